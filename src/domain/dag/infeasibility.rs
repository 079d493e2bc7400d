use std::fmt;

use serde::Serialize;

/// Why a slot vertex was cut from a feasibility DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Infeasibility {
    /// Arrives too late, at the destination or already on the way.
    Overdue,
    /// Arrives at the destination before the arrival window opens.
    Underdue,
    /// All its successors were cut.
    Backtracking,
    /// No connecting slot departs within the allowed dwell time.
    NoSuccessor,
}

impl Infeasibility {
    pub const ALL: [Infeasibility; 4] = [Infeasibility::Overdue, Infeasibility::Underdue, Infeasibility::Backtracking, Infeasibility::NoSuccessor];
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Infeasibility::Overdue => "OVERDUE",
            Infeasibility::Underdue => "UNDERDUE",
            Infeasibility::Backtracking => "BACKTRACKING",
            Infeasibility::NoSuccessor => "NOSUCCESSOR",
        };
        write!(f, "{}", s)
    }
}
