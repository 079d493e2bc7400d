use thiserror::Error;

/// Coarse classification of every failure the crate can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    TopologyOrCatalogueConflict,
    BoundViolation,
    InternalConsistency,
    Infeasible,
    Io,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse scenario JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid periodicity pattern '{0}'")]
    InvalidPattern(String),

    #[error("Invalid week day {0}, expected 1 (Monday) to 7 (Sunday)")]
    InvalidWeekDay(u32),

    #[error("Link name '{name}' is already used for ({from}, {to})")]
    DuplicateLinkName { name: String, from: String, to: String },

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    #[error("Unknown system node '{0}'")]
    UnknownNode(String),

    #[error("Duplicate slot: {0}")]
    DuplicateSlot(String),

    #[error("Inconsistent slot duration: {0}")]
    InconsistentDuration(String),

    #[error("Invalid slot: {0}")]
    InvalidSlot(String),

    #[error("There is no link from {from} to {to} in the catalogue")]
    NoSuchLink { from: String, to: String },

    #[error("Pruning bound violation: {0}")]
    BoundViolation(String),

    #[error("Adding edge {from} -> {to} would close a cycle")]
    CycleDetected { from: String, to: String },

    #[error("Internal consistency violated: {0}")]
    InternalConsistency(String),

    #[error("Infeasible train path applications: {}", .0.join(", "))]
    InfeasibleApplications(Vec<String>),

    #[error("Infeasible allocation model: {} IIS applications, {} IIS slots", .applications.len(), .slots.len())]
    InfeasibleModel { applications: Vec<String>, slots: Vec<String> },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IoError(_) | Error::DeserializationError(_) => ErrorKind::Io,
            Error::InvalidInput(_) | Error::InvalidPattern(_) | Error::InvalidWeekDay(_) => ErrorKind::InvalidInput,
            Error::DuplicateLinkName { .. }
            | Error::InvalidLink(_)
            | Error::InvalidRoute(_)
            | Error::UnknownNode(_)
            | Error::DuplicateSlot(_)
            | Error::InconsistentDuration(_)
            | Error::InvalidSlot(_)
            | Error::NoSuchLink { .. } => ErrorKind::TopologyOrCatalogueConflict,
            Error::BoundViolation(_) => ErrorKind::BoundViolation,
            Error::CycleDetected { .. } | Error::InternalConsistency(_) => ErrorKind::InternalConsistency,
            Error::InfeasibleApplications(_) | Error::InfeasibleModel { .. } => ErrorKind::Infeasible,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
