use std::fmt;

use crate::domain::application::pruning_parameters::PruningParameters;
use crate::domain::time::cyclic_time_frame::CyclicTimeFrame;
use crate::domain::utils::id::{ApplicationName, RequestName, SystemNodeId};
use crate::error::{Error, Result};

/// A request for one train path from `from` to `to` on one week day: departure at `start`,
/// arrival at `end`.
#[derive(Debug, Clone)]
pub struct SimpleApplication {
    pub name: RequestName,
    pub from: SystemNodeId,
    pub to: SystemNodeId,
    pub start: CyclicTimeFrame,
    pub end: CyclicTimeFrame,

    /// The periodic application this request was derived from, if any.
    pub parent: Option<ApplicationName>,

    params: PruningParameters,
}

impl SimpleApplication {
    /// Creates a request with the hard bounds given in minutes.
    ///
    /// # Returns
    /// `Error::InvalidInput` if `end` does not lie within 24 hours after `start` or if origin and
    /// destination coincide.
    pub fn new(name: RequestName, from: SystemNodeId, to: SystemNodeId, start: CyclicTimeFrame, end: CyclicTimeFrame, hard_bounds: (i64, i64, i64)) -> Result<Self> {
        if !end.is_within_bounds(&start, &start.plus_days(1)) {
            return Err(Error::InvalidInput(format!("End time {} is not within 24h from start time {} in request {}", end, start, name)));
        }
        if from == to {
            return Err(Error::InvalidInput(format!("Request {} starts and ends at {}", name, from)));
        }

        let (hard_max_earlier_departure, hard_min_dwell_time, hard_max_later_arrival) = hard_bounds;
        let params = PruningParameters::new(start, end, hard_max_earlier_departure, hard_min_dwell_time, hard_max_later_arrival)?;

        Ok(Self { name, from, to, start, end, parent: None, params })
    }

    pub fn with_parent(mut self, parent: ApplicationName) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn params(&self) -> &PruningParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut PruningParameters {
        &mut self.params
    }

    /// `#name [start,end], (from, to)`
    pub fn description(&self) -> String {
        format!("#{} [{},{}], ({}, {})", self.name, self.start, self.end, self.from, self.to)
    }

    /// Lists the request together with its current pruning state, one `key: value` per line.
    pub fn debug_info(&self) -> String {
        let p = &self.params;
        let mut lines = vec![
            format!("name: {}", self.name),
            format!("from: {}", self.from),
            format!("to: {}", self.to),
            format!("start: {}", self.start),
            format!("end: {}", self.end),
        ];
        if let Some(parent) = &self.parent {
            lines.push(format!("parent: {}", parent));
        }
        lines.push(format!("departure: [{}, {}], hard lower bound {}", p.departure_lower_bound(), p.departure_upper_bound(), p.departure_hard_lower_bound()));
        lines.push(format!("arrival: [{}, {}], hard upper bound {}", p.arrival_lower_bound(), p.arrival_upper_bound(), p.arrival_hard_upper_bound()));
        lines.push(format!("min dwell time: {} min (hard {} min)", p.min_dwell_time().num_minutes(), p.hard_min_dwell_time().num_minutes()));
        lines.join("\n")
    }
}

impl fmt::Display for SimpleApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
