use std::collections::HashMap;

use chrono::TimeDelta;

use crate::domain::time::cyclic_time_frame::CyclicTimeFrame;
use crate::domain::utils::id::SystemNodeId;
use crate::error::{Error, Result};

const DEFAULT_ADDITIONAL_DWELL_MINUTES: i64 = 15;
const DEFAULT_DEPARTURE_ARRIVAL_SLACK_MINUTES: i64 = 60;

/// The bounds the feasibility DAG of one request is pruned with.
///
/// The hard bounds are fixed when the request is created. The soft bounds are widened step by
/// step during the candidate search but never beyond their hard counterparts: every setter
/// rejects such a value with `Error::BoundViolation` and leaves the parameters unchanged.
#[derive(Debug, Clone)]
pub struct PruningParameters {
    /// Requested departure.
    start: CyclicTimeFrame,

    /// Requested arrival.
    end: CyclicTimeFrame,

    hard_max_earlier_departure: TimeDelta,
    hard_min_dwell_time: TimeDelta,
    hard_max_later_arrival: TimeDelta,

    max_earlier_departure: TimeDelta,
    min_dwell_time: TimeDelta,
    max_later_arrival: TimeDelta,

    max_later_departure: TimeDelta,
    max_earlier_arrival: TimeDelta,
    max_additional_dwell_time: TimeDelta,

    /// Additional dwell times deviating from `max_additional_dwell_time`.
    additional_dwell_time_per_node: HashMap<SystemNodeId, TimeDelta>,

    max_train_paths_per_request: usize,
    max_outgoing_connections_per_slot: usize,
}

impl PruningParameters {
    /// Creates the parameters for a request from `start` to `end` with hard bounds in minutes.
    ///
    /// All soft bounds start out tight: no earlier departure, no later arrival, no slack and the
    /// hard minimum dwell time.
    pub fn new(start: CyclicTimeFrame, end: CyclicTimeFrame, hard_max_earlier_departure: i64, hard_min_dwell_time: i64, hard_max_later_arrival: i64) -> Result<Self> {
        if hard_max_earlier_departure < 0 || hard_min_dwell_time < 0 || hard_max_later_arrival < 0 {
            return Err(Error::InvalidInput(format!(
                "Hard bounds must not be negative, got ({}, {}, {})",
                hard_max_earlier_departure, hard_min_dwell_time, hard_max_later_arrival
            )));
        }

        Ok(Self {
            start,
            end,
            hard_max_earlier_departure: TimeDelta::minutes(hard_max_earlier_departure),
            hard_min_dwell_time: TimeDelta::minutes(hard_min_dwell_time),
            hard_max_later_arrival: TimeDelta::minutes(hard_max_later_arrival),
            max_earlier_departure: TimeDelta::zero(),
            min_dwell_time: TimeDelta::minutes(hard_min_dwell_time),
            max_later_arrival: TimeDelta::zero(),
            max_later_departure: TimeDelta::zero(),
            max_earlier_arrival: TimeDelta::zero(),
            max_additional_dwell_time: TimeDelta::zero(),
            additional_dwell_time_per_node: HashMap::new(),
            max_train_paths_per_request: usize::MAX,
            max_outgoing_connections_per_slot: usize::MAX,
        })
    }

    /// Resets the soft bounds to the values the first search attempt is made with.
    pub fn set_default_pruning(&mut self) {
        self.min_dwell_time = self.hard_min_dwell_time;
        self.max_earlier_departure = self.hard_max_earlier_departure;
        self.max_later_arrival = self.hard_max_later_arrival;

        self.max_additional_dwell_time = TimeDelta::minutes(DEFAULT_ADDITIONAL_DWELL_MINUTES);

        let slack = TimeDelta::minutes(DEFAULT_DEPARTURE_ARRIVAL_SLACK_MINUTES).min(self.application_hard_max_duration() / 2);
        self.max_later_departure = slack;
        self.max_earlier_arrival = slack;

        self.additional_dwell_time_per_node.clear();
    }

    /// Widens every soft bound as far as the hard bounds allow.
    pub fn relax_to_max(&mut self) {
        self.max_additional_dwell_time = self.application_hard_max_duration();
        self.max_earlier_arrival = self.application_duration();
        self.max_later_departure = self.application_duration();

        self.min_dwell_time = self.hard_min_dwell_time;
        self.max_earlier_departure = self.hard_max_earlier_departure;
        self.max_later_arrival = self.hard_max_later_arrival;
    }

    pub fn start(&self) -> CyclicTimeFrame {
        self.start
    }

    pub fn end(&self) -> CyclicTimeFrame {
        self.end
    }

    pub fn hard_max_earlier_departure(&self) -> TimeDelta {
        self.hard_max_earlier_departure
    }

    pub fn hard_min_dwell_time(&self) -> TimeDelta {
        self.hard_min_dwell_time
    }

    pub fn hard_max_later_arrival(&self) -> TimeDelta {
        self.hard_max_later_arrival
    }

    pub fn max_earlier_departure(&self) -> TimeDelta {
        self.max_earlier_departure
    }

    pub fn set_max_earlier_departure(&mut self, value: TimeDelta) -> Result<()> {
        check_non_negative("maximum earlier departure", value)?;
        if value > self.hard_max_earlier_departure {
            return Err(Error::BoundViolation(format!("Maximum earlier departure {} exceeds hard maximum {}", value, self.hard_max_earlier_departure)));
        }
        self.max_earlier_departure = value;
        Ok(())
    }

    pub fn min_dwell_time(&self) -> TimeDelta {
        self.min_dwell_time
    }

    pub fn set_min_dwell_time(&mut self, value: TimeDelta) -> Result<()> {
        if value < self.hard_min_dwell_time {
            return Err(Error::BoundViolation(format!("Minimum dwell time {} is below hard minimum {}", value, self.hard_min_dwell_time)));
        }
        self.min_dwell_time = value;
        Ok(())
    }

    pub fn max_later_arrival(&self) -> TimeDelta {
        self.max_later_arrival
    }

    pub fn set_max_later_arrival(&mut self, value: TimeDelta) -> Result<()> {
        check_non_negative("maximum later arrival", value)?;
        if value > self.hard_max_later_arrival {
            return Err(Error::BoundViolation(format!("Maximum later arrival {} exceeds hard maximum {}", value, self.hard_max_later_arrival)));
        }
        self.max_later_arrival = value;
        Ok(())
    }

    pub fn max_later_departure(&self) -> TimeDelta {
        self.max_later_departure
    }

    pub fn set_max_later_departure(&mut self, value: TimeDelta) -> Result<()> {
        check_non_negative("maximum later departure", value)?;
        self.max_later_departure = value;
        Ok(())
    }

    pub fn max_earlier_arrival(&self) -> TimeDelta {
        self.max_earlier_arrival
    }

    pub fn set_max_earlier_arrival(&mut self, value: TimeDelta) -> Result<()> {
        check_non_negative("maximum earlier arrival", value)?;
        self.max_earlier_arrival = value;
        Ok(())
    }

    /// # Returns
    /// The additional dwell time allowed at `node`, falling back to the global value.
    pub fn max_additional_dwell_time(&self, node: &SystemNodeId) -> TimeDelta {
        self.additional_dwell_time_per_node.get(node).copied().unwrap_or(self.max_additional_dwell_time)
    }

    pub fn set_max_additional_dwell_time(&mut self, value: TimeDelta) -> Result<()> {
        check_non_negative("maximum additional dwell time", value)?;
        self.max_additional_dwell_time = value;
        Ok(())
    }

    pub fn set_max_additional_dwell_time_at(&mut self, node: SystemNodeId, value: TimeDelta) -> Result<()> {
        check_non_negative("maximum additional dwell time", value)?;
        self.additional_dwell_time_per_node.insert(node, value);
        Ok(())
    }

    pub fn max_train_paths_per_request(&self) -> usize {
        self.max_train_paths_per_request
    }

    pub fn set_max_train_paths_per_request(&mut self, value: usize) {
        self.max_train_paths_per_request = value;
    }

    pub fn max_outgoing_connections_per_slot(&self) -> usize {
        self.max_outgoing_connections_per_slot
    }

    pub fn set_max_outgoing_connections_per_slot(&mut self, value: usize) {
        self.max_outgoing_connections_per_slot = value;
    }

    pub fn departure_lower_bound(&self) -> CyclicTimeFrame {
        self.start.minus(self.max_earlier_departure)
    }

    pub fn departure_hard_lower_bound(&self) -> CyclicTimeFrame {
        self.start.minus(self.hard_max_earlier_departure)
    }

    pub fn departure_upper_bound(&self) -> CyclicTimeFrame {
        self.start.plus(self.max_later_departure)
    }

    pub fn arrival_lower_bound(&self) -> CyclicTimeFrame {
        self.end.minus(self.max_earlier_arrival)
    }

    pub fn arrival_upper_bound(&self) -> CyclicTimeFrame {
        self.end.plus(self.max_later_arrival)
    }

    pub fn arrival_hard_upper_bound(&self) -> CyclicTimeFrame {
        self.end.plus(self.hard_max_later_arrival)
    }

    pub fn is_within_hard_bounds(&self, moment: &CyclicTimeFrame) -> bool {
        moment.is_within_bounds(&self.departure_hard_lower_bound(), &self.arrival_hard_upper_bound())
    }

    pub fn is_within_bounds(&self, moment: &CyclicTimeFrame) -> bool {
        moment.is_within_bounds(&self.departure_lower_bound(), &self.arrival_upper_bound())
    }

    /// The span from the hard departure lower bound to the hard arrival upper bound.
    pub fn application_hard_max_duration(&self) -> TimeDelta {
        self.arrival_hard_upper_bound().distance_after(&self.departure_hard_lower_bound())
    }

    /// The span from requested departure to requested arrival.
    pub fn application_duration(&self) -> TimeDelta {
        self.end.distance_after(&self.start)
    }
}

fn check_non_negative(what: &str, value: TimeDelta) -> Result<()> {
    if value < TimeDelta::zero() {
        return Err(Error::BoundViolation(format!("The {} must not be negative, got {}", what, value)));
    }
    Ok(())
}
