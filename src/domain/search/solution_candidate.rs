use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::TimeDelta;

use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::catalogue::slot::Slot;
use crate::domain::time::cyclic_time_frame::CyclicTimeFrame;
use crate::domain::utils::id::{RequestName, SlotName, SystemNodeId};
use crate::error::{Error, Result};

pub const CANDIDATE_PREFIX: &str = "sc|";

/// A complete chain of slots serving one request.
///
/// Two candidates are equal if their names are equal. The name is derived from the request name
/// and the slot names, see [`SolutionCandidate::name`].
#[derive(Debug, Clone)]
pub struct SolutionCandidate {
    name: String,
    path: Vec<Arc<Slot>>,
    request: RequestName,
    from: SystemNodeId,
    to: SystemNodeId,
    requested_start: CyclicTimeFrame,
    requested_end: CyclicTimeFrame,
}

impl SolutionCandidate {
    /// Validates `path` as a train path for `request`.
    ///
    /// # Returns
    /// `Error::InternalConsistency` if the path is empty, does not run from the request's origin
    /// to its destination, is not connected, takes longer than its direct span or runs over the
    /// same link twice.
    pub fn new(path: Vec<Arc<Slot>>, request: &SimpleApplication) -> Result<Self> {
        Self::sanity_check_path(&path, request)?;

        let mut sections: HashSet<(&SystemNodeId, &SystemNodeId)> = HashSet::new();
        for slot in &path {
            if !sections.insert((&slot.from, &slot.to)) {
                return Err(Error::InternalConsistency(format!("Section ({}, {}) visited twice in path for request {}", slot.from, slot.to, request.name)));
            }
        }

        let path_string: String = path.iter().map(|slot| format!("_{}", slot.name)).collect();
        let name = format!("{}{}|{}", CANDIDATE_PREFIX, request.name, polynomial_string_hash(&path_string));

        Ok(Self { name, path, request: request.name.clone(), from: request.from.clone(), to: request.to.clone(), requested_start: request.start, requested_end: request.end })
    }

    /// Verifies that the path is connected and that summed slot durations and dwell times equal the
    /// direct distance from first departure to last arrival, i.e. the path spans less than a week.
    pub fn sanity_check_path(path: &[Arc<Slot>], request: &SimpleApplication) -> Result<()> {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(Error::InternalConsistency(format!("Path should not be empty for request {}", request.name)));
        };
        if first.from != request.from || last.to != request.to {
            return Err(Error::InternalConsistency(format!("Path does not start or end at requested locations in {}", request.name)));
        }

        let mut summed_distance: TimeDelta = path.iter().map(|slot| slot.duration()).sum();
        for pair in path.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if previous.to != current.from {
                return Err(Error::InternalConsistency(format!("Path is not connected at {} => {} in {}", previous.name, current.name, request.name)));
            }
            summed_distance += current.start.distance_after(&previous.end);
        }

        let direct_distance = last.end.distance_after(&first.start);
        if direct_distance != summed_distance {
            return Err(Error::InternalConsistency(format!("Direct and summed distance should be the same in path for request {}", request.name)));
        }

        Ok(())
    }

    /// `sc|{request}|{hash}`, where the hash is the 32 bit polynomial string hash of the
    /// concatenated `_{slot}` names.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &[Arc<Slot>] {
        &self.path
    }

    pub fn request(&self) -> &RequestName {
        &self.request
    }

    pub fn first_slot(&self) -> &Arc<Slot> {
        &self.path[0]
    }

    pub fn last_slot(&self) -> &Arc<Slot> {
        &self.path[self.path.len() - 1]
    }

    pub fn start(&self) -> CyclicTimeFrame {
        self.first_slot().start
    }

    pub fn end(&self) -> CyclicTimeFrame {
        self.last_slot().end
    }

    /// Milliseconds from the departure of the first slot to the arrival of the last one.
    pub fn duration(&self) -> i64 {
        self.end().distance_after(&self.start()).num_milliseconds()
    }

    /// Milliseconds the departure lies before the requested window.
    pub fn earliness(&self) -> i64 {
        self.start().distance_before_interval(&self.requested_start, &self.requested_end).num_milliseconds()
    }

    /// Milliseconds the arrival lies after the requested window.
    pub fn lateness(&self) -> i64 {
        self.end().distance_after_interval(&self.requested_start, &self.requested_end).num_milliseconds()
    }

    pub fn weight(&self) -> i64 {
        self.duration() + self.earliness() + self.lateness()
    }

    pub fn contains_slot(&self, name: &SlotName) -> bool {
        self.path.iter().any(|slot| &slot.name == name)
    }

    pub fn describe_full_path(&self) -> String {
        let mut s = format!(
            "Request {} {} => {} [{}, {}] (day {}) has the solution candidate {} of weight {} (duration {}, earliness {}, lateness {})",
            self.request,
            self.from,
            self.to,
            self.requested_start,
            self.requested_end,
            self.requested_start.day_of_week(),
            self.name,
            self.weight(),
            self.duration(),
            self.earliness(),
            self.lateness()
        );
        for slot in &self.path {
            s.push_str(&format!("\n {} {} => {} [{}, {}]", slot.name, slot.from, slot.to, slot.start, slot.end));
        }
        s
    }
}

impl PartialEq for SolutionCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SolutionCandidate {}

impl Hash for SolutionCandidate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for SolutionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Extracts the request name from a candidate name `sc|{request}|{hash}`.
pub fn application_name_from_candidate_name(name: &str) -> Option<&str> {
    if !name.starts_with(CANDIDATE_PREFIX) {
        return None;
    }
    name.split('|').nth(1)
}

/// `s[0]*31^(n-1) + ... + s[n-1]` over the UTF-16 code units of `s`, wrapping at 32 bits.
pub fn polynomial_string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}
