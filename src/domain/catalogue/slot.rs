use std::fmt;

use chrono::{NaiveTime, TimeDelta, Timelike};

use crate::domain::time::cyclic_time_frame::CyclicTimeFrame;
use crate::domain::time::periodicity::Periodicity;
use crate::domain::utils::id::{LinkName, PeriodicSlotName, SlotName, SystemNodeId};
use crate::error::{Error, Result};

/// One weekday occurrence of a periodic slot: the right to run over the link `from -> to`
/// departing at `start` and arriving at `end`.
///
/// Concrete slots are immutable and shared as `Arc<Slot>` between the catalogue, the
/// feasibility DAGs and the solution candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// `{periodic slot name}_{day}`.
    pub name: SlotName,

    pub periodic_slot: PeriodicSlotName,

    /// The name of the link (train path section) the slot runs on.
    pub section: LinkName,

    pub start: CyclicTimeFrame,
    pub end: CyclicTimeFrame,
    pub from: SystemNodeId,
    pub to: SystemNodeId,
}

impl Slot {
    pub fn duration(&self) -> TimeDelta {
        self.end.distance_after(&self.start)
    }

    pub fn is_start_time_contained_inclusive(&self, earliest: &CyclicTimeFrame, latest: &CyclicTimeFrame) -> bool {
        self.start.is_within_bounds(earliest, latest)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{},{}], ({}, {})", self.name, self.start, self.end, self.from, self.to)
    }
}

/// A recurring capacity offer on one link, valid on the week days of its periodicity.
#[derive(Debug, Clone)]
pub struct PeriodicSlot {
    pub section: LinkName,
    pub name: PeriodicSlotName,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub from: SystemNodeId,
    pub to: SystemNodeId,
    pub periodicity: Periodicity,
}

impl PeriodicSlot {
    pub fn new(section: LinkName, name: PeriodicSlotName, start_time: NaiveTime, end_time: NaiveTime, from: SystemNodeId, to: SystemNodeId, periodicity: Periodicity) -> Self {
        Self { section, name, start_time, end_time, from, to, periodicity }
    }

    /// Creates the concrete slot for every week day of the periodicity, Monday first.
    ///
    /// An end time before the start time means arrival on the following day.
    ///
    /// # Returns
    /// `Error::InvalidSlot` if an instantiated end does not lie within 24 hours after its start.
    pub fn instantiate(&self) -> Result<Vec<Slot>> {
        let mut slots = Vec::new();

        for day in self.periodicity.weekdays() {
            let start = CyclicTimeFrame::from_day_number(day, self.start_time.hour(), self.start_time.minute())?;
            let mut end = CyclicTimeFrame::from_day_number(day, self.end_time.hour(), self.end_time.minute())?;
            if end.is_before(&start) {
                end = end.plus_hours(24);
            }
            if !end.is_within_bounds(&start, &start.plus_days(1)) {
                return Err(Error::InvalidSlot(format!("End {} of {} must lie within 24h from {}", end, self.name, start)));
            }

            slots.push(Slot {
                name: SlotName::new(format!("{}_{}", self.name, day)),
                periodic_slot: self.name.clone(),
                section: self.section.clone(),
                start,
                end,
                from: self.from.clone(),
                to: self.to.clone(),
            });
        }

        Ok(slots)
    }
}

/// Hands out names for slots that come without one.
///
/// Owned by whoever generates the slots, so independent generation runs never share state.
#[derive(Debug, Default)]
pub struct SlotNameCounter {
    next: usize,
}

impl SlotNameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: usize) -> Self {
        Self { next }
    }

    pub fn next_name(&mut self, section: &LinkName) -> PeriodicSlotName {
        let name = PeriodicSlotName::new(format!("{}_auto_{:05}", section, self.next));
        self.next += 1;
        name
    }
}
