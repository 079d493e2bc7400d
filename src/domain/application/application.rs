use chrono::{NaiveTime, Timelike};

use crate::domain::application::simple_application::SimpleApplication;
use crate::domain::time::cyclic_time_frame::{CyclicTimeFrame, next_day_of_week};
use crate::domain::time::periodicity::Periodicity;
use crate::domain::utils::id::{ApplicationName, RequestName, SystemNodeId};
use crate::error::Result;

/// A train path application with week day periodicity.
///
/// It is never allocated as a whole: every active week day becomes its own
/// [`SimpleApplication`] named `{name}_{day}`.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: ApplicationName,
    pub from: SystemNodeId,
    pub to: SystemNodeId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub periodicity: Periodicity,

    /// One request per active week day, Monday first.
    requests: Vec<(u32, SimpleApplication)>,
}

impl Application {
    /// # Returns
    /// `Error::InvalidInput` if any of the derived requests is invalid.
    pub fn new(name: ApplicationName, from: SystemNodeId, to: SystemNodeId, start_time: NaiveTime, end_time: NaiveTime, periodicity: Periodicity, hard_bounds: (i64, i64, i64)) -> Result<Self> {
        let mut requests = Vec::new();

        for day in periodicity.weekdays() {
            let start = CyclicTimeFrame::from_day_number(day, start_time.hour(), start_time.minute())?;
            let mut end = CyclicTimeFrame::from_day_number(day, end_time.hour(), end_time.minute())?;
            if end.is_before(&start) {
                end = CyclicTimeFrame::from_day_number(next_day_of_week(day)?, end_time.hour(), end_time.minute())?;
            }

            let request_name = RequestName::new(format!("{}_{}", name, day));
            let request = SimpleApplication::new(request_name, from.clone(), to.clone(), start, end, hard_bounds)?.with_parent(name.clone());
            requests.push((day, request));
        }

        Ok(Self { name, from, to, start_time, end_time, periodicity, requests })
    }

    pub fn request_on_week_day(&self, day: u32) -> Option<&SimpleApplication> {
        self.requests.iter().find(|(d, _)| *d == day).map(|(_, request)| request)
    }

    pub fn nb_days(&self) -> usize {
        self.requests.len()
    }

    pub fn children(&self) -> impl Iterator<Item = &SimpleApplication> {
        self.requests.iter().map(|(_, request)| request)
    }

    pub fn into_children(self) -> Vec<SimpleApplication> {
        self.requests.into_iter().map(|(_, request)| request).collect()
    }
}
