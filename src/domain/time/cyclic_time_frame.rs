use std::fmt;

use chrono::{NaiveTime, TimeDelta, Timelike, Weekday};
use serde::Serialize;

use crate::error::{Error, Result};

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;
pub const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;

/// A moment within a repeating week, stored as milliseconds after Monday 00:00.
///
/// Values are always normalized into `[START_OF_WEEK, END_OF_WEEK)`: adding or subtracting a
/// duration wraps around by whole weeks. Ordering (`Ord`) is the linear order within one week;
/// every comparison that has to respect the wraparound goes through [`is_within_bounds`] and the
/// `distance_*` functions.
///
/// [`is_within_bounds`]: CyclicTimeFrame::is_within_bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CyclicTimeFrame {
    millis: i64,
}

/// Monday 00:00:00.000 (inclusive).
pub const START_OF_WEEK: CyclicTimeFrame = CyclicTimeFrame { millis: 0 };

/// Sunday 23:59:59.999, the last representable moment of the week. The week itself ends
/// (exclusively) one millisecond later.
pub const END_OF_WEEK: CyclicTimeFrame = CyclicTimeFrame { millis: MILLIS_PER_WEEK - 1 };

impl CyclicTimeFrame {
    /// Creates a moment from any millisecond offset, normalizing it into the week.
    pub fn from_millis(millis: i64) -> Self {
        Self { millis: millis.rem_euclid(MILLIS_PER_WEEK) }
    }

    pub fn new(day: Weekday, hour: u32, minute: u32) -> Self {
        Self::from_millis(Self::day_offset(day) + hour as i64 * MILLIS_PER_HOUR + minute as i64 * MILLIS_PER_MINUTE)
    }

    pub fn with_time(day: Weekday, time: NaiveTime) -> Self {
        let millis_of_day = time.num_seconds_from_midnight() as i64 * MILLIS_PER_SECOND + (time.nanosecond() / 1_000_000) as i64;
        Self::from_millis(Self::day_offset(day) + millis_of_day)
    }

    /// Creates a moment from a numeric week day (1 = Monday, ..., 7 = Sunday).
    pub fn from_day_number(day: u32, hour: u32, minute: u32) -> Result<Self> {
        Ok(Self::new(weekday_from_number(day)?, hour, minute))
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    pub fn weekday(&self) -> Weekday {
        match self.millis / MILLIS_PER_DAY {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }

    /// # Returns
    /// The day of week as number, 1 = Monday, ..., 7 = Sunday.
    pub fn day_of_week(&self) -> u32 {
        self.weekday().number_from_monday()
    }

    pub fn millis_of_day(&self) -> i64 {
        self.millis % MILLIS_PER_DAY
    }

    pub fn hour(&self) -> u32 {
        (self.millis_of_day() / MILLIS_PER_HOUR) as u32
    }

    pub fn minute(&self) -> u32 {
        (self.millis_of_day() % MILLIS_PER_HOUR / MILLIS_PER_MINUTE) as u32
    }

    pub fn second(&self) -> u32 {
        (self.millis_of_day() % MILLIS_PER_MINUTE / MILLIS_PER_SECOND) as u32
    }

    pub fn millisecond(&self) -> u32 {
        (self.millis_of_day() % MILLIS_PER_SECOND) as u32
    }

    pub fn plus(&self, duration: TimeDelta) -> Self {
        Self::from_millis(self.millis + duration.num_milliseconds())
    }

    pub fn minus(&self, duration: TimeDelta) -> Self {
        Self::from_millis(self.millis - duration.num_milliseconds())
    }

    pub fn plus_hours(&self, hours: i64) -> Self {
        Self::from_millis(self.millis + hours * MILLIS_PER_HOUR)
    }

    pub fn plus_days(&self, days: i64) -> Self {
        Self::from_millis(self.millis + days * MILLIS_PER_DAY)
    }

    pub fn is_before(&self, other: &CyclicTimeFrame) -> bool {
        self.millis < other.millis
    }

    /// Tests whether this moment lies in the inclusive interval `[earliest, latest]`.
    ///
    /// If `earliest` is after `latest` within the week, the interval wraps across the week
    /// boundary and the test becomes `self >= earliest || self <= latest`.
    pub fn is_within_bounds(&self, earliest: &CyclicTimeFrame, latest: &CyclicTimeFrame) -> bool {
        if earliest.millis <= latest.millis {
            earliest.millis <= self.millis && self.millis <= latest.millis
        } else {
            self.millis >= earliest.millis || self.millis <= latest.millis
        }
    }

    /// The non-negative duration from `reference` forward to this moment.
    ///
    /// Zero if both are equal; if this moment lies before `reference` the distance wraps
    /// into the following week.
    pub fn distance_after(&self, reference: &CyclicTimeFrame) -> TimeDelta {
        let millis = if self.millis >= reference.millis {
            self.millis - reference.millis
        } else {
            MILLIS_PER_WEEK - reference.millis + self.millis
        };
        TimeDelta::milliseconds(millis)
    }

    /// Zero if this moment lies in `[lb, ub]`, otherwise the distance from `ub` forward to it.
    pub fn distance_after_interval(&self, lb: &CyclicTimeFrame, ub: &CyclicTimeFrame) -> TimeDelta {
        if self.is_within_bounds(lb, ub) {
            return TimeDelta::zero();
        }
        self.distance_after(ub)
    }

    /// Zero if this moment lies in `[lb, ub]`, otherwise the distance from it forward to `lb`.
    pub fn distance_before_interval(&self, lb: &CyclicTimeFrame, ub: &CyclicTimeFrame) -> TimeDelta {
        if self.is_within_bounds(lb, ub) {
            return TimeDelta::zero();
        }
        lb.distance_after(self)
    }

    fn day_offset(day: Weekday) -> i64 {
        day.num_days_from_monday() as i64 * MILLIS_PER_DAY
    }
}

impl fmt::Display for CyclicTimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:{:02}:{:02}", self.weekday(), self.hour(), self.minute(), self.second())
    }
}

/// Converts a numeric week day (1 = Monday, ..., 7 = Sunday).
pub fn weekday_from_number(day: u32) -> Result<Weekday> {
    match day {
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        7 => Ok(Weekday::Sun),
        _ => Err(Error::InvalidWeekDay(day)),
    }
}

/// The following week day, Sunday wrapping to Monday.
pub fn next_day_of_week(day: u32) -> Result<u32> {
    Ok(weekday_from_number(day)?.succ().number_from_monday())
}

/// Formats a duration as `HH:MM:SS`; hours are not truncated at 24.
pub fn format_duration(duration: TimeDelta) -> String {
    let total_seconds = duration.num_seconds();
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total_seconds = total_seconds.abs();
    format!("{}{:02}:{:02}:{:02}", sign, total_seconds / 3600, total_seconds % 3600 / 60, total_seconds % 60)
}
