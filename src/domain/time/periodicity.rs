use std::fmt;

use chrono::Weekday;
use serde::Serialize;

use crate::error::{Error, Result};

/// Bit pattern with all seven week days set (bit 0 is unused).
const ALL_DAYS: u8 = 0b1111_1110;

/// The set of week days on which a slot operates or an application is requested.
///
/// Day `d` (1 = Monday, ..., 7 = Sunday) is stored in bit `d`, so the mask lies in `[0, 254]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Periodicity {
    val: u8,
}

impl Periodicity {
    /// Creates an empty periodicity.
    pub fn new() -> Self {
        Self { val: 0 }
    }

    /// Creates a periodicity from its raw bit mask.
    ///
    /// # Returns
    /// `Error::InvalidInput` if the mask uses bit 0 or lies outside `[0, 254]`.
    pub fn from_mask(val: u32) -> Result<Self> {
        if val > ALL_DAYS as u32 || val & 1 == 1 {
            return Err(Error::InvalidInput(format!("Periodicity mask {} is not within [0, {}] or uses bit 0", val, ALL_DAYS)));
        }

        Ok(Self { val: val as u8 })
    }

    pub fn whole_week() -> Self {
        Self { val: ALL_DAYS }
    }

    pub fn mask(&self) -> u32 {
        self.val as u32
    }

    pub fn is_empty(&self) -> bool {
        self.val == 0
    }

    /// Sets or clears `day` (1 = Monday, ..., 7 = Sunday).
    pub fn set(&mut self, day: u32, value: bool) -> Result<()> {
        let bit = Self::bit(day)?;
        if value {
            self.val |= bit;
        } else {
            self.val &= !bit;
        }
        Ok(())
    }

    pub fn get(&self, day: u32) -> Result<bool> {
        Ok(self.val & Self::bit(day)? != 0)
    }

    pub fn set_weekday(&mut self, day: Weekday, value: bool) {
        let bit = 1u8 << day.number_from_monday();
        if value {
            self.val |= bit;
        } else {
            self.val &= !bit;
        }
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.val & (1u8 << day.number_from_monday()) != 0
    }

    /// # Returns
    /// The active week days in ascending order (1 = Monday, ..., 7 = Sunday).
    pub fn weekdays(&self) -> Vec<u32> {
        (1..=7).filter(|day| self.val & (1u8 << day) != 0).collect()
    }

    /// Returns `true` if every day set in `value` is also set in `filter`.
    pub fn is_sub_periodicity(value: &Periodicity, filter: &Periodicity) -> bool {
        if filter.val == ALL_DAYS {
            return true;
        }

        (!value.val | filter.val) & ALL_DAYS == ALL_DAYS
    }

    /// Returns `true` if `lower` is contained in `self` and `self` is contained in `upper`.
    ///
    /// # Returns
    /// `Error::InvalidPattern` if `lower` is not itself contained in `upper`.
    pub fn contained_within(&self, lower: &Periodicity, upper: &Periodicity) -> Result<bool> {
        if !Self::is_sub_periodicity(lower, upper) {
            return Err(Error::InvalidPattern(format!("{} is not contained in {}", lower, upper)));
        }

        Ok(Self::is_sub_periodicity(lower, self) && Self::is_sub_periodicity(self, upper))
    }

    /// Parses a seven character pattern over `{0, 1, ?}`, Monday first, into inclusive bounds.
    ///
    /// `1` marks a day in both bounds, `?` only in the upper bound, `0` in neither.
    ///
    /// # Returns
    /// The `(lower, upper)` pair or `Error::InvalidPattern` for any other length or character.
    pub fn parse_bounds(pattern: &str) -> Result<(Periodicity, Periodicity)> {
        if pattern.chars().count() != 7 {
            return Err(Error::InvalidPattern(pattern.to_string()));
        }

        let mut lower = Periodicity::new();
        let mut upper = Periodicity::new();

        for (i, c) in pattern.chars().enumerate() {
            let bit = 1u8 << (i + 1);
            match c {
                '0' => {}
                '?' => upper.val |= bit,
                '1' => {
                    lower.val |= bit;
                    upper.val |= bit;
                }
                _ => return Err(Error::InvalidPattern(pattern.to_string())),
            }
        }

        Ok((lower, upper))
    }

    /// Parses a strict `{0, 1}` pattern as used in scenario files.
    pub fn parse(pattern: &str) -> Result<Periodicity> {
        let (lower, upper) = Self::parse_bounds(pattern)?;
        if lower != upper {
            return Err(Error::InvalidPattern(pattern.to_string()));
        }
        Ok(lower)
    }

    fn bit(day: u32) -> Result<u8> {
        if !(1..=7).contains(&day) {
            return Err(Error::InvalidWeekDay(day));
        }
        Ok(1u8 << day)
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for day in 1..=7 {
            write!(f, "{}", if self.val & (1u8 << day) != 0 { '1' } else { '0' })?;
        }
        Ok(())
    }
}
