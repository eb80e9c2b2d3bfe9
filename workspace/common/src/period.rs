//! Calendar month used as the time axis of every demand series.
//!
//! The backend exchanges periods as `"YYYY-MM"` strings. Parsing is strict so
//! that a malformed period is rejected at the wire boundary instead of
//! producing a nonsensical "next month" later on.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or advancing a [`Period`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    /// The input was not of the form `YYYY-MM`
    #[error("Invalid period '{0}', expected YYYY-MM")]
    Malformed(String),

    /// Advancing the period left chrono's representable range
    #[error("Period {0} cannot be advanced")]
    OutOfRange(String),
}

/// A single calendar month, e.g. `2024-05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NaiveDate);

impl Period {
    /// Returns the following month. December rolls over to January of the next year.
    pub fn next(&self) -> Result<Self, PeriodError> {
        self.0
            .checked_add_months(Months::new(1))
            .map(Period)
            .ok_or_else(|| PeriodError::OutOfRange(self.to_string()))
    }

    /// Returns the `count` months that follow this one, in order.
    pub fn following(&self, count: usize) -> Result<Vec<Self>, PeriodError> {
        let mut periods = Vec::with_capacity(count);
        let mut current = *self;
        for _ in 0..count {
            current = current.next()?;
            periods.push(current);
        }
        Ok(periods)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodError::Malformed(s.to_string());

        let (year, month) = s.split_once('-').ok_or_else(malformed)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(malformed());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Period)
            .ok_or_else(malformed)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
