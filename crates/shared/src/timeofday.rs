//! Time-of-day value type for schedule marks.
//!
//! Schedule configurations store their marks as `HH:mm` strings. This
//! type is the single parsing point: strict two-field format, 24-hour
//! range checks, and minute granularity (seconds are never part of a
//! schedule mark).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

/// Error parsing an `HH:mm` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day: {0}")]
pub struct ParseTimeOfDayError(pub String);

impl TimeOfDay {
    /// Build from hour and minute components.
    ///
    /// Returns `None` when either component is out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self {
            minutes: u16::from(hour) * 60 + u16::from(minute),
        })
    }

    pub fn hour(&self) -> u8 {
        (self.minutes / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.minutes % 60) as u8
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_from_midnight(&self) -> i64 {
        i64::from(self.minutes)
    }

    /// Project this time of day onto a calendar date.
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        let time = NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or(NaiveTime::MIN);
        NaiveDateTime::new(date, time)
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hours, minutes) = s
            .split_once(':')
            .ok_or_else(|| ParseTimeOfDayError(s.to_string()))?;
        let hour: u8 = hours
            .trim()
            .parse()
            .map_err(|_| ParseTimeOfDayError(s.to_string()))?;
        let minute: u8 = minutes
            .trim()
            .parse()
            .map_err(|_| ParseTimeOfDayError(s.to_string()))?;
        TimeOfDay::new(hour, minute).ok_or_else(|| ParseTimeOfDayError(s.to_string()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ParseTimeOfDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}
