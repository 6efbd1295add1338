//! Schedule configuration for a group.
//!
//! A group either expects reports at a handful of fixed times of day,
//! or on a continuous interval cadence anchored at a start time. The
//! absence of a configuration means the group has no schedule and every
//! member renders in the neutral default state.

use serde::{Deserialize, Serialize};
use shared::TimeOfDay;

/// Maximum number of fixed time marks a group may configure.
pub const MAX_FIXED_TIMES: usize = 5;

/// Inclusive bounds for the interval cadence, in minutes.
pub const INTERVAL_MINUTES_RANGE: (i64, i64) = (5, 1440);

/// How a group expects reports to arrive.
///
/// Marks and start times are stored as raw `HH:mm` strings, exactly as
/// clients submitted them. Parsing happens at evaluation time so that a
/// single malformed mark degrades only itself, never the whole group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleConfig {
    /// Up to five fixed times of day, recurring every calendar day.
    FixedTimes { times: Vec<String> },
    /// A 24/7 cadence: every `interval_minutes` starting from
    /// `start_time`, not reset at midnight.
    Interval {
        start_time: String,
        interval_minutes: i64,
    },
}

impl ScheduleConfig {
    /// Build a fixed-times schedule, truncating to [`MAX_FIXED_TIMES`].
    pub fn fixed_times<I, S>(times: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScheduleConfig::FixedTimes {
            times: times
                .into_iter()
                .map(Into::into)
                .take(MAX_FIXED_TIMES)
                .collect(),
        }
    }

    /// Build an interval schedule.
    ///
    /// Returns `None` when `interval_minutes` is outside [5, 1440] or
    /// the start time does not parse; storage never holds a config that
    /// was rejected here.
    pub fn interval(start_time: impl Into<String>, interval_minutes: i64) -> Option<Self> {
        let start_time = start_time.into();
        let (min, max) = INTERVAL_MINUTES_RANGE;
        if interval_minutes < min || interval_minutes > max {
            return None;
        }
        if start_time.parse::<TimeOfDay>().is_err() {
            return None;
        }
        Some(ScheduleConfig::Interval {
            start_time,
            interval_minutes,
        })
    }

    /// The parseable marks of a fixed-times schedule, in clock order.
    ///
    /// Malformed entries are dropped silently. Empty for interval
    /// schedules.
    pub fn parsed_marks(&self) -> Vec<TimeOfDay> {
        match self {
            ScheduleConfig::FixedTimes { times } => {
                let mut marks: Vec<TimeOfDay> = times
                    .iter()
                    .filter_map(|raw| raw.parse::<TimeOfDay>().ok())
                    .collect();
                marks.sort();
                marks
            }
            ScheduleConfig::Interval { .. } => Vec::new(),
        }
    }
}
