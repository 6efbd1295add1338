//! Reminder trigger detection.
//!
//! Decides whether a minute-truncated reference instant coincides with
//! a schedule mark. Evaluated once per minute by the reminder ticker;
//! an absent or unusable configuration never fires.

use chrono::{Duration, NaiveDateTime, Timelike};
use shared::TimeOfDay;

use crate::models::ScheduleConfig;

/// True when `now` (whole minutes) sits exactly on a schedule mark.
pub fn should_fire_at(config: Option<&ScheduleConfig>, now: NaiveDateTime) -> bool {
    let Some(config) = config else {
        return false;
    };

    let now = truncate_to_minute(now);

    match config {
        fixed @ ScheduleConfig::FixedTimes { .. } => {
            let Some(current) = TimeOfDay::new(now.hour() as u8, now.minute() as u8) else {
                return false;
            };
            fixed.parsed_marks().contains(&current)
        }
        ScheduleConfig::Interval {
            start_time,
            interval_minutes,
        } => interval_fires(start_time, *interval_minutes, now),
    }
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

// Same anchor rule as the schedule calculator: the cadence runs
// continuously from yesterday's start time when today's has not
// occurred yet, so marks after midnight still fire.
fn interval_fires(start_time: &str, interval_minutes: i64, now: NaiveDateTime) -> bool {
    if interval_minutes <= 0 {
        return false;
    }
    let Ok(start) = start_time.parse::<TimeOfDay>() else {
        return false;
    };

    let mut anchor = start.on(now.date());
    if anchor > now {
        anchor = anchor - Duration::days(1);
    }

    let elapsed_minutes = (now - anchor).num_minutes();
    elapsed_minutes % interval_minutes == 0
}
