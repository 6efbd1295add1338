//! Scheduled-instant arithmetic.
//!
//! Maps a group's schedule configuration and a reference instant to
//! the previous and next expected report instants, in the group's
//! local time. Fixed-times schedules recur every calendar day;
//! interval schedules are a continuous 24/7 cadence anchored at their
//! start time and are not reset at midnight.
//!
//! Comparisons run at minute granularity: marks have no seconds, and a
//! reference instant sitting exactly on a mark selects the neighboring
//! marks, not the mark itself.

use chrono::{Duration, NaiveDateTime, Timelike};
use shared::TimeOfDay;

use crate::models::ScheduleConfig;

/// The nearest expected report instant strictly after `now`.
///
/// `None` when there is no schedule or the configuration has no usable
/// marks.
pub fn next_scheduled_time(
    config: Option<&ScheduleConfig>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    match config? {
        fixed @ ScheduleConfig::FixedTimes { .. } => next_fixed_time(fixed, now),
        ScheduleConfig::Interval {
            start_time,
            interval_minutes,
        } => interval_cycle(start_time, *interval_minutes, now).map(|(_, next)| next),
    }
}

/// The most recent expected report instant strictly before `now`.
pub fn previous_scheduled_time(
    config: Option<&ScheduleConfig>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    match config? {
        fixed @ ScheduleConfig::FixedTimes { .. } => previous_fixed_time(fixed, now),
        ScheduleConfig::Interval {
            start_time,
            interval_minutes,
        } => interval_cycle(start_time, *interval_minutes, now).map(|(previous, _)| previous),
    }
}

fn minutes_of_day(now: NaiveDateTime) -> i64 {
    i64::from(now.hour()) * 60 + i64::from(now.minute())
}

fn next_fixed_time(config: &ScheduleConfig, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let marks = config.parsed_marks();
    let now_minutes = minutes_of_day(now);

    // Smallest mark still ahead of us today; marks are sorted.
    if let Some(mark) = marks
        .iter()
        .find(|mark| mark.minutes_from_midnight() > now_minutes)
    {
        return Some(mark.on(now.date()));
    }

    // Nothing left today: the smallest mark, tomorrow.
    let tomorrow = now.date().succ_opt()?;
    marks.first().map(|mark| mark.on(tomorrow))
}

fn previous_fixed_time(config: &ScheduleConfig, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let marks = config.parsed_marks();
    let now_minutes = minutes_of_day(now);

    // Largest mark already behind us today.
    if let Some(mark) = marks
        .iter()
        .rev()
        .find(|mark| mark.minutes_from_midnight() < now_minutes)
    {
        return Some(mark.on(now.date()));
    }

    // Nothing yet today: the largest mark, yesterday.
    let yesterday = now.date().pred_opt()?;
    marks.last().map(|mark| mark.on(yesterday))
}

/// The (previous, next) pair of an interval cadence around `now`.
///
/// The anchor is today's start time, shifted back one day when it has
/// not occurred yet, so the anchor never lies in the future. From
/// there: `previous = anchor + floor(elapsed / interval) * interval`
/// and `next = previous + interval`, which keeps
/// `previous <= now < next` for every valid configuration.
fn interval_cycle(
    start_time: &str,
    interval_minutes: i64,
    now: NaiveDateTime,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    if interval_minutes <= 0 {
        return None;
    }
    let start: TimeOfDay = start_time.parse().ok()?;

    let mut anchor = start.on(now.date());
    if anchor > now {
        anchor = anchor - Duration::days(1);
    }

    let elapsed_minutes = (now - anchor).num_minutes();
    let cycles_passed = elapsed_minutes / interval_minutes;

    let previous = anchor + Duration::minutes(cycles_passed * interval_minutes);
    let next = anchor + Duration::minutes((cycles_passed + 1) * interval_minutes);
    Some((previous, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    #[test]
    fn test_no_config_yields_nothing() {
        let now = at(2024, 1, 10, 10, 0);
        assert_eq!(next_scheduled_time(None, now), None);
        assert_eq!(previous_scheduled_time(None, now), None);
    }

    #[test]
    fn test_fixed_times_mid_window() {
        let config = ScheduleConfig::fixed_times(["09:00", "21:00"]);
        let now = at(2024, 1, 10, 10, 0);

        assert_eq!(
            previous_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 9, 0))
        );
        assert_eq!(
            next_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 21, 0))
        );
    }

    #[test]
    fn test_fixed_times_wraps_to_tomorrow_and_yesterday() {
        let config = ScheduleConfig::fixed_times(["09:00", "21:00"]);

        // After the last mark of the day
        let late = at(2024, 1, 10, 22, 0);
        assert_eq!(
            next_scheduled_time(Some(&config), late),
            Some(at(2024, 1, 11, 9, 0))
        );
        assert_eq!(
            previous_scheduled_time(Some(&config), late),
            Some(at(2024, 1, 10, 21, 0))
        );

        // Before the first mark of the day
        let early = at(2024, 1, 10, 8, 0);
        assert_eq!(
            next_scheduled_time(Some(&config), early),
            Some(at(2024, 1, 10, 9, 0))
        );
        assert_eq!(
            previous_scheduled_time(Some(&config), early),
            Some(at(2024, 1, 9, 21, 0))
        );
    }

    #[test]
    fn test_fixed_times_wrap_uses_clock_order_not_storage_order() {
        // Stored out of order: the tomorrow fallback must still be the
        // numerically smallest mark and the yesterday fallback the
        // numerically largest.
        let config = ScheduleConfig::fixed_times(["21:00", "09:00"]);
        let late = at(2024, 1, 10, 23, 0);
        assert_eq!(
            next_scheduled_time(Some(&config), late),
            Some(at(2024, 1, 11, 9, 0))
        );
        let early = at(2024, 1, 10, 0, 30);
        assert_eq!(
            previous_scheduled_time(Some(&config), early),
            Some(at(2024, 1, 9, 21, 0))
        );
    }

    #[test]
    fn test_fixed_times_exactly_on_mark_selects_neighbors() {
        let config = ScheduleConfig::fixed_times(["09:00", "21:00"]);
        let now = at(2024, 1, 10, 9, 0);

        // Strict comparisons: the mark we sit on is neither previous
        // nor next.
        assert_eq!(
            next_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 21, 0))
        );
        assert_eq!(
            previous_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 9, 21, 0))
        );
    }

    #[test]
    fn test_fixed_times_skips_malformed_marks() {
        let config = ScheduleConfig::fixed_times(["banana", "21:00", "27:90"]);
        let now = at(2024, 1, 10, 10, 0);
        assert_eq!(
            next_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 21, 0))
        );
    }

    #[test]
    fn test_fixed_times_all_malformed_yields_nothing() {
        let config = ScheduleConfig::fixed_times(["banana", "27:90"]);
        let now = at(2024, 1, 10, 10, 0);
        assert_eq!(next_scheduled_time(Some(&config), now), None);
        assert_eq!(previous_scheduled_time(Some(&config), now), None);
    }

    #[test]
    fn test_interval_hourly_from_midnight() {
        let config = ScheduleConfig::interval("00:00", 60).unwrap();
        let now = at(2024, 1, 10, 10, 37);

        assert_eq!(
            previous_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 10, 0))
        );
        assert_eq!(
            next_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 11, 0))
        );
    }

    #[test]
    fn test_interval_anchor_shifts_to_yesterday() {
        // Start time later than now: the cadence anchors on
        // yesterday's start and keeps running across midnight.
        let config = ScheduleConfig::interval("22:00", 180).unwrap();
        let now = at(2024, 1, 10, 2, 30);

        assert_eq!(
            previous_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 1, 0))
        );
        assert_eq!(
            next_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 4, 0))
        );
    }

    #[test]
    fn test_interval_exactly_on_cycle_start() {
        let config = ScheduleConfig::interval("00:00", 60).unwrap();
        let now = at(2024, 1, 10, 10, 0);

        // previous <= now < next
        assert_eq!(
            previous_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 10, 0))
        );
        assert_eq!(
            next_scheduled_time(Some(&config), now),
            Some(at(2024, 1, 10, 11, 0))
        );
    }

    #[test]
    fn test_interval_invariants_hold_across_the_day() {
        let config = ScheduleConfig::interval("07:15", 45).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        for hour in 0..24 {
            for minute in [0, 13, 29, 44, 59] {
                let now = date.and_hms_opt(hour, minute, 0).unwrap();
                let previous = previous_scheduled_time(Some(&config), now).unwrap();
                let next = next_scheduled_time(Some(&config), now).unwrap();
                assert!(previous <= now, "previous {} > now {}", previous, now);
                assert!(now < next, "now {} >= next {}", now, next);
                assert_eq!(next - previous, Duration::minutes(45));
            }
        }
    }

    #[test]
    fn test_interval_bad_start_time_yields_nothing() {
        let config = ScheduleConfig::Interval {
            start_time: "not-a-time".to_string(),
            interval_minutes: 60,
        };
        let now = at(2024, 1, 10, 10, 0);
        assert_eq!(next_scheduled_time(Some(&config), now), None);
        assert_eq!(previous_scheduled_time(Some(&config), now), None);
    }

    #[test]
    fn test_interval_nonpositive_interval_yields_nothing() {
        // Constructed directly: the validated constructor refuses
        // these, but stored data may predate validation.
        let config = ScheduleConfig::Interval {
            start_time: "08:00".to_string(),
            interval_minutes: 0,
        };
        let now = at(2024, 1, 10, 10, 0);
        assert_eq!(next_scheduled_time(Some(&config), now), None);
        assert_eq!(previous_scheduled_time(Some(&config), now), None);
    }

    #[test]
    fn test_fixed_times_invariant_previous_before_next() {
        let config = ScheduleConfig::fixed_times(["06:30", "12:00", "18:45"]);
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        for hour in 0..24 {
            let now = date.and_hms_opt(hour, 7, 0).unwrap();
            let previous = previous_scheduled_time(Some(&config), now).unwrap();
            let next = next_scheduled_time(Some(&config), now).unwrap();
            assert!(previous < now);
            assert!(now < next);
        }
    }
}
