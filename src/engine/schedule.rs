//! Expands a challenge's date range into Sunday-aligned weekly plan slots.
//!
//! All week numbering in the crate goes through [`week_number_for`]: week N
//! is the N-th calendar week counted from the Sunday on or before the
//! challenge start date, so week 1 always contains the start date and
//! generated plans are numbered consecutively with no duplicates even for
//! mid-week starts.

use crate::engine::lifecycle::ChallengeWindow;
use chrono::{Datelike, Duration, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWeek {
    pub week_start: NaiveDate,
    pub week_number: i32,
    /// Set on the first generated week when generation begins in the
    /// current calendar week (mid-challenge join).
    pub starts_today: bool,
}

/// The Sunday on or before `date`.
pub fn sunday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// 1-based week number of the week containing `date`, counted from the
/// Sunday-aligned start of the challenge.
pub fn week_number_for(challenge_start: NaiveDate, date: NaiveDate) -> i32 {
    let anchor = sunday_on_or_before(challenge_start);
    let elapsed = (sunday_on_or_before(date) - anchor).num_days() / 7;
    (elapsed + 1).max(1) as i32
}

/// Week number the challenge is currently in.
pub fn current_week_number(challenge_start: NaiveDate, today: NaiveDate) -> i32 {
    week_number_for(challenge_start, today)
}

fn weeks_from(
    anchor: NaiveDate,
    window: &ChallengeWindow,
    current_sunday: Option<NaiveDate>,
) -> Vec<PlannedWeek> {
    let mut weeks = Vec::new();
    let mut week_start = anchor;
    while week_start <= window.end_date {
        weeks.push(PlannedWeek {
            week_start,
            week_number: week_number_for(window.start_date, week_start),
            starts_today: weeks.is_empty() && current_sunday == Some(week_start),
        });
        week_start += Duration::days(7);
    }
    weeks
}

/// Weekly plan slots to generate for an instance joining (or retaking) the
/// challenge as of `today`.
///
/// Ended challenges regenerate their full history from the challenge's first
/// Sunday; otherwise generation starts at the later of the current week and
/// the challenge's first week, and the first slot is flagged `starts_today`
/// when that is the current week.
pub fn generate_weeks(window: &ChallengeWindow, today: NaiveDate) -> Vec<PlannedWeek> {
    let first_sunday = sunday_on_or_before(window.start_date);
    let anchor = if window.has_ended(today) {
        first_sunday
    } else {
        first_sunday.max(sunday_on_or_before(today))
    };
    weeks_from(anchor, window, Some(sunday_on_or_before(today)))
}

/// Every week of the challenge, regardless of lifecycle state. Used by the
/// leaderboard batch to enumerate started weeks.
pub fn challenge_weeks(window: &ChallengeWindow) -> Vec<PlannedWeek> {
    weeks_from(sunday_on_or_before(window.start_date), window, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: NaiveDate, end: NaiveDate) -> ChallengeWindow {
        ChallengeWindow {
            start_date: start,
            end_date: end,
            signup_opens_date: None,
            signup_deadline: None,
            is_active: true,
            is_visible: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sunday_alignment() {
        // 2026-01-07 is a Wednesday; 2026-01-04 the preceding Sunday.
        assert_eq!(sunday_on_or_before(date(2026, 1, 7)), date(2026, 1, 4));
        assert_eq!(sunday_on_or_before(date(2026, 1, 4)), date(2026, 1, 4));
        assert_eq!(sunday_on_or_before(date(2026, 1, 10)), date(2026, 1, 4));
    }

    #[test]
    fn week_numbers_are_consecutive_for_mid_week_start() {
        let start = date(2026, 1, 7); // Wednesday
        assert_eq!(week_number_for(start, date(2026, 1, 4)), 1);
        assert_eq!(week_number_for(start, date(2026, 1, 7)), 1);
        assert_eq!(week_number_for(start, date(2026, 1, 11)), 2);
        assert_eq!(week_number_for(start, date(2026, 1, 18)), 3);
    }

    #[test]
    fn wednesday_start_spanning_three_calendar_weeks() {
        // Wed 2026-01-07 through Mon 2026-01-19 touches three Sundays.
        let w = window(date(2026, 1, 7), date(2026, 1, 19));
        let weeks = generate_weeks(&w, date(2026, 1, 1));
        assert_eq!(weeks.len(), 3);
        assert_eq!(
            weeks.iter().map(|p| p.week_start).collect::<Vec<_>>(),
            vec![date(2026, 1, 4), date(2026, 1, 11), date(2026, 1, 18)]
        );
        assert_eq!(
            weeks.iter().map(|p| p.week_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        for p in &weeks {
            assert_eq!(p.week_start.weekday(), chrono::Weekday::Sun);
        }
    }

    #[test]
    fn partial_first_and_last_weeks_count() {
        // Ten days from a Wednesday: two Sunday-aligned weeks cover them.
        let w = window(date(2026, 1, 7), date(2026, 1, 16));
        let weeks = generate_weeks(&w, date(2026, 1, 1));
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, date(2026, 1, 4));
        assert_eq!(weeks[1].week_start, date(2026, 1, 11));
        assert_eq!(weeks[1].week_number, 2);
    }

    #[test]
    fn mid_challenge_join_starts_at_current_week() {
        let w = window(date(2026, 1, 4), date(2026, 2, 28));
        let weeks = generate_weeks(&w, date(2026, 1, 21)); // a Wednesday in week 3
        assert_eq!(weeks[0].week_start, date(2026, 1, 18));
        assert_eq!(weeks[0].week_number, 3);
        assert!(weeks[0].starts_today);
        assert!(weeks.iter().skip(1).all(|p| !p.starts_today));
    }

    #[test]
    fn ended_challenge_regenerates_full_history() {
        let w = window(date(2026, 1, 7), date(2026, 1, 19));
        let weeks = generate_weeks(&w, date(2026, 3, 1));
        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[0].week_start, date(2026, 1, 4));
        assert!(!weeks[0].starts_today);
    }

    #[test]
    fn challenge_weeks_enumerates_everything() {
        let w = window(date(2026, 1, 7), date(2026, 2, 3));
        let weeks = challenge_weeks(&w);
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks.last().unwrap().week_number, 5);
    }
}
