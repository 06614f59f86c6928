//! Progressive week unlock: whether a given week of an instance's plan may
//! be edited, and the pure reconciliation of admin week-unlock records.

use crate::engine::Decision;
use chrono::NaiveDate;

/// One weekly plan of the instance, ordered by `week_start` by the caller
/// or sorted here before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRef {
    pub week_start: NaiveDate,
    pub is_completed: bool,
}

/// Whether the week starting at `target_week_start` may be edited.
///
/// `challenge_open` is false for items not tied to a challenge, and for
/// challenges that have ended or been deactivated; all of those are always
/// editable (retroactive editing is permitted). Week 1 is always editable;
/// a later week opens only once every prior week is fully completed.
pub fn can_edit_week(
    challenge_open: bool,
    weeks: &[WeekRef],
    target_week_start: NaiveDate,
) -> Decision {
    if !challenge_open {
        return Decision::allow();
    }

    let mut ordered: Vec<WeekRef> = weeks.to_vec();
    ordered.sort_by_key(|week| week.week_start);

    let Some(position) = ordered
        .iter()
        .position(|week| week.week_start == target_week_start)
    else {
        // Not one of the instance's generated weeks; nothing to gate.
        return Decision::allow();
    };

    if position == 0 {
        return Decision::allow();
    }

    let incomplete: Vec<String> = ordered[..position]
        .iter()
        .enumerate()
        .filter(|(_, week)| !week.is_completed)
        .map(|(index, _)| (index + 1).to_string())
        .collect();

    if incomplete.is_empty() {
        Decision::allow()
    } else {
        Decision::deny(format!(
            "Week {} is locked until week(s) {} are completed.",
            position + 1,
            incomplete.join(", ")
        ))
    }
}

/// Stored state of a per-(challenge, week) unlock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockState {
    pub is_unlocked: bool,
    pub unlock_date: Option<NaiveDate>,
}

/// Effective unlocked state as of `today`. Pure: the caller persists the
/// flip (write-after-read) when [`unlock_needs_persist`] says so.
pub fn effective_unlock(state: UnlockState, today: NaiveDate) -> bool {
    state.is_unlocked || state.unlock_date.is_some_and(|date| date <= today)
}

/// True when the stored flag lags the effective state and should be
/// flipped in the store.
pub fn unlock_needs_persist(state: UnlockState, today: NaiveDate) -> bool {
    !state.is_unlocked && effective_unlock(state, today)
}

/// Denial imposed by an admin unlock record, if one applies. Records are
/// only consulted while the challenge is open; ended and deactivated
/// challenges permit retroactive editing whatever the record says.
pub fn unlock_denial(
    challenge_open: bool,
    state: Option<UnlockState>,
    week_number: i32,
    today: NaiveDate,
) -> Option<Decision> {
    if !challenge_open {
        return None;
    }
    let state = state?;
    if effective_unlock(state, today) {
        None
    } else {
        Some(Decision::deny(format!(
            "Week {week_number} has not been unlocked yet."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn weeks(completed: &[bool]) -> Vec<WeekRef> {
        completed
            .iter()
            .enumerate()
            .map(|(i, done)| WeekRef {
                week_start: date(4 + 7 * i as u32),
                is_completed: *done,
            })
            .collect()
    }

    #[test]
    fn closed_challenge_is_always_editable() {
        assert!(can_edit_week(false, &weeks(&[false, false]), date(11)).allowed);
    }

    #[test]
    fn week_one_is_always_editable() {
        assert!(can_edit_week(true, &weeks(&[false, false]), date(4)).allowed);
    }

    #[test]
    fn later_week_requires_all_prior_weeks_complete() {
        let w = weeks(&[true, true, false]);
        assert!(can_edit_week(true, &w, date(18)).allowed);

        let w = weeks(&[true, false, false, false]);
        let decision = can_edit_week(true, &w, date(25));
        assert!(!decision.allowed);
        let reason = decision.reason.unwrap();
        assert!(reason.contains("2, 3"));
        assert!(reason.contains("Week 4"));
    }

    #[test]
    fn unknown_week_is_not_gated() {
        assert!(can_edit_week(true, &weeks(&[false]), date(25)).allowed);
    }

    #[test]
    fn unlock_records_are_ignored_once_challenge_closes() {
        let locked = UnlockState {
            is_unlocked: false,
            unlock_date: None,
        };
        assert!(unlock_denial(true, Some(locked), 2, date(5)).is_some());
        // A record left locked cannot outlive the challenge.
        assert_eq!(unlock_denial(false, Some(locked), 2, date(5)), None);
        assert_eq!(unlock_denial(true, None, 2, date(5)), None);

        let dated = UnlockState {
            is_unlocked: false,
            unlock_date: Some(date(10)),
        };
        assert!(unlock_denial(true, Some(dated), 2, date(9)).is_some());
        assert_eq!(unlock_denial(true, Some(dated), 2, date(10)), None);
    }

    #[test]
    fn unlock_reconciliation() {
        let locked = UnlockState {
            is_unlocked: false,
            unlock_date: Some(date(10)),
        };
        assert!(!effective_unlock(locked, date(9)));
        assert!(effective_unlock(locked, date(10)));
        assert!(unlock_needs_persist(locked, date(10)));

        let unlocked = UnlockState {
            is_unlocked: true,
            unlock_date: None,
        };
        assert!(effective_unlock(unlocked, date(1)));
        assert!(!unlock_needs_persist(unlocked, date(1)));

        let no_date = UnlockState {
            is_unlocked: false,
            unlock_date: None,
        };
        assert!(!effective_unlock(no_date, date(1)));
    }
}
