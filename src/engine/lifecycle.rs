//! Challenge-level temporal state, per-instance participation state and the
//! join/leave/complete/hide/retake rules, including the cross-challenge
//! conflict rule and the scoring-eligibility lookback.

use crate::engine::Decision;
use crate::engine::schedule::{current_week_number, sunday_on_or_before};
use crate::engine::scoring::PlanSnapshot;
use chrono::{Duration, NaiveDate};

/// Days an instance may sit idle on a running challenge before its past
/// activity stops counting toward team scores.
const SCORING_LOOKBACK_DAYS: i64 = 14;

/// Explicit participation state. Replaces inferring four lifecycle states
/// from the (is_active, completed_at) flag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    SignedUp,
    Active,
    Completed,
    Left,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceState::SignedUp => "signed_up",
            InstanceState::Active => "active",
            InstanceState::Completed => "completed",
            InstanceState::Left => "left",
        }
    }

    pub fn parse(value: &str) -> Option<InstanceState> {
        match value {
            "signed_up" => Some(InstanceState::SignedUp),
            "active" => Some(InstanceState::Active),
            "completed" => Some(InstanceState::Completed),
            "left" => Some(InstanceState::Left),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: InstanceState) -> bool {
        matches!(
            (self, next),
            (InstanceState::SignedUp, InstanceState::Active)
                | (InstanceState::SignedUp, InstanceState::Left)
                | (InstanceState::Active, InstanceState::Completed)
                | (InstanceState::Active, InstanceState::Left)
                | (InstanceState::Completed, InstanceState::Left)
        )
    }
}

/// Temporal attributes of a challenge, detached from the database row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub signup_opens_date: Option<NaiveDate>,
    pub signup_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub is_visible: bool,
}

impl ChallengeWindow {
    pub fn has_started(&self, today: NaiveDate) -> bool {
        today >= self.start_date
    }

    pub fn has_ended(&self, today: NaiveDate) -> bool {
        today > self.end_date
    }

    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.has_started(today) && !self.has_ended(today)
    }

    pub fn overlaps(&self, other: &ChallengeWindow) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// Number of calendar weeks the challenge spans, minimum 1.
    pub fn duration_weeks(&self) -> i64 {
        let days = (self.end_date - self.start_date).num_days() + 1;
        (days + 6).div_euclid(7).max(1)
    }

    /// Whether a user may sign up today. Ended challenges always accept
    /// signups (the retake path). Otherwise signups open at
    /// `signup_opens_date` (or the start date) and close at the deadline
    /// when one is set, or at the start date when none is.
    pub fn can_signup(&self, today: NaiveDate) -> bool {
        if !self.is_visible {
            return false;
        }
        if self.has_ended(today) {
            return true;
        }
        let opens = self.signup_opens_date.unwrap_or(self.start_date);
        if today < opens {
            return false;
        }
        match self.signup_deadline {
            Some(deadline) => today <= deadline,
            None => today < self.start_date,
        }
    }
}

/// Cross-challenge conflict rule for joining `target` as of `today`.
///
/// Joining a challenge that is already running is blocked while the user
/// holds an engaged instance on another currently-running challenge whose
/// date range overlaps the target's. Joining a not-yet-started challenge is
/// never blocked by other signups.
pub fn join_conflict(
    target: &ChallengeWindow,
    today: NaiveDate,
    other_engaged: &[ChallengeWindow],
) -> Decision {
    if !target.is_running(today) {
        return Decision::allow();
    }
    let conflicted = other_engaged
        .iter()
        .any(|other| other.is_running(today) && other.overlaps(target));
    if conflicted {
        Decision::deny(
            "You are already participating in another challenge running over these dates. \
             Finish or leave it before joining this one.",
        )
    } else {
        Decision::allow()
    }
}

/// Start of the week preceding the current one, when the challenge has been
/// running for more than one week. Callers fetch that week's plan and feed
/// it to [`can_leave`].
pub fn previous_week_start(window: &ChallengeWindow, today: NaiveDate) -> Option<NaiveDate> {
    if !window.is_running(today) {
        return None;
    }
    let current_week = current_week_number(window.start_date, today);
    if current_week <= 1 {
        return None;
    }
    let anchor = sunday_on_or_before(window.start_date);
    Some(anchor + Duration::days(7 * (current_week as i64 - 2)))
}

/// Whether the instance may leave the challenge. Ended and upcoming
/// challenges can always be left; a running challenge past week 1 can only
/// be left while the previous week has no completed work.
pub fn can_leave(
    window: &ChallengeWindow,
    today: NaiveDate,
    previous_week_plan: Option<&PlanSnapshot>,
) -> Decision {
    if !window.is_running(today) {
        return Decision::allow();
    }
    let current_week = current_week_number(window.start_date, today);
    if current_week <= 1 {
        return Decision::allow();
    }
    match previous_week_plan {
        Some(plan) if plan.has_completed_work() => Decision::deny(format!(
            "You are in week {} and already completed workouts in week {}. \
             The challenge can no longer be left.",
            current_week,
            current_week - 1
        )),
        _ => Decision::allow(),
    }
}

/// Whether the instance may be marked completed. Ended challenges demand
/// every weekly plan be finished first.
pub fn can_complete(
    window: &ChallengeWindow,
    today: NaiveDate,
    all_weeks_completed: bool,
) -> Decision {
    if window.has_ended(today) && !all_weeks_completed {
        Decision::deny("Finish all remaining weeks before completing this challenge.")
    } else {
        Decision::allow()
    }
}

/// Whether the user may start a fresh attempt at the challenge.
pub fn can_retake(
    window: &ChallengeWindow,
    today: NaiveDate,
    has_engaged_instance: bool,
) -> Decision {
    if has_engaged_instance {
        return Decision::deny("You already have an active attempt at this challenge.");
    }
    if window.is_running(today) && !window.can_signup(today) {
        return Decision::deny("Signups for this challenge are closed until it ends.");
    }
    Decision::allow()
}

/// A prior attempt considered for template inheritance on retake.
#[derive(Debug, Clone)]
pub struct PriorAttempt {
    pub state: InstanceState,
    pub template_id: Option<i64>,
    pub include_kegels: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Template and kegel choice for a fresh attempt: the most recently
/// completed prior attempt wins, then the most recent attempt of any state,
/// then the challenge default, then the first available template.
pub fn inherit_template(
    prior: &[PriorAttempt],
    default_template: Option<i64>,
    available: &[i64],
) -> (Option<i64>, bool) {
    let pick_latest = |candidates: &mut dyn Iterator<Item = &PriorAttempt>| {
        candidates.max_by_key(|attempt| attempt.started_at).cloned()
    };

    let chosen = pick_latest(
        &mut prior
            .iter()
            .filter(|attempt| attempt.state == InstanceState::Completed),
    )
    .or_else(|| pick_latest(&mut prior.iter()));

    match chosen {
        Some(attempt) if attempt.template_id.is_some() => {
            (attempt.template_id, attempt.include_kegels)
        }
        Some(attempt) => (
            default_template.or_else(|| available.first().copied()),
            attempt.include_kegels,
        ),
        None => (default_template.or_else(|| available.first().copied()), false),
    }
}

/// Per-plan activity summary consumed by [`is_scoring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanActivity {
    pub week_start: NaiveDate,
    pub has_completed_activity: bool,
}

/// Whether the instance counts toward its team's score.
///
/// Ended and not-yet-started challenges always score. On a running
/// challenge an instance scores only if it has plans at all, and either a
/// plan inside the 14-day lookback has completed activity, or no plans fall
/// in the window and some plan ever had completed activity.
pub fn is_scoring(window: &ChallengeWindow, today: NaiveDate, plans: &[PlanActivity]) -> bool {
    if window.has_ended(today) || !window.has_started(today) {
        return true;
    }
    if plans.is_empty() {
        return false;
    }
    let lookback_floor = today - Duration::days(SCORING_LOOKBACK_DAYS);
    let recent: Vec<&PlanActivity> = plans
        .iter()
        .filter(|plan| plan.week_start >= lookback_floor && plan.week_start <= today)
        .collect();
    if recent.is_empty() {
        plans.iter().any(|plan| plan.has_completed_activity)
    } else {
        recent.iter().any(|plan| plan.has_completed_activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::ItemSnapshot;
    use chrono::{TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

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

    #[test]
    fn signup_open_before_start_without_deadline() {
        let mut w = window(date(2026, 3, 1), date(2026, 3, 31));
        w.signup_opens_date = Some(date(2026, 2, 20));
        assert!(!w.can_signup(date(2026, 2, 19)));
        assert!(w.can_signup(date(2026, 2, 20)));
        assert!(w.can_signup(date(2026, 2, 28)));
        // No deadline: signups close once the challenge starts.
        assert!(!w.can_signup(date(2026, 3, 1)));
    }

    #[test]
    fn deadline_keeps_signup_open_past_start() {
        let mut w = window(date(2026, 3, 1), date(2026, 3, 31));
        w.signup_deadline = Some(date(2026, 3, 3));
        // Start one day in the past, deadline two days in the future.
        assert!(w.can_signup(date(2026, 3, 2)));
        assert!(!w.can_signup(date(2026, 3, 4)));
    }

    #[test]
    fn ended_challenge_always_accepts_signup() {
        let w = window(date(2026, 1, 1), date(2026, 1, 31));
        assert!(w.can_signup(date(2026, 6, 1)));
    }

    #[test]
    fn invisible_challenge_never_accepts_signup() {
        let mut w = window(date(2026, 1, 1), date(2026, 1, 31));
        w.is_visible = false;
        assert!(!w.can_signup(date(2026, 6, 1)));
    }

    #[test]
    fn duration_weeks_rounds_up() {
        assert_eq!(window(date(2026, 1, 4), date(2026, 1, 4)).duration_weeks(), 1);
        assert_eq!(window(date(2026, 1, 4), date(2026, 1, 10)).duration_weeks(), 1);
        assert_eq!(window(date(2026, 1, 4), date(2026, 1, 11)).duration_weeks(), 2);
        assert_eq!(window(date(2026, 1, 7), date(2026, 1, 16)).duration_weeks(), 2);
    }

    #[test]
    fn joining_running_challenge_conflicts_with_overlapping_active() {
        let target = window(date(2026, 3, 1), date(2026, 3, 31));
        let overlapping = window(date(2026, 2, 15), date(2026, 3, 15));
        let today = date(2026, 3, 5);
        assert!(!join_conflict(&target, today, &[overlapping]).allowed);
    }

    #[test]
    fn joining_upcoming_challenge_is_never_blocked() {
        let target = window(date(2026, 4, 1), date(2026, 4, 30));
        let running = window(date(2026, 3, 1), date(2026, 5, 31));
        let today = date(2026, 3, 5);
        assert!(join_conflict(&target, today, &[running]).allowed);
    }

    #[test]
    fn non_running_other_challenge_does_not_conflict() {
        let target = window(date(2026, 3, 1), date(2026, 3, 31));
        let finished = window(date(2026, 1, 1), date(2026, 1, 31));
        let today = date(2026, 3, 5);
        assert!(join_conflict(&target, today, &[finished]).allowed);
    }

    #[test]
    fn leave_allowed_in_week_one_and_for_idle_previous_week() {
        let w = window(date(2026, 1, 4), date(2026, 2, 28));
        assert!(can_leave(&w, date(2026, 1, 6), None).allowed);

        // Week 3, previous week untouched.
        let today = date(2026, 1, 20);
        assert_eq!(current_week_number(w.start_date, today), 3);
        let idle = PlanSnapshot::default();
        assert_eq!(can_leave(&w, today, Some(&idle)), Decision::allow());
    }

    #[test]
    fn leave_blocked_by_completed_work_in_previous_week() {
        let w = window(date(2026, 1, 4), date(2026, 2, 28));
        let today = date(2026, 1, 20); // week 3
        let plan = PlanSnapshot {
            core_workout_count: 3,
            items: vec![ItemSnapshot {
                id: 1,
                day_of_week: 1,
                has_ride: true,
                ride_done: true,
                ..ItemSnapshot::default()
            }],
        };
        let decision = can_leave(&w, today, Some(&plan));
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("week 2"));
    }

    #[test]
    fn previous_week_start_matches_unified_numbering() {
        let w = window(date(2026, 1, 7), date(2026, 2, 28)); // Wednesday start
        assert_eq!(previous_week_start(&w, date(2026, 1, 8)), None); // week 1
        assert_eq!(
            previous_week_start(&w, date(2026, 1, 14)),
            Some(date(2026, 1, 4))
        );
        assert_eq!(
            previous_week_start(&w, date(2026, 1, 20)),
            Some(date(2026, 1, 11))
        );
    }

    #[test]
    fn complete_requires_finished_weeks_after_end() {
        let w = window(date(2026, 1, 4), date(2026, 1, 31));
        assert!(!can_complete(&w, date(2026, 2, 5), false).allowed);
        assert!(can_complete(&w, date(2026, 2, 5), true).allowed);
        // Early completion while running is not gated on week state.
        assert!(can_complete(&w, date(2026, 1, 20), false).allowed);
    }

    #[test]
    fn retake_blocked_by_engaged_instance_or_closed_signup() {
        let w = window(date(2026, 1, 4), date(2026, 1, 31));
        let today = date(2026, 1, 20); // running, signups closed
        assert!(!can_retake(&w, today, true).allowed);
        assert!(!can_retake(&w, today, false).allowed);
        assert!(can_retake(&w, date(2026, 2, 5), false).allowed); // ended
    }

    #[test]
    fn template_inheritance_prefers_completed_then_recent_then_default() {
        let at = |day| Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap();
        let completed = PriorAttempt {
            state: InstanceState::Completed,
            template_id: Some(7),
            include_kegels: true,
            started_at: at(2),
        };
        let newer_left = PriorAttempt {
            state: InstanceState::Left,
            template_id: Some(9),
            include_kegels: false,
            started_at: at(10),
        };

        assert_eq!(
            inherit_template(&[completed.clone(), newer_left.clone()], Some(1), &[2, 3]),
            (Some(7), true)
        );
        assert_eq!(
            inherit_template(&[newer_left], Some(1), &[2, 3]),
            (Some(9), false)
        );
        assert_eq!(inherit_template(&[], Some(1), &[2, 3]), (Some(1), false));
        assert_eq!(inherit_template(&[], None, &[2, 3]), (Some(2), false));
        assert_eq!(inherit_template(&[], None, &[]), (None, false));
    }

    #[test]
    fn state_transitions() {
        use InstanceState::*;
        assert!(SignedUp.can_transition_to(Active));
        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Left));
        assert!(Completed.can_transition_to(Left)); // hide
        assert!(!Left.can_transition_to(Active));
        assert!(!Completed.can_transition_to(Active));
        assert_eq!(InstanceState::parse("active"), Some(Active));
        assert_eq!(InstanceState::parse("bogus"), None);
    }

    #[test]
    fn scoring_rules() {
        let running = window(date(2026, 1, 4), date(2026, 3, 31));
        let today = date(2026, 2, 10);

        // Ended and upcoming always score.
        assert!(is_scoring(&window(date(2026, 1, 1), date(2026, 1, 31)), today, &[]));
        assert!(is_scoring(&window(date(2026, 3, 1), date(2026, 3, 31)), today, &[]));

        // Running with zero plans never scores.
        assert!(!is_scoring(&running, today, &[]));

        // Recent plan with activity scores; recent idle plan does not even
        // if old plans had activity.
        let recent_active = PlanActivity {
            week_start: date(2026, 2, 8),
            has_completed_activity: true,
        };
        let recent_idle = PlanActivity {
            week_start: date(2026, 2, 8),
            has_completed_activity: false,
        };
        let old_active = PlanActivity {
            week_start: date(2026, 1, 4),
            has_completed_activity: true,
        };
        assert!(is_scoring(&running, today, &[recent_active, old_active]));
        assert!(!is_scoring(&running, today, &[recent_idle, old_active]));

        // No plans in the window: any historical activity counts.
        assert!(is_scoring(&running, today, &[old_active]));
        let old_idle = PlanActivity {
            week_start: date(2026, 1, 4),
            has_completed_activity: false,
        };
        assert!(!is_scoring(&running, today, &[old_idle]));
    }
}
