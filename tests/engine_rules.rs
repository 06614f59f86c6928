//! End-to-end walkthrough of the rule engine: one participant joins a
//! running challenge, works through a week, and a team score is derived
//! from the result. Exercises the public engine API without a database.

use challenge_hub_server::engine::lifecycle::{
    self, ChallengeWindow, InstanceState, PlanActivity,
};
use challenge_hub_server::engine::schedule;
use challenge_hub_server::engine::scoring::{self, ItemSnapshot, PlanSnapshot};
use challenge_hub_server::engine::team_score::{self, MemberPoints};
use challenge_hub_server::engine::week_gate::{self, WeekRef};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Four-week challenge starting Wednesday 2026-01-07.
fn challenge() -> ChallengeWindow {
    ChallengeWindow {
        start_date: date(2026, 1, 7),
        end_date: date(2026, 2, 3),
        signup_opens_date: Some(date(2026, 1, 1)),
        signup_deadline: Some(date(2026, 1, 10)),
        is_active: true,
        is_visible: true,
    }
}

fn week_plan(core: i32, days: &[i16]) -> PlanSnapshot {
    PlanSnapshot {
        core_workout_count: core,
        items: days
            .iter()
            .enumerate()
            .map(|(i, day)| ItemSnapshot {
                id: i as i64 + 1,
                day_of_week: *day,
                has_ride: true,
                ..ItemSnapshot::default()
            })
            .collect(),
    }
}

#[test]
fn join_during_grace_window_generates_full_schedule() {
    let window = challenge();
    // The challenge started yesterday but the deadline is still open.
    let today = date(2026, 1, 8);
    assert!(window.can_signup(today));

    let weeks = schedule::generate_weeks(&window, today);
    assert_eq!(weeks.len(), 5);
    assert_eq!(weeks[0].week_start, date(2026, 1, 4));
    assert_eq!(weeks[0].week_number, 1);
    assert!(weeks[0].starts_today);
    assert_eq!(weeks.last().unwrap().week_start, date(2026, 2, 1));

    // No overlap conflict with an already-finished challenge.
    let finished = ChallengeWindow {
        start_date: date(2025, 11, 1),
        end_date: date(2025, 12, 1),
        ..window.clone()
    };
    assert!(lifecycle::join_conflict(&window, today, &[finished]).allowed);
}

#[test]
fn working_through_week_one_earns_points_and_completes_the_plan() {
    let mut plan = week_plan(3, &[1, 3, 5]);

    // Week 1 is editable from the start.
    let weeks = [
        WeekRef {
            week_start: date(2026, 1, 4),
            is_completed: false,
        },
        WeekRef {
            week_start: date(2026, 1, 11),
            is_completed: false,
        },
    ];
    assert!(week_gate::can_edit_week(true, &weeks, date(2026, 1, 4)).allowed);
    // Week 2 stays locked until week 1 completes.
    assert!(!week_gate::can_edit_week(true, &weeks, date(2026, 1, 11)).allowed);

    let mut total = 0;
    for index in 0..plan.items.len() {
        let item = plan.items[index].clone();
        total += scoring::calculate_points(&plan, &item, true);
        assert!(scoring::exclusive_unchecks(&plan, &item).is_empty());
        plan.items[index].ride_done = true;
    }
    assert_eq!(total, 150);
    assert!(plan.all_workout_days_done());
    assert!(plan.has_completed_work());

    let unlocked = [
        WeekRef {
            week_start: date(2026, 1, 4),
            is_completed: true,
        },
        weeks[1],
    ];
    assert!(week_gate::can_edit_week(true, &unlocked, date(2026, 1, 11)).allowed);
}

#[test]
fn leaving_is_blocked_once_the_previous_week_holds_work() {
    let window = challenge();
    let today = date(2026, 1, 14); // week 2

    let previous_start = lifecycle::previous_week_start(&window, today);
    assert_eq!(previous_start, Some(date(2026, 1, 4)));

    let mut previous = week_plan(3, &[1, 3, 5]);
    assert!(lifecycle::can_leave(&window, today, Some(&previous)).allowed);

    previous.items[0].ride_done = true;
    let decision = lifecycle::can_leave(&window, today, Some(&previous));
    assert!(!decision.allowed);
}

#[test]
fn idle_member_drops_out_of_the_team_score() {
    let window = challenge();
    let today = date(2026, 1, 28); // week 4

    let active_plans = [
        PlanActivity {
            week_start: date(2026, 1, 18),
            has_completed_activity: true,
        },
        PlanActivity {
            week_start: date(2026, 1, 25),
            has_completed_activity: false,
        },
    ];
    let idle_plans = [
        PlanActivity {
            week_start: date(2026, 1, 18),
            has_completed_activity: false,
        },
        PlanActivity {
            week_start: date(2026, 1, 25),
            has_completed_activity: false,
        },
    ];
    assert!(lifecycle::is_scoring(&window, today, &active_plans));
    assert!(!lifecycle::is_scoring(&window, today, &idle_plans));

    let members = [
        MemberPoints {
            instance_id: 1,
            is_scoring: true,
            points: 150,
        },
        MemberPoints {
            instance_id: 2,
            is_scoring: false,
            points: 100,
        },
    ];
    assert_eq!(team_score::team_total(&members), 150);
}

#[test]
fn completed_attempt_can_be_hidden_but_not_reactivated() {
    let window = challenge();
    let after_end = date(2026, 2, 10);

    assert!(lifecycle::can_complete(&window, after_end, true).allowed);
    assert!(!lifecycle::can_complete(&window, after_end, false).allowed);

    assert!(InstanceState::Completed.can_transition_to(InstanceState::Left));
    assert!(!InstanceState::Left.can_transition_to(InstanceState::Active));

    // Ended challenges accept a fresh attempt.
    assert!(lifecycle::can_retake(&window, after_end, false).allowed);
}
