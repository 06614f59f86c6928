use super::helper;
use crate::engine::lifecycle::{self, InstanceState, PriorAttempt};
use crate::engine::schedule;
use crate::engine::scoring::{self, PlanSnapshot};
use crate::engine::week_gate::{self, UnlockState, WeekRef};
use crate::engine::{Decision, class_ref};
use crate::model::challenge::{
    ChallengeRow, ChallengeSummary, InstanceRow, InstanceSummary, JoinOutcome,
    NewChallengeInstance,
};
use crate::model::plan::{
    BonusWorkoutRow, DailyPlanItemRow, NewDailyPlanItem, NewWeeklyPlan, ToggleOutcome,
    WeekAccess, WeeklyPlanRow, WorkoutAssignmentRow, plan_snapshot,
};
use crate::model::team::{NewVolunteer, VOLUNTEER_PENDING};
use crate::payloads::participant::{
    CompleteChallengePayload, GetMyChallengesParams, GetWeekAccessParams, HideChallengePayload,
    JoinChallengePayload, LeaveChallengePayload, RetakeChallengePayload, ToggleActivityPayload,
    VolunteerTeamLeadPayload,
};
use crate::{
    errors::AppError,
    response::ApiResponse,
    schema::{
        bonus_workouts::dsl as bw_dsl, challenge_instances::dsl as ci_dsl,
        challenge_templates::dsl as ct_dsl, challenge_week_unlocks::dsl as cwu_dsl,
        challenges::dsl as ch_dsl, daily_plan_items::dsl as dpi_dsl,
        plan_templates::dsl as pt_dsl, team_leader_volunteers::dsl as tlv_dsl,
        weekly_plans::dsl as wp_dsl, workout_assignments::dsl as wa_dsl,
    },
};
use anyhow::anyhow;
use axum::extract::Query;
use axum::{extract::State, response::Json};
use chrono::{NaiveDate, Utc};
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, info, instrument, warn};

const DEFAULT_CORE_WORKOUT_COUNT: i32 = 3;

/// Queries all challenges a participant could currently see, with their
/// signup availability evaluated as of today.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<ChallengeSummary>`: visible, active challenges (200 OK).
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool))]
pub async fn get_available_challenges(
    State(pool): State<Pool>,
) -> Result<ApiResponse<Vec<ChallengeSummary>>, AppError> {
    info!("Fetching available challenges");
    let today = Utc::now().date_naive();

    let rows = helper::run_query(&pool, |conn_sync| {
        ch_dsl::challenges
            .filter(ch_dsl::is_visible.eq(true).and(ch_dsl::is_active.eq(true)))
            .order(ch_dsl::start_date.asc())
            .load::<ChallengeRow>(conn_sync)
    })
    .await?;

    let summaries: Vec<ChallengeSummary> = rows
        .into_iter()
        .map(|row| {
            let window = row.window();
            ChallengeSummary {
                id: row.id,
                name: row.name,
                challenge_type: row.challenge_type,
                start_date: row.start_date,
                end_date: row.end_date,
                duration_weeks: window.duration_weeks(),
                can_signup: window.can_signup(today),
            }
        })
        .collect();

    info!("Successfully fetched {} challenges", summaries.len());
    Ok(ApiResponse::ok(summaries))
}

/// Retrieves a user's participation records across all challenges.
///
/// Query Parameters:
/// * `user_id`: The acting user.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Vec<InstanceSummary>` (200 OK).
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_my_challenges(
    State(pool): State<Pool>,
    Query(params): Query<GetMyChallengesParams>,
) -> Result<ApiResponse<Vec<InstanceSummary>>, AppError> {
    let user_id = params.user_id;
    info!("Fetching challenge instances for user_id: {}", user_id);

    let rows = helper::run_query(&pool, move |conn_sync| {
        ci_dsl::challenge_instances
            .filter(ci_dsl::user_id.eq(user_id))
            .order(ci_dsl::started_at.desc())
            .load::<InstanceRow>(conn_sync)
    })
    .await?;

    let summaries = rows
        .into_iter()
        .map(|row| InstanceSummary {
            id: row.id,
            challenge_id: row.challenge_id,
            state: row.state,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
        .collect::<Vec<_>>();

    info!(
        "Successfully fetched {} instances for user_id: {}",
        summaries.len(),
        user_id
    );
    Ok(ApiResponse::ok(summaries))
}

/// Joins a challenge, creating a participation instance and generating its
/// weekly plans.
///
/// Request Body: `JoinChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `JoinOutcome`: The decision; on success also the new instance ID and
///   generated plan count (200 OK). Signup-window and conflict denials are
///   expected business outcomes, not errors.
/// * `404 Not Found`: If the challenge does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn join_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<JoinChallengePayload>,
) -> Result<ApiResponse<JoinOutcome>, AppError> {
    info!(
        "User {} attempting to join challenge {}",
        payload.user_id, payload.challenge_id
    );
    debug!("Join challenge payload: {:?}", payload);
    let today = Utc::now().date_naive();

    let outcome = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let challenge = load_challenge(tx, payload.challenge_id)?;
            let window = challenge.window();

            if !window.can_signup(today) {
                return Ok(denied_join("Signups for this challenge are not open."));
            }

            let engaged = engaged_instance(tx, payload.user_id, payload.challenge_id)?;
            if engaged.is_some() {
                return Ok(denied_join(
                    "You are already participating in this challenge.",
                ));
            }

            let conflict =
                lifecycle::join_conflict(&window, today, &other_engaged_windows(tx, payload.user_id, payload.challenge_id)?);
            if !conflict.allowed {
                return Ok(JoinOutcome {
                    decision: conflict,
                    instance_id: None,
                    plans_generated: 0,
                });
            }

            let template_id = resolve_template(tx, &challenge, payload.template_id)?;
            let state = if window.has_started(today) {
                InstanceState::Active
            } else {
                InstanceState::SignedUp
            };

            let new_instance = NewChallengeInstance {
                user_id: payload.user_id,
                challenge_id: payload.challenge_id,
                template_id,
                include_kegels: payload.include_kegels,
                state: state.as_str().to_string(),
            };
            let instance_id = diesel::insert_into(ci_dsl::challenge_instances)
                .values(&new_instance)
                .returning(ci_dsl::id)
                .get_result::<i64>(tx)
                .map_err(map_instance_insert_error(payload.user_id, payload.challenge_id))?;

            let plans_generated =
                regenerate_plans(tx, instance_id, &challenge, template_id, today)?;

            info!(
                "User {} joined challenge {} as instance {} ({} plans)",
                payload.user_id, payload.challenge_id, instance_id, plans_generated
            );
            Ok(JoinOutcome {
                decision: Decision::allow(),
                instance_id: Some(instance_id),
                plans_generated,
            })
        })
    })
    .await?;

    Ok(ApiResponse::ok(outcome))
}

/// Leaves a challenge. Running challenges past week 1 can only be left
/// while the previous week has no completed work.
///
/// Request Body: `LeaveChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `Decision` (200 OK): Allowed, or denied with the blocking week named.
/// * `403 Forbidden`: If the instance belongs to another user.
/// * `404 Not Found`: If the instance does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn leave_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<LeaveChallengePayload>,
) -> Result<ApiResponse<Decision>, AppError> {
    info!(
        "User {} attempting to leave instance {}",
        payload.user_id, payload.instance_id
    );
    let today = Utc::now().date_naive();

    let decision = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let instance = load_owned_instance(tx, payload.instance_id, payload.user_id)?;
            let state = parse_state(&instance)?;
            if !state.can_transition_to(InstanceState::Left) {
                return Ok(Decision::deny(
                    "This challenge attempt is not currently active.",
                ));
            }

            let challenge = load_challenge(tx, instance.challenge_id)?;
            let window = challenge.window();

            let previous_plan = match lifecycle::previous_week_start(&window, today) {
                Some(week_start) => load_plan_snapshot_by_week(tx, instance.id, week_start)?,
                None => None,
            };

            let decision = lifecycle::can_leave(&window, today, previous_plan.as_ref());
            if decision.allowed {
                diesel::update(ci_dsl::challenge_instances.find(instance.id))
                    .set((
                        ci_dsl::state.eq(InstanceState::Left.as_str()),
                        ci_dsl::completed_at.eq(None::<chrono::DateTime<Utc>>),
                    ))
                    .execute(tx)?;
                info!("Instance {} left challenge {}", instance.id, challenge.id);
            } else {
                info!(
                    "Leave denied for instance {}: {:?}",
                    instance.id, decision.reason
                );
            }
            Ok(decision)
        })
    })
    .await?;

    Ok(ApiResponse::ok(decision))
}

/// Marks a challenge attempt completed. For ended challenges, every weekly
/// plan must be finished first.
///
/// Request Body: `CompleteChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `Decision` (200 OK).
/// * `403 Forbidden`: If the instance belongs to another user.
/// * `404 Not Found`: If the instance does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn complete_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<CompleteChallengePayload>,
) -> Result<ApiResponse<Decision>, AppError> {
    info!(
        "User {} attempting to complete instance {}",
        payload.user_id, payload.instance_id
    );
    let today = Utc::now().date_naive();

    let decision = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let instance = load_owned_instance(tx, payload.instance_id, payload.user_id)?;
            let state = parse_state(&instance)?;
            if !state.can_transition_to(InstanceState::Completed) {
                return Ok(Decision::deny(
                    "Only an active challenge attempt can be completed.",
                ));
            }

            let challenge = load_challenge(tx, instance.challenge_id)?;
            let window = challenge.window();

            let all_weeks_completed = if window.has_ended(today) {
                let unfinished: i64 = wp_dsl::weekly_plans
                    .filter(wp_dsl::instance_id.eq(instance.id))
                    .filter(wp_dsl::is_completed.eq(false))
                    .count()
                    .get_result(tx)?;
                unfinished == 0
            } else {
                true
            };

            let decision = lifecycle::can_complete(&window, today, all_weeks_completed);
            if decision.allowed {
                diesel::update(ci_dsl::challenge_instances.find(instance.id))
                    .set((
                        ci_dsl::state.eq(InstanceState::Completed.as_str()),
                        ci_dsl::completed_at.eq(Some(Utc::now())),
                    ))
                    .execute(tx)?;
                info!("Instance {} completed", instance.id);
            }
            Ok(decision)
        })
    })
    .await?;

    Ok(ApiResponse::ok(decision))
}

/// Hides a completed challenge attempt from the completed list. Clears the
/// completion timestamp without re-entering active status.
///
/// Request Body: `HideChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `Decision` (200 OK): Denied when the attempt was never completed.
/// * `403 Forbidden`: If the instance belongs to another user.
/// * `404 Not Found`: If the instance does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn hide_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<HideChallengePayload>,
) -> Result<ApiResponse<Decision>, AppError> {
    info!(
        "User {} attempting to hide instance {}",
        payload.user_id, payload.instance_id
    );

    let decision = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let instance = load_owned_instance(tx, payload.instance_id, payload.user_id)?;
            let state = parse_state(&instance)?;
            if state != InstanceState::Completed || instance.completed_at.is_none() {
                return Ok(Decision::deny(
                    "Only a completed challenge attempt can be hidden.",
                ));
            }

            diesel::update(ci_dsl::challenge_instances.find(instance.id))
                .set((
                    ci_dsl::state.eq(InstanceState::Left.as_str()),
                    ci_dsl::completed_at.eq(None::<chrono::DateTime<Utc>>),
                ))
                .execute(tx)?;
            info!("Instance {} hidden", instance.id);
            Ok(Decision::allow())
        })
    })
    .await?;

    Ok(ApiResponse::ok(decision))
}

/// Starts a fresh attempt at a challenge, inheriting the template and kegel
/// choice from prior attempts. Old attempts and their plans are untouched;
/// the new instance gets a freshly generated plan set.
///
/// Request Body: `RetakeChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `JoinOutcome` (200 OK).
/// * `404 Not Found`: If the challenge does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn retake_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<RetakeChallengePayload>,
) -> Result<ApiResponse<JoinOutcome>, AppError> {
    info!(
        "User {} attempting to retake challenge {}",
        payload.user_id, payload.challenge_id
    );
    let today = Utc::now().date_naive();

    let outcome = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let challenge = load_challenge(tx, payload.challenge_id)?;
            let window = challenge.window();

            let engaged = engaged_instance(tx, payload.user_id, payload.challenge_id)?;
            let decision = lifecycle::can_retake(&window, today, engaged.is_some());
            if !decision.allowed {
                return Ok(JoinOutcome {
                    decision,
                    instance_id: None,
                    plans_generated: 0,
                });
            }

            let prior_rows = ci_dsl::challenge_instances
                .filter(ci_dsl::user_id.eq(payload.user_id))
                .filter(ci_dsl::challenge_id.eq(payload.challenge_id))
                .load::<InstanceRow>(tx)?;
            let prior: Vec<PriorAttempt> = prior_rows
                .iter()
                .filter_map(|row| {
                    row.state().map(|state| PriorAttempt {
                        state,
                        template_id: row.template_id,
                        include_kegels: row.include_kegels,
                        started_at: row.started_at,
                    })
                })
                .collect();

            let available = available_templates(tx, payload.challenge_id)?;
            let (template_id, include_kegels) =
                lifecycle::inherit_template(&prior, challenge.default_template_id, &available);

            let state = if window.has_started(today) {
                InstanceState::Active
            } else {
                InstanceState::SignedUp
            };
            let new_instance = NewChallengeInstance {
                user_id: payload.user_id,
                challenge_id: payload.challenge_id,
                template_id,
                include_kegels,
                state: state.as_str().to_string(),
            };
            let instance_id = diesel::insert_into(ci_dsl::challenge_instances)
                .values(&new_instance)
                .returning(ci_dsl::id)
                .get_result::<i64>(tx)
                .map_err(map_instance_insert_error(payload.user_id, payload.challenge_id))?;

            let plans_generated =
                regenerate_plans(tx, instance_id, &challenge, template_id, today)?;

            info!(
                "User {} retook challenge {} as instance {} ({} plans)",
                payload.user_id, payload.challenge_id, instance_id, plans_generated
            );
            Ok(JoinOutcome {
                decision: Decision::allow(),
                instance_id: Some(instance_id),
                plans_generated,
            })
        })
    })
    .await?;

    Ok(ApiResponse::ok(outcome))
}

/// Toggles an activity on a daily plan item, computing the points awarded
/// and unchecking mutually-exclusive alternatives.
///
/// Request Body: `ToggleActivityPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `ToggleOutcome` (200 OK): Denials carry the locked-week reason.
/// * `400 Bad Request`: If the activity name is unknown.
/// * `403 Forbidden`: If the item belongs to another user's plan.
/// * `404 Not Found`: If the item does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn toggle_activity(
    State(pool): State<Pool>,
    Json(payload): Json<ToggleActivityPayload>,
) -> Result<ApiResponse<ToggleOutcome>, AppError> {
    info!(
        "User {} toggling '{}' on item {} (checking: {})",
        payload.user_id, payload.activity, payload.item_id, payload.checking
    );
    let today = Utc::now().date_naive();
    let activity = parse_activity(&payload.activity)?;

    let outcome = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let item = dpi_dsl::daily_plan_items
                .find(payload.item_id)
                .first::<DailyPlanItemRow>(tx)
                .optional()?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Plan item with ID {} not found", payload.item_id))
                })?;
            let plan = wp_dsl::weekly_plans
                .find(item.plan_id)
                .first::<WeeklyPlanRow>(tx)?;
            let instance = load_owned_instance(tx, plan.instance_id, payload.user_id)?;
            let challenge = load_challenge(tx, instance.challenge_id)?;
            let window = challenge.window();

            // Progressive unlock applies only while the challenge is live.
            let challenge_open = challenge.is_active && !window.has_ended(today);
            if let Some(denial) =
                week_unlock_denial(tx, challenge_open, challenge.id, plan.week_number, today)?
            {
                return Ok(locked_outcome(denial, plan.is_completed));
            }
            let weeks = instance_week_refs(tx, instance.id)?;
            let gate = week_gate::can_edit_week(challenge_open, &weeks, plan.week_start);
            if !gate.allowed {
                return Ok(locked_outcome(gate, plan.is_completed));
            }

            let items = plan_items(tx, plan.id)?;
            let snapshot = plan_snapshot(&plan, &items);
            let item_snapshot = item.snapshot();

            let points_awarded = match activity {
                ActivityKind::Exercise => 0,
                _ => scoring::calculate_points(&snapshot, &item_snapshot, payload.checking),
            };
            let unchecked_item_ids = if payload.checking && activity != ActivityKind::Exercise {
                scoring::exclusive_unchecks(&snapshot, &item_snapshot)
            } else {
                Vec::new()
            };

            apply_toggle(tx, item.id, activity, payload.checking, points_awarded)?;
            if !unchecked_item_ids.is_empty() {
                diesel::update(
                    dpi_dsl::daily_plan_items.filter(dpi_dsl::id.eq_any(&unchecked_item_ids)),
                )
                .set((
                    dpi_dsl::ride_done.eq(false),
                    dpi_dsl::run_done.eq(false),
                    dpi_dsl::yoga_done.eq(false),
                    dpi_dsl::strength_done.eq(false),
                    dpi_dsl::points.eq(0),
                ))
                .execute(tx)?;
            }

            // Re-read and persist the plan's completion state.
            let refreshed = plan_items(tx, plan.id)?;
            let plan_completed = plan_snapshot(&plan, &refreshed).all_workout_days_done();
            if plan_completed != plan.is_completed {
                diesel::update(wp_dsl::weekly_plans.find(plan.id))
                    .set(wp_dsl::is_completed.eq(plan_completed))
                    .execute(tx)?;
            }

            info!(
                "Toggled item {}: {} points, {} unchecked, plan completed: {}",
                item.id,
                points_awarded,
                unchecked_item_ids.len(),
                plan_completed
            );
            Ok(ToggleOutcome {
                decision: Decision::allow(),
                points_awarded,
                unchecked_item_ids,
                plan_completed,
            })
        })
    })
    .await?;

    Ok(ApiResponse::ok(outcome))
}

/// Checks whether a weekly plan may currently be edited, reconciling any
/// pending week-unlock record along the way.
///
/// Query Parameters:
/// * `user_id`, `plan_id`.
///
/// Returns (wrapped in `ApiResponse`)
/// * `WeekAccess` (200 OK).
/// * `403 Forbidden`: If the plan belongs to another user.
/// * `404 Not Found`: If the plan does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn get_week_access(
    State(pool): State<Pool>,
    Query(params): Query<GetWeekAccessParams>,
) -> Result<ApiResponse<WeekAccess>, AppError> {
    info!(
        "Checking week access for plan {} (user {})",
        params.plan_id, params.user_id
    );
    let today = Utc::now().date_naive();

    let access = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let plan = wp_dsl::weekly_plans
                .find(params.plan_id)
                .first::<WeeklyPlanRow>(tx)
                .optional()?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Weekly plan with ID {} not found", params.plan_id))
                })?;
            let instance = load_owned_instance(tx, plan.instance_id, params.user_id)?;
            let challenge = load_challenge(tx, instance.challenge_id)?;
            let window = challenge.window();

            let challenge_open = challenge.is_active && !window.has_ended(today);
            let decision =
                match week_unlock_denial(tx, challenge_open, challenge.id, plan.week_number, today)?
                {
                    Some(denial) => denial,
                    None => {
                        let weeks = instance_week_refs(tx, instance.id)?;
                        week_gate::can_edit_week(challenge_open, &weeks, plan.week_start)
                    }
                };

            Ok(WeekAccess {
                plan_id: plan.id,
                week_number: plan.week_number,
                decision,
            })
        })
    })
    .await?;

    Ok(ApiResponse::ok(access))
}

/// Registers a user's request to lead a team within a challenge.
///
/// Request Body: `VolunteerTeamLeadPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The volunteer record ID (200 OK).
/// * `404 Not Found`: If the user or challenge does not exist.
/// * `409 Conflict`: If the user already volunteered for this challenge.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn volunteer_team_lead(
    State(pool): State<Pool>,
    Json(payload): Json<VolunteerTeamLeadPayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!(
        "User {} volunteering to lead a team in challenge {}",
        payload.user_id, payload.challenge_id
    );

    let new_volunteer = NewVolunteer {
        user_id: payload.user_id,
        challenge_id: payload.challenge_id,
        status: VOLUNTEER_PENDING.to_string(),
    };

    let insert_result = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(tlv_dsl::team_leader_volunteers)
            .values(&new_volunteer)
            .returning(tlv_dsl::id)
            .get_result::<i64>(conn_sync)
    })
    .await;

    match insert_result {
        Ok(new_id) => {
            info!(
                "User {} volunteered for challenge {}, volunteer_id: {}",
                payload.user_id, payload.challenge_id, new_id
            );
            Ok(ApiResponse::ok(new_id))
        }
        Err(AppError::DieselError(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            _,
        ))) => {
            warn!(
                "User {} already volunteered for challenge {}",
                payload.user_id, payload.challenge_id
            );
            Err(AppError::Conflict(format!(
                "User {} has already volunteered for challenge {}.",
                payload.user_id, payload.challenge_id
            )))
        }
        Err(AppError::DieselError(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            _,
        ))) => Err(AppError::NotFound(format!(
            "User with ID {} or Challenge with ID {} not found.",
            payload.user_id, payload.challenge_id
        ))),
        Err(e) => Err(e),
    }
}

// shared internals

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActivityKind {
    Ride,
    Run,
    Yoga,
    Strength,
    Exercise,
}

fn parse_activity(value: &str) -> Result<ActivityKind, AppError> {
    match value {
        "ride" | "cycling" => Ok(ActivityKind::Ride),
        "run" | "running" => Ok(ActivityKind::Run),
        "yoga" => Ok(ActivityKind::Yoga),
        "strength" => Ok(ActivityKind::Strength),
        "exercise" => Ok(ActivityKind::Exercise),
        other => Err(AppError::BadRequest(format!(
            "Unknown activity type: {other}"
        ))),
    }
}

fn denied_join(reason: &str) -> JoinOutcome {
    JoinOutcome {
        decision: Decision::deny(reason),
        instance_id: None,
        plans_generated: 0,
    }
}

fn locked_outcome(decision: Decision, plan_completed: bool) -> ToggleOutcome {
    ToggleOutcome {
        decision,
        points_awarded: 0,
        unchecked_item_ids: Vec::new(),
        plan_completed,
    }
}

fn load_challenge(conn: &mut PgConnection, challenge_id: i64) -> Result<ChallengeRow, AppError> {
    ch_dsl::challenges
        .find(challenge_id)
        .first::<ChallengeRow>(conn)
        .optional()?
        .ok_or_else(|| AppError::NotFound(format!("Challenge with ID {challenge_id} not found")))
}

fn load_owned_instance(
    conn: &mut PgConnection,
    instance_id: i64,
    user_id: i64,
) -> Result<InstanceRow, AppError> {
    let instance = ci_dsl::challenge_instances
        .find(instance_id)
        .first::<InstanceRow>(conn)
        .optional()?
        .ok_or_else(|| {
            AppError::NotFound(format!("Challenge instance with ID {instance_id} not found"))
        })?;
    if instance.user_id != user_id {
        warn!(
            "User {} attempted to act on instance {} owned by user {}",
            user_id, instance_id, instance.user_id
        );
        return Err(AppError::Forbidden(
            "This challenge attempt belongs to another user.".to_string(),
        ));
    }
    Ok(instance)
}

fn parse_state(instance: &InstanceRow) -> Result<InstanceState, AppError> {
    instance.state().ok_or_else(|| {
        AppError::InternalServerError(anyhow!(
            "Instance {} has unrecognized state '{}'",
            instance.id,
            instance.state
        ))
    })
}

fn engaged_instance(
    conn: &mut PgConnection,
    user_id: i64,
    challenge_id: i64,
) -> Result<Option<InstanceRow>, AppError> {
    let row = ci_dsl::challenge_instances
        .filter(ci_dsl::user_id.eq(user_id))
        .filter(ci_dsl::challenge_id.eq(challenge_id))
        .filter(ci_dsl::state.eq_any([
            InstanceState::SignedUp.as_str(),
            InstanceState::Active.as_str(),
        ]))
        .first::<InstanceRow>(conn)
        .optional()?;
    Ok(row)
}

/// Windows of all other challenges the user is currently engaged in.
fn other_engaged_windows(
    conn: &mut PgConnection,
    user_id: i64,
    excluding_challenge_id: i64,
) -> Result<Vec<lifecycle::ChallengeWindow>, AppError> {
    let rows = ci_dsl::challenge_instances
        .inner_join(ch_dsl::challenges)
        .filter(ci_dsl::user_id.eq(user_id))
        .filter(ci_dsl::challenge_id.ne(excluding_challenge_id))
        .filter(ci_dsl::state.eq_any([
            InstanceState::SignedUp.as_str(),
            InstanceState::Active.as_str(),
        ]))
        .select((
            ch_dsl::start_date,
            ch_dsl::end_date,
            ch_dsl::signup_opens_date,
            ch_dsl::signup_deadline,
            ch_dsl::is_active,
            ch_dsl::is_visible,
        ))
        .load::<(
            NaiveDate,
            NaiveDate,
            Option<NaiveDate>,
            Option<NaiveDate>,
            bool,
            bool,
        )>(conn)?;

    Ok(rows
        .into_iter()
        .map(
            |(start_date, end_date, signup_opens_date, signup_deadline, is_active, is_visible)| {
                lifecycle::ChallengeWindow {
                    start_date,
                    end_date,
                    signup_opens_date,
                    signup_deadline,
                    is_active,
                    is_visible,
                }
            },
        )
        .collect())
}

fn available_templates(
    conn: &mut PgConnection,
    challenge_id: i64,
) -> Result<Vec<i64>, AppError> {
    let ids = ct_dsl::challenge_templates
        .filter(ct_dsl::challenge_id.eq(challenge_id))
        .order(ct_dsl::template_id.asc())
        .select(ct_dsl::template_id)
        .load::<i64>(conn)?;
    Ok(ids)
}

/// The template to use for a new instance: the requested one when it is
/// offered by the challenge, else the challenge default, else the first
/// available.
fn resolve_template(
    conn: &mut PgConnection,
    challenge: &ChallengeRow,
    requested: Option<i64>,
) -> Result<Option<i64>, AppError> {
    let available = available_templates(conn, challenge.id)?;
    if let Some(template_id) = requested {
        if available.contains(&template_id) {
            return Ok(Some(template_id));
        }
        warn!(
            "Requested template {} is not offered by challenge {}; falling back",
            template_id, challenge.id
        );
    }
    Ok(challenge
        .default_template_id
        .filter(|id| available.contains(id))
        .or_else(|| available.first().copied()))
}

fn plan_items(
    conn: &mut PgConnection,
    plan_id: i64,
) -> Result<Vec<DailyPlanItemRow>, AppError> {
    let items = dpi_dsl::daily_plan_items
        .filter(dpi_dsl::plan_id.eq(plan_id))
        .order(dpi_dsl::id.asc())
        .load::<DailyPlanItemRow>(conn)?;
    Ok(items)
}

fn load_plan_snapshot_by_week(
    conn: &mut PgConnection,
    instance_id: i64,
    week_start: NaiveDate,
) -> Result<Option<PlanSnapshot>, AppError> {
    let plan = wp_dsl::weekly_plans
        .filter(wp_dsl::instance_id.eq(instance_id))
        .filter(wp_dsl::week_start.eq(week_start))
        .first::<WeeklyPlanRow>(conn)
        .optional()?;
    match plan {
        Some(plan) => {
            let items = plan_items(conn, plan.id)?;
            Ok(Some(plan_snapshot(&plan, &items)))
        }
        None => Ok(None),
    }
}

fn instance_week_refs(
    conn: &mut PgConnection,
    instance_id: i64,
) -> Result<Vec<WeekRef>, AppError> {
    let rows = wp_dsl::weekly_plans
        .filter(wp_dsl::instance_id.eq(instance_id))
        .order(wp_dsl::week_start.asc())
        .select((wp_dsl::week_start, wp_dsl::is_completed))
        .load::<(NaiveDate, bool)>(conn)?;
    Ok(rows
        .into_iter()
        .map(|(week_start, is_completed)| WeekRef {
            week_start,
            is_completed,
        })
        .collect())
}

/// Evaluates the admin week-unlock record for (challenge, week), persisting
/// the auto-unlock flip when its date has passed (explicit write-after-read
/// rather than mutation inside a getter). Returns a denial while the week
/// remains locked. Closed challenges skip the record entirely; retroactive
/// editing is permitted.
fn week_unlock_denial(
    conn: &mut PgConnection,
    challenge_open: bool,
    challenge_id: i64,
    week_number: i32,
    today: NaiveDate,
) -> Result<Option<Decision>, AppError> {
    if !challenge_open {
        return Ok(None);
    }
    let row = cwu_dsl::challenge_week_unlocks
        .filter(cwu_dsl::challenge_id.eq(challenge_id))
        .filter(cwu_dsl::week_number.eq(week_number))
        .first::<crate::model::challenge::WeekUnlockRow>(conn)
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };
    let state = UnlockState {
        is_unlocked: row.is_unlocked,
        unlock_date: row.unlock_date,
    };
    if week_gate::unlock_needs_persist(state, today) {
        diesel::update(cwu_dsl::challenge_week_unlocks.find(row.id))
            .set(cwu_dsl::is_unlocked.eq(true))
            .execute(conn)?;
        info!(
            "Auto-unlocked week {} of challenge {} (unlock date passed)",
            week_number, challenge_id
        );
    }
    Ok(week_gate::unlock_denial(
        challenge_open,
        Some(state),
        week_number,
        today,
    ))
}

fn apply_toggle(
    conn: &mut PgConnection,
    item_id: i64,
    activity: ActivityKind,
    checking: bool,
    points: i32,
) -> Result<(), AppError> {
    let target = dpi_dsl::daily_plan_items.find(item_id);
    match activity {
        ActivityKind::Ride => {
            diesel::update(target)
                .set((dpi_dsl::ride_done.eq(checking), dpi_dsl::points.eq(points)))
                .execute(conn)?;
        }
        ActivityKind::Run => {
            diesel::update(target)
                .set((dpi_dsl::run_done.eq(checking), dpi_dsl::points.eq(points)))
                .execute(conn)?;
        }
        ActivityKind::Yoga => {
            diesel::update(target)
                .set((dpi_dsl::yoga_done.eq(checking), dpi_dsl::points.eq(points)))
                .execute(conn)?;
        }
        ActivityKind::Strength => {
            diesel::update(target)
                .set((
                    dpi_dsl::strength_done.eq(checking),
                    dpi_dsl::points.eq(points),
                ))
                .execute(conn)?;
        }
        ActivityKind::Exercise => {
            diesel::update(target)
                .set(dpi_dsl::exercise_done.eq(checking))
                .execute(conn)?;
        }
    }
    Ok(())
}

fn map_instance_insert_error(
    user_id: i64,
    challenge_id: i64,
) -> impl FnOnce(DieselError) -> AppError {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            warn!(
                "Instance insert failed for user {} challenge {}: {}",
                user_id,
                challenge_id,
                info.message()
            );
            AppError::NotFound(format!(
                "User with ID {user_id} or Challenge with ID {challenge_id} not found."
            ))
        }
        other => AppError::from(other),
    }
}

/// Deletes any existing plans for the instance, then generates one weekly
/// plan per calendar week with its daily items materialized from the
/// challenge's workout assignments and bonus workout. Deletion completes
/// before generation begins, inside the caller's transaction.
pub(super) fn regenerate_plans(
    conn: &mut PgConnection,
    instance_id: i64,
    challenge: &ChallengeRow,
    template_id: Option<i64>,
    today: NaiveDate,
) -> Result<usize, AppError> {
    let old_plan_ids = wp_dsl::weekly_plans
        .filter(wp_dsl::instance_id.eq(instance_id))
        .select(wp_dsl::id)
        .load::<i64>(conn)?;
    if !old_plan_ids.is_empty() {
        diesel::delete(dpi_dsl::daily_plan_items.filter(dpi_dsl::plan_id.eq_any(&old_plan_ids)))
            .execute(conn)?;
        diesel::delete(wp_dsl::weekly_plans.filter(wp_dsl::id.eq_any(&old_plan_ids)))
            .execute(conn)?;
        debug!(
            "Deleted {} stale plans for instance {}",
            old_plan_ids.len(),
            instance_id
        );
    }

    let core_workout_count = match template_id {
        Some(id) => pt_dsl::plan_templates
            .find(id)
            .select(pt_dsl::core_workout_count)
            .first::<i32>(conn)
            .optional()?
            .unwrap_or(DEFAULT_CORE_WORKOUT_COUNT),
        None => DEFAULT_CORE_WORKOUT_COUNT,
    };

    let weeks = schedule::generate_weeks(&challenge.window(), today);
    for week in &weeks {
        let new_plan = NewWeeklyPlan {
            instance_id,
            week_start: week.week_start,
            week_number: week.week_number,
            core_workout_count,
            is_completed: false,
        };
        let plan_id = diesel::insert_into(wp_dsl::weekly_plans)
            .values(&new_plan)
            .returning(wp_dsl::id)
            .get_result::<i64>(conn)?;

        let items = build_week_items(conn, challenge.id, template_id, week.week_number, plan_id)?;
        if !items.is_empty() {
            diesel::insert_into(dpi_dsl::daily_plan_items)
                .values(&items)
                .execute(conn)?;
        }
    }

    info!(
        "Generated {} weekly plans for instance {}",
        weeks.len(),
        instance_id
    );
    Ok(weeks.len())
}

fn build_week_items(
    conn: &mut PgConnection,
    challenge_id: i64,
    template_id: Option<i64>,
    week_number: i32,
    plan_id: i64,
) -> Result<Vec<NewDailyPlanItem>, AppError> {
    let mut items = Vec::new();

    if let Some(template_id) = template_id {
        let assignments = wa_dsl::workout_assignments
            .filter(wa_dsl::challenge_id.eq(challenge_id))
            .filter(wa_dsl::template_id.eq(template_id))
            .filter(wa_dsl::week_number.eq(week_number))
            .order((
                wa_dsl::day_of_week.asc(),
                wa_dsl::alternative_group.asc(),
                wa_dsl::order_in_group.asc(),
            ))
            .load::<WorkoutAssignmentRow>(conn)?;

        for assignment in assignments {
            let mut item = NewDailyPlanItem {
                plan_id,
                day_of_week: assignment.day_of_week,
                points: 0,
                ..NewDailyPlanItem::default()
            };
            if let Some(url) = canonical_class_url(&assignment.class_ref) {
                match assignment.activity_type.as_str() {
                    "ride" | "cycling" => item.ride_url = Some(url),
                    "run" | "running" => item.run_url = Some(url),
                    "yoga" => item.yoga_url = Some(url),
                    "strength" => item.strength_url = Some(url),
                    other => {
                        warn!(
                            "Assignment {} has unknown activity type '{}'; skipping target",
                            assignment.id, other
                        );
                    }
                }
            }
            items.push(item);
        }
    }

    let bonus = bw_dsl::bonus_workouts
        .filter(bw_dsl::challenge_id.eq(challenge_id))
        .filter(bw_dsl::week_number.eq(week_number))
        .first::<BonusWorkoutRow>(conn)
        .optional()?;
    if let Some(bonus) = bonus {
        let mut item = NewDailyPlanItem {
            plan_id,
            day_of_week: 0,
            is_bonus: true,
            points: 0,
            bonus_points: bonus.points,
            ..NewDailyPlanItem::default()
        };
        // A blank class_ref means any qualifying workout counts.
        let url = bonus.class_ref.as_deref().and_then(canonical_class_url);
        if let Some(url) = url {
            match bonus.activity_type.as_str() {
                "ride" | "cycling" => item.ride_url = Some(url),
                "run" | "running" => item.run_url = Some(url),
                "yoga" => item.yoga_url = Some(url),
                "strength" => item.strength_url = Some(url),
                other => {
                    warn!(
                        "Bonus workout {} has unknown activity type '{}'; skipping target",
                        bonus.id, other
                    );
                }
            }
        }
        items.push(item);
    }

    Ok(items)
}

/// Canonical catalog URL for an authored class reference, or `None` (with a
/// warning) when the reference cannot be resolved. A bad reference must not
/// block plan generation.
fn canonical_class_url(reference: &str) -> Option<String> {
    if reference.trim().is_empty() {
        return None;
    }
    match class_ref::extract_identifier(reference).and_then(|id| class_ref::build_url(&id)) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!("Skipping unresolvable class reference: {}", err);
            None
        }
    }
}
