use std::collections::BTreeSet;

use super::helper;
use crate::engine::class_ref;
use crate::model::catalog::{ClassRecordRow, EnqueueReport, NewSyncRequest, SYNC_PENDING};
use crate::model::challenge::{
    NewChallenge, NewChallengeCategory, NewChallengeTemplate, NewWeekUnlock, WeekUnlockRow,
};
use crate::model::team::{
    MAX_TEAM_LEADERS, NewTeam, NewTeamLeader, NewTeamMember, VOLUNTEER_ASSIGNED,
    VOLUNTEER_PENDING, VolunteerRow,
};
use crate::payloads::admin::{
    AddTeamMemberPayload, AssignTeamLeaderPayload, CreateChallengePayload, CreateTeamPayload,
    EnqueueMissingClassesPayload, LookupClassParams, ModifyChallengePayload, SetTeamLeadersPayload,
    SetWeekUnlockPayload,
};
use crate::{
    errors::AppError,
    response::ApiResponse,
    schema::{
        challenge_categories::dsl as cc_dsl, challenge_templates::dsl as ct_dsl,
        challenge_week_unlocks::dsl as cwu_dsl, challenges::dsl as ch_dsl,
        class_records::dsl as cr_dsl, class_sync_requests::dsl as csr_dsl,
        team_leader_volunteers::dsl as tlv_dsl, team_leaders::dsl as tl_dsl,
        team_members::dsl as tm_dsl, teams::dsl as t_dsl,
    },
};
use axum::extract::Query;
use axum::{extract::State, response::Json};
use chrono::{NaiveDate, Utc};
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{info, instrument, warn};

const CHALLENGE_TYPES: [&str; 3] = ["team", "mini", "individual"];

/// Creates a challenge together with its categories and offered templates.
///
/// Request Body: `CreateChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The new challenge ID (200 OK).
/// * `409 Conflict`: If a challenge with the same name exists.
/// * `422 Unprocessable Entity`: If the dates or challenge type are invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn create_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<CreateChallengePayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!("Creating challenge '{}'", payload.name);

    validate_challenge_type(&payload.challenge_type)?;
    validate_dates(
        payload.start_date,
        payload.end_date,
        payload.signup_opens_date,
        payload.signup_deadline,
    )?;

    // A default template that is not among the offered templates would be
    // unusable; clear it rather than rejecting the whole request.
    let default_template_id = match payload.default_template_id {
        Some(id) if !payload.template_ids.contains(&id) => {
            warn!(
                "Default template {} is not among the offered templates; clearing it",
                id
            );
            None
        }
        other => other,
    };

    let challenge_id = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let new_challenge = NewChallenge {
                name: payload.name.clone(),
                description: payload.description.clone(),
                challenge_type: payload.challenge_type.clone(),
                start_date: payload.start_date,
                end_date: payload.end_date,
                signup_opens_date: payload.signup_opens_date,
                signup_deadline: payload.signup_deadline,
                is_active: payload.is_active,
                is_visible: payload.is_visible,
                leaderboard_visible: payload.leaderboard_visible,
                leaderboard_visible_date: payload.leaderboard_visible_date,
                default_template_id,
            };
            let challenge_id = diesel::insert_into(ch_dsl::challenges)
                .values(&new_challenge)
                .returning(ch_dsl::id)
                .get_result::<i64>(tx)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AppError::Conflict(format!(
                            "A challenge named '{}' already exists.",
                            payload.name
                        ))
                    }
                    other => AppError::from(other),
                })?;

            let categories: Vec<NewChallengeCategory> = payload
                .categories
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|category| NewChallengeCategory {
                    challenge_id,
                    category: category.clone(),
                })
                .collect();
            if !categories.is_empty() {
                diesel::insert_into(cc_dsl::challenge_categories)
                    .values(&categories)
                    .execute(tx)?;
            }

            let templates: Vec<NewChallengeTemplate> = payload
                .template_ids
                .iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|&template_id| NewChallengeTemplate {
                    challenge_id,
                    template_id,
                })
                .collect();
            if !templates.is_empty() {
                diesel::insert_into(ct_dsl::challenge_templates)
                    .values(&templates)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(
                            DatabaseErrorKind::ForeignKeyViolation,
                            _,
                        ) => AppError::NotFound(
                            "One or more offered templates do not exist.".to_string(),
                        ),
                        other => AppError::from(other),
                    })?;
            }

            Ok(challenge_id)
        })
    })
    .await?;

    info!("Successfully created challenge with ID: {}", challenge_id);
    Ok(ApiResponse::ok(challenge_id))
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::challenges)]
struct ChallengeChanges {
    name: Option<String>,
    description: Option<String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    signup_opens_date: Option<NaiveDate>,
    signup_deadline: Option<NaiveDate>,
    is_active: Option<bool>,
    is_visible: Option<bool>,
    leaderboard_visible: Option<bool>,
    leaderboard_visible_date: Option<NaiveDate>,
    default_template_id: Option<i64>,
    updated_at: chrono::DateTime<Utc>,
}

/// Applies a partial update to a challenge. Omitted fields keep their
/// current value; the resulting date window must still be coherent.
///
/// Request Body: `ModifyChallengePayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `()` (200 OK).
/// * `404 Not Found`: If the challenge does not exist.
/// * `422 Unprocessable Entity`: If the resulting dates are invalid.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn modify_challenge(
    State(pool): State<Pool>,
    Json(payload): Json<ModifyChallengePayload>,
) -> Result<ApiResponse<()>, AppError> {
    info!("Modifying challenge {}", payload.challenge_id);

    helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let (current_start, current_end, current_opens, current_deadline) =
                ch_dsl::challenges
                    .find(payload.challenge_id)
                    .select((
                        ch_dsl::start_date,
                        ch_dsl::end_date,
                        ch_dsl::signup_opens_date,
                        ch_dsl::signup_deadline,
                    ))
                    .first::<(NaiveDate, NaiveDate, Option<NaiveDate>, Option<NaiveDate>)>(tx)
                    .optional()?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "Challenge with ID {} not found",
                            payload.challenge_id
                        ))
                    })?;

            let effective_start = payload.start_date.unwrap_or(current_start);
            let effective_end = payload.end_date.unwrap_or(current_end);
            let effective_opens = payload.signup_opens_date.or(current_opens);
            let effective_deadline = payload.signup_deadline.or(current_deadline);
            validate_dates(
                effective_start,
                effective_end,
                effective_opens,
                effective_deadline,
            )?;

            if let Some(template_id) = payload.default_template_id {
                let offered: i64 = ct_dsl::challenge_templates
                    .filter(ct_dsl::challenge_id.eq(payload.challenge_id))
                    .filter(ct_dsl::template_id.eq(template_id))
                    .count()
                    .get_result(tx)?;
                if offered == 0 {
                    return Err(AppError::UnprocessableEntity(format!(
                        "Template {} is not offered by challenge {}.",
                        template_id, payload.challenge_id
                    )));
                }
            }

            let changes = ChallengeChanges {
                name: payload.name,
                description: payload.description,
                start_date: payload.start_date,
                end_date: payload.end_date,
                signup_opens_date: payload.signup_opens_date,
                signup_deadline: payload.signup_deadline,
                is_active: payload.is_active,
                is_visible: payload.is_visible,
                leaderboard_visible: payload.leaderboard_visible,
                leaderboard_visible_date: payload.leaderboard_visible_date,
                default_template_id: payload.default_template_id,
                updated_at: Utc::now(),
            };
            diesel::update(ch_dsl::challenges.find(payload.challenge_id))
                .set(&changes)
                .execute(tx)?;
            Ok(())
        })
    })
    .await?;

    info!("Successfully modified challenge {}", payload.challenge_id);
    Ok(ApiResponse::ok(()))
}

/// Creates or updates the unlock record for one week of a challenge.
///
/// Request Body: `SetWeekUnlockPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The unlock record ID (200 OK).
/// * `404 Not Found`: If the challenge does not exist.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn set_week_unlock(
    State(pool): State<Pool>,
    Json(payload): Json<SetWeekUnlockPayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!(
        "Setting unlock for challenge {} week {} (unlocked: {}, date: {:?})",
        payload.challenge_id, payload.week_number, payload.is_unlocked, payload.unlock_date
    );

    let unlock_id = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let existing = cwu_dsl::challenge_week_unlocks
                .filter(cwu_dsl::challenge_id.eq(payload.challenge_id))
                .filter(cwu_dsl::week_number.eq(payload.week_number))
                .first::<WeekUnlockRow>(tx)
                .optional()?;

            match existing {
                Some(row) => {
                    diesel::update(cwu_dsl::challenge_week_unlocks.find(row.id))
                        .set((
                            cwu_dsl::is_unlocked.eq(payload.is_unlocked),
                            cwu_dsl::unlock_date.eq(payload.unlock_date),
                        ))
                        .execute(tx)?;
                    Ok(row.id)
                }
                None => {
                    let new_unlock = NewWeekUnlock {
                        challenge_id: payload.challenge_id,
                        week_number: payload.week_number,
                        is_unlocked: payload.is_unlocked,
                        unlock_date: payload.unlock_date,
                    };
                    diesel::insert_into(cwu_dsl::challenge_week_unlocks)
                        .values(&new_unlock)
                        .returning(cwu_dsl::id)
                        .get_result::<i64>(tx)
                        .map_err(|err| match err {
                            DieselError::DatabaseError(
                                DatabaseErrorKind::ForeignKeyViolation,
                                _,
                            ) => AppError::NotFound(format!(
                                "Challenge with ID {} not found",
                                payload.challenge_id
                            )),
                            other => AppError::from(other),
                        })
                }
            }
        })
    })
    .await?;

    Ok(ApiResponse::ok(unlock_id))
}

/// Creates a team with an optional ordered set of leaders.
///
/// Request Body: `CreateTeamPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The new team ID (200 OK).
/// * `409 Conflict`: If a team with the same name exists.
/// * `422 Unprocessable Entity`: If more than three leaders are given.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn create_team(
    State(pool): State<Pool>,
    Json(payload): Json<CreateTeamPayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!(
        "Creating team '{}' with {} leaders",
        payload.name,
        payload.leader_user_ids.len()
    );
    validate_leader_list(&payload.leader_user_ids)?;

    let team_id = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let team_id = diesel::insert_into(t_dsl::teams)
                .values(&NewTeam {
                    name: payload.name.clone(),
                })
                .returning(t_dsl::id)
                .get_result::<i64>(tx)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AppError::Conflict(format!(
                            "A team named '{}' already exists.",
                            payload.name
                        ))
                    }
                    other => AppError::from(other),
                })?;

            insert_leaders(tx, team_id, &payload.leader_user_ids)?;
            Ok(team_id)
        })
    })
    .await?;

    info!("Successfully created team with ID: {}", team_id);
    Ok(ApiResponse::ok(team_id))
}

/// Replaces a team's leaders with a new ordered set. Position 0 is the
/// primary leader.
///
/// Request Body: `SetTeamLeadersPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `()` (200 OK).
/// * `404 Not Found`: If the team or a user does not exist.
/// * `422 Unprocessable Entity`: If more than three leaders are given.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn set_team_leaders(
    State(pool): State<Pool>,
    Json(payload): Json<SetTeamLeadersPayload>,
) -> Result<ApiResponse<()>, AppError> {
    info!(
        "Setting {} leaders on team {}",
        payload.leader_user_ids.len(),
        payload.team_id
    );
    validate_leader_list(&payload.leader_user_ids)?;

    helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let team_exists: i64 = t_dsl::teams
                .filter(t_dsl::id.eq(payload.team_id))
                .count()
                .get_result(tx)?;
            if team_exists == 0 {
                return Err(AppError::NotFound(format!(
                    "Team with ID {} not found",
                    payload.team_id
                )));
            }

            diesel::delete(tl_dsl::team_leaders.filter(tl_dsl::team_id.eq(payload.team_id)))
                .execute(tx)?;
            insert_leaders(tx, payload.team_id, &payload.leader_user_ids)?;
            Ok(())
        })
    })
    .await?;

    info!("Successfully set leaders on team {}", payload.team_id);
    Ok(ApiResponse::ok(()))
}

/// Adds a challenge participation to a team's roster.
///
/// Request Body: `AddTeamMemberPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `i64`: The membership record ID (200 OK).
/// * `404 Not Found`: If the team or instance does not exist.
/// * `409 Conflict`: If the instance is already on a team.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn add_team_member(
    State(pool): State<Pool>,
    Json(payload): Json<AddTeamMemberPayload>,
) -> Result<ApiResponse<i64>, AppError> {
    info!(
        "Adding instance {} to team {}",
        payload.instance_id, payload.team_id
    );

    let insert_result = helper::run_query(&pool, move |conn_sync| {
        diesel::insert_into(tm_dsl::team_members)
            .values(&NewTeamMember {
                team_id: payload.team_id,
                instance_id: payload.instance_id,
            })
            .returning(tm_dsl::id)
            .get_result::<i64>(conn_sync)
    })
    .await;

    match insert_result {
        Ok(member_id) => {
            info!(
                "Instance {} joined team {} as member {}",
                payload.instance_id, payload.team_id, member_id
            );
            Ok(ApiResponse::ok(member_id))
        }
        Err(AppError::DieselError(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            _,
        ))) => Err(AppError::Conflict(format!(
            "Instance {} is already on a team for this challenge.",
            payload.instance_id
        ))),
        Err(AppError::DieselError(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            _,
        ))) => Err(AppError::NotFound(format!(
            "Team with ID {} or instance with ID {} not found.",
            payload.team_id, payload.instance_id
        ))),
        Err(e) => Err(e),
    }
}

/// Assigns a pending team-lead volunteer to a team, appending them to the
/// team's leader list.
///
/// Request Body: `AssignTeamLeaderPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `()` (200 OK).
/// * `404 Not Found`: If no pending volunteer record matches.
/// * `409 Conflict`: If the team already has three leaders.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn assign_team_leader(
    State(pool): State<Pool>,
    Json(payload): Json<AssignTeamLeaderPayload>,
) -> Result<ApiResponse<()>, AppError> {
    info!(
        "Assigning volunteer user {} (challenge {}) to lead team {}",
        payload.user_id, payload.challenge_id, payload.team_id
    );

    helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let volunteer = tlv_dsl::team_leader_volunteers
                .filter(tlv_dsl::user_id.eq(payload.user_id))
                .filter(tlv_dsl::challenge_id.eq(payload.challenge_id))
                .filter(tlv_dsl::status.eq(VOLUNTEER_PENDING))
                .first::<VolunteerRow>(tx)
                .optional()?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "No pending volunteer record for user {} in challenge {}.",
                        payload.user_id, payload.challenge_id
                    ))
                })?;

            let positions: Vec<i16> = tl_dsl::team_leaders
                .filter(tl_dsl::team_id.eq(payload.team_id))
                .order(tl_dsl::position.asc())
                .select(tl_dsl::position)
                .load(tx)?;
            if positions.len() >= MAX_TEAM_LEADERS {
                return Err(AppError::Conflict(format!(
                    "Team {} already has {} leaders.",
                    payload.team_id, MAX_TEAM_LEADERS
                )));
            }
            let next_position = positions.last().map(|p| p + 1).unwrap_or(0);

            diesel::insert_into(tl_dsl::team_leaders)
                .values(&NewTeamLeader {
                    team_id: payload.team_id,
                    position: next_position,
                    user_id: payload.user_id,
                })
                .execute(tx)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        AppError::NotFound(format!(
                            "Team with ID {} not found",
                            payload.team_id
                        ))
                    }
                    other => AppError::from(other),
                })?;

            diesel::update(tlv_dsl::team_leader_volunteers.find(volunteer.id))
                .set((
                    tlv_dsl::status.eq(VOLUNTEER_ASSIGNED),
                    tlv_dsl::assigned_team_id.eq(Some(payload.team_id)),
                    tlv_dsl::assigned_at.eq(Some(Utc::now())),
                ))
                .execute(tx)?;
            Ok(())
        })
    })
    .await?;

    info!(
        "Volunteer user {} assigned to team {}",
        payload.user_id, payload.team_id
    );
    Ok(ApiResponse::ok(()))
}

/// Resolves a class reference to its synced catalog record, if present.
///
/// Query Parameters:
/// * `reference`: Bare identifier or any accepted catalog URL shape.
///
/// Returns (wrapped in `ApiResponse`)
/// * `Option<ClassRecordRow>` (200 OK): `None` when the class has not been
///   synced yet.
/// * `400 Bad Request`: If the reference cannot be parsed.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, params))]
pub async fn lookup_class(
    State(pool): State<Pool>,
    Query(params): Query<LookupClassParams>,
) -> Result<ApiResponse<Option<ClassRecordRow>>, AppError> {
    let class_id = class_ref::extract_identifier(&params.reference)?;
    info!("Looking up class record for identifier '{}'", class_id);

    let record = helper::run_query(&pool, move |conn_sync| {
        cr_dsl::class_records
            .filter(cr_dsl::class_id.eq(&class_id))
            .first::<ClassRecordRow>(conn_sync)
            .optional()
    })
    .await?;

    Ok(ApiResponse::ok(record))
}

/// Resolves a batch of class references and queues the ones without a
/// synced record for background import. The whole batch is rejected when
/// any reference is malformed.
///
/// Request Body: `EnqueueMissingClassesPayload`
///
/// Returns (wrapped in `ApiResponse`)
/// * `EnqueueReport` (200 OK).
/// * `400 Bad Request`: If any reference cannot be parsed.
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool, payload))]
pub async fn enqueue_missing_classes(
    State(pool): State<Pool>,
    Json(payload): Json<EnqueueMissingClassesPayload>,
) -> Result<ApiResponse<EnqueueReport>, AppError> {
    info!(
        "Enqueueing sync for {} class references",
        payload.references.len()
    );

    let mut class_ids = BTreeSet::new();
    for reference in &payload.references {
        class_ids.insert(class_ref::extract_identifier(reference)?);
    }

    let report = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let ids: Vec<String> = class_ids.into_iter().collect();

            let found: BTreeSet<String> = cr_dsl::class_records
                .filter(cr_dsl::class_id.eq_any(&ids))
                .select(cr_dsl::class_id)
                .load::<String>(tx)?
                .into_iter()
                .collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !found.contains(*id))
                .cloned()
                .collect();

            let already_queued: BTreeSet<String> = csr_dsl::class_sync_requests
                .filter(csr_dsl::class_id.eq_any(&missing))
                .filter(csr_dsl::status.eq(SYNC_PENDING))
                .select(csr_dsl::class_id)
                .load::<String>(tx)?
                .into_iter()
                .collect();

            let to_queue: Vec<NewSyncRequest> = missing
                .iter()
                .filter(|id| !already_queued.contains(*id))
                .map(|id| NewSyncRequest {
                    class_id: id.clone(),
                    status: SYNC_PENDING.to_string(),
                })
                .collect();
            if !to_queue.is_empty() {
                diesel::insert_into(csr_dsl::class_sync_requests)
                    .values(&to_queue)
                    .execute(tx)?;
            }

            Ok(EnqueueReport {
                found_count: found.len(),
                missing_count: missing.len(),
                queued_count: to_queue.len(),
                already_queued_count: already_queued.len(),
                missing_ids: missing,
            })
        })
    })
    .await?;

    info!(
        "Class sync enqueue complete: {} found, {} missing, {} newly queued",
        report.found_count, report.missing_count, report.queued_count
    );
    Ok(ApiResponse::ok(report))
}

// shared internals

fn validate_challenge_type(challenge_type: &str) -> Result<(), AppError> {
    if CHALLENGE_TYPES.contains(&challenge_type) {
        Ok(())
    } else {
        Err(AppError::UnprocessableEntity(format!(
            "Unknown challenge type '{challenge_type}'; expected one of: {}.",
            CHALLENGE_TYPES.join(", ")
        )))
    }
}

/// Date-window coherence. A signup deadline may extend past the start date
/// (late signups stay open through it) but never past the end date, and
/// never before the signup opening date.
fn validate_dates(
    start_date: NaiveDate,
    end_date: NaiveDate,
    signup_opens_date: Option<NaiveDate>,
    signup_deadline: Option<NaiveDate>,
) -> Result<(), AppError> {
    if end_date < start_date {
        return Err(AppError::UnprocessableEntity(
            "End date must not precede the start date.".to_string(),
        ));
    }
    if let Some(opens) = signup_opens_date {
        if opens > start_date {
            return Err(AppError::UnprocessableEntity(
                "Signup opening date must not be after the start date.".to_string(),
            ));
        }
    }
    if let Some(deadline) = signup_deadline {
        if deadline > end_date {
            return Err(AppError::UnprocessableEntity(
                "Signup deadline must not be after the end date.".to_string(),
            ));
        }
        if let Some(opens) = signup_opens_date {
            if deadline < opens {
                return Err(AppError::UnprocessableEntity(
                    "Signup deadline must not precede the signup opening date.".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_leader_list(leader_user_ids: &[i64]) -> Result<(), AppError> {
    if leader_user_ids.len() > MAX_TEAM_LEADERS {
        return Err(AppError::UnprocessableEntity(format!(
            "A team can have at most {MAX_TEAM_LEADERS} leaders."
        )));
    }
    let unique: BTreeSet<_> = leader_user_ids.iter().collect();
    if unique.len() != leader_user_ids.len() {
        return Err(AppError::UnprocessableEntity(
            "Leader list contains duplicate users.".to_string(),
        ));
    }
    Ok(())
}

fn insert_leaders(
    conn: &mut PgConnection,
    team_id: i64,
    leader_user_ids: &[i64],
) -> Result<(), AppError> {
    let leaders: Vec<NewTeamLeader> = leader_user_ids
        .iter()
        .enumerate()
        .map(|(position, &user_id)| NewTeamLeader {
            team_id,
            position: position as i16,
            user_id,
        })
        .collect();
    if leaders.is_empty() {
        return Ok(());
    }
    diesel::insert_into(tl_dsl::team_leaders)
        .values(&leaders)
        .execute(conn)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                AppError::NotFound("One or more leader users do not exist.".to_string())
            }
            other => AppError::from(other),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn window_dates_must_be_ordered() {
        assert!(validate_dates(date(3, 1), date(3, 31), None, None).is_ok());
        assert!(validate_dates(date(3, 31), date(3, 1), None, None).is_err());
        assert!(validate_dates(date(3, 1), date(3, 31), Some(date(3, 2)), None).is_err());
        assert!(validate_dates(date(3, 1), date(3, 31), Some(date(2, 20)), None).is_ok());
    }

    #[test]
    fn deadline_must_fall_inside_the_window() {
        // A deadline past the start date is the late-signup grace period.
        assert!(validate_dates(date(3, 1), date(3, 31), None, Some(date(3, 3))).is_ok());
        // But never past the end date.
        assert!(validate_dates(date(3, 1), date(3, 31), None, Some(date(4, 1))).is_err());
        // And never before signups even open.
        assert!(
            validate_dates(date(3, 1), date(3, 31), Some(date(2, 20)), Some(date(2, 15))).is_err()
        );
        assert!(
            validate_dates(date(3, 1), date(3, 31), Some(date(2, 20)), Some(date(2, 25))).is_ok()
        );
    }
}
