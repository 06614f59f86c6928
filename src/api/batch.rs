use std::collections::BTreeMap;

use super::helper;
use crate::engine::lifecycle::{self, PlanActivity};
use crate::engine::schedule;
use crate::engine::team_score::{self, MemberPoints};
use crate::model::challenge::{ChallengeRow, InstanceRow};
use crate::model::plan::{DailyPlanItemRow, WeeklyPlanRow, plan_snapshot};
use crate::model::team::{NewLeaderboardEntry, RecomputeReport};
use crate::{
    errors::AppError,
    response::ApiResponse,
    schema::{
        challenge_instances, challenges::dsl as ch_dsl, daily_plan_items::dsl as dpi_dsl,
        team_leaderboards::dsl as tlb_dsl, team_members::dsl as tm_dsl,
        weekly_plans::dsl as wp_dsl,
    },
};
use axum::extract::State;
use chrono::{NaiveDate, Utc};
use deadpool_diesel::postgres::Pool;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Recomputes team leaderboards for every active team challenge: one
/// overall entry per team plus one entry per started week. Members outside
/// the scoring window contribute nothing.
///
/// Returns (wrapped in `ApiResponse`)
/// * `RecomputeReport` (200 OK).
/// * `500 Internal Server Error`: If a database error occurs.
#[instrument(skip(pool))]
pub async fn recompute_leaderboards(
    State(pool): State<Pool>,
) -> Result<ApiResponse<RecomputeReport>, AppError> {
    info!("Recomputing team leaderboards");
    let today = Utc::now().date_naive();

    let report = helper::run_in_connection(&pool, move |conn_sync| {
        conn_sync.transaction(|tx| {
            let mut report = RecomputeReport::default();

            let challenges = ch_dsl::challenges
                .filter(ch_dsl::is_active.eq(true))
                .filter(ch_dsl::challenge_type.eq("team"))
                .order(ch_dsl::id.asc())
                .load::<ChallengeRow>(tx)?;

            for challenge in &challenges {
                report.challenges_processed += 1;
                let rosters = team_rosters(tx, challenge.id)?;
                debug!(
                    "Challenge {} has {} teams to score",
                    challenge.id,
                    rosters.len()
                );

                let started_weeks: Vec<i32> = schedule::challenge_weeks(&challenge.window())
                    .into_iter()
                    .filter(|week| week.week_start <= today)
                    .map(|week| week.week_number)
                    .collect();

                for (team_id, instances) in rosters {
                    report.teams_processed += 1;
                    let mut members = Vec::with_capacity(instances.len());
                    let mut weekly: BTreeMap<i32, i32> = BTreeMap::new();

                    for instance in &instances {
                        let member = score_member(tx, challenge, instance, today, &mut weekly)?;
                        members.push(member);
                    }

                    let total = team_score::team_total(&members);
                    upsert_entry(tx, team_id, challenge.id, None, total)?;
                    report.entries_written += 1;

                    for &week_number in &started_weeks {
                        let week_points = weekly.get(&week_number).copied().unwrap_or(0);
                        upsert_entry(tx, team_id, challenge.id, Some(week_number), week_points)?;
                        report.entries_written += 1;
                    }
                }
            }

            Ok(report)
        })
    })
    .await?;

    info!(
        "Leaderboard recompute finished: {} challenges, {} teams, {} entries",
        report.challenges_processed, report.teams_processed, report.entries_written
    );
    Ok(ApiResponse::ok(report))
}

/// Teams of a challenge with their member instances, keyed by team ID.
fn team_rosters(
    conn: &mut PgConnection,
    challenge_id: i64,
) -> Result<BTreeMap<i64, Vec<InstanceRow>>, AppError> {
    let rows = tm_dsl::team_members
        .inner_join(challenge_instances::table)
        .filter(challenge_instances::challenge_id.eq(challenge_id))
        .select((tm_dsl::team_id, challenge_instances::all_columns))
        .load::<(i64, InstanceRow)>(conn)?;

    let mut rosters: BTreeMap<i64, Vec<InstanceRow>> = BTreeMap::new();
    for (team_id, instance) in rows {
        rosters.entry(team_id).or_default().push(instance);
    }
    Ok(rosters)
}

/// Loads one member's plans, evaluates their scoring eligibility and sums
/// their item points. Weekly subtotals accumulate into `weekly` only for
/// scoring members.
fn score_member(
    conn: &mut PgConnection,
    challenge: &ChallengeRow,
    instance: &InstanceRow,
    today: NaiveDate,
    weekly: &mut BTreeMap<i32, i32>,
) -> Result<MemberPoints, AppError> {
    let plans = wp_dsl::weekly_plans
        .filter(wp_dsl::instance_id.eq(instance.id))
        .order(wp_dsl::week_start.asc())
        .load::<WeeklyPlanRow>(conn)?;
    let plan_ids: Vec<i64> = plans.iter().map(|plan| plan.id).collect();
    let items = dpi_dsl::daily_plan_items
        .filter(dpi_dsl::plan_id.eq_any(&plan_ids))
        .load::<DailyPlanItemRow>(conn)?;

    let activities: Vec<PlanActivity> = plans
        .iter()
        .map(|plan| {
            let plan_items: Vec<DailyPlanItemRow> = items
                .iter()
                .filter(|item| item.plan_id == plan.id)
                .cloned()
                .collect();
            PlanActivity {
                week_start: plan.week_start,
                has_completed_activity: plan_snapshot(plan, &plan_items).has_completed_work(),
            }
        })
        .collect();
    let is_scoring = lifecycle::is_scoring(&challenge.window(), today, &activities);

    let mut points = 0;
    if is_scoring {
        for plan in &plans {
            let plan_points: i32 = items
                .iter()
                .filter(|item| item.plan_id == plan.id)
                .map(|item| item.points)
                .sum();
            points += plan_points;
            *weekly.entry(plan.week_number).or_insert(0) += plan_points;
        }
    }

    Ok(MemberPoints {
        instance_id: instance.id,
        is_scoring,
        points,
    })
}

fn upsert_entry(
    conn: &mut PgConnection,
    team_id: i64,
    challenge_id: i64,
    week_number: Option<i32>,
    total_points: i32,
) -> Result<(), AppError> {
    let base = tlb_dsl::team_leaderboards
        .filter(tlb_dsl::team_id.eq(team_id))
        .filter(tlb_dsl::challenge_id.eq(challenge_id));
    let existing_id = match week_number {
        Some(week) => base
            .filter(tlb_dsl::week_number.eq(week))
            .select(tlb_dsl::id)
            .first::<i64>(conn)
            .optional()?,
        None => base
            .filter(tlb_dsl::week_number.is_null())
            .select(tlb_dsl::id)
            .first::<i64>(conn)
            .optional()?,
    };

    match existing_id {
        Some(id) => {
            diesel::update(tlb_dsl::team_leaderboards.find(id))
                .set((
                    tlb_dsl::total_points.eq(total_points),
                    tlb_dsl::computed_at.eq(Utc::now()),
                ))
                .execute(conn)?;
        }
        None => {
            diesel::insert_into(tlb_dsl::team_leaderboards)
                .values(&NewLeaderboardEntry {
                    team_id,
                    challenge_id,
                    week_number,
                    total_points,
                })
                .execute(conn)?;
        }
    }
    Ok(())
}
