use crate::schema::{team_leader_volunteers, team_leaderboards, team_leaders, team_members, teams};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;

/// A team carries one primary leader and up to two co-leaders, stored as an
/// ordered collection.
pub const MAX_TEAM_LEADERS: usize = 3;

pub const VOLUNTEER_PENDING: &str = "pending";
pub const VOLUNTEER_ASSIGNED: &str = "assigned";

#[derive(Insertable, Debug)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub name: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = team_leaders)]
pub struct NewTeamLeader {
    pub team_id: i64,
    pub position: i16,
    pub user_id: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub team_id: i64,
    pub instance_id: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = team_leader_volunteers)]
pub struct NewVolunteer {
    pub user_id: i64,
    pub challenge_id: i64,
    pub status: String,
    // created_at has a DB default (CURRENT_TIMESTAMP)
}

#[derive(Queryable, Debug, Clone)]
pub struct VolunteerRow {
    pub id: i64,
    pub user_id: i64,
    pub challenge_id: i64,
    pub status: String,
    pub assigned_team_id: Option<i64>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = team_leaderboards)]
pub struct NewLeaderboardEntry {
    pub team_id: i64,
    pub challenge_id: i64,
    pub week_number: Option<i32>,
    pub total_points: i32,
    // computed_at has a DB default (CURRENT_TIMESTAMP)
}

#[derive(Serialize, Debug, Default)]
pub struct RecomputeReport {
    pub challenges_processed: usize,
    pub teams_processed: usize,
    pub entries_written: usize,
}
