use crate::engine::Decision;
use crate::engine::lifecycle::{ChallengeWindow, InstanceState};
use crate::schema::{challenge_categories, challenge_instances, challenge_templates, challenge_week_unlocks, challenges};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Insertable, Debug)]
#[diesel(table_name = challenges)]
pub struct NewChallenge {
    pub name: String,
    pub description: String,
    pub challenge_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub signup_opens_date: Option<NaiveDate>,
    pub signup_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub is_visible: bool,
    pub leaderboard_visible: bool,
    pub leaderboard_visible_date: Option<NaiveDate>,
    pub default_template_id: Option<i64>,
    // created_at and updated_at have DB defaults (CURRENT_TIMESTAMP)
}

#[derive(Queryable, Debug, Clone)]
pub struct ChallengeRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub challenge_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub signup_opens_date: Option<NaiveDate>,
    pub signup_deadline: Option<NaiveDate>,
    pub is_active: bool,
    pub is_visible: bool,
    pub leaderboard_visible: bool,
    pub leaderboard_visible_date: Option<NaiveDate>,
    pub default_template_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChallengeRow {
    pub fn window(&self) -> ChallengeWindow {
        ChallengeWindow {
            start_date: self.start_date,
            end_date: self.end_date,
            signup_opens_date: self.signup_opens_date,
            signup_deadline: self.signup_deadline,
            is_active: self.is_active,
            is_visible: self.is_visible,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = challenge_categories)]
pub struct NewChallengeCategory {
    pub challenge_id: i64,
    pub category: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = challenge_templates)]
pub struct NewChallengeTemplate {
    pub challenge_id: i64,
    pub template_id: i64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = challenge_instances)]
pub struct NewChallengeInstance {
    pub user_id: i64,
    pub challenge_id: i64,
    pub template_id: Option<i64>,
    pub include_kegels: bool,
    pub state: String,
    // started_at has a DB default (CURRENT_TIMESTAMP), completed_at is NULL
}

#[derive(Queryable, Debug, Clone)]
pub struct InstanceRow {
    pub id: i64,
    pub user_id: i64,
    pub challenge_id: i64,
    pub template_id: Option<i64>,
    pub include_kegels: bool,
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InstanceRow {
    pub fn state(&self) -> Option<InstanceState> {
        InstanceState::parse(&self.state)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = challenge_week_unlocks)]
pub struct NewWeekUnlock {
    pub challenge_id: i64,
    pub week_number: i32,
    pub is_unlocked: bool,
    pub unlock_date: Option<NaiveDate>,
}

#[derive(Queryable, Debug, Clone)]
pub struct WeekUnlockRow {
    pub id: i64,
    pub challenge_id: i64,
    pub week_number: i32,
    pub is_unlocked: bool,
    pub unlock_date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChallengeSummary {
    pub id: i64,
    pub name: String,
    pub challenge_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_weeks: i64,
    pub can_signup: bool,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InstanceSummary {
    pub id: i64,
    pub challenge_id: i64,
    pub state: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result of join/retake: the business decision plus, when allowed, the
/// created instance and the number of weekly plans generated for it.
#[derive(Serialize, Debug)]
pub struct JoinOutcome {
    pub decision: Decision,
    pub instance_id: Option<i64>,
    pub plans_generated: usize,
}
