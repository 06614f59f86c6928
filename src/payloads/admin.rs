use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct CreateChallengePayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// One of "team", "mini" or "individual".
    pub challenge_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub signup_opens_date: Option<NaiveDate>,
    pub signup_deadline: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub leaderboard_visible: bool,
    pub leaderboard_visible_date: Option<NaiveDate>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub template_ids: Vec<i64>,
    pub default_template_id: Option<i64>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug)]
pub struct ModifyChallengePayload {
    pub challenge_id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub signup_opens_date: Option<NaiveDate>,
    pub signup_deadline: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub is_visible: Option<bool>,
    pub leaderboard_visible: Option<bool>,
    pub leaderboard_visible_date: Option<NaiveDate>,
    pub default_template_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct SetWeekUnlockPayload {
    pub challenge_id: i64,
    pub week_number: i32,
    #[serde(default)]
    pub is_unlocked: bool,
    pub unlock_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
pub struct CreateTeamPayload {
    pub name: String,
    #[serde(default)]
    pub leader_user_ids: Vec<i64>,
}

#[derive(Deserialize, Debug)]
pub struct SetTeamLeadersPayload {
    pub team_id: i64,
    pub leader_user_ids: Vec<i64>,
}

#[derive(Deserialize, Debug)]
pub struct AddTeamMemberPayload {
    pub team_id: i64,
    pub instance_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct AssignTeamLeaderPayload {
    pub user_id: i64,
    pub challenge_id: i64,
    pub team_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct LookupClassParams {
    /// Bare class identifier or any accepted catalog URL shape.
    pub reference: String,
}

#[derive(Deserialize, Debug)]
pub struct EnqueueMissingClassesPayload {
    pub references: Vec<String>,
}
