use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct JoinChallengePayload {
    pub user_id: i64,
    pub challenge_id: i64,
    pub template_id: Option<i64>,
    #[serde(default)]
    pub include_kegels: bool,
}

#[derive(Deserialize, Debug)]
pub struct LeaveChallengePayload {
    pub user_id: i64,
    pub instance_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct CompleteChallengePayload {
    pub user_id: i64,
    pub instance_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct HideChallengePayload {
    pub user_id: i64,
    pub instance_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct RetakeChallengePayload {
    pub user_id: i64,
    pub challenge_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct ToggleActivityPayload {
    pub user_id: i64,
    pub item_id: i64,
    /// One of "ride", "run", "yoga", "strength" or "exercise".
    pub activity: String,
    pub checking: bool,
}

#[derive(Deserialize, Debug)]
pub struct GetWeekAccessParams {
    pub user_id: i64,
    pub plan_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct GetMyChallengesParams {
    pub user_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct VolunteerTeamLeadPayload {
    pub user_id: i64,
    pub challenge_id: i64,
}
