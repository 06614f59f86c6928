use crate::engine::Decision;
use crate::engine::scoring::{ItemSnapshot, PlanSnapshot};
use crate::schema::{daily_plan_items, weekly_plans};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Serialize;

#[derive(Insertable, Debug)]
#[diesel(table_name = weekly_plans)]
pub struct NewWeeklyPlan {
    pub instance_id: i64,
    pub week_start: NaiveDate,
    pub week_number: i32,
    pub core_workout_count: i32,
    pub is_completed: bool,
}

#[derive(Queryable, Debug, Clone)]
pub struct WeeklyPlanRow {
    pub id: i64,
    pub instance_id: i64,
    pub week_start: NaiveDate,
    pub week_number: i32,
    pub core_workout_count: i32,
    pub is_completed: bool,
}

#[derive(Insertable, Debug, Default)]
#[diesel(table_name = daily_plan_items)]
pub struct NewDailyPlanItem {
    pub plan_id: i64,
    pub day_of_week: i16,
    pub is_bonus: bool,
    pub points: i32,
    pub bonus_points: i32,
    pub ride_url: Option<String>,
    pub run_url: Option<String>,
    pub yoga_url: Option<String>,
    pub strength_url: Option<String>,
    pub ride_done: bool,
    pub run_done: bool,
    pub yoga_done: bool,
    pub strength_done: bool,
    pub exercise_done: bool,
}

#[derive(Queryable, Debug, Clone)]
pub struct DailyPlanItemRow {
    pub id: i64,
    pub plan_id: i64,
    pub day_of_week: i16,
    pub is_bonus: bool,
    pub points: i32,
    pub bonus_points: i32,
    pub ride_url: Option<String>,
    pub run_url: Option<String>,
    pub yoga_url: Option<String>,
    pub strength_url: Option<String>,
    pub ride_done: bool,
    pub run_done: bool,
    pub yoga_done: bool,
    pub strength_done: bool,
    pub exercise_done: bool,
}

impl DailyPlanItemRow {
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            day_of_week: self.day_of_week,
            is_bonus: self.is_bonus,
            bonus_points: self.bonus_points,
            has_ride: self.ride_url.is_some(),
            has_run: self.run_url.is_some(),
            has_yoga: self.yoga_url.is_some(),
            has_strength: self.strength_url.is_some(),
            ride_done: self.ride_done,
            run_done: self.run_done,
            yoga_done: self.yoga_done,
            strength_done: self.strength_done,
            exercise_done: self.exercise_done,
        }
    }
}

pub fn plan_snapshot(plan: &WeeklyPlanRow, items: &[DailyPlanItemRow]) -> PlanSnapshot {
    PlanSnapshot {
        core_workout_count: plan.core_workout_count,
        items: items.iter().map(DailyPlanItemRow::snapshot).collect(),
    }
}

#[derive(Queryable, Debug, Clone)]
pub struct WorkoutAssignmentRow {
    pub id: i64,
    pub challenge_id: i64,
    pub template_id: i64,
    pub week_number: i32,
    pub day_of_week: i16,
    pub activity_type: String,
    pub class_ref: String,
    pub points: i32,
    pub alternative_group: i32,
    pub order_in_group: i32,
}

#[derive(Queryable, Debug, Clone)]
pub struct BonusWorkoutRow {
    pub id: i64,
    pub challenge_id: i64,
    pub week_number: i32,
    pub activity_type: String,
    pub points: i32,
    pub class_ref: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ToggleOutcome {
    pub decision: Decision,
    pub points_awarded: i32,
    pub unchecked_item_ids: Vec<i64>,
    pub plan_completed: bool,
}

#[derive(Serialize, Debug)]
pub struct WeekAccess {
    pub plan_id: i64,
    pub week_number: i32,
    pub decision: Decision,
}
