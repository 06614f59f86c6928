//! Points computation for toggling activities on a weekly plan, plus the
//! exclusivity rules between alternative workouts (same day) and bonus
//! workouts (whole week).

const EDGE_DAY_POINTS: i32 = 50;
const INTERIOR_DAY_POINTS: i32 = 25;

/// Snapshot of one daily plan item, detached from the database row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub id: i64,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i16,
    pub is_bonus: bool,
    /// Configured award for a bonus item; zero on core items.
    pub bonus_points: i32,
    pub has_ride: bool,
    pub has_run: bool,
    pub has_yoga: bool,
    pub has_strength: bool,
    pub ride_done: bool,
    pub run_done: bool,
    pub yoga_done: bool,
    pub strength_done: bool,
    pub exercise_done: bool,
}

impl ItemSnapshot {
    /// Whether any ride/run/yoga/strength target class is assigned.
    pub fn has_target(&self) -> bool {
        self.has_ride || self.has_run || self.has_yoga || self.has_strength
    }

    pub fn any_activity_done(&self) -> bool {
        self.ride_done || self.run_done || self.yoga_done || self.strength_done
    }

    /// A completed activity that actually had a target class assigned.
    pub fn completed_assigned_activity(&self) -> bool {
        (self.ride_done && self.has_ride)
            || (self.run_done && self.has_run)
            || (self.yoga_done && self.has_yoga)
            || (self.strength_done && self.has_strength)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlanSnapshot {
    /// 3 or 4 depending on the template shape; anything else falls back to
    /// a flat 50 points per workout day.
    pub core_workout_count: i32,
    pub items: Vec<ItemSnapshot>,
}

impl PlanSnapshot {
    /// Sorted distinct days (0-6) carrying at least one assigned core
    /// activity. Bonus items never count as workout days, whatever they
    /// carry; only core days participate in the day-position pricing.
    pub fn workout_days(&self) -> Vec<i16> {
        let mut days: Vec<i16> = self
            .items
            .iter()
            .filter(|item| !item.is_bonus && item.has_target())
            .map(|item| item.day_of_week)
            .collect();
        days.sort_unstable();
        days.dedup();
        days
    }

    /// Whether any work on this plan has been completed: an exercise item,
    /// an assigned activity, or a bonus workout.
    pub fn has_completed_work(&self) -> bool {
        self.items.iter().any(|item| {
            item.exercise_done
                || item.completed_assigned_activity()
                || (item.is_bonus && item.any_activity_done())
        })
    }

    /// Whether every workout day has at least one completed activity.
    pub fn all_workout_days_done(&self) -> bool {
        let days = self.workout_days();
        !days.is_empty() && days.iter().all(|day| day_points(self, *day) > 0)
    }
}

fn points_for_position(core_workout_count: i32, position: usize, day_count: usize) -> i32 {
    match core_workout_count {
        4 if position > 0 && position + 1 < day_count => INTERIOR_DAY_POINTS,
        _ => EDGE_DAY_POINTS,
    }
}

/// Points for toggling `item` on its plan. Unchecking never awards points.
/// Bonus items award their own configured points; core items use the
/// day-position formula, and days outside the plan's workout days score
/// zero.
pub fn calculate_points(plan: &PlanSnapshot, item: &ItemSnapshot, checking: bool) -> i32 {
    if !checking {
        return 0;
    }
    if item.is_bonus {
        return item.bonus_points;
    }
    let days = plan.workout_days();
    match days.iter().position(|day| *day == item.day_of_week) {
        Some(position) => points_for_position(plan.core_workout_count, position, days.len()),
        None => 0,
    }
}

/// Points earned for `day`: zero unless some activity on that day is done,
/// otherwise the day-position formula. Which specific activity was completed
/// does not matter; exclusivity guarantees at most one per day.
pub fn day_points(plan: &PlanSnapshot, day: i16) -> i32 {
    let any_done = plan
        .items
        .iter()
        .any(|item| item.day_of_week == day && !item.is_bonus && item.any_activity_done());
    if !any_done {
        return 0;
    }
    let days = plan.workout_days();
    match days.iter().position(|d| *d == day) {
        Some(position) => points_for_position(plan.core_workout_count, position, days.len()),
        None => 0,
    }
}

/// IDs of the items that must be unchecked when `item` is checked.
///
/// Bonus items exclude every other bonus item in the plan, whatever the day;
/// non-bonus items exclude the other non-bonus items sharing their day. The
/// two domains never overlap.
pub fn exclusive_unchecks(plan: &PlanSnapshot, item: &ItemSnapshot) -> Vec<i64> {
    plan.items
        .iter()
        .filter(|other| other.id != item.id)
        .filter(|other| {
            if item.is_bonus {
                other.is_bonus
            } else {
                !other.is_bonus && other.day_of_week == item.day_of_week
            }
        })
        .map(|other| other.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, day: i16) -> ItemSnapshot {
        ItemSnapshot {
            id,
            day_of_week: day,
            has_ride: true,
            ..ItemSnapshot::default()
        }
    }

    fn plan(core: i32, days: &[i16]) -> PlanSnapshot {
        PlanSnapshot {
            core_workout_count: core,
            items: days
                .iter()
                .enumerate()
                .map(|(i, day)| item(i as i64 + 1, *day))
                .collect(),
        }
    }

    #[test]
    fn three_core_awards_fifty_everywhere() {
        let plan = plan(3, &[1, 3, 5]);
        for it in &plan.items {
            assert_eq!(calculate_points(&plan, it, true), 50);
        }
    }

    #[test]
    fn four_core_edges_fifty_interior_twenty_five() {
        // Workout days Mon, Wed, Fri, Sun (sorted: 0, 1, 3, 5).
        let plan = plan(4, &[1, 3, 5, 0]);
        let by_day = |day: i16| {
            let it = plan.items.iter().find(|i| i.day_of_week == day).unwrap();
            calculate_points(&plan, it, true)
        };
        assert_eq!(by_day(0), 50); // first workout day
        assert_eq!(by_day(1), 25);
        assert_eq!(by_day(3), 25);
        assert_eq!(by_day(5), 50); // last workout day
    }

    #[test]
    fn bonus_with_target_does_not_shift_four_core_pricing() {
        // Core days Mon, Wed, Fri, Sat plus a Sunday bonus carrying a
        // target URL. The bonus must not claim the first edge slot.
        let mut plan = plan(4, &[1, 3, 5, 6]);
        plan.items.push(ItemSnapshot {
            id: 10,
            day_of_week: 0,
            is_bonus: true,
            bonus_points: 30,
            has_ride: true,
            ..ItemSnapshot::default()
        });

        assert_eq!(plan.workout_days(), vec![1, 3, 5, 6]);
        let by_day = |day: i16| {
            let it = plan
                .items
                .iter()
                .find(|i| i.day_of_week == day && !i.is_bonus)
                .unwrap();
            calculate_points(&plan, it, true)
        };
        assert_eq!(by_day(1), 50);
        assert_eq!(by_day(3), 25);
        assert_eq!(by_day(5), 25);
        assert_eq!(by_day(6), 50);

        // The bonus awards its configured points, never the edge award.
        let bonus = plan.items.iter().find(|i| i.is_bonus).unwrap();
        assert_eq!(calculate_points(&plan, bonus, true), 30);
        assert_eq!(calculate_points(&plan, bonus, false), 0);
    }

    #[test]
    fn unchecking_awards_zero() {
        let plan = plan(3, &[1, 3, 5]);
        assert_eq!(calculate_points(&plan, &plan.items[0], false), 0);
    }

    #[test]
    fn non_workout_day_awards_zero() {
        let plan = plan(3, &[1, 3, 5]);
        let stray = ItemSnapshot {
            id: 99,
            day_of_week: 6,
            ..ItemSnapshot::default()
        };
        assert_eq!(calculate_points(&plan, &stray, true), 0);
    }

    #[test]
    fn unknown_core_count_defaults_to_fifty() {
        let plan = plan(5, &[0, 2, 4, 6]);
        for it in &plan.items {
            assert_eq!(calculate_points(&plan, it, true), 50);
        }
    }

    #[test]
    fn day_points_requires_completed_activity() {
        let mut plan = plan(3, &[1, 3, 5]);
        assert_eq!(day_points(&plan, 1), 0);
        plan.items[0].ride_done = true;
        assert_eq!(day_points(&plan, 1), 50);
        assert_eq!(day_points(&plan, 3), 0);
    }

    #[test]
    fn checking_non_bonus_excludes_same_day_alternatives() {
        let mut plan = plan(3, &[1, 1, 3]);
        plan.items.push(ItemSnapshot {
            id: 10,
            day_of_week: 1,
            is_bonus: true,
            ..ItemSnapshot::default()
        });
        let unchecks = exclusive_unchecks(&plan, &plan.items[0]);
        // The other day-1 alternative, but not the day-3 item or the bonus.
        assert_eq!(unchecks, vec![2]);
    }

    #[test]
    fn checking_bonus_excludes_other_bonuses_across_week() {
        let mut plan = plan(3, &[1, 3]);
        plan.items.push(ItemSnapshot {
            id: 10,
            day_of_week: 1,
            is_bonus: true,
            ..ItemSnapshot::default()
        });
        plan.items.push(ItemSnapshot {
            id: 11,
            day_of_week: 5,
            is_bonus: true,
            ..ItemSnapshot::default()
        });
        let bonus = plan.items.iter().find(|i| i.id == 10).unwrap();
        assert_eq!(exclusive_unchecks(&plan, bonus), vec![11]);
    }

    #[test]
    fn empty_plan_scores_zero_not_error() {
        let plan = PlanSnapshot {
            core_workout_count: 3,
            items: vec![],
        };
        assert_eq!(day_points(&plan, 2), 0);
        assert!(!plan.has_completed_work());
    }
}
