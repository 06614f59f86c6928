//! Team score aggregation over scoring-eligible member instances.

/// Points contributed by one team member's instance, with its scoring
/// eligibility already evaluated (see `lifecycle::is_scoring`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberPoints {
    pub instance_id: i64,
    pub is_scoring: bool,
    pub points: i32,
}

/// Sum of points across scoring members only.
pub fn team_total(members: &[MemberPoints]) -> i32 {
    members
        .iter()
        .filter(|member| member.is_scoring)
        .map(|member| member.points)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_scoring_members_are_skipped() {
        let members = [
            MemberPoints {
                instance_id: 1,
                is_scoring: true,
                points: 50,
            },
            MemberPoints {
                instance_id: 2,
                is_scoring: false,
                points: 50,
            },
        ];
        assert_eq!(team_total(&members), 50);
    }

    #[test]
    fn empty_team_scores_zero() {
        assert_eq!(team_total(&[]), 0);
    }
}
