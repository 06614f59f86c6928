//! Pure business rules for challenge participation, scoring and plan
//! generation. Nothing in this module touches the database or the clock:
//! callers load snapshots, pass in "today", and persist whatever the rules
//! decide.

use serde::Serialize;

pub mod class_ref;
pub mod lifecycle;
pub mod schedule;
pub mod scoring;
pub mod team_score;
pub mod week_gate;

/// Outcome of a business-rule check. Denials are expected, frequent results
/// and carry the user-facing reason; they are never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl Decision {
    pub fn allow() -> Self {
        Decision {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Decision {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}
