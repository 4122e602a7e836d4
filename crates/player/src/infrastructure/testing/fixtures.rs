//! Small builders shared by unit tests.

use scryer_domain::{Creature, HitPoints, Role};

use crate::ports::outbound::ApiError;

pub fn api_request_failed(msg: &str) -> ApiError {
    ApiError::RequestFailed(msg.to_string())
}

/// An unsaved creature at full health.
pub fn creature(name: &str, initiative: i32, hit_points: i32, role: Role) -> Creature {
    let hp = hit_points.max(0);
    Creature::new(name, initiative, HitPoints::from((hp, hp)), role)
}

pub fn goblin() -> Creature {
    creature("Goblin", 12, 7, Role::NonPlayer)
}
