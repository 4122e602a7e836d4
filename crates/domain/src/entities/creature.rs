use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::CreatureId;
use crate::value_objects::{HealthDescription, HitPoints, Role};

/// A combatant in a session's initiative order.
///
/// `creature_id` is nil until the server has stored the creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    #[serde(default = "CreatureId::nil")]
    pub creature_id: CreatureId,
    pub name: String,
    pub initiative: i32,
    pub hit_points: HitPoints,
    pub role: Role,
    /// Rules-API condition indexes, e.g. "poisoned"
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Rules-API or custom monster index this creature was built from
    #[serde(default)]
    pub monster: Option<String>,
}

impl Creature {
    pub fn new(name: impl Into<String>, initiative: i32, hit_points: HitPoints, role: Role) -> Self {
        Self {
            creature_id: CreatureId::nil(),
            name: name.into(),
            initiative,
            hit_points,
            role,
            conditions: Vec::new(),
            monster: None,
        }
    }

    pub fn with_conditions(mut self, conditions: Vec<String>) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_monster(mut self, monster: impl Into<String>) -> Self {
        self.monster = Some(monster.into());
        self
    }

    pub fn is_stored(&self) -> bool {
        !self.creature_id.is_nil()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("creature name cannot be empty"));
        }
        Ok(())
    }

    pub fn health(&self) -> HealthDescription {
        self.hit_points.description()
    }

    /// Positive values heal, negative values damage.
    pub fn adjust_hit_points(&mut self, delta: i32) {
        self.hit_points = self.hit_points.adjust(delta);
    }

    /// Adds the condition if absent, removes it otherwise. Returns whether it is now held.
    pub fn toggle_condition(&mut self, condition: &str) -> bool {
        if let Some(pos) = self.conditions.iter().position(|c| c == condition) {
            self.conditions.remove(pos);
            false
        } else {
            self.conditions.push(condition.to_string());
            true
        }
    }
}
