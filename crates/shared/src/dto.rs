//! REST request and response bodies that are not domain entities themselves.

use serde::{Deserialize, Serialize};

use scryer_domain::{Creature, CreatureId, PlayerInput};

/// Body for adding several creatures to a group at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleCharacters {
    pub characters: Vec<Creature>,
}

/// Moves the initiative marker; `None` resets it to the top of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeTop {
    pub creature_id: Option<CreatureId>,
}

/// A stored player answer as listed by the session.
///
/// Servers return either the bare input or the event that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredPlayerInput {
    Event { event_body: PlayerInput },
    Bare(PlayerInput),
}

impl From<StoredPlayerInput> for PlayerInput {
    fn from(stored: StoredPlayerInput) -> Self {
        match stored {
            StoredPlayerInput::Event { event_body } => event_body,
            StoredPlayerInput::Bare(input) => input,
        }
    }
}
