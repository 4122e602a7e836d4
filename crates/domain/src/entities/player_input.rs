use serde::{Deserialize, Serialize};

use crate::ids::ClientId;
use crate::value_objects::{DiceFormula, DiceParseError};

/// A DM's request for one or more players to roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequest {
    /// Die size, e.g. 20 for a d20
    pub dice_type: u32,
    pub client_uuids: Vec<ClientId>,
    pub reason: String,
}

impl RollRequest {
    pub fn new(dice_type: u32, client_uuids: Vec<ClientId>, reason: impl Into<String>) -> Self {
        Self {
            dice_type,
            client_uuids,
            reason: reason.into(),
        }
    }

    pub fn for_all_players(dice_type: u32, reason: impl Into<String>) -> Self {
        Self::new(dice_type, vec![ClientId::ALL_PLAYERS], reason)
    }

    pub fn formula(&self) -> Result<DiceFormula, DiceParseError> {
        DiceFormula::single(self.dice_type)
    }
}

/// A player's answer to a roll request, kept by the server until the DM clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub value: i32,
    pub client_uuid: ClientId,
    pub name: String,
    #[serde(default)]
    pub reason: String,
}

impl PlayerInput {
    pub fn answering(request: &RollRequest, value: i32, client_uuid: ClientId, name: impl Into<String>) -> Self {
        Self {
            value,
            client_uuid,
            name: name.into(),
            reason: request.reason.clone(),
        }
    }
}
