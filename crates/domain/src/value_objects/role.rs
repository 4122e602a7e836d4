use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Display name that marks a participant as a read-only observer.
pub const OBSERVER_NAME: &str = "Observer";

/// Display name a dungeon master joins under.
pub const DUNGEON_MASTER_NAME: &str = "DM";

/// A participant's role in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Monsters and NPCs; never a connected client
    NonPlayer,
    Player,
    DungeonMaster,
    Observer,
}

impl Role {
    /// Role a joining participant takes from their chosen display name.
    pub fn for_participant_name(name: &str) -> Self {
        if name == OBSERVER_NAME {
            Self::Observer
        } else {
            Self::Player
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonPlayer => "non_player",
            Self::Player => "player",
            Self::DungeonMaster => "dungeon_master",
            Self::Observer => "observer",
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "non_player" | "npc" => Ok(Self::NonPlayer),
            "player" => Ok(Self::Player),
            "dungeon_master" | "dm" => Ok(Self::DungeonMaster),
            "observer" => Ok(Self::Observer),
            other => Err(DomainError::parse(format!("Unknown role: {}", other))),
        }
    }
}
