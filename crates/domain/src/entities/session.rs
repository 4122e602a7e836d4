use serde::{Deserialize, Serialize};

use crate::ids::{GroupId, SessionId};

/// One combat-tracking instance shared by a DM and their players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_uuid: SessionId,
    #[serde(default)]
    pub session_name: String,
    #[serde(default)]
    pub session_description: String,
}

/// Body of a session creation request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewSession {
    pub session_name: String,
    pub session_description: String,
}

/// A DM's prepared stash of creatures, added to the order in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGroup {
    #[serde(default = "GroupId::nil")]
    pub group_uuid: GroupId,
    pub group_name: String,
}

impl SessionGroup {
    pub fn named(group_name: impl Into<String>) -> Self {
        Self {
            group_uuid: GroupId::nil(),
            group_name: group_name.into(),
        }
    }
}
