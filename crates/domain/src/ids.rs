use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The all-zero id. Used on the wire for "not yet assigned".
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }

            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    DomainError::invalid_id(format!(
                        "{} '{}': {}",
                        stringify!($name),
                        s,
                        e
                    ))
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Session scoped ids
define_id!(SessionId);
define_id!(ClientId);

// Tracker content
define_id!(CreatureId);
define_id!(GroupId);
define_id!(MonsterId);

impl ClientId {
    /// Recipient sentinel addressing every player in the session.
    pub const ALL_PLAYERS: ClientId = ClientId::nil();
}

impl From<ClientId> for CreatureId {
    /// A participant's client id doubles as the id of their creature.
    fn from(value: ClientId) -> Self {
        CreatureId::from_uuid(value.to_uuid())
    }
}

impl From<CreatureId> for ClientId {
    fn from(value: CreatureId) -> Self {
        ClientId::from_uuid(value.to_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_id_serializes_as_empty_guid() {
        let json = serde_json::to_string(&ClientId::ALL_PLAYERS).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<SessionId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = SessionId::new();
        let parsed: SessionId = format!("  {}  ", id).parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn client_and_creature_ids_share_uuid() {
        let client = ClientId::new();
        let creature: CreatureId = client.into();
        assert_eq!(creature.to_uuid(), client.to_uuid());
    }
}
