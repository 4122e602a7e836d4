use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, SessionId};
use crate::value_objects::role::{Role, DUNGEON_MASTER_NAME, OBSERVER_NAME};

/// Who this client is within one session.
///
/// Created when a session view mounts and dropped when it is left. The
/// client id stays `None` until the server assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub session_id: SessionId,
    pub role: Role,
    pub name: Option<String>,
    pub client_id: Option<ClientId>,
}

impl SessionIdentity {
    pub fn dungeon_master(session_id: SessionId) -> Self {
        Self {
            session_id,
            role: Role::DungeonMaster,
            name: Some(DUNGEON_MASTER_NAME.to_string()),
            client_id: None,
        }
    }

    /// A player or observer; the role follows from the chosen name.
    pub fn participant(session_id: SessionId, name: Option<String>) -> Self {
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let role = name
            .as_deref()
            .map(Role::for_participant_name)
            .unwrap_or(Role::Player);
        Self {
            session_id,
            role,
            name,
            client_id: None,
        }
    }

    /// A watcher who asked for the observer seat, whatever name it chose.
    pub fn observer(session_id: SessionId, name: Option<String>) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| OBSERVER_NAME.to_string());
        Self {
            session_id,
            role: Role::Observer,
            name: Some(name),
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: Option<ClientId>) -> Self {
        self.client_id = client_id.filter(|id| !id.is_nil());
        self
    }

    pub fn is_dungeon_master(&self) -> bool {
        self.role == Role::DungeonMaster
    }

    /// Id sent in the join subscription; the nil id asks the server for a new one.
    pub fn subscription_client_id(&self) -> ClientId {
        self.client_id.unwrap_or(ClientId::nil())
    }

    /// Whether a request addressed to `recipients` is meant for this client.
    ///
    /// An empty list or the all-players sentinel addresses everyone. A client
    /// that has not been assigned an id yet trusts the server's routing.
    pub fn is_addressed_by(&self, recipients: &[ClientId]) -> bool {
        if recipients.is_empty() || recipients.contains(&ClientId::ALL_PLAYERS) {
            return true;
        }
        match self.client_id {
            Some(own) => recipients.contains(&own),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_role_follows_name() {
        let session = SessionId::new();
        assert_eq!(
            SessionIdentity::participant(session, Some("Observer".into())).role,
            Role::Observer
        );
        assert_eq!(
            SessionIdentity::participant(session, Some(" Alice ".into())).name.as_deref(),
            Some("Alice")
        );
        assert_eq!(SessionIdentity::participant(session, Some("  ".into())).name, None);
    }

    #[test]
    fn nil_client_id_counts_as_unassigned() {
        let identity = SessionIdentity::dungeon_master(SessionId::new())
            .with_client_id(Some(ClientId::nil()));
        assert_eq!(identity.client_id, None);
        assert!(identity.subscription_client_id().is_nil());
    }

    #[test]
    fn addressing() {
        let me = ClientId::new();
        let other = ClientId::new();
        let identity =
            SessionIdentity::participant(SessionId::new(), Some("Alice".into())).with_client_id(Some(me));

        assert!(identity.is_addressed_by(&[me]));
        assert!(identity.is_addressed_by(&[ClientId::ALL_PLAYERS]));
        assert!(identity.is_addressed_by(&[]));
        assert!(!identity.is_addressed_by(&[other]));
    }
}
