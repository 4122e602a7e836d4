//! Persisted identity per session.
//!
//! The server-assigned client id and the chosen display name are kept per
//! session, so rejoining a session reclaims the same seat.

use std::sync::Arc;

use scryer_domain::{ClientId, Role, SessionId, SessionIdentity, DUNGEON_MASTER_NAME};

use crate::ports::outbound::{storage_keys, StorageProvider};

#[derive(Clone)]
pub struct IdentityStore {
    storage: Arc<dyn StorageProvider>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self { storage }
    }

    fn key(session_id: SessionId, key: &str) -> String {
        storage_keys::scoped(&session_id.to_string(), key)
    }

    /// Identity for mounting a session view with `role`.
    ///
    /// Participants take their stored name. A requested observer seat is
    /// kept as such; otherwise the role follows from the name.
    pub fn load(&self, session_id: SessionId, role: Role) -> SessionIdentity {
        let identity = match role {
            Role::DungeonMaster => SessionIdentity::dungeon_master(session_id),
            Role::Observer => SessionIdentity::observer(session_id, self.name(session_id)),
            Role::Player | Role::NonPlayer => {
                SessionIdentity::participant(session_id, self.name(session_id))
            }
        };
        identity.with_client_id(self.client_id(session_id))
    }

    pub fn client_id(&self, session_id: SessionId) -> Option<ClientId> {
        let raw = self.storage.load(&Self::key(session_id, storage_keys::CLIENT_ID))?;
        match raw.parse::<ClientId>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(session = %session_id, "Discarding stored client id: {}", e);
                None
            }
        }
    }

    pub fn save_client_id(&self, session_id: SessionId, client_id: ClientId) {
        self.storage.save(
            &Self::key(session_id, storage_keys::CLIENT_ID),
            &client_id.to_string(),
        );
    }

    pub fn name(&self, session_id: SessionId) -> Option<String> {
        self.storage
            .load(&Self::key(session_id, storage_keys::PLAYER_NAME))
    }

    /// Store the name a participant joins under; blank clears it.
    pub fn save_name(&self, session_id: SessionId, name: &str) {
        let key = Self::key(session_id, storage_keys::PLAYER_NAME);
        let name = name.trim();
        if name.is_empty() {
            self.storage.remove(&key);
        } else {
            self.storage.save(&key, name);
        }
    }

    /// Record the DM seat for a session the DM just opened.
    pub fn save_dungeon_master(&self, session_id: SessionId) {
        self.save_name(session_id, DUNGEON_MASTER_NAME);
        self.remember_session(session_id);
    }

    pub fn remember_session(&self, session_id: SessionId) {
        self.storage
            .save(storage_keys::SESSION, &session_id.to_string());
    }

    pub fn last_session(&self) -> Option<SessionId> {
        self.storage.load(storage_keys::SESSION)?.parse().ok()
    }

    /// Forget everything stored for a session.
    pub fn clear(&self, session_id: SessionId) {
        self.storage
            .remove(&Self::key(session_id, storage_keys::CLIENT_ID));
        self.storage
            .remove(&Self::key(session_id, storage_keys::PLAYER_NAME));
        if self.last_session() == Some(session_id) {
            self.storage.remove(storage_keys::SESSION);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::platform::MemoryStorageProvider;

    fn store() -> (IdentityStore, MemoryStorageProvider) {
        let storage = MemoryStorageProvider::new();
        (IdentityStore::new(Arc::new(storage.clone())), storage)
    }

    #[test]
    fn keys_are_scoped_per_session() {
        let (store, storage) = store();
        let session = SessionId::new();
        let id = ClientId::new();

        store.save_client_id(session, id);
        assert_eq!(
            storage.load(&format!("{}/clientId", session)),
            Some(id.to_string())
        );
        assert_eq!(store.client_id(SessionId::new()), None);
    }

    #[test]
    fn participant_identity_from_storage() {
        let (store, _) = store();
        let session = SessionId::new();
        let id = ClientId::new();
        store.save_name(session, " Observer ");
        store.save_client_id(session, id);

        let identity = store.load(session, Role::Player);
        assert_eq!(identity.role, Role::Observer);
        assert_eq!(identity.name.as_deref(), Some("Observer"));
        assert_eq!(identity.client_id, Some(id));
    }

    #[test]
    fn no_name_means_unnamed_player() {
        let (store, _) = store();
        let identity = store.load(SessionId::new(), Role::Player);
        assert_eq!(identity.role, Role::Player);
        assert_eq!(identity.name, None);
        assert_eq!(identity.client_id, None);
    }

    #[test]
    fn requested_observer_seat_is_kept() {
        let (store, _) = store();
        let session = SessionId::new();

        let unnamed = store.load(session, Role::Observer);
        assert_eq!(unnamed.role, Role::Observer);
        assert_eq!(unnamed.name.as_deref(), Some("Observer"));

        store.save_name(session, "Bob");
        let named = store.load(session, Role::Observer);
        assert_eq!(named.role, Role::Observer);
        assert_eq!(named.name.as_deref(), Some("Bob"));
    }

    #[test]
    fn garbage_client_id_is_ignored() {
        let (store, storage) = store();
        let session = SessionId::new();
        storage.save(&format!("{}/clientId", session), "not-a-uuid");
        assert_eq!(store.client_id(session), None);
    }

    #[test]
    fn clear_forgets_the_session() {
        let (store, storage) = store();
        let session = SessionId::new();
        store.save_dungeon_master(session);
        store.save_client_id(session, ClientId::new());
        assert_eq!(store.last_session(), Some(session));

        store.clear(session);
        assert!(storage.is_empty());
    }
}
