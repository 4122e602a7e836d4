//! Session Service - sessions and the per-session exchange with players
//!
//! Covers session lifecycle, roll requests and the answers players store,
//! messages, and the initiative marker.

use scryer_domain::{
    CreatureId, DomainError, NewSession, PlayerInput, PlayerMessage, RollRequest, Session,
    SessionId,
};
use scryer_shared::{InitiativeTop, StoredPlayerInput};

use crate::application::api::Api;
use crate::application::ServiceError;

#[derive(Clone)]
pub struct SessionService {
    api: Api,
}

fn session_path(session_id: SessionId) -> String {
    format!("/sessions/{}", session_id)
}

impl SessionService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, ServiceError> {
        Ok(self.api.get("/sessions").await?)
    }

    /// The server answers with a one-element list; a 404 or empty list is `None`.
    pub async fn get_session(&self, session_id: SessionId) -> Result<Option<Session>, ServiceError> {
        let found: Option<Vec<Session>> = self.api.get_optional(&session_path(session_id)).await?;
        Ok(found.and_then(|sessions| sessions.into_iter().next()))
    }

    pub async fn create_session(&self, new_session: &NewSession) -> Result<Session, ServiceError> {
        if new_session.session_name.trim().is_empty() {
            return Err(DomainError::validation("session name cannot be empty").into());
        }
        Ok(self.api.post("/sessions/", new_session).await?)
    }

    /// Ends the session for everyone; connected clients receive `end_session`.
    pub async fn end_session(&self, session_id: SessionId) -> Result<(), ServiceError> {
        Ok(self.api.post_empty(&session_path(session_id)).await?)
    }

    pub async fn delete_session(&self, session_id: SessionId) -> Result<(), ServiceError> {
        Ok(self.api.delete(&session_path(session_id)).await?)
    }

    pub async fn get_player_inputs(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<PlayerInput>, ServiceError> {
        let path = format!("{}/player-input", session_path(session_id));
        let stored: Vec<StoredPlayerInput> = self.api.get(&path).await?;
        Ok(stored.into_iter().map(PlayerInput::from).collect())
    }

    pub async fn add_player_input(
        &self,
        session_id: SessionId,
        input: &PlayerInput,
    ) -> Result<(), ServiceError> {
        let path = format!("{}/player-input", session_path(session_id));
        Ok(self.api.post_no_response(&path, input).await?)
    }

    pub async fn clear_player_inputs(&self, session_id: SessionId) -> Result<(), ServiceError> {
        let path = format!("{}/player-input", session_path(session_id));
        Ok(self.api.delete(&path).await?)
    }

    pub async fn request_roll(
        &self,
        session_id: SessionId,
        request: &RollRequest,
    ) -> Result<(), ServiceError> {
        request.formula().map_err(DomainError::from)?;
        let path = format!("{}/request-roll", session_path(session_id));
        Ok(self.api.post_no_response(&path, request).await?)
    }

    /// Chat messages and DM secrets travel the same way.
    pub async fn send_message(
        &self,
        session_id: SessionId,
        message: &PlayerMessage,
    ) -> Result<(), ServiceError> {
        if message.message.trim().is_empty() {
            return Err(DomainError::validation("message cannot be empty").into());
        }
        let path = format!("{}/message", session_path(session_id));
        Ok(self.api.post_no_response(&path, message).await?)
    }

    /// Move the turn marker; `None` puts it back at the top of the order.
    pub async fn set_initiative_top(
        &self,
        session_id: SessionId,
        creature_id: Option<CreatureId>,
    ) -> Result<(), ServiceError> {
        let path = format!("{}/initiative-top", session_path(session_id));
        Ok(self
            .api
            .patch_no_response(&path, &InitiativeTop { creature_id })
            .await?)
    }
}
