//! Character Service - creatures in a session's initiative order
//!
//! Thin REST wrappers; callers re-fetch the list after every mutation.

use scryer_domain::{Creature, CreatureId, DomainError, RootFilter, SessionId};
use scryer_shared::MultipleCharacters;

use crate::application::api::Api;
use crate::application::ServiceError;

#[derive(Clone)]
pub struct CharacterService {
    api: Api,
}

fn characters_path(session_id: SessionId) -> String {
    format!("/characters/{}", session_id)
}

/// `?filter=<json>`, percent-encoded.
fn filter_query(filter: &RootFilter) -> Result<String, ServiceError> {
    let json = serde_json::to_string(filter)
        .map_err(|e| DomainError::filter(format!("unserializable filter: {}", e)))?;
    let encoded: String = url::form_urlencoded::byte_serialize(json.as_bytes()).collect();
    Ok(format!("?filter={}", encoded))
}

fn stored_id(creature: &Creature) -> Result<CreatureId, ServiceError> {
    if creature.is_stored() {
        Ok(creature.creature_id)
    } else {
        Err(DomainError::validation(format!("{} has not been saved yet", creature.name)).into())
    }
}

impl CharacterService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Every creature in the session, optionally narrowed server-side.
    pub async fn get_characters(
        &self,
        session_id: SessionId,
        filter: Option<&RootFilter>,
    ) -> Result<Vec<Creature>, ServiceError> {
        let mut path = characters_path(session_id);
        if let Some(filter) = filter.filter(|f| !f.filters.is_empty()) {
            path.push_str(&filter_query(filter)?);
        }
        Ok(self.api.get(&path).await?)
    }

    /// The order as players see it.
    pub async fn get_initiative_order(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<Creature>, ServiceError> {
        let path = format!("{}/initiative", characters_path(session_id));
        Ok(self.api.get(&path).await?)
    }

    pub async fn add_character(
        &self,
        session_id: SessionId,
        creature: &Creature,
    ) -> Result<(), ServiceError> {
        creature.validate()?;
        self.api
            .post_no_response(&characters_path(session_id), creature)
            .await?;
        Ok(())
    }

    /// Add several creatures in one request; each is stored under a fresh id.
    pub async fn add_characters(
        &self,
        session_id: SessionId,
        creatures: Vec<Creature>,
    ) -> Result<(), ServiceError> {
        for creature in &creatures {
            creature.validate()?;
        }
        let path = format!("{}/multiple", characters_path(session_id));
        let body = MultipleCharacters {
            characters: creatures,
        };
        Ok(self.api.post_no_response(&path, &body).await?)
    }

    pub async fn save_character(
        &self,
        session_id: SessionId,
        creature: &Creature,
    ) -> Result<(), ServiceError> {
        creature.validate()?;
        let id = stored_id(creature)?;
        let path = format!("{}/{}", characters_path(session_id), id);
        self.api.patch_no_response(&path, creature).await?;
        Ok(())
    }

    pub async fn delete_character(
        &self,
        session_id: SessionId,
        creature_id: CreatureId,
    ) -> Result<(), ServiceError> {
        let path = format!("{}/{}", characters_path(session_id), creature_id);
        Ok(self.api.delete(&path).await?)
    }

    /// Clear every non-player creature from the order.
    pub async fn delete_all_monsters(&self, session_id: SessionId) -> Result<(), ServiceError> {
        let path = format!("{}/monsters", characters_path(session_id));
        Ok(self.api.delete(&path).await?)
    }
}
