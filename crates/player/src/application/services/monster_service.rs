//! Monster Service - DM-authored monsters stored with a session
//!
//! Custom monsters are addressed by their `index`, like rules-API monsters,
//! so both kinds can be offered in one picker.

use scryer_domain::{ApiReference, CustomMonster, DomainError, Monster, SessionId};

use crate::application::api::Api;
use crate::application::ServiceError;

#[derive(Clone)]
pub struct MonsterService {
    api: Api,
}

fn monsters_path(session_id: SessionId) -> String {
    format!("/monsters/{}", session_id)
}

impl MonsterService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    /// Picker entries for the session's custom monsters.
    pub async fn list_custom_monsters(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ApiReference>, ServiceError> {
        let monsters: Vec<Monster> = self.api.get(&monsters_path(session_id)).await?;
        Ok(monsters
            .iter()
            .map(|m| ApiReference::new(m.index.clone(), m.name.clone()))
            .collect())
    }

    pub async fn get_custom_monster(
        &self,
        session_id: SessionId,
        index: &str,
    ) -> Result<Option<Monster>, ServiceError> {
        let path = format!("{}/{}", monsters_path(session_id), index);
        Ok(self.api.get_optional(&path).await?)
    }

    pub async fn add_custom_monster(
        &self,
        session_id: SessionId,
        monster: &Monster,
    ) -> Result<CustomMonster, ServiceError> {
        if monster.index.trim().is_empty() || monster.name.trim().is_empty() {
            return Err(DomainError::validation("custom monster needs an index and a name").into());
        }
        Ok(self.api.post(&monsters_path(session_id), monster).await?)
    }

    pub async fn delete_custom_monster(
        &self,
        session_id: SessionId,
        index: &str,
    ) -> Result<(), ServiceError> {
        let path = format!("{}/{}", monsters_path(session_id), index);
        Ok(self.api.delete(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockRawApiPort;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn list_drops_urls() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json().returning(|_| {
            Ok(json!([{
                "index": "swamp-hag",
                "name": "Swamp Hag",
                "url": "/custom/swamp-hag",
                "hit_points": 40
            }]))
        });

        let refs = MonsterService::new(Api::new(Arc::new(raw)))
            .list_custom_monsters(SessionId::new())
            .await
            .unwrap();
        assert_eq!(refs, vec![ApiReference::new("swamp-hag", "Swamp Hag")]);
    }
}
