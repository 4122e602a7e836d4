//! Rules Service - conditions, skills and monsters from the public 5e rules API
//!
//! Rules data never changes during a session, so every response is cached
//! for the life of the service.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use scryer_domain::{ApiReference, Condition, Monster, ResourceList, Skill};

use crate::application::api::Api;
use crate::application::ServiceError;
use crate::ports::outbound::ApiError;

const INITIATIVE_INDEX: &str = "initiative";

#[derive(Clone)]
pub struct RulesService {
    api: Api,
    cache: Arc<RwLock<HashMap<String, Value>>>,
}

impl RulesService {
    pub fn new(api: Api) -> Self {
        Self {
            api,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn cached<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let hit = self.cache.read().await.get(path).cloned();
        let value = match hit {
            Some(value) => {
                tracing::trace!(path, "Rules cache hit");
                value
            }
            None => {
                let value: Value = self.api.get(path).await?;
                self.cache
                    .write()
                    .await
                    .insert(path.to_string(), value.clone());
                value
            }
        };
        serde_json::from_value(value)
            .map_err(|e| ServiceError::Api(ApiError::ParseError(e.to_string())))
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn list_conditions(&self) -> Result<ResourceList, ServiceError> {
        self.cached("/conditions").await
    }

    pub async fn get_condition(&self, index: &str) -> Result<Condition, ServiceError> {
        self.cached(&format!("/conditions/{}", index)).await
    }

    /// Skills a DM can request a roll for, initiative first.
    pub async fn list_skills(&self) -> Result<ResourceList, ServiceError> {
        let skills: ResourceList = self.cached("/skills").await?;
        Ok(skills.with_leading(ApiReference::initiative()))
    }

    pub async fn get_skill(&self, index: &str) -> Result<Skill, ServiceError> {
        if index == INITIATIVE_INDEX {
            return Ok(Skill::initiative());
        }
        self.cached(&format!("/skills/{}", index)).await
    }

    pub async fn list_monsters(&self) -> Result<ResourceList, ServiceError> {
        self.cached("/monsters").await
    }

    pub async fn get_monster(&self, index: &str) -> Result<Monster, ServiceError> {
        self.cached(&format!("/monsters/{}", index)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockRawApiPort;
    use mockall::predicate::eq;
    use scryer_domain::INITIATIVE_DESCRIPTION;
    use serde_json::json;

    fn rules(raw: MockRawApiPort) -> RulesService {
        RulesService::new(Api::new(Arc::new(raw)))
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .with(eq("/conditions/poisoned"))
            .times(1)
            .returning(|_| {
                Ok(json!({
                    "index": "poisoned",
                    "name": "Poisoned",
                    "url": "/api/conditions/poisoned",
                    "desc": ["A poisoned creature has disadvantage on attack rolls and ability checks."]
                }))
            });

        let rules = rules(raw);
        let first = rules.get_condition("poisoned").await.unwrap();
        let second = rules.get_condition("poisoned").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(rules.cached_entries().await, 1);
    }

    #[tokio::test]
    async fn skills_lead_with_initiative() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json().with(eq("/skills")).times(1).returning(|_| {
            Ok(json!({
                "count": 1,
                "results": [{"index": "stealth", "name": "Stealth", "url": "/api/skills/stealth"}]
            }))
        });

        let skills = rules(raw).list_skills().await.unwrap();
        assert_eq!(skills.count, 2);
        assert_eq!(skills.results[0], ApiReference::initiative());
        assert_eq!(skills.results[1].index, "stealth");
    }

    #[tokio::test]
    async fn initiative_skill_is_local() {
        let raw = MockRawApiPort::new();
        let skill = rules(raw).get_skill("initiative").await.unwrap();
        assert_eq!(skill.desc, vec![INITIATIVE_DESCRIPTION.to_string()]);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let mut raw = MockRawApiPort::new();
        let mut calls = 0;
        raw.expect_get_json().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ApiError::RequestFailed("offline".into()))
            } else {
                Ok(json!({"count": 0, "results": []}))
            }
        });

        let rules = rules(raw);
        assert!(rules.list_monsters().await.is_err());
        assert_eq!(rules.list_monsters().await.unwrap().count, 0);
    }
}
