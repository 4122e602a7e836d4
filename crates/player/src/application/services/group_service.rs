//! Group Service - the DM's prepared groups of creatures

use serde::Deserialize;

use scryer_domain::{Creature, CreatureId, DomainError, GroupId, SessionGroup, SessionId};
use scryer_shared::MultipleCharacters;

use crate::application::api::Api;
use crate::application::ServiceError;

#[derive(Clone)]
pub struct GroupService {
    api: Api,
}

/// Group creation answers with the new id, bare or inside the stored group.
#[derive(Deserialize)]
#[serde(untagged)]
enum CreatedGroup {
    Id(GroupId),
    Group(SessionGroup),
}

fn groups_path(session_id: SessionId) -> String {
    format!("/groups/{}", session_id)
}

fn group_path(session_id: SessionId, group_id: GroupId) -> String {
    format!("/groups/{}/{}", session_id, group_id)
}

impl GroupService {
    pub fn new(api: Api) -> Self {
        Self { api }
    }

    pub async fn list_groups(&self, session_id: SessionId) -> Result<Vec<SessionGroup>, ServiceError> {
        Ok(self.api.get(&groups_path(session_id)).await?)
    }

    pub async fn create_group(
        &self,
        session_id: SessionId,
        group: &SessionGroup,
    ) -> Result<GroupId, ServiceError> {
        if group.group_name.trim().is_empty() {
            return Err(DomainError::validation("group name cannot be empty").into());
        }
        let created: CreatedGroup = self.api.post(&groups_path(session_id), group).await?;
        Ok(match created {
            CreatedGroup::Id(id) => id,
            CreatedGroup::Group(group) => group.group_uuid,
        })
    }

    pub async fn delete_group(
        &self,
        session_id: SessionId,
        group_id: GroupId,
    ) -> Result<(), ServiceError> {
        Ok(self.api.delete(&group_path(session_id, group_id)).await?)
    }

    pub async fn group_characters(
        &self,
        session_id: SessionId,
        group_id: GroupId,
    ) -> Result<Vec<Creature>, ServiceError> {
        Ok(self.api.get(&group_path(session_id, group_id)).await?)
    }

    pub async fn add_group_character(
        &self,
        session_id: SessionId,
        group_id: GroupId,
        creature: &Creature,
    ) -> Result<(), ServiceError> {
        creature.validate()?;
        Ok(self
            .api
            .post_no_response(&group_path(session_id, group_id), creature)
            .await?)
    }

    pub async fn add_group_characters(
        &self,
        session_id: SessionId,
        group_id: GroupId,
        creatures: Vec<Creature>,
    ) -> Result<(), ServiceError> {
        for creature in &creatures {
            creature.validate()?;
        }
        let path = format!("{}/multiple", group_path(session_id, group_id));
        let body = MultipleCharacters {
            characters: creatures,
        };
        Ok(self.api.post_no_response(&path, &body).await?)
    }

    pub async fn save_group_character(
        &self,
        session_id: SessionId,
        group_id: GroupId,
        creature: &Creature,
    ) -> Result<(), ServiceError> {
        creature.validate()?;
        if !creature.is_stored() {
            return Err(DomainError::validation(format!(
                "{} has not been saved yet",
                creature.name
            ))
            .into());
        }
        let path = format!(
            "{}/{}",
            group_path(session_id, group_id),
            creature.creature_id
        );
        Ok(self.api.patch_no_response(&path, creature).await?)
    }

    pub async fn delete_group_character(
        &self,
        session_id: SessionId,
        group_id: GroupId,
        creature_id: CreatureId,
    ) -> Result<(), ServiceError> {
        let path = format!("{}/{}", group_path(session_id, group_id), creature_id);
        Ok(self.api.delete(&path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockRawApiPort;
    use scryer_domain::{HitPoints, Role};
    use serde_json::json;
    use std::sync::Arc;

    fn service(raw: MockRawApiPort) -> GroupService {
        GroupService::new(Api::new(Arc::new(raw)))
    }

    #[tokio::test]
    async fn created_id_in_either_shape() {
        let id = GroupId::new();
        let mut raw = MockRawApiPort::new();
        let mut answers = vec![
            json!(id.to_string()),
            json!({"group_uuid": id.to_string(), "group_name": "Goblins"}),
        ]
        .into_iter();
        raw.expect_post_json()
            .times(2)
            .returning(move |_, _| Ok(answers.next().unwrap_or_default()));

        let groups = service(raw);
        let session = SessionId::new();
        let group = SessionGroup::named("Goblins");
        assert_eq!(groups.create_group(session, &group).await.unwrap(), id);
        assert_eq!(groups.create_group(session, &group).await.unwrap(), id);
    }

    #[tokio::test]
    async fn multiple_wraps_characters() {
        let mut raw = MockRawApiPort::new();
        raw.expect_post_json()
            .withf(|path, body| {
                path.ends_with("/multiple") && body["characters"].as_array().map(Vec::len) == Some(2)
            })
            .times(1)
            .returning(|_, _| Ok(serde_json::Value::Null));

        let goblin = Creature::new("Goblin", 0, HitPoints::full(7).unwrap(), Role::NonPlayer);
        service(raw)
            .add_group_characters(
                SessionId::new(),
                GroupId::new(),
                vec![goblin.clone(), goblin],
            )
            .await
            .unwrap();
    }
}
