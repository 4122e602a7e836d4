//! Session tracker: the lists a session view shows, kept in sync with the
//! server by re-fetching after every change.
//!
//! Mutations never touch local state directly. They issue the request and,
//! on success, re-fetch the list the change belongs to. Each list sits in a
//! [`SyncSlot`], so overlapping re-fetches settle on the newest one issued.

use scryer_domain::{
    ApiReference, Creature, CreatureId, DomainError, GroupId, Monster, PlayerInput, RollRequest,
    RootFilter, SessionGroup, SessionId,
};

use crate::application::api::Api;
use crate::application::controller::{RefetchTarget, ViewKind};
use crate::application::services::{CharacterService, GroupService, MonsterService, SessionService};
use crate::application::sync::SyncSlot;
use crate::application::ServiceError;
use crate::ports::outbound::RandomProvider;

pub struct Tracker {
    session_id: SessionId,
    view: ViewKind,
    characters: CharacterService,
    sessions: SessionService,
    group_service: GroupService,
    monster_service: MonsterService,
    initiative: SyncSlot<Vec<Creature>>,
    roster: SyncSlot<Vec<Creature>>,
    player_inputs: SyncSlot<Vec<PlayerInput>>,
    groups: SyncSlot<Vec<SessionGroup>>,
    custom_monsters: SyncSlot<Vec<ApiReference>>,
}

impl Tracker {
    pub fn new(api: Api, session_id: SessionId, view: ViewKind) -> Self {
        Self {
            session_id,
            view,
            characters: CharacterService::new(api.clone()),
            sessions: SessionService::new(api.clone()),
            group_service: GroupService::new(api.clone()),
            monster_service: MonsterService::new(api),
            initiative: SyncSlot::new("initiative"),
            roster: SyncSlot::new("roster"),
            player_inputs: SyncSlot::new("player_inputs"),
            groups: SyncSlot::new("groups"),
            custom_monsters: SyncSlot::new("custom_monsters"),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The initiative order. The DM sees every creature; players see the
    /// server's initiative view.
    pub fn initiative(&self) -> Vec<Creature> {
        self.initiative.get()
    }

    /// Player characters only; used to resolve names for messages and rolls.
    pub fn roster(&self) -> Vec<Creature> {
        self.roster.get()
    }

    pub fn player_inputs(&self) -> Vec<PlayerInput> {
        self.player_inputs.get()
    }

    pub fn groups(&self) -> Vec<SessionGroup> {
        self.groups.get()
    }

    pub fn custom_monsters(&self) -> Vec<ApiReference> {
        self.custom_monsters.get()
    }

    pub async fn refresh(&self, target: RefetchTarget) -> Result<(), ServiceError> {
        let sid = self.session_id;
        match target {
            RefetchTarget::Initiative => {
                let ticket = self.initiative.issue();
                let order = match self.view {
                    ViewKind::DungeonMaster => self.characters.get_characters(sid, None).await?,
                    ViewKind::Participant => self.characters.get_initiative_order(sid).await?,
                };
                tracing::debug!(count = order.len(), "Initiative fetched");
                self.initiative.apply(ticket, order);
            }
            RefetchTarget::Roster => {
                let ticket = self.roster.issue();
                let players = self
                    .characters
                    .get_characters(sid, Some(&RootFilter::players()))
                    .await?;
                self.roster.apply(ticket, players);
            }
            RefetchTarget::PlayerInputs => {
                let ticket = self.player_inputs.issue();
                let inputs = self.sessions.get_player_inputs(sid).await?;
                self.player_inputs.apply(ticket, inputs);
            }
        }
        Ok(())
    }

    pub async fn refresh_groups(&self) -> Result<(), ServiceError> {
        let ticket = self.groups.issue();
        let groups = self.group_service.list_groups(self.session_id).await?;
        self.groups.apply(ticket, groups);
        Ok(())
    }

    pub async fn refresh_custom_monsters(&self) -> Result<(), ServiceError> {
        let ticket = self.custom_monsters.issue();
        let monsters = self
            .monster_service
            .list_custom_monsters(self.session_id)
            .await?;
        self.custom_monsters.apply(ticket, monsters);
        Ok(())
    }

    async fn refresh_order(&self) -> Result<(), ServiceError> {
        let (initiative, roster) = tokio::join!(
            self.refresh(RefetchTarget::Initiative),
            self.refresh(RefetchTarget::Roster)
        );
        initiative.and(roster)
    }

    /// Re-fetch everything the view shows, concurrently.
    pub async fn refresh_all(&self) -> Result<(), ServiceError> {
        match self.view {
            ViewKind::DungeonMaster => {
                let (order, inputs, groups, monsters) = tokio::join!(
                    self.refresh_order(),
                    self.refresh(RefetchTarget::PlayerInputs),
                    self.refresh_groups(),
                    self.refresh_custom_monsters()
                );
                order.and(inputs).and(groups).and(monsters)
            }
            ViewKind::Participant => self.refresh_order().await,
        }
    }

    // Initiative order

    pub async fn add_character(&self, creature: &Creature) -> Result<(), ServiceError> {
        self.characters.add_character(self.session_id, creature).await?;
        self.refresh_order().await
    }

    pub async fn add_characters(&self, creatures: Vec<Creature>) -> Result<(), ServiceError> {
        self.characters
            .add_characters(self.session_id, creatures)
            .await?;
        self.refresh_order().await
    }

    /// Add a rules or custom monster to the order at `initiative`.
    pub async fn add_monster(&self, monster: &Monster, initiative: i32) -> Result<(), ServiceError> {
        self.add_character(&monster.to_creature(initiative)).await
    }

    /// Roll `count` fresh copies of `monster` and add them in one request.
    ///
    /// Each copy gets its own hit points and initiative. With a non-empty
    /// `condition_pool`, each also starts with one condition drawn from it.
    pub async fn add_random_monsters(
        &self,
        monster: &Monster,
        count: usize,
        condition_pool: &[String],
        random: &dyn RandomProvider,
    ) -> Result<(), ServiceError> {
        if count == 0 {
            return Err(DomainError::validation("count must be at least 1").into());
        }
        let mut roll_die = |sides| random.roll_die(sides);
        let creatures: Vec<Creature> = (0..count)
            .map(|_| {
                let creature = monster.roll_creature(&mut roll_die);
                let drawn = match condition_pool.len() {
                    0 => None,
                    n => {
                        let face = random.roll_die(n as u32) as usize;
                        condition_pool.get(face.clamp(1, n) - 1).cloned()
                    }
                };
                match drawn {
                    Some(condition) => creature.with_conditions(vec![condition]),
                    None => creature,
                }
            })
            .collect();
        tracing::info!(monster = %monster.index, count, "Adding rolled monsters");
        self.add_characters(creatures).await
    }

    pub async fn save_character(&self, creature: &Creature) -> Result<(), ServiceError> {
        self.characters
            .save_character(self.session_id, creature)
            .await?;
        self.refresh_order().await
    }

    pub async fn delete_character(&self, creature_id: CreatureId) -> Result<(), ServiceError> {
        self.characters
            .delete_character(self.session_id, creature_id)
            .await?;
        self.refresh_order().await
    }

    pub async fn delete_all_monsters(&self) -> Result<(), ServiceError> {
        self.characters.delete_all_monsters(self.session_id).await?;
        self.refresh_order().await
    }

    pub async fn set_initiative_top(
        &self,
        creature_id: Option<CreatureId>,
    ) -> Result<(), ServiceError> {
        self.sessions
            .set_initiative_top(self.session_id, creature_id)
            .await?;
        self.refresh(RefetchTarget::Initiative).await
    }

    // Rolls

    pub async fn request_roll(&self, request: &RollRequest) -> Result<(), ServiceError> {
        self.sessions.request_roll(self.session_id, request).await
    }

    pub async fn clear_player_inputs(&self) -> Result<(), ServiceError> {
        self.sessions.clear_player_inputs(self.session_id).await?;
        self.refresh(RefetchTarget::PlayerInputs).await
    }

    // Groups

    pub async fn create_group(&self, name: &str) -> Result<GroupId, ServiceError> {
        let id = self
            .group_service
            .create_group(self.session_id, &SessionGroup::named(name))
            .await?;
        self.refresh_groups().await?;
        Ok(id)
    }

    pub async fn delete_group(&self, group_id: GroupId) -> Result<(), ServiceError> {
        self.group_service
            .delete_group(self.session_id, group_id)
            .await?;
        self.refresh_groups().await
    }

    pub async fn group_characters(&self, group_id: GroupId) -> Result<Vec<Creature>, ServiceError> {
        self.group_service
            .group_characters(self.session_id, group_id)
            .await
    }

    pub async fn add_group_character(
        &self,
        group_id: GroupId,
        creature: &Creature,
    ) -> Result<Vec<Creature>, ServiceError> {
        self.group_service
            .add_group_character(self.session_id, group_id, creature)
            .await?;
        self.group_characters(group_id).await
    }

    pub async fn add_group_characters(
        &self,
        group_id: GroupId,
        creatures: Vec<Creature>,
    ) -> Result<Vec<Creature>, ServiceError> {
        self.group_service
            .add_group_characters(self.session_id, group_id, creatures)
            .await?;
        self.group_characters(group_id).await
    }

    pub async fn save_group_character(
        &self,
        group_id: GroupId,
        creature: &Creature,
    ) -> Result<Vec<Creature>, ServiceError> {
        self.group_service
            .save_group_character(self.session_id, group_id, creature)
            .await?;
        self.group_characters(group_id).await
    }

    pub async fn delete_group_character(
        &self,
        group_id: GroupId,
        creature_id: CreatureId,
    ) -> Result<Vec<Creature>, ServiceError> {
        self.group_service
            .delete_group_character(self.session_id, group_id, creature_id)
            .await?;
        self.group_characters(group_id).await
    }

    /// Copy a group's creatures into the initiative order as new entries.
    ///
    /// Returns how many creatures were added.
    pub async fn add_group_to_order(&self, group_id: GroupId) -> Result<usize, ServiceError> {
        let creatures: Vec<Creature> = self
            .group_characters(group_id)
            .await?
            .into_iter()
            .map(|mut c| {
                c.creature_id = CreatureId::nil();
                c
            })
            .collect();
        let count = creatures.len();
        if count > 0 {
            self.add_characters(creatures).await?;
        }
        Ok(count)
    }

    // Custom monsters

    pub async fn custom_monster(&self, index: &str) -> Result<Option<Monster>, ServiceError> {
        self.monster_service
            .get_custom_monster(self.session_id, index)
            .await
    }

    pub async fn add_custom_monster(&self, monster: &Monster) -> Result<(), ServiceError> {
        self.monster_service
            .add_custom_monster(self.session_id, monster)
            .await?;
        self.refresh_custom_monsters().await
    }

    pub async fn delete_custom_monster(&self, index: &str) -> Result<(), ServiceError> {
        self.monster_service
            .delete_custom_monster(self.session_id, index)
            .await?;
        self.refresh_custom_monsters().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::fixtures::goblin;
    use crate::ports::outbound::{ApiError, MockRandomProvider, MockRawApiPort, RawApiPort};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    /// Answers each GET with whatever the test later sends on that call's gate.
    struct GatedApi {
        gates: Mutex<VecDeque<oneshot::Receiver<Value>>>,
        calls: AtomicUsize,
    }

    impl GatedApi {
        fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Value>>) {
            let (senders, receivers): (Vec<_>, VecDeque<_>) =
                (0..count).map(|_| oneshot::channel()).unzip();
            let api = Arc::new(Self {
                gates: Mutex::new(receivers),
                calls: AtomicUsize::new(0),
            });
            (api, senders)
        }

        async fn wait_for_calls(&self, n: usize) {
            while self.calls.load(Ordering::SeqCst) < n {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait::async_trait]
    impl RawApiPort for GatedApi {
        async fn get_json(&self, _path: &str) -> Result<Value, ApiError> {
            let gate = self.gates.lock().unwrap().pop_front();
            self.calls.fetch_add(1, Ordering::SeqCst);
            match gate {
                Some(rx) => rx.await.map_err(|e| ApiError::RequestFailed(e.to_string())),
                None => Err(ApiError::RequestFailed("no gate".into())),
            }
        }

        async fn get_optional_json(&self, path: &str) -> Result<Option<Value>, ApiError> {
            self.get_json(path).await.map(Some)
        }

        async fn post_json(&self, _path: &str, _body: &Value) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }

        async fn post_empty(&self, _path: &str) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }

        async fn patch_json(&self, _path: &str, _body: &Value) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }

        async fn delete(&self, _path: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn creature_json(name: &str) -> Value {
        json!([{
            "creature_id": CreatureId::new().to_string(),
            "name": name,
            "initiative": 10,
            "hit_points": [5, 5],
            "role": "non_player"
        }])
    }

    #[tokio::test]
    async fn newest_issued_refetch_wins_when_completions_reorder() {
        let (api, mut gates) = GatedApi::new(2);
        let tracker = Arc::new(Tracker::new(
            Api::new(api.clone()),
            SessionId::new(),
            ViewKind::Participant,
        ));

        let first = tokio::spawn({
            let tracker = tracker.clone();
            async move { tracker.refresh(RefetchTarget::Initiative).await }
        });
        api.wait_for_calls(1).await;
        let second = tokio::spawn({
            let tracker = tracker.clone();
            async move { tracker.refresh(RefetchTarget::Initiative).await }
        });
        api.wait_for_calls(2).await;

        let older = gates.remove(0);
        let newer = gates.remove(0);
        newer.send(creature_json("Newer")).unwrap();
        second.await.unwrap().unwrap();
        older.send(creature_json("Older")).unwrap();
        first.await.unwrap().unwrap();

        let order = tracker.initiative();
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].name, "Newer");
    }

    #[tokio::test]
    async fn player_view_reads_initiative_endpoint() {
        let session = SessionId::new();
        let expected = format!("/characters/{}/initiative", session);
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .withf(move |path| path == expected)
            .times(1)
            .returning(|_| Ok(json!([])));

        let tracker = Tracker::new(Api::new(Arc::new(raw)), session, ViewKind::Participant);
        tracker.refresh(RefetchTarget::Initiative).await.unwrap();
    }

    #[tokio::test]
    async fn mutation_refetches_order_and_roster() {
        let session = SessionId::new();
        let mut raw = MockRawApiPort::new();
        raw.expect_post_json()
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        raw.expect_get_json()
            .withf(|path| path.contains("filter="))
            .times(1)
            .returning(|_| Ok(json!([])));
        raw.expect_get_json()
            .withf(|path| !path.contains("filter="))
            .times(1)
            .returning(|_| Ok(creature_json("Goblin")));

        let tracker = Tracker::new(Api::new(Arc::new(raw)), session, ViewKind::DungeonMaster);
        tracker.add_character(&goblin()).await.unwrap();

        assert_eq!(tracker.initiative()[0].name, "Goblin");
        assert!(tracker.roster().is_empty());
    }

    #[tokio::test]
    async fn failed_mutation_skips_refetch() {
        let mut raw = MockRawApiPort::new();
        raw.expect_delete().returning(|_| {
            Err(ApiError::HttpError {
                status: 500,
                body: "boom".into(),
            })
        });
        raw.expect_get_json().never();

        let tracker = Tracker::new(
            Api::new(Arc::new(raw)),
            SessionId::new(),
            ViewKind::DungeonMaster,
        );
        assert!(tracker.delete_character(CreatureId::new()).await.is_err());
    }

    #[tokio::test]
    async fn group_copy_clears_ids_before_adding() {
        let session = SessionId::new();
        let group = GroupId::new();
        let group_path = format!("/groups/{}/{}", session, group);
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .withf(move |path| path == group_path)
            .returning(|_| Ok(creature_json("Bandit")));
        raw.expect_post_json()
            .withf(|path, body| {
                path.ends_with("/multiple")
                    && body["characters"][0]["creature_id"]
                        == json!("00000000-0000-0000-0000-000000000000")
            })
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        raw.expect_get_json()
            .withf(|path| path.starts_with("/characters/"))
            .returning(|_| Ok(json!([])));

        let tracker = Tracker::new(Api::new(Arc::new(raw)), session, ViewKind::DungeonMaster);
        assert_eq!(tracker.add_group_to_order(group).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rolled_monsters_go_out_in_one_request() {
        let monster: Monster = serde_json::from_value(json!({
            "index": "goblin",
            "name": "Goblin",
            "hit_points": 7,
            "hit_points_roll": "2d6",
            "dexterity": 14
        }))
        .unwrap();
        let mut random = MockRandomProvider::new();
        random.expect_roll_die().returning(|sides| match sides {
            6 => 3,
            20 => 10,
            _ => 2,
        });

        let mut raw = MockRawApiPort::new();
        raw.expect_post_json()
            .withf(|path, body| {
                let characters = body["characters"].as_array().cloned().unwrap_or_default();
                path.ends_with("/multiple")
                    && characters.len() == 3
                    && characters.iter().all(|c| {
                        c["hit_points"] == json!([6, 6])
                            && c["initiative"] == json!(12)
                            && c["conditions"] == json!(["prone"])
                            && c["monster"] == json!("goblin")
                    })
            })
            .times(1)
            .returning(|_, _| Ok(Value::Null));
        raw.expect_get_json().returning(|_| Ok(json!([])));

        let tracker = Tracker::new(
            Api::new(Arc::new(raw)),
            SessionId::new(),
            ViewKind::DungeonMaster,
        );
        let pool = vec!["blinded".to_string(), "prone".to_string()];
        tracker
            .add_random_monsters(&monster, 3, &pool, &random)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn zero_rolled_monsters_is_rejected() {
        let monster: Monster =
            serde_json::from_value(json!({"index": "goblin", "name": "Goblin"})).unwrap();
        let mut raw = MockRawApiPort::new();
        raw.expect_post_json().never();
        let tracker = Tracker::new(
            Api::new(Arc::new(raw)),
            SessionId::new(),
            ViewKind::DungeonMaster,
        );
        let random = MockRandomProvider::new();
        assert!(tracker
            .add_random_monsters(&monster, 0, &[], &random)
            .await
            .is_err());
    }
}
