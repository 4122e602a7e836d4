//! In-memory session server behind the HTTP port.
//!
//! Serves the REST surface the services use and publishes the socket events
//! a real server would push after each call, so whole DM/player exchanges
//! run without a network.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use scryer_domain::{
    Creature, CreatureId, CustomMonster, GroupId, Monster, MonsterId, NewSession, PlayerInput,
    PlayerMessage, Role, RollRequest, RootFilter, Session, SessionGroup, SessionId,
};
use scryer_shared::{InitiativeTop, MultipleCharacters, ServerEvent};

use crate::ports::outbound::{ApiError, RawApiPort};

const EVENT_BUFFER: usize = 64;

#[derive(Default)]
struct SessionData {
    session: Option<Session>,
    characters: Vec<Creature>,
    initiative_top: Option<CreatureId>,
    inputs: Vec<PlayerInput>,
    groups: Vec<(SessionGroup, Vec<Creature>)>,
    monsters: Vec<CustomMonster>,
}

#[derive(Default)]
struct BackendState {
    sessions: HashMap<SessionId, SessionData>,
    roll_requests: Vec<RollRequest>,
    messages: Vec<PlayerMessage>,
    ended: Vec<SessionId>,
}

pub struct FakeSessionBackend {
    state: Mutex<BackendState>,
    events: broadcast::Sender<ServerEvent>,
}

fn not_found(path: &str) -> ApiError {
    ApiError::HttpError {
        status: 404,
        body: format!("No route for {}", path),
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError::HttpError {
        status: 422,
        body: message.into(),
    }
}

fn parse<T: DeserializeOwned>(body: &Value) -> Result<T, ApiError> {
    serde_json::from_value(body.clone()).map_err(|e| bad_request(e.to_string()))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::SerializeError(e.to_string()))
}

fn id<T: std::str::FromStr>(segment: &str) -> Result<T, ApiError> {
    segment
        .parse()
        .map_err(|_| bad_request(format!("not an id: {}", segment)))
}

/// Path segments and the decoded `filter` query parameter, if any.
fn split_path(path: &str) -> Result<(Vec<String>, Option<RootFilter>), ApiError> {
    let (route, query) = path.split_once('?').unwrap_or((path, ""));
    let segments = route
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    let filter = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "filter")
        .map(|(_, raw)| serde_json::from_str(&raw).map_err(|e| bad_request(e.to_string())))
        .transpose()?;
    Ok((segments, filter))
}

fn store(creature: &Creature) -> Creature {
    let mut stored = creature.clone();
    stored.creature_id = CreatureId::new();
    stored
}

/// Highest initiative first, rotated so the marked creature leads.
fn initiative_order(data: &SessionData) -> Vec<Creature> {
    let mut order = data.characters.clone();
    order.sort_by(|a, b| b.initiative.cmp(&a.initiative));
    if let Some(top) = data.initiative_top {
        if let Some(pos) = order.iter().position(|c| c.creature_id == top) {
            order.rotate_left(pos);
        }
    }
    order
}

impl Default for FakeSessionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSessionBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            state: Mutex::new(BackendState::default()),
            events,
        }
    }

    /// Socket events the server would push to every client in a session.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Register a session directly, skipping the create call.
    pub fn with_session(self, session_id: SessionId, name: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.sessions.entry(session_id).or_default().session = Some(Session {
                session_uuid: session_id,
                session_name: name.to_string(),
                session_description: String::new(),
            });
        }
        self
    }

    pub fn roll_requests(&self) -> Vec<RollRequest> {
        self.lock()
            .map(|s| s.roll_requests.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<PlayerMessage> {
        self.lock().map(|s| s.messages.clone()).unwrap_or_default()
    }

    pub fn is_ended(&self, session_id: SessionId) -> bool {
        self.lock()
            .map(|s| s.ended.contains(&session_id))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, BackendState>, ApiError> {
        self.state
            .lock()
            .map_err(|_| ApiError::RequestFailed("fake backend poisoned".into()))
    }

    fn publish(&self, event: ServerEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn get(&self, path: &str) -> Result<Value, ApiError> {
        let (segments, filter) = split_path(path)?;
        let state = self.lock()?;
        let seg: Vec<&str> = segments.iter().map(String::as_str).collect();
        match seg.as_slice() {
            ["sessions"] => {
                let sessions: Vec<&Session> =
                    state.sessions.values().filter_map(|d| d.session.as_ref()).collect();
                to_json(&sessions)
            }
            ["sessions", sid] => {
                let session = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .and_then(|d| d.session.as_ref())
                    .ok_or_else(|| not_found(path))?;
                to_json(&vec![session])
            }
            ["sessions", sid, "player-input"] => {
                let inputs: Vec<Value> = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .map(|d| d.inputs.as_slice())
                    .unwrap_or_default()
                    .iter()
                    .map(|input| json!({"event_type": "receive_roll", "event_body": input}))
                    .collect();
                Ok(Value::Array(inputs))
            }
            ["characters", sid] => {
                let characters: Vec<&Creature> = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .map(|d| d.characters.as_slice())
                    .unwrap_or_default()
                    .iter()
                    .filter(|c| filter.as_ref().map_or(true, |f| f.matches(c)))
                    .collect();
                to_json(&characters)
            }
            ["characters", sid, "initiative"] => {
                let order = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .map(initiative_order)
                    .unwrap_or_default();
                to_json(&order)
            }
            ["groups", sid] => {
                let groups: Vec<&SessionGroup> = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .map(|d| d.groups.iter().map(|(g, _)| g).collect())
                    .unwrap_or_default();
                to_json(&groups)
            }
            ["groups", sid, gid] => {
                let gid: GroupId = id(gid)?;
                let members = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .and_then(|d| d.groups.iter().find(|(g, _)| g.group_uuid == gid))
                    .map(|(_, members)| members)
                    .ok_or_else(|| not_found(path))?;
                to_json(members)
            }
            ["monsters", sid] => {
                let monsters: Vec<&Monster> = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .map(|d| d.monsters.iter().map(|m| &m.stat_block).collect())
                    .unwrap_or_default();
                to_json(&monsters)
            }
            ["monsters", sid, index] => {
                let monster = state
                    .sessions
                    .get(&id::<SessionId>(sid)?)
                    .and_then(|d| d.monsters.iter().find(|m| m.stat_block.index == *index))
                    .ok_or_else(|| not_found(path))?;
                to_json(&monster.stat_block)
            }
            _ => Err(not_found(path)),
        }
    }

    fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let (segments, _) = split_path(path)?;
        let seg: Vec<&str> = segments.iter().map(String::as_str).collect();
        let require_body = || body.ok_or_else(|| bad_request("missing body"));
        let mut state = self.lock()?;
        match seg.as_slice() {
            ["sessions"] => {
                let new: NewSession = parse(require_body()?)?;
                let session = Session {
                    session_uuid: SessionId::new(),
                    session_name: new.session_name,
                    session_description: new.session_description,
                };
                state.sessions.entry(session.session_uuid).or_default().session =
                    Some(session.clone());
                to_json(&session)
            }
            ["sessions", sid] => {
                let sid: SessionId = id::<SessionId>(sid)?;
                state.ended.push(sid);
                drop(state);
                self.publish(ServerEvent::EndSession);
                Ok(Value::Null)
            }
            ["sessions", sid, "player-input"] => {
                let input: PlayerInput = parse(require_body()?)?;
                state
                    .sessions
                    .entry(id::<SessionId>(sid)?)
                    .or_default()
                    .inputs
                    .push(input.clone());
                drop(state);
                self.publish(ServerEvent::ReceiveRoll(Some(input)));
                Ok(Value::Null)
            }
            ["sessions", _, "request-roll"] => {
                let request: RollRequest = parse(require_body()?)?;
                state.roll_requests.push(request.clone());
                drop(state);
                self.publish(ServerEvent::RequestRoll(request));
                Ok(Value::Null)
            }
            ["sessions", _, "message"] => {
                let message: PlayerMessage = parse(require_body()?)?;
                state.messages.push(message.clone());
                drop(state);
                self.publish(ServerEvent::ReceiveMessage(message));
                Ok(Value::Null)
            }
            ["characters", sid] => {
                let creature: Creature = parse(require_body()?)?;
                let stored = store(&creature);
                state
                    .sessions
                    .entry(id::<SessionId>(sid)?)
                    .or_default()
                    .characters
                    .push(stored.clone());
                drop(state);
                self.publish(ServerEvent::ReceiveOrderUpdate);
                to_json(&stored)
            }
            ["characters", sid, "multiple"] => {
                let batch: MultipleCharacters = parse(require_body()?)?;
                let data = state.sessions.entry(id::<SessionId>(sid)?).or_default();
                data.characters.extend(batch.characters.iter().map(store));
                drop(state);
                self.publish(ServerEvent::ReceiveOrderUpdate);
                Ok(Value::Null)
            }
            ["groups", sid] => {
                let mut group: SessionGroup = parse(require_body()?)?;
                group.group_uuid = GroupId::new();
                state
                    .sessions
                    .entry(id::<SessionId>(sid)?)
                    .or_default()
                    .groups
                    .push((group.clone(), Vec::new()));
                to_json(&group.group_uuid)
            }
            ["groups", sid, gid] => {
                let creature: Creature = parse(require_body()?)?;
                self.group_members(&mut state, sid, gid, path)?.push(store(&creature));
                Ok(Value::Null)
            }
            ["groups", sid, gid, "multiple"] => {
                let batch: MultipleCharacters = parse(require_body()?)?;
                self.group_members(&mut state, sid, gid, path)?
                    .extend(batch.characters.iter().map(store));
                Ok(Value::Null)
            }
            ["monsters", sid] => {
                let monster: Monster = parse(require_body()?)?;
                let custom = CustomMonster {
                    monster_id: MonsterId::new(),
                    stat_block: monster,
                };
                let monsters = &mut state.sessions.entry(id::<SessionId>(sid)?).or_default().monsters;
                monsters.retain(|m| m.stat_block.index != custom.stat_block.index);
                monsters.push(custom.clone());
                to_json(&custom)
            }
            _ => Err(not_found(path)),
        }
    }

    fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let (segments, _) = split_path(path)?;
        let seg: Vec<&str> = segments.iter().map(String::as_str).collect();
        let mut state = self.lock()?;
        match seg.as_slice() {
            ["sessions", sid, "initiative-top"] => {
                let top: InitiativeTop = parse(body)?;
                state.sessions.entry(id::<SessionId>(sid)?).or_default().initiative_top = top.creature_id;
                drop(state);
                self.publish(ServerEvent::ReceiveOrderUpdate);
                Ok(Value::Null)
            }
            ["characters", sid, cid] => {
                let cid: CreatureId = id(cid)?;
                let mut update: Creature = parse(body)?;
                update.creature_id = cid;
                let slot = state
                    .sessions
                    .get_mut(&id::<SessionId>(sid)?)
                    .and_then(|d| d.characters.iter_mut().find(|c| c.creature_id == cid))
                    .ok_or_else(|| not_found(path))?;
                *slot = update;
                drop(state);
                self.publish(ServerEvent::ReceiveOrderUpdate);
                Ok(Value::Null)
            }
            ["groups", sid, gid, cid] => {
                let cid: CreatureId = id(cid)?;
                let mut update: Creature = parse(body)?;
                update.creature_id = cid;
                let slot = self
                    .group_members(&mut state, sid, gid, path)?
                    .iter_mut()
                    .find(|c| c.creature_id == cid)
                    .ok_or_else(|| not_found(path))?;
                *slot = update;
                Ok(Value::Null)
            }
            _ => Err(not_found(path)),
        }
    }

    fn delete_at(&self, path: &str) -> Result<(), ApiError> {
        let (segments, _) = split_path(path)?;
        let seg: Vec<&str> = segments.iter().map(String::as_str).collect();
        let mut state = self.lock()?;
        match seg.as_slice() {
            ["sessions", sid] => {
                state
                    .sessions
                    .remove(&id::<SessionId>(sid)?)
                    .ok_or_else(|| not_found(path))?;
                Ok(())
            }
            ["sessions", sid, "player-input"] => {
                if let Some(data) = state.sessions.get_mut(&id::<SessionId>(sid)?) {
                    data.inputs.clear();
                }
                Ok(())
            }
            ["characters", sid, "monsters"] => {
                if let Some(data) = state.sessions.get_mut(&id::<SessionId>(sid)?) {
                    data.characters.retain(|c| c.role != Role::NonPlayer);
                }
                drop(state);
                self.publish(ServerEvent::ReceiveOrderUpdate);
                Ok(())
            }
            ["characters", sid, cid] => {
                let cid: CreatureId = id(cid)?;
                let data = state
                    .sessions
                    .get_mut(&id::<SessionId>(sid)?)
                    .ok_or_else(|| not_found(path))?;
                let before = data.characters.len();
                data.characters.retain(|c| c.creature_id != cid);
                if data.characters.len() == before {
                    return Err(not_found(path));
                }
                drop(state);
                self.publish(ServerEvent::ReceiveOrderUpdate);
                Ok(())
            }
            ["groups", sid, gid] => {
                let gid: GroupId = id(gid)?;
                if let Some(data) = state.sessions.get_mut(&id::<SessionId>(sid)?) {
                    data.groups.retain(|(g, _)| g.group_uuid != gid);
                }
                Ok(())
            }
            ["groups", sid, gid, cid] => {
                let cid: CreatureId = id(cid)?;
                self.group_members(&mut state, sid, gid, path)?
                    .retain(|c| c.creature_id != cid);
                Ok(())
            }
            ["monsters", sid, index] => {
                if let Some(data) = state.sessions.get_mut(&id::<SessionId>(sid)?) {
                    data.monsters.retain(|m| m.stat_block.index != *index);
                }
                Ok(())
            }
            _ => Err(not_found(path)),
        }
    }

    fn group_members<'a>(
        &self,
        state: &'a mut BackendState,
        sid: &str,
        gid: &str,
        path: &str,
    ) -> Result<&'a mut Vec<Creature>, ApiError> {
        let gid: GroupId = id(gid)?;
        state
            .sessions
            .get_mut(&id::<SessionId>(sid)?)
            .and_then(|d| d.groups.iter_mut().find(|(g, _)| g.group_uuid == gid))
            .map(|(_, members)| members)
            .ok_or_else(|| not_found(path))
    }
}

#[async_trait::async_trait]
impl RawApiPort for FakeSessionBackend {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        tracing::trace!(path, "fake GET");
        self.get(path)
    }

    async fn get_optional_json(&self, path: &str) -> Result<Option<Value>, ApiError> {
        match self.get(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::trace!(path, "fake POST");
        self.post(path, Some(body))
    }

    async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.post(path, None)
    }

    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.patch(path, body)
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.delete_at(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::api::Api;
    use crate::application::services::{CharacterService, SessionService};
    use scryer_domain::{ClientId, HitPoints};
    use std::sync::Arc;

    fn services() -> (Arc<FakeSessionBackend>, CharacterService, SessionService) {
        let backend = Arc::new(FakeSessionBackend::new());
        let api = Api::new(backend.clone());
        (
            backend,
            CharacterService::new(api.clone()),
            SessionService::new(api),
        )
    }

    #[tokio::test]
    async fn added_character_comes_back_with_an_id() {
        let (_, characters, _) = services();
        let session = SessionId::new();
        let alice = Creature::new("Alice", 15, HitPoints::new(20, 24).unwrap(), Role::Player)
            .with_conditions(vec!["poisoned".into()]);

        characters.add_character(session, &alice).await.unwrap();
        let listed = characters.get_characters(session, None).await.unwrap();

        assert_eq!(listed.len(), 1);
        let stored = &listed[0];
        assert!(stored.is_stored());
        assert_eq!(stored.name, alice.name);
        assert_eq!(stored.initiative, alice.initiative);
        assert_eq!(stored.hit_points, alice.hit_points);
        assert_eq!(stored.conditions, alice.conditions);
    }

    #[tokio::test]
    async fn filter_and_initiative_views() {
        let (_, characters, sessions) = services();
        let session = SessionId::new();
        let hp = HitPoints::full(10).unwrap();
        characters
            .add_characters(
                session,
                vec![
                    Creature::new("Goblin", 18, hp, Role::NonPlayer),
                    Creature::new("Alice", 12, hp, Role::Player),
                    Creature::new("Bob", 5, hp, Role::Player),
                ],
            )
            .await
            .unwrap();

        let players = characters
            .get_characters(session, Some(&RootFilter::players()))
            .await
            .unwrap();
        assert_eq!(players.len(), 2);

        let bob = players.iter().find(|c| c.name == "Bob").unwrap().creature_id;
        sessions.set_initiative_top(session, Some(bob)).await.unwrap();
        let order: Vec<String> = characters
            .get_initiative_order(session)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(order, vec!["Bob", "Goblin", "Alice"]);

        characters.delete_all_monsters(session).await.unwrap();
        assert_eq!(characters.get_characters(session, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn calls_publish_socket_events() {
        let (backend, _, sessions) = services();
        let mut events = backend.subscribe();
        let session = SessionId::new();

        let request = RollRequest::new(20, vec![ClientId::new()], "Initiative");
        sessions.request_roll(session, &request).await.unwrap();
        sessions.end_session(session).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), ServerEvent::RequestRoll(request));
        assert_eq!(events.recv().await.unwrap(), ServerEvent::EndSession);
        assert!(backend.is_ended(session));
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let backend = FakeSessionBackend::new();
        let err = backend.get_json("/nowhere").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.get_optional_json("/sessions/nope").await, Err(bad_request("not an id: nope")));
        assert_eq!(
            backend.get_optional_json(&format!("/sessions/{}", SessionId::new())).await,
            Ok(None)
        );
    }
}
