//! Session view controller.
//!
//! Maps each inbound [`ServerEvent`] to a list of [`Effect`]s for the
//! runtime to execute. The controller does no I/O; its only state is where
//! the join handshake stands on the current connection.

use std::time::Duration;

use scryer_domain::{ClientId, PlayerMessage, RollRequest, SessionIdentity, DUNGEON_MASTER_NAME};
use scryer_shared::{ClientEvent, JoinSessionBody, ServerEvent};

use crate::application::alerts::{AlertInfo, ORDER_UPDATED_MESSAGE, SESSION_ENDED_MESSAGE};
use crate::ports::outbound::Destination;

/// How long players see the end-of-session notice before being sent away.
pub const END_SESSION_REDIRECT_DELAY: Duration = Duration::from_secs(5);

/// Lists a view keeps in sync with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefetchTarget {
    Initiative,
    Roster,
    PlayerInputs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(ClientEvent),
    Refetch(RefetchTarget),
    PromptRoll(RollRequest),
    PersistClientId(ClientId),
    AppendMessage(PlayerMessage),
    Alert(AlertInfo),
    Navigate { to: Destination, after: Duration },
}

/// Join handshake progress on the current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    /// Waiting for the server's join nudge
    #[default]
    AwaitingJoin,
    /// Subscription sent, no id assigned yet
    Subscribed,
    /// The server assigned this connection its id
    Identified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    DungeonMaster,
    /// Players and observers share one view
    Participant,
}

impl ViewKind {
    pub fn for_identity(identity: &SessionIdentity) -> Self {
        if identity.is_dungeon_master() {
            ViewKind::DungeonMaster
        } else {
            ViewKind::Participant
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionController {
    view: ViewKind,
    handshake: HandshakeState,
}

impl SessionController {
    pub fn new(view: ViewKind) -> Self {
        Self {
            view,
            handshake: HandshakeState::default(),
        }
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn handshake(&self) -> HandshakeState {
        self.handshake
    }

    /// A new connection starts a fresh handshake.
    pub fn connection_opened(&mut self) {
        self.handshake = HandshakeState::AwaitingJoin;
    }

    pub fn handle(&mut self, identity: &SessionIdentity, event: ServerEvent) -> Vec<Effect> {
        match self.view {
            ViewKind::DungeonMaster => self.handle_dungeon_master(identity, event),
            ViewKind::Participant => self.handle_participant(identity, event),
        }
    }

    fn handle_dungeon_master(
        &mut self,
        identity: &SessionIdentity,
        event: ServerEvent,
    ) -> Vec<Effect> {
        match event {
            ServerEvent::RequestRoll(_) => Vec::new(),
            ServerEvent::ReceiveRoll(_) => vec![Effect::Refetch(RefetchTarget::PlayerInputs)],
            ServerEvent::ReceiveOrderUpdate => vec![
                Effect::Refetch(RefetchTarget::Roster),
                Effect::Refetch(RefetchTarget::Initiative),
            ],
            ServerEvent::ReceiveMessage(message) => vec![Effect::AppendMessage(message)],
            ServerEvent::ReceiveClientId(id) => self.identified(id),
            ServerEvent::EndSession => vec![Effect::Navigate {
                to: Destination::Home,
                after: Duration::ZERO,
            }],
            ServerEvent::JoinSession => self.subscribe(identity, DUNGEON_MASTER_NAME),
            ServerEvent::Unknown(tag) => ignore_unknown(&tag),
        }
    }

    fn handle_participant(&mut self, identity: &SessionIdentity, event: ServerEvent) -> Vec<Effect> {
        match event {
            ServerEvent::RequestRoll(request) => {
                if identity.is_addressed_by(&request.client_uuids) {
                    vec![Effect::PromptRoll(request)]
                } else {
                    Vec::new()
                }
            }
            ServerEvent::ReceiveRoll(_) => Vec::new(),
            ServerEvent::ReceiveOrderUpdate => vec![
                Effect::Alert(AlertInfo::info(ORDER_UPDATED_MESSAGE)),
                Effect::Refetch(RefetchTarget::Initiative),
                Effect::Refetch(RefetchTarget::Roster),
            ],
            ServerEvent::ReceiveMessage(message) => vec![Effect::AppendMessage(message)],
            ServerEvent::ReceiveClientId(id) => self.identified(id),
            ServerEvent::EndSession => vec![
                Effect::Alert(AlertInfo::info(SESSION_ENDED_MESSAGE)),
                Effect::Navigate {
                    to: Destination::JoinPage,
                    after: END_SESSION_REDIRECT_DELAY,
                },
            ],
            ServerEvent::JoinSession => match identity.name.clone() {
                Some(name) => self.subscribe(identity, &name),
                None => vec![Effect::Navigate {
                    to: Destination::JoinPage,
                    after: Duration::ZERO,
                }],
            },
            ServerEvent::Unknown(tag) => ignore_unknown(&tag),
        }
    }

    fn subscribe(&mut self, identity: &SessionIdentity, name: &str) -> Vec<Effect> {
        if self.handshake != HandshakeState::AwaitingJoin {
            tracing::debug!(handshake = ?self.handshake, "Ignoring repeated join nudge");
            return Vec::new();
        }
        self.handshake = HandshakeState::Subscribed;
        vec![Effect::Send(ClientEvent::JoinSession(JoinSessionBody {
            session_uuid: identity.session_id,
            role: identity.role,
            name: name.to_string(),
            client_uuid: identity.subscription_client_id(),
        }))]
    }

    fn identified(&mut self, id: ClientId) -> Vec<Effect> {
        self.handshake = HandshakeState::Identified;
        vec![Effect::PersistClientId(id)]
    }
}

fn ignore_unknown(tag: &str) -> Vec<Effect> {
    tracing::debug!(event_type = %tag, "Ignoring unknown session event");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scryer_domain::{Role, SessionId};

    fn dm() -> (SessionController, SessionIdentity) {
        let identity = SessionIdentity::dungeon_master(SessionId::new());
        (SessionController::new(ViewKind::for_identity(&identity)), identity)
    }

    fn player(name: Option<&str>) -> (SessionController, SessionIdentity) {
        let identity = SessionIdentity::participant(SessionId::new(), name.map(String::from));
        (SessionController::new(ViewKind::for_identity(&identity)), identity)
    }

    fn sent_join(effects: &[Effect]) -> Option<&JoinSessionBody> {
        effects.iter().find_map(|e| match e {
            Effect::Send(ClientEvent::JoinSession(body)) => Some(body),
            _ => None,
        })
    }

    #[test]
    fn dm_joins_as_dm_with_nil_id() {
        let (mut controller, identity) = dm();
        let effects = controller.handle(&identity, ServerEvent::JoinSession);

        let body = sent_join(&effects).unwrap();
        assert_eq!(body.role, Role::DungeonMaster);
        assert_eq!(body.name, "DM");
        assert!(body.client_uuid.is_nil());
        assert_eq!(body.session_uuid, identity.session_id);
    }

    #[test]
    fn handshake_sends_once_per_connection() {
        let (mut controller, identity) = player(Some("Alice"));
        let first = controller.handle(&identity, ServerEvent::JoinSession);
        assert_eq!(sent_join(&first).unwrap().role, Role::Player);

        let id = ClientId::new();
        let assigned = controller.handle(&identity, ServerEvent::ReceiveClientId(id));
        assert_eq!(assigned, vec![Effect::PersistClientId(id)]);
        assert_eq!(controller.handshake(), HandshakeState::Identified);

        assert!(controller.handle(&identity, ServerEvent::JoinSession).is_empty());
    }

    #[test]
    fn duplicate_nudge_before_id_is_ignored() {
        let (mut controller, identity) = player(Some("Alice"));
        controller.handle(&identity, ServerEvent::JoinSession);
        assert!(controller.handle(&identity, ServerEvent::JoinSession).is_empty());
    }

    #[test]
    fn reconnect_rejoins_with_stored_id() {
        let (mut controller, identity) = player(Some("Alice"));
        let id = ClientId::new();
        controller.handle(&identity, ServerEvent::JoinSession);
        controller.handle(&identity, ServerEvent::ReceiveClientId(id));

        controller.connection_opened();
        let identity = identity.with_client_id(Some(id));
        let effects = controller.handle(&identity, ServerEvent::JoinSession);
        assert_eq!(sent_join(&effects).unwrap().client_uuid, id);
    }

    #[test]
    fn observer_name_joins_as_observer() {
        let (mut controller, identity) = player(Some("Observer"));
        let effects = controller.handle(&identity, ServerEvent::JoinSession);
        assert_eq!(sent_join(&effects).unwrap().role, Role::Observer);
    }

    #[test]
    fn unnamed_player_is_sent_to_join_page() {
        let (mut controller, identity) = player(None);
        let effects = controller.handle(&identity, ServerEvent::JoinSession);
        assert_eq!(
            effects,
            vec![Effect::Navigate {
                to: Destination::JoinPage,
                after: Duration::ZERO
            }]
        );
        assert_eq!(controller.handshake(), HandshakeState::AwaitingJoin);
    }

    #[test]
    fn end_session_timing_per_view() {
        let (mut controller, identity) = dm();
        assert_eq!(
            controller.handle(&identity, ServerEvent::EndSession),
            vec![Effect::Navigate {
                to: Destination::Home,
                after: Duration::ZERO
            }]
        );

        let (mut controller, identity) = player(Some("Alice"));
        let effects = controller.handle(&identity, ServerEvent::EndSession);
        assert!(effects.contains(&Effect::Alert(AlertInfo::info(SESSION_ENDED_MESSAGE))));
        assert!(effects.contains(&Effect::Navigate {
            to: Destination::JoinPage,
            after: Duration::from_secs(5)
        }));
    }

    #[test]
    fn order_update_refetches_both_lists() {
        let (mut controller, identity) = dm();
        let effects = controller.handle(&identity, ServerEvent::ReceiveOrderUpdate);
        assert!(effects.contains(&Effect::Refetch(RefetchTarget::Roster)));
        assert!(effects.contains(&Effect::Refetch(RefetchTarget::Initiative)));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Alert(_))));

        let (mut controller, identity) = player(Some("Alice"));
        let effects = controller.handle(&identity, ServerEvent::ReceiveOrderUpdate);
        assert_eq!(effects[0], Effect::Alert(AlertInfo::info(ORDER_UPDATED_MESSAGE)));
        assert!(effects.contains(&Effect::Refetch(RefetchTarget::Initiative)));
        assert!(effects.contains(&Effect::Refetch(RefetchTarget::Roster)));
    }

    #[test]
    fn roll_prompts_only_when_addressed() {
        let me = ClientId::new();
        let (mut controller, identity) = player(Some("Alice"));
        let identity = identity.with_client_id(Some(me));

        let mine = RollRequest::new(20, vec![me], "Initiative");
        assert_eq!(
            controller.handle(&identity, ServerEvent::RequestRoll(mine.clone())),
            vec![Effect::PromptRoll(mine)]
        );

        let everyone = RollRequest::for_all_players(20, "Perception");
        assert_eq!(
            controller.handle(&identity, ServerEvent::RequestRoll(everyone.clone())),
            vec![Effect::PromptRoll(everyone)]
        );

        let someone_else = RollRequest::new(20, vec![ClientId::new()], "Stealth");
        assert!(controller
            .handle(&identity, ServerEvent::RequestRoll(someone_else))
            .is_empty());
    }

    #[test]
    fn dm_only_cares_about_rolls_coming_back() {
        let (mut controller, identity) = dm();
        assert!(controller
            .handle(&identity, ServerEvent::RequestRoll(RollRequest::for_all_players(20, "x")))
            .is_empty());
        assert_eq!(
            controller.handle(&identity, ServerEvent::ReceiveRoll(None)),
            vec![Effect::Refetch(RefetchTarget::PlayerInputs)]
        );

        let (mut controller, identity) = player(Some("Alice"));
        assert!(controller
            .handle(&identity, ServerEvent::ReceiveRoll(None))
            .is_empty());
    }

    #[test]
    fn unknown_events_do_nothing() {
        let (mut controller, identity) = player(Some("Alice"));
        assert!(controller
            .handle(&identity, ServerEvent::Unknown("dance".into()))
            .is_empty());
    }
}
