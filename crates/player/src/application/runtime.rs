//! Session runtime.
//!
//! Owns everything a mounted session view needs: identity, controller,
//! tracker, message threads and the alert banner. Session events go in
//! through [`SessionRuntime::handle`]; the controller turns them into
//! effects and the runtime carries those out.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;

use scryer_domain::{
    ClientId, DomainError, PlayerInput, PlayerMessage, Role, RollRequest, SessionId,
    SessionIdentity,
};

use crate::application::alerts::{AlertBanner, AlertInfo};
use crate::application::api::Api;
use crate::application::controller::{Effect, HandshakeState, SessionController, ViewKind};
use crate::application::identity_store::IdentityStore;
use crate::application::services::SessionService;
use crate::application::threads::MessageThreads;
use crate::application::tracker::Tracker;
use crate::application::ServiceError;
use crate::infrastructure::messaging::{CommandBus, ConnectionHandle, ConnectionState};
use crate::ports::outbound::{ClockPort, NavigationPort, RandomProvider, SessionEvent};

const CONNECTION_LOST_MESSAGE: &str = "Lost connection to the session.";

/// Collaborators a runtime is built from.
pub struct RuntimeDeps {
    pub api: Api,
    pub commands: CommandBus,
    pub identities: IdentityStore,
    pub navigator: Arc<dyn NavigationPort>,
    pub clock: Arc<dyn ClockPort>,
    /// When set, roll prompts are answered at once with a local roll.
    pub auto_roll: Option<Arc<dyn RandomProvider>>,
}

pub struct SessionRuntime {
    identity: SessionIdentity,
    controller: SessionController,
    tracker: Arc<Tracker>,
    sessions: SessionService,
    threads: MessageThreads,
    alerts: AlertBanner,
    identities: IdentityStore,
    commands: CommandBus,
    connection: Option<ConnectionHandle>,
    navigator: Arc<dyn NavigationPort>,
    clock: Arc<dyn ClockPort>,
    auto_roll: Option<Arc<dyn RandomProvider>>,
    roll_prompt: Option<RollRequest>,
    connected_before: bool,
    /// Delayed redirect; aborted on leave
    pending_navigation: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    /// Mount a session view for `role`, loading the stored identity.
    pub fn mount(deps: RuntimeDeps, session_id: SessionId, role: Role) -> Self {
        let identity = deps.identities.load(session_id, role);
        deps.identities.remember_session(session_id);
        let view = ViewKind::for_identity(&identity);
        tracing::info!(
            session = %session_id,
            role = %identity.role,
            client_id = ?identity.client_id,
            "Session view mounted"
        );

        Self {
            controller: SessionController::new(view),
            tracker: Arc::new(Tracker::new(deps.api.clone(), session_id, view)),
            sessions: SessionService::new(deps.api),
            threads: MessageThreads::new(),
            alerts: AlertBanner::new(),
            identities: deps.identities,
            commands: deps.commands,
            connection: None,
            navigator: deps.navigator,
            clock: deps.clock,
            auto_roll: deps.auto_roll,
            roll_prompt: None,
            connected_before: false,
            pending_navigation: None,
            identity,
        }
    }

    /// Hand the runtime the socket it should close on [`leave`](Self::leave).
    pub fn attach_connection(&mut self, handle: ConnectionHandle) {
        self.connection = Some(handle);
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn handshake(&self) -> HandshakeState {
        self.controller.handshake()
    }

    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }

    pub fn threads(&self) -> &MessageThreads {
        &self.threads
    }

    pub fn threads_mut(&mut self) -> &mut MessageThreads {
        &mut self.threads
    }

    pub fn roll_prompt(&self) -> Option<&RollRequest> {
        self.roll_prompt.as_ref()
    }

    pub fn alert(&self) -> Option<&AlertInfo> {
        self.alerts.current(self.clock.now())
    }

    pub fn raise_alert(&mut self, alert: AlertInfo) {
        self.alerts.raise(alert, self.clock.now());
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.dismiss();
    }

    /// Pass a result through, raising an error alert if it failed.
    pub fn report<T>(&mut self, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Session operation failed");
            self.raise_alert(AlertInfo::error(e.user_message()));
        }
        result
    }

    /// Load every list the view shows.
    pub async fn load(&mut self) -> Result<(), ServiceError> {
        let result = self.tracker.refresh_all().await;
        self.report(result)
    }

    pub async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ConnectionStateChanged(state) => self.connection_changed(state).await,
            SessionEvent::Server(event) => {
                let effects = self.controller.handle(&self.identity, event);
                self.execute(effects).await;
            }
        }
    }

    async fn connection_changed(&mut self, state: ConnectionState) {
        tracing::debug!(%state, "Connection state changed");
        match state {
            ConnectionState::Connected => {
                self.controller.connection_opened();
                if self.connected_before {
                    tracing::info!("Reconnected; reloading session");
                    let result = self.tracker.refresh_all().await;
                    let _ = self.report(result);
                }
                self.connected_before = true;
            }
            ConnectionState::Failed => {
                tracing::warn!("Session connection failed");
                self.raise_alert(AlertInfo::error(CONNECTION_LOST_MESSAGE));
            }
            ConnectionState::Disconnected
            | ConnectionState::Connecting
            | ConnectionState::Reconnecting => {}
        }
    }

    async fn execute(&mut self, effects: Vec<Effect>) {
        let mut refetches = Vec::new();
        for effect in effects {
            match effect {
                Effect::Send(event) => {
                    if let Err(e) = self.commands.send(event) {
                        tracing::error!(error = %e, "Failed to queue session event");
                    }
                }
                Effect::Refetch(target) => refetches.push(target),
                Effect::PromptRoll(request) => self.prompt_roll(request).await,
                Effect::PersistClientId(id) => self.persist_client_id(id),
                Effect::AppendMessage(message) => {
                    let roster = self.tracker.roster();
                    self.threads.receive(message, &roster, self.clock.now());
                }
                Effect::Alert(alert) => self.raise_alert(alert),
                Effect::Navigate { to, after } => {
                    tracing::info!(destination = %to, delay_ms = after.as_millis() as u64, "Navigating away");
                    if after.is_zero() {
                        self.navigator.navigate(to);
                    } else {
                        let navigator = Arc::clone(&self.navigator);
                        let redirect = tokio::spawn(async move {
                            tokio::time::sleep(after).await;
                            navigator.navigate(to);
                        });
                        if let Some(previous) = self.pending_navigation.replace(redirect) {
                            previous.abort();
                        }
                    }
                }
            }
        }

        // Overlapping refetches are safe; each list keeps the newest issued.
        let tracker = &self.tracker;
        let results = join_all(refetches.into_iter().map(|t| tracker.refresh(t))).await;
        for result in results {
            let _ = self.report(result);
        }
    }

    fn persist_client_id(&mut self, id: ClientId) {
        tracing::info!(client_id = %id, "Client id assigned");
        self.identity = self.identity.clone().with_client_id(Some(id));
        self.identities.save_client_id(self.identity.session_id, id);
    }

    async fn prompt_roll(&mut self, request: RollRequest) {
        tracing::info!(reason = %request.reason, dice_type = request.dice_type, "Roll requested");
        self.roll_prompt = Some(request.clone());
        let Some(random) = self.auto_roll.clone() else {
            return;
        };
        let formula = match request.formula() {
            Ok(formula) => formula,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot roll requested die");
                return;
            }
        };
        let roll = formula.roll_with(|sides| random.roll_die(sides));
        tracing::info!(roll = %roll.breakdown(), "Auto-rolled");
        let _ = self.submit_roll(roll.total).await;
    }

    /// Answer the open roll prompt with `value` and close it.
    pub async fn submit_roll(&mut self, value: i32) -> Result<(), ServiceError> {
        let Some(request) = self.roll_prompt.take() else {
            return Err(DomainError::validation("no roll has been requested").into());
        };
        let input = PlayerInput::answering(
            &request,
            value,
            self.identity.subscription_client_id(),
            self.identity.name.clone().unwrap_or_default(),
        );
        let result = self
            .sessions
            .add_player_input(self.identity.session_id, &input)
            .await;
        if result.is_err() {
            self.roll_prompt = Some(request);
        }
        self.report(result)
    }

    /// Close the roll prompt without answering.
    pub fn dismiss_roll(&mut self) {
        self.roll_prompt = None;
    }

    fn sender_name(&self) -> String {
        self.identity.name.clone().unwrap_or_default()
    }

    /// Message (or DM secret) to `recipients`; [`ClientId::ALL_PLAYERS`]
    /// addresses everyone.
    pub async fn send_message(
        &mut self,
        text: &str,
        recipients: Vec<ClientId>,
    ) -> Result<(), ServiceError> {
        let message = PlayerMessage::new(self.sender_name(), text, recipients);
        let result = self
            .sessions
            .send_message(self.identity.session_id, &message)
            .await;
        self.report(result)
    }

    /// Reply to everyone in the current thread.
    pub async fn reply(&mut self, text: &str) -> Result<(), ServiceError> {
        let message = match self.threads.reply(&self.sender_name(), text) {
            Some(Ok(message)) => message,
            Some(Err(e)) => return self.report(Err(e.into())),
            None => {
                return self.report(Err(
                    DomainError::validation("no conversation to reply to").into()
                ))
            }
        };
        let result = self
            .sessions
            .send_message(self.identity.session_id, &message)
            .await;
        self.report(result)
    }

    /// DM only: end the session for every connected client.
    pub async fn end_session(&mut self) -> Result<(), ServiceError> {
        if !self.identity.is_dungeon_master() {
            return Err(DomainError::validation("only the DM can end a session").into());
        }
        let result = self.sessions.end_session(self.identity.session_id).await;
        self.report(result)
    }

    /// Unmount: close the socket and drop in-memory session state.
    pub fn leave(mut self) {
        tracing::info!(session = %self.identity.session_id, "Leaving session");
        self.threads.clear();
        if let Some(redirect) = self.pending_navigation.take() {
            redirect.abort();
        }
        if let Some(handle) = self.connection.take() {
            tracing::debug!(state = %handle.state(), "Closing session socket");
            handle.disconnect();
        }
    }
}
