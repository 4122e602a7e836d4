//! Scryer Player - headless session client.
//!
//! Joins the configured session as the DM, a player or an observer, logs
//! what the session view would show, and exits when the view navigates away.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scryer_domain::{Creature, RollRequest, SessionId};
use scryer_player::application::alerts::AlertInfo;
use scryer_player::application::api::Api;
use scryer_player::application::identity_store::IdentityStore;
use scryer_player::application::services::{RulesService, SessionService};
use scryer_player::application::{RuntimeDeps, SessionRuntime};
use scryer_player::infrastructure::config::{load_dotenv_from_repo_root, ClientConfig};
use scryer_player::infrastructure::http_client::HttpApiClient;
use scryer_player::infrastructure::messaging::ConnectionState;
use scryer_player::infrastructure::platform::{
    DesktopRandomProvider, DesktopStorageProvider, SystemClock,
};
use scryer_player::infrastructure::websocket::{create_connection, session_socket_url, SocketQuery};
use scryer_player::ports::outbound::{Destination, NavigationPort, RandomProvider, SessionEvent};

/// Forwards navigation requests to the main loop, which exits on the first.
struct ExitOnNavigate(mpsc::UnboundedSender<Destination>);

impl NavigationPort for ExitOnNavigate {
    fn navigate(&self, destination: Destination) {
        let _ = self.0.send(destination);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scryer_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Scryer player");

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let session_id: SessionId = config
        .session_id
        .context("SCRYER_SESSION_ID must be set")?;

    let api = Api::new(Arc::new(HttpApiClient::new(
        &config.api_base_url,
        config.request_timeout,
    )));
    let rules = RulesService::new(Api::new(Arc::new(HttpApiClient::new(
        &config.rules_api_base_url,
        config.request_timeout,
    ))));

    let session = SessionService::new(api.clone())
        .get_session(session_id)
        .await?
        .with_context(|| format!("session {} does not exist", session_id))?;
    tracing::info!(session = %session_id, name = %session.session_name, "Found session");

    let identities = IdentityStore::new(Arc::new(DesktopStorageProvider::new()));
    if let Some(name) = &config.player_name {
        identities.save_name(session_id, name);
    }

    let identity = identities.load(session_id, config.role);
    let query = SocketQuery {
        role: Some(identity.role),
        name: identity.name.clone(),
        existing_client_uuid: identity.client_id,
    };
    let url = session_socket_url(&config.websocket_base_url, session_id, &query)?;
    tracing::info!(%url, "Connecting to session socket");

    let connection = create_connection(url.as_str());
    let mut events = connection.event_bus.subscribe_channel().await;

    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    let auto_roll: Option<Arc<dyn RandomProvider>> = if config.auto_roll {
        Some(Arc::new(DesktopRandomProvider))
    } else {
        None
    };
    let deps = RuntimeDeps {
        api,
        commands: connection.command_bus.clone(),
        identities,
        navigator: Arc::new(ExitOnNavigate(nav_tx)),
        clock: Arc::new(SystemClock),
        auto_roll,
    };
    let mut runtime = SessionRuntime::mount(deps, session_id, config.role);
    runtime.attach_connection(connection.handle);

    if let Err(e) = runtime.load().await {
        tracing::warn!(error = %e, "Initial load failed; waiting for updates");
    }
    let mut view = ViewLog::default();
    view.report(&runtime, &rules).await;

    loop {
        tokio::select! {
            Some(destination) = nav_rx.recv() => {
                tracing::info!(%destination, "Session view closed");
                break;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("Session event stream ended");
                    break;
                };
                let failed = matches!(
                    event,
                    SessionEvent::ConnectionStateChanged(ConnectionState::Failed)
                );
                runtime.handle(event).await;
                view.report(&runtime, &rules).await;
                if failed {
                    anyhow::bail!("could not stay connected to the session");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    runtime.leave();
    Ok(())
}

/// What has already been logged, so only changes are reported.
#[derive(Default)]
struct ViewLog {
    order: Vec<(String, i32)>,
    messages: usize,
    prompt: Option<RollRequest>,
    alert: Option<AlertInfo>,
}

fn summary(order: &[Creature]) -> Vec<(String, i32)> {
    order.iter().map(|c| (c.name.clone(), c.initiative)).collect()
}

impl ViewLog {
    async fn report(&mut self, runtime: &SessionRuntime, rules: &RulesService) {
        let order = summary(&runtime.tracker().initiative());
        if order != self.order {
            let line: Vec<String> = order
                .iter()
                .map(|(name, init)| format!("{} ({})", name, init))
                .collect();
            tracing::info!(order = %line.join(", "), "Initiative order");
            self.order = order;
        }

        let threads = runtime.threads();
        if threads.len() > self.messages {
            if let Some(received) = threads.current_messages().last() {
                tracing::info!(from = %received.message.sender, "{}", received.message.message);
            }
            self.messages = threads.len();
        }

        let prompt = runtime.roll_prompt().cloned();
        if prompt != self.prompt {
            if let Some(request) = &prompt {
                let index = request.reason.trim().to_lowercase().replace(' ', "-");
                let hint = match rules.get_skill(&index).await {
                    Ok(skill) => skill.desc.join(" "),
                    Err(e) => {
                        tracing::debug!(error = %e, "No skill description for roll");
                        String::new()
                    }
                };
                tracing::info!(
                    reason = %request.reason,
                    die = request.dice_type,
                    hint = %hint,
                    "Roll requested; set SCRYER_AUTO_ROLL=true to answer automatically"
                );
            }
            self.prompt = prompt;
        }

        let alert = runtime.alert().cloned();
        if alert != self.alert {
            if let Some(alert) = &alert {
                tracing::info!(severity = %alert.severity, "{}", alert.message);
            }
            self.alert = alert;
        }
    }
}
