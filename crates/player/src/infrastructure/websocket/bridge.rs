//! Wires the session socket client to the command and event buses.
//!
//! Server events and state changes go through one queue before reaching the
//! bus, so subscribers observe them in the order they happened.

use tokio::sync::{mpsc, oneshot};

use super::desktop::SessionSocketClient;
use crate::infrastructure::messaging::{
    BusMessage, CommandBus, ConnectionHandle, EventBus, SharedConnectionState,
};
use crate::ports::outbound::SessionEvent;

/// One session socket as the application sees it.
pub struct Connection {
    /// Outbound events for the server
    pub command_bus: CommandBus,
    /// Server events and connection state changes
    pub event_bus: EventBus,
    /// Socket state and close
    pub handle: ConnectionHandle,
}

/// Open the session socket at `url` in the background.
///
/// Must be called from within a tokio runtime. Subscribe to the returned
/// event bus before yielding if the first events matter.
pub fn create_connection(url: &str) -> Connection {
    let (command_bus, cmd_rx) = CommandBus::channel();
    let (close_tx, close_rx) = oneshot::channel::<()>();
    let state = SharedConnectionState::new();
    let event_bus = EventBus::new();

    tokio::spawn(bridge_task(
        SessionSocketClient::new(url),
        cmd_rx,
        close_rx,
        event_bus.clone(),
        state.clone(),
    ));

    Connection {
        command_bus,
        event_bus,
        handle: ConnectionHandle::new(state, close_tx),
    }
}

async fn bridge_task(
    client: SessionSocketClient,
    mut cmd_rx: mpsc::Receiver<BusMessage>,
    mut close_rx: oneshot::Receiver<()>,
    event_bus: EventBus,
    state: SharedConnectionState,
) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<SessionEvent>();

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            event_bus.dispatch(event).await;
        }
    });

    let state_events = event_tx.clone();
    client
        .set_on_state_change(move |conn_state| {
            state.set(conn_state);
            let _ = state_events.send(SessionEvent::ConnectionStateChanged(conn_state));
        })
        .await;

    client
        .set_on_message(move |event| {
            tracing::debug!(event = ?event.event_type(), "Session event received");
            let _ = event_tx.send(SessionEvent::Server(event));
        })
        .await;

    // connect() lives as long as the connection, reconnects included
    let connector = client.clone();
    let mut connect_task = tokio::spawn(async move { connector.connect().await });

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                tracing::info!("Disconnect requested");
                client.disconnect().await;
                break;
            }

            result = &mut connect_task => {
                match result {
                    Ok(Ok(())) => tracing::info!("Session connection closed"),
                    Ok(Err(e)) => tracing::error!("Failed to connect: {}", e),
                    Err(e) => tracing::error!("Connection task aborted: {}", e),
                }
                break;
            }

            Some(BusMessage::Send(event)) = cmd_rx.recv() => {
                if let Err(e) = client.send(event).await {
                    tracing::error!("Failed to send session event: {}", e);
                }
            }
        }
    }
}
