//! Desktop WebSocket client using tokio-tungstenite

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use scryer_shared::{ClientEvent, ServerEvent};

use crate::infrastructure::messaging::{ConnectionState, COMMAND_BUFFER};
use crate::infrastructure::websocket::shared::{parse_server_event, MAX_RETRY_ATTEMPTS};
use crate::infrastructure::websocket::BackoffState;

type MessageCallback = Arc<Mutex<Option<Box<dyn Fn(ServerEvent) + Send + Sync>>>>;
type StateCallback = Arc<Mutex<Option<Box<dyn Fn(ConnectionState) + Send + Sync>>>>;

/// WebSocket client for one session channel (Desktop)
pub struct SessionSocketClient {
    url: String,
    state: Arc<RwLock<ConnectionState>>,
    tx: Arc<Mutex<Option<mpsc::Sender<ClientEvent>>>>,
    on_message: MessageCallback,
    on_state_change: StateCallback,
    /// Set when the application asked to close; suppresses reconnection
    intentional_disconnect: Arc<RwLock<bool>>,
}

impl SessionSocketClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            tx: Arc::new(Mutex::new(None)),
            on_message: Arc::new(Mutex::new(None)),
            on_state_change: Arc::new(Mutex::new(None)),
            intentional_disconnect: Arc::new(RwLock::new(false)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_on_message<F>(&self, callback: F)
    where
        F: Fn(ServerEvent) + Send + Sync + 'static,
    {
        let mut on_message = self.on_message.lock().await;
        *on_message = Some(Box::new(callback));
    }

    pub async fn set_on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let mut on_state_change = self.on_state_change.lock().await;
        *on_state_change = Some(Box::new(callback));
    }

    async fn set_state(&self, new_state: ConnectionState) {
        {
            let mut state = self.state.write().await;
            *state = new_state;
        }

        let callback = self.on_state_change.lock().await;
        if let Some(ref cb) = *callback {
            cb(new_state);
        }
    }

    /// One connection attempt; returns whether the connection closed unexpectedly.
    ///
    /// Retries stay in `Reconnecting` until they succeed; failure is reported
    /// by the caller.
    async fn connect_internal(&self, initial: bool) -> Result<bool> {
        if initial {
            self.set_state(ConnectionState::Connecting).await;
        }

        match connect_async(self.url.as_str()).await {
            Ok((ws_stream, _)) => {
                tracing::info!(url = %self.url, "Connected to session channel");

                let (mut write, mut read) = ws_stream.split();

                let (tx, mut rx) = mpsc::channel::<ClientEvent>(COMMAND_BUFFER);
                {
                    let mut tx_lock = self.tx.lock().await;
                    *tx_lock = Some(tx);
                }

                // Announce only once the outbound queue exists, so a subscriber
                // reacting to `Connected` can already send.
                self.set_state(ConnectionState::Connected).await;

                let on_message = Arc::clone(&self.on_message);
                let state = Arc::clone(&self.state);
                let on_state_change = Arc::clone(&self.on_state_change);
                let intentional_disconnect = Arc::clone(&self.intentional_disconnect);

                let mut read_handle = tokio::spawn(async move {
                    let mut unexpected_close = false;
                    while let Some(msg) = read.next().await {
                        match msg {
                            Ok(Message::Text(text)) => match parse_server_event(&text) {
                                Ok(ServerEvent::Unknown(tag)) => {
                                    tracing::debug!(event_type = %tag, "Ignoring unknown session event");
                                }
                                Ok(event) => {
                                    let callback = on_message.lock().await;
                                    if let Some(ref cb) = *callback {
                                        cb(event);
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Failed to decode session event: {}", e);
                                }
                            },
                            Ok(Message::Close(_)) => {
                                tracing::info!("Server closed connection");
                                let intentional = *intentional_disconnect.read().await;
                                unexpected_close = !intentional;
                                break;
                            }
                            Ok(Message::Ping(_data)) => {}
                            Err(e) => {
                                tracing::error!("WebSocket error: {}", e);
                                unexpected_close = true;
                                break;
                            }
                            _ => {}
                        }
                    }

                    {
                        let mut s = state.write().await;
                        *s = ConnectionState::Disconnected;
                    }
                    {
                        let callback = on_state_change.lock().await;
                        if let Some(ref cb) = *callback {
                            cb(ConnectionState::Disconnected);
                        }
                    }

                    unexpected_close
                });

                let mut write_handle = tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        let json = match event.encode() {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize session event: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(json)).await {
                            tracing::error!("Failed to send session event: {}", e);
                            return;
                        }
                    }
                    // Outbound queue dropped by `disconnect()`
                    let _ = write.send(Message::Close(None)).await;
                });

                let unexpected_close = tokio::select! {
                    result = &mut read_handle => {
                        tracing::debug!("Read task completed");
                        write_handle.abort();
                        result.unwrap_or(true)
                    }
                    _ = &mut write_handle => {
                        tracing::debug!("Write task completed");
                        read_handle.abort();
                        !*self.intentional_disconnect.read().await
                    }
                };

                {
                    let mut tx_lock = self.tx.lock().await;
                    *tx_lock = None;
                }

                Ok(unexpected_close)
            }
            Err(e) => {
                tracing::warn!(url = %self.url, "Failed to connect to session channel: {}", e);
                Err(e.into())
            }
        }
    }

    /// Attempt to reconnect with exponential backoff
    async fn reconnect_with_backoff(&self) {
        let mut backoff = BackoffState::default();

        self.set_state(ConnectionState::Reconnecting).await;
        loop {
            let Some(delay) = backoff.next_delay_and_advance() else {
                tracing::error!("Max reconnection attempts reached, giving up");
                self.set_state(ConnectionState::Failed).await;
                return;
            };
            tracing::info!(
                attempt = backoff.attempts(),
                max_attempts = MAX_RETRY_ATTEMPTS,
                delay_ms = delay,
                "Reconnecting to session channel"
            );

            tokio::time::sleep(Duration::from_millis(delay)).await;

            if *self.intentional_disconnect.read().await {
                tracing::info!("Reconnection cancelled - intentional disconnect");
                self.set_state(ConnectionState::Disconnected).await;
                return;
            }

            match self.connect_internal(false).await {
                Ok(unexpected_close) => {
                    if unexpected_close && !*self.intentional_disconnect.read().await {
                        // Was up for a while; a fresh drop gets a fresh schedule.
                        backoff.reset();
                        self.set_state(ConnectionState::Reconnecting).await;
                        continue;
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!(attempt = backoff.attempts(), "Reconnection attempt failed: {}", e);
                }
            }
        }
    }

    /// Connect and keep the connection alive until an intentional disconnect,
    /// a clean close, or reconnection gives up.
    ///
    /// Only the very first connection attempt reports failure as `Err`.
    pub async fn connect(&self) -> Result<()> {
        {
            let mut flag = self.intentional_disconnect.write().await;
            *flag = false;
        }

        let unexpected_close = match self.connect_internal(true).await {
            Ok(unexpected_close) => unexpected_close,
            Err(e) => {
                self.set_state(ConnectionState::Failed).await;
                return Err(e);
            }
        };
        if unexpected_close && !*self.intentional_disconnect.read().await {
            tracing::info!("Connection closed unexpectedly, initiating reconnection");
            self.reconnect_with_backoff().await;
        }
        Ok(())
    }

    pub async fn send(&self, event: ClientEvent) -> Result<()> {
        // Clone the sender to avoid holding the lock across await
        let tx = {
            let tx_lock = self.tx.lock().await;
            tx_lock.clone()
        };
        if let Some(tx) = tx {
            tx.send(event).await?;
            Ok(())
        } else {
            Err(anyhow::anyhow!("Not connected"))
        }
    }

    pub async fn disconnect(&self) {
        {
            let mut flag = self.intentional_disconnect.write().await;
            *flag = true;
        }
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = None;
        }
        self.set_state(ConnectionState::Disconnected).await;
    }
}

impl Clone for SessionSocketClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            state: Arc::clone(&self.state),
            tx: Arc::clone(&self.tx),
            on_message: Arc::clone(&self.on_message),
            on_state_change: Arc::clone(&self.on_state_change),
            intentional_disconnect: Arc::clone(&self.intentional_disconnect),
        }
    }
}
