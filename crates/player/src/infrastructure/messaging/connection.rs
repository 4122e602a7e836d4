//! Socket state shared between the bridge and the application, and the
//! handle the application closes the socket with.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

/// State of the session socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    /// First connection attempt in flight
    Connecting = 1,
    Connected = 2,
    /// The socket dropped; retrying on the backoff schedule
    Reconnecting = 3,
    /// Gave up: the first attempt failed or every retry did
    Failed = 4,
}

impl ConnectionState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Reconnecting,
            4 => Self::Failed,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        })
    }
}

/// Latest socket state; written by the bridge, read through the handle.
#[derive(Debug, Clone)]
pub struct SharedConnectionState(Arc<AtomicU8>);

impl SharedConnectionState {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_raw(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner's grip on one session socket.
///
/// Dropping the handle leaves the socket open; call [`disconnect`](Self::disconnect).
pub struct ConnectionHandle {
    state: SharedConnectionState,
    close: oneshot::Sender<()>,
}

impl ConnectionHandle {
    pub fn new(state: SharedConnectionState, close: oneshot::Sender<()>) -> Self {
        Self { state, close }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Close the socket and stop reconnecting. A closed connection is not reused.
    pub fn disconnect(self) {
        let _ = self.close.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_state_round_trips_every_variant() {
        let shared = SharedConnectionState::new();
        assert_eq!(shared.get(), ConnectionState::Disconnected);

        for state in [
            ConnectionState::Connecting,
            ConnectionState::Connected,
            ConnectionState::Reconnecting,
            ConnectionState::Failed,
            ConnectionState::Disconnected,
        ] {
            shared.set(state);
            assert_eq!(shared.get(), state);
        }
    }

    #[tokio::test]
    async fn handle_reads_bridge_state_and_signals_close() {
        let shared = SharedConnectionState::new();
        let (tx, rx) = oneshot::channel();
        let handle = ConnectionHandle::new(shared.clone(), tx);

        shared.set(ConnectionState::Reconnecting);
        assert_eq!(handle.state(), ConnectionState::Reconnecting);

        handle.disconnect();
        assert!(rx.await.is_ok());
    }
}
