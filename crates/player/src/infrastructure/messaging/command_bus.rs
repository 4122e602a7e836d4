//! Command Bus for sending events to the session server.
//!
//! The only outbound socket traffic is the join subscription, so the bus is
//! fire-and-forget; REST covers everything that needs a response.

use anyhow::Result;
use scryer_shared::ClientEvent;
use tokio::sync::mpsc;

/// Capacity of the outbound queue between the application and the bridge.
pub const COMMAND_BUFFER: usize = 32;

/// Message types sent through the command bus to the WebSocket bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    Send(ClientEvent),
}

/// Command bus for sending events to the session server.
///
/// This is a concrete struct (not a trait) that can be cloned and shared.
/// Services depend on this directly rather than through a trait object.
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<BusMessage>,
}

impl CommandBus {
    pub fn new(tx: mpsc::Sender<BusMessage>) -> Self {
        Self { tx }
    }

    /// Bus plus the receiving end, for bridges and tests.
    pub fn channel() -> (Self, mpsc::Receiver<BusMessage>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        (Self::new(tx), rx)
    }

    /// Queue an event without waiting; fails when the queue is full or the
    /// bridge has shut down.
    pub fn send(&self, event: ClientEvent) -> Result<()> {
        self.tx
            .try_send(BusMessage::Send(event))
            .map_err(|e| anyhow::anyhow!("CommandBus send failed: {}", e))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
