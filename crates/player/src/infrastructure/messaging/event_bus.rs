//! Event Bus for receiving events from the session server.
//!
//! Subscribers register callbacks that are invoked, in registration order,
//! for every event the bridge dispatches.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::ports::outbound::SessionEvent;

type Subscriber = Box<dyn FnMut(SessionEvent) + Send + 'static>;

/// Event bus for receiving session events.
///
/// The bus holds strong references to subscribers, so they persist until
/// cleared or the bus is dropped.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to all events.
    pub async fn subscribe(&self, callback: impl FnMut(SessionEvent) + Send + 'static) {
        self.subscribers.lock().await.push(Box::new(callback));
    }

    /// Subscribe through an unbounded channel, for consumers that handle
    /// events with async code.
    pub async fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(move |event| {
            if tx.send(event).is_err() {
                tracing::trace!("Session event receiver dropped");
            }
        })
        .await;
        rx
    }

    /// Dispatch an event to all subscribers.
    pub async fn dispatch(&self, event: SessionEvent) {
        let mut subscribers = self.subscribers.lock().await;
        for subscriber in subscribers.iter_mut() {
            subscriber(event.clone());
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn clear(&self) {
        self.subscribers.lock().await.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
