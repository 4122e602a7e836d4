//! Session events - what the connection bridge hands to the application.
//!
//! The bridge decodes wire frames into [`ServerEvent`] and also reports
//! connection state transitions on the same bus, so the runtime sees one
//! ordered stream per session.

use scryer_shared::ServerEvent;

use crate::infrastructure::messaging::ConnectionState;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A decoded frame from the server.
    Server(ServerEvent),
    /// The socket changed state (connected, reconnecting, failed, ...).
    ConnectionStateChanged(ConnectionState),
}

impl From<ServerEvent> for SessionEvent {
    fn from(event: ServerEvent) -> Self {
        SessionEvent::Server(event)
    }
}
