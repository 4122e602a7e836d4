//! Command Bus and Event Bus messaging infrastructure.
//!
//! - `CommandBus`: queue events for the session server (fire-and-forget)
//! - `EventBus`: receive decoded server events and connection state changes
//! - `ConnectionHandle`: read the socket state and close the socket
//!
//! The WebSocket bridge (in the websocket module) connects these buses to the actual transport.

pub mod command_bus;
pub mod connection;
pub mod event_bus;

pub use command_bus::{BusMessage, CommandBus, COMMAND_BUFFER};
pub use connection::{ConnectionHandle, ConnectionState, SharedConnectionState};
pub use event_bus::EventBus;
