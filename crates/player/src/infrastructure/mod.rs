//! Infrastructure adapters: HTTP, session socket, platform storage and
//! configuration.

pub mod config;
pub mod http_client;
pub mod messaging;
pub mod platform;
pub mod websocket;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use messaging::{CommandBus, ConnectionState, EventBus};
