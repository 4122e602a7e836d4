//! WebSocket client for the session channel
//!
//! - `desktop`: tokio-tungstenite based client with reconnection
//! - `bridge`: wires the client to the command and event buses
//! - `shared`: constants, frame parsing and the socket URL

mod bridge;
mod core;
mod desktop;
mod shared;

pub use bridge::{create_connection, Connection};
pub use desktop::SessionSocketClient;
pub use shared::{
    parse_server_event, session_socket_url, SocketQuery, INITIAL_RETRY_DELAY_MS,
    MAX_RETRY_ATTEMPTS, MAX_RETRY_DELAY_MS,
};

pub(crate) use core::*;
