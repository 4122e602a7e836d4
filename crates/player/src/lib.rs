//! Scryer player: the session client shared by the DM and player views.
//!
//! `application` holds the session runtime and typed REST services,
//! `infrastructure` the reqwest/tokio-tungstenite adapters, and `ports` the
//! traits between them.

pub mod application;
pub mod infrastructure;
pub mod ports;
