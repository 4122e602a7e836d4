//! Application layer: typed services over the HTTP port, plus the session
//! view state that reacts to socket events.

pub mod alerts;
pub mod api;
pub mod controller;
pub mod error;
pub mod identity_store;
pub mod runtime;
pub mod services;
pub mod sync;
pub mod threads;
pub mod tracker;

pub use error::ServiceError;
pub use runtime::{RuntimeDeps, SessionRuntime};
