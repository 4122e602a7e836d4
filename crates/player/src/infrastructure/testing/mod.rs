//! Test doubles for the outbound ports.

pub mod fake_backend;
pub mod fixtures;

pub use fake_backend::FakeSessionBackend;
