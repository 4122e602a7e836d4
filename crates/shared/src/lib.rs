//! Scryer Shared - the wire contract between session server and clients
//!
//! - Session socket envelope and its inbound/outbound events
//! - REST bodies that wrap or batch domain entities
//!
//! Pure data and serialization; no I/O.

pub mod dto;
pub mod events;

pub use dto::{InitiativeTop, MultipleCharacters, StoredPlayerInput};
pub use events::{
    ClientEvent, ClientIdBody, EventDecodeError, EventEnvelope, EventType, JoinSessionBody,
    ServerEvent,
};
