use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;
use crate::ids::ClientId;

/// A chat message or DM secret addressed to a subset of participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMessage {
    pub sender: String,
    pub message: String,
    pub client_uuids: Vec<ClientId>,
}

impl PlayerMessage {
    pub fn new(sender: impl Into<String>, message: impl Into<String>, client_uuids: Vec<ClientId>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
            client_uuids,
        }
    }

    pub fn thread_key(&self) -> ThreadKey {
        ThreadKey::for_recipients(&self.client_uuids)
    }
}

/// Conversation key: the recipient ids joined with `,` in the order given.
///
/// The same recipients listed in a different order form a different thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadKey(String);

impl ThreadKey {
    pub fn for_recipients(recipients: &[ClientId]) -> Self {
        let ids: Vec<String> = recipients.iter().map(ToString::to_string).collect();
        Self(ids.join(","))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recipients to address a reply in this thread to.
    pub fn recipients(&self) -> Result<Vec<ClientId>, DomainError> {
        if self.0.is_empty() {
            return Ok(Vec::new());
        }
        self.0.split(',').map(str::parse).collect()
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_order_sensitive() {
        let a = ClientId::new();
        let b = ClientId::new();
        assert_eq!(ThreadKey::for_recipients(&[a, b]), ThreadKey::for_recipients(&[a, b]));
        assert_ne!(ThreadKey::for_recipients(&[a, b]), ThreadKey::for_recipients(&[b, a]));
    }

    #[test]
    fn recipients_split_the_key() {
        let a = ClientId::new();
        let b = ClientId::new();
        let key = ThreadKey::for_recipients(&[a, b]);
        assert_eq!(key.as_str(), format!("{},{}", a, b));
        assert_eq!(key.recipients().unwrap(), vec![a, b]);
        assert!(ThreadKey::for_recipients(&[]).recipients().unwrap().is_empty());
    }
}
