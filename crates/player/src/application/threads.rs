//! Message threads.
//!
//! Messages are grouped by their exact recipient list (see [`ThreadKey`]).
//! The newest incoming message switches the current thread, and replies go
//! to the current thread's recipients.

use chrono::{DateTime, Utc};

use scryer_domain::{ClientId, Creature, DomainError, PlayerMessage, ThreadKey};

const ALL_PLAYERS_LABEL: &str = "All Players";

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedMessage {
    pub message: PlayerMessage,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub key: ThreadKey,
    /// Recipient names at the time the thread was opened
    pub label: String,
}

#[derive(Debug, Default)]
pub struct MessageThreads {
    messages: Vec<ReceivedMessage>,
    threads: Vec<Thread>,
    current: Option<ThreadKey>,
}

/// Display label for a recipient list, resolved against the roster.
pub fn thread_label(recipients: &[ClientId], roster: &[Creature]) -> String {
    recipients
        .iter()
        .map(|id| {
            if *id == ClientId::ALL_PLAYERS {
                return ALL_PLAYERS_LABEL.to_string();
            }
            roster
                .iter()
                .find(|c| c.creature_id.to_uuid() == id.to_uuid())
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.to_string().chars().take(8).collect())
        })
        .collect::<Vec<_>>()
        .join(",")
}

impl MessageThreads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming message and switch to its thread.
    pub fn receive(&mut self, message: PlayerMessage, roster: &[Creature], now: DateTime<Utc>) {
        let key = message.thread_key();
        if !self.threads.iter().any(|t| t.key == key) {
            self.threads.push(Thread {
                key: key.clone(),
                label: thread_label(&message.client_uuids, roster),
            });
        }
        self.messages.push(ReceivedMessage {
            message,
            received_at: now,
        });
        self.current = Some(key);
    }

    /// Switch to a known thread. Returns false for an unknown key.
    pub fn select(&mut self, key: &ThreadKey) -> bool {
        if self.threads.iter().any(|t| &t.key == key) {
            self.current = Some(key.clone());
            true
        } else {
            false
        }
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn current(&self) -> Option<&ThreadKey> {
        self.current.as_ref()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in `key`'s thread, oldest first.
    pub fn messages_in(&self, key: &ThreadKey) -> Vec<&ReceivedMessage> {
        self.messages
            .iter()
            .filter(|m| &m.message.thread_key() == key)
            .collect()
    }

    pub fn current_messages(&self) -> Vec<&ReceivedMessage> {
        match &self.current {
            Some(key) => self.messages_in(key),
            None => Vec::new(),
        }
    }

    /// A reply from `sender` to everyone in the current thread.
    ///
    /// `None` when no thread has been opened yet.
    pub fn reply(
        &self,
        sender: &str,
        text: &str,
    ) -> Option<Result<PlayerMessage, DomainError>> {
        let key = self.current.as_ref()?;
        Some(
            key.recipients()
                .map(|recipients| PlayerMessage::new(sender, text, recipients)),
        )
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
