//! Platform abstraction ports
//!
//! These traits abstract platform-specific operations so that application code
//! stays testable: storage, wall clock and dice randomness all have desktop
//! implementations in `infrastructure::platform` and in-memory ones for tests.

use chrono::{DateTime, Utc};

/// Persistent key/value storage (file-backed on desktop).
pub trait StorageProvider: Send + Sync {
    /// Save a string value with the given key
    fn save(&self, key: &str, value: &str);

    /// Load a string value by key, returns None if not found
    fn load(&self, key: &str) -> Option<String>;

    /// Remove a value by key
    fn remove(&self, key: &str);
}

/// Wall clock.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of die faces for local rolls.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait RandomProvider: Send + Sync {
    /// A uniformly random face in `1..=sides`.
    fn roll_die(&self, sides: u32) -> u32;
}

/// Storage key constants
///
/// Per-session values are stored under `{session_id}/{key}`; see
/// [`scoped`].
pub mod storage_keys {
    pub const CLIENT_ID: &str = "clientId";
    pub const PLAYER_NAME: &str = "player-name";
    /// Last session this client joined. Not scoped.
    pub const SESSION: &str = "session";

    pub fn scoped(session_id: &str, key: &str) -> String {
        format!("{}/{}", session_id, key)
    }
}
