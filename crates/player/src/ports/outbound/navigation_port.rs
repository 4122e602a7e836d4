//! Navigation Port - leaving the session view
//!
//! The runtime never owns a UI; it asks the host to move elsewhere when the
//! session ends or the participant has not picked a name yet.

use std::fmt;

/// Where the host should take the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The DM's session list.
    Home,
    /// The join page where a participant enters a name.
    JoinPage,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Home => write!(f, "home"),
            Destination::JoinPage => write!(f, "join page"),
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait NavigationPort: Send + Sync {
    fn navigate(&self, destination: Destination);
}
