//! Platform-specific implementations of the ports in `ports::outbound::platform`.
//!
//! `desktop` backs a real run; `memory` backs tests and throwaway sessions.

mod desktop;
mod memory;

pub use desktop::{DesktopRandomProvider, DesktopStorageProvider, SystemClock};
pub use memory::{ManualClock, MemoryStorageProvider};
