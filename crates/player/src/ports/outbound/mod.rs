//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to interact with external systems without
//! depending on concrete implementations.

pub mod navigation_port;
pub mod platform;
pub mod raw_api_port;
pub mod session_events;

pub use navigation_port::{Destination, NavigationPort};
pub use platform::{storage_keys, ClockPort, RandomProvider, StorageProvider};
pub use raw_api_port::{ApiError, RawApiPort};
pub use session_events::SessionEvent;

#[cfg(any(test, feature = "testing"))]
pub use navigation_port::MockNavigationPort;
#[cfg(any(test, feature = "testing"))]
pub use platform::{MockClockPort, MockRandomProvider};
#[cfg(any(test, feature = "testing"))]
pub use raw_api_port::MockRawApiPort;
