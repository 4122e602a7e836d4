//! Alert banner: one time-boxed, dismissible notice at a time.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// How long an alert stays up unless dismissed or replaced.
pub const ALERT_DURATION_MS: i64 = 3_000;

pub const ORDER_UPDATED_MESSAGE: &str = "Initiative order updates.";
pub const SESSION_ENDED_MESSAGE: &str = "The current session has ended.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertSeverity::Success => "success",
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertInfo {
    pub message: String,
    pub severity: AlertSeverity,
}

impl AlertInfo {
    pub fn new(message: impl Into<String>, severity: AlertSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, AlertSeverity::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, AlertSeverity::Error)
    }
}

#[derive(Debug, Clone)]
struct ShownAlert {
    alert: AlertInfo,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertBanner {
    shown: Option<ShownAlert>,
}

impl AlertBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `alert`, replacing any current one and restarting the timer.
    pub fn raise(&mut self, alert: AlertInfo, now: DateTime<Utc>) {
        tracing::debug!(severity = %alert.severity, message = %alert.message, "Alert raised");
        self.shown = Some(ShownAlert {
            alert,
            expires_at: now + Duration::milliseconds(ALERT_DURATION_MS),
        });
    }

    /// The alert on screen at `now`, if it has not expired.
    pub fn current(&self, now: DateTime<Utc>) -> Option<&AlertInfo> {
        self.shown
            .as_ref()
            .filter(|shown| now < shown.expires_at)
            .map(|shown| &shown.alert)
    }

    pub fn dismiss(&mut self) {
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_three_seconds() {
        let mut banner = AlertBanner::new();
        let t0 = Utc::now();
        banner.raise(AlertInfo::info(ORDER_UPDATED_MESSAGE), t0);

        assert!(banner.current(t0 + Duration::milliseconds(2_999)).is_some());
        assert!(banner.current(t0 + Duration::milliseconds(3_000)).is_none());
    }

    #[test]
    fn new_alert_replaces_and_restarts() {
        let mut banner = AlertBanner::new();
        let t0 = Utc::now();
        banner.raise(AlertInfo::info("first"), t0);
        banner.raise(AlertInfo::error("second"), t0 + Duration::seconds(2));

        let shown = banner.current(t0 + Duration::seconds(4)).unwrap();
        assert_eq!(shown.message, "second");
        assert_eq!(shown.severity, AlertSeverity::Error);
    }

    #[test]
    fn dismiss_clears() {
        let mut banner = AlertBanner::new();
        let t0 = Utc::now();
        banner.raise(AlertInfo::new("Saved", AlertSeverity::Success), t0);
        banner.dismiss();
        assert!(banner.current(t0).is_none());
    }
}
