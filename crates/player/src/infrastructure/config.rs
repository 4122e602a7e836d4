//! Client configuration from the environment.
//!
//! `.env.local` then `.env` at the repository root are loaded first (see
//! [`load_dotenv_from_repo_root`]); variables already set in the process win.

use std::time::Duration;

use scryer_domain::{DomainError, Role, SessionId};

pub const DEFAULT_API_BASEURL: &str = "http://localhost:8000";
pub const DEFAULT_WEBSOCKET_BASEURL: &str = "ws://localhost:8000";
pub const DEFAULT_RULES_API_BASEURL: &str = "https://www.dnd5eapi.co/api";
/// Default request timeout in milliseconds (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub websocket_base_url: String,
    pub rules_api_base_url: String,
    pub request_timeout: Duration,
    pub session_id: Option<SessionId>,
    pub role: Role,
    pub player_name: Option<String>,
    /// Answer roll prompts with a local roll instead of waiting for input.
    pub auto_roll: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASEURL.to_string(),
            websocket_base_url: DEFAULT_WEBSOCKET_BASEURL.to_string(),
            rules_api_base_url: DEFAULT_RULES_API_BASEURL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            session_id: None,
            role: Role::Player,
            player_name: None,
            auto_roll: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_base_url = get("SCRYER_API_BASEURL")
            .or_else(|| get("NEXT_PUBLIC_API_BASEURL"))
            .unwrap_or(defaults.api_base_url);
        let websocket_base_url = get("SCRYER_WEBSOCKET_BASEURL")
            .or_else(|| get("NEXT_PUBLIC_WEBSOCKET_BASEURL"))
            .unwrap_or(defaults.websocket_base_url);
        let rules_api_base_url =
            get("SCRYER_RULES_API_BASEURL").unwrap_or(defaults.rules_api_base_url);

        let request_timeout = match get("SCRYER_REQUEST_TIMEOUT_MS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %raw, "Ignoring invalid SCRYER_REQUEST_TIMEOUT_MS");
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        let session_id = get("SCRYER_SESSION_ID")
            .map(|raw| raw.parse::<SessionId>())
            .transpose()?;
        let role = get("SCRYER_ROLE")
            .map(|raw| raw.parse::<Role>())
            .transpose()?
            .unwrap_or(defaults.role);
        let player_name = get("SCRYER_PLAYER_NAME");
        let auto_roll = get("SCRYER_AUTO_ROLL")
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            api_base_url,
            websocket_base_url,
            rules_api_base_url,
            request_timeout,
            session_id,
            role,
            player_name,
            auto_roll,
        })
    }
}

/// Load `.env.local` then `.env` from the workspace root, if present.
pub fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ClientConfig, DomainError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config(&[]).unwrap(), ClientConfig::default());
    }

    #[test]
    fn legacy_names_are_fallbacks() {
        let cfg = config(&[
            ("NEXT_PUBLIC_API_BASEURL", "http://legacy:1"),
            ("NEXT_PUBLIC_WEBSOCKET_BASEURL", "ws://legacy:1"),
            ("SCRYER_WEBSOCKET_BASEURL", "ws://new:2"),
        ])
        .unwrap();
        assert_eq!(cfg.api_base_url, "http://legacy:1");
        assert_eq!(cfg.websocket_base_url, "ws://new:2");
    }

    #[test]
    fn parses_session_settings() {
        let session = SessionId::new();
        let cfg = config(&[
            ("SCRYER_SESSION_ID", &session.to_string()),
            ("SCRYER_ROLE", "dm"),
            ("SCRYER_PLAYER_NAME", "  "),
            ("SCRYER_AUTO_ROLL", "TRUE"),
            ("SCRYER_REQUEST_TIMEOUT_MS", "1500"),
        ])
        .unwrap();
        assert_eq!(cfg.session_id, Some(session));
        assert_eq!(cfg.role, Role::DungeonMaster);
        assert_eq!(cfg.player_name, None);
        assert!(cfg.auto_roll);
        assert_eq!(cfg.request_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn bad_values() {
        assert!(config(&[("SCRYER_SESSION_ID", "nope")]).is_err());
        assert!(config(&[("SCRYER_ROLE", "wizard")]).is_err());
        let cfg = config(&[("SCRYER_REQUEST_TIMEOUT_MS", "soon")]).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS));
    }
}
