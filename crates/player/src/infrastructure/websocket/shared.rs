//! Shared helpers for the WebSocket client: reconnection constants, frame
//! parsing and the session socket URL.

use scryer_domain::{ClientId, Role, SessionId};
use scryer_shared::{EventDecodeError, ServerEvent};
use url::Url;

// Reconnection constants
pub const INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;
pub const MAX_RETRY_ATTEMPTS: u32 = 10;
pub const BACKOFF_MULTIPLIER: f64 = 2.0;

pub fn parse_server_event(text: &str) -> Result<ServerEvent, EventDecodeError> {
    ServerEvent::decode(text)
}

/// Optional query parameters on the session socket URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketQuery {
    pub role: Option<Role>,
    pub name: Option<String>,
    pub existing_client_uuid: Option<ClientId>,
}

impl SocketQuery {
    fn is_empty(&self) -> bool {
        self.role.is_none() && self.name.is_none() && self.existing_client_uuid.is_none()
    }
}

/// `{base}/sessions/{session_id}/ws`, plus any query parameters.
pub fn session_socket_url(
    base: &str,
    session_id: SessionId,
    query: &SocketQuery,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}/sessions/{}/ws",
        base.trim_end_matches('/'),
        session_id
    ))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        if let Some(role) = query.role {
            pairs.append_pair("role", role.as_str());
        }
        if let Some(name) = &query.name {
            pairs.append_pair("name", name);
        }
        if let Some(id) = query.existing_client_uuid {
            pairs.append_pair("existing_client_uuid", &id.to_string());
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_query() {
        let session = SessionId::new();
        let url = session_socket_url("ws://localhost:8000/", session, &SocketQuery::default())
            .unwrap();
        assert_eq!(
            url.as_str(),
            format!("ws://localhost:8000/sessions/{}/ws", session)
        );
    }

    #[test]
    fn url_query_is_encoded() {
        let session = SessionId::new();
        let client = ClientId::new();
        let query = SocketQuery {
            role: Some(Role::Player),
            name: Some("Sir Robin".into()),
            existing_client_uuid: Some(client),
        };
        let url = session_socket_url("wss://scryer.example", session, &query).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("role".to_string(), "player".to_string()),
                ("name".to_string(), "Sir Robin".to_string()),
                ("existing_client_uuid".to_string(), client.to_string()),
            ]
        );
    }

    #[test]
    fn bad_base_is_rejected() {
        assert!(session_socket_url("not a url", SessionId::new(), &SocketQuery::default()).is_err());
    }
}
