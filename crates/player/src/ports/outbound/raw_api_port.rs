//! Raw API Port - Object-safe HTTP boundary
//!
//! `RawApiPort` speaks `serde_json::Value` so it can be stored behind
//! `Arc<dyn RawApiPort>`. The application layer wraps it in the typed
//! [`Api`](crate::application::api::Api) helper.
//!
//! Two adapters implement it: the reqwest client talking to the session
//! server or the rules API, and the in-memory fake backend used by tests.

use serde_json::Value;

/// Errors surfaced by the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Failed to serialize request: {0}")]
    SerializeError(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::HttpError { status: 404, .. })
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait RawApiPort: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    /// Like `get_json`, but a 404 yields `Ok(None)`.
    async fn get_optional_json(&self, path: &str) -> Result<Option<Value>, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    /// POST without a request body; the response body (if any) is returned.
    async fn post_empty(&self, path: &str) -> Result<Value, ApiError>;

    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;

    async fn delete(&self, path: &str) -> Result<(), ApiError>;
}
