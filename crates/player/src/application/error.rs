//! Service layer error types
//!
//! Wraps transport errors from the HTTP port and domain validation failures
//! so callers deal with one error type per service call.

use scryer_domain::DomainError;
use thiserror::Error;

use crate::ports::outbound::ApiError;

/// Errors that can occur in service operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The HTTP call failed or returned something unusable
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input rejected before anything was sent
    #[error("Invalid input: {0}")]
    Invalid(#[from] DomainError),

    /// The server answered, but without the data the call promises
    #[error("Server returned empty response")]
    EmptyResponse,

    /// The session socket is gone
    #[error("Not connected to session")]
    NotConnected,
}

impl ServiceError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Api(e) if e.is_not_found())
    }

    /// Text suitable for an error alert.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Api(ApiError::HttpError { status, body }) if !body.is_empty() => {
                format!("Request failed ({}): {}", status, body)
            }
            ServiceError::Api(ApiError::RequestFailed(_)) => {
                "Could not reach the session server.".to_string()
            }
            other => other.to_string(),
        }
    }
}
