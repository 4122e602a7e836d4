//! reqwest adapter for [`RawApiPort`].
//!
//! One instance per base URL: the session server and the public rules API
//! each get their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::ports::outbound::{ApiError, RawApiPort};

#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
            tracing::debug!(status = status.as_u16(), body = %body, "Request rejected");
            return Err(ApiError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Some endpoints answer with an empty body; treat that as `null`.
    async fn json_body(response: Response) -> Result<Value, ApiError> {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl RawApiPort for HttpApiClient {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        tracing::trace!(path, "GET");
        let response = self.send(self.client.get(self.url(path))).await?;
        Self::json_body(response).await
    }

    async fn get_optional_json(&self, path: &str) -> Result<Option<Value>, ApiError> {
        match self.get_json(path).await {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::HttpError { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::trace!(path, "POST");
        let response = self.send(self.client.post(self.url(path)).json(body)).await?;
        Self::json_body(response).await
    }

    async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        tracing::trace!(path, "POST");
        let response = self.send(self.client.post(self.url(path))).await?;
        Self::json_body(response).await
    }

    async fn patch_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::trace!(path, "PATCH");
        let response = self
            .send(self.client.patch(self.url(path)).json(body))
            .await?;
        Self::json_body(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        tracing::trace!(path, "DELETE");
        self.send(self.client.delete(self.url(path))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_onto_base() {
        let client = HttpApiClient::new("http://localhost:8000/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/sessions"), "http://localhost:8000/sessions");
        assert_eq!(client.url("skills"), "http://localhost:8000/skills");
    }

    #[tokio::test]
    async fn unreachable_server_is_request_failure() {
        let client = HttpApiClient::new("http://127.0.0.1:9", Duration::from_millis(500));
        let err = client.get_json("/sessions").await.unwrap_err();
        assert!(matches!(err, ApiError::RequestFailed(_)));
    }
}
