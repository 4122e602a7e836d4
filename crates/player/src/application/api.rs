//! Typed API wrapper for application services.
//!
//! `Api` wraps an `Arc<dyn RawApiPort>` and converts request and response
//! bodies with serde_json, so services only see domain types.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::ports::outbound::{ApiError, RawApiPort};

#[derive(Clone)]
pub struct Api {
    raw: Arc<dyn RawApiPort>,
}

fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::SerializeError(e.to_string()))
}

fn from_body<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::ParseError(e.to_string()))
}

impl Api {
    pub fn new(raw: Arc<dyn RawApiPort>) -> Self {
        Self { raw }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.raw.get_json(path).await?;
        from_body(value)
    }

    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        match self.raw.get_optional_json(path).await? {
            None => Ok(None),
            Some(value) => from_body(value).map(Some),
        }
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = self.raw.post_json(path, &to_body(body)?).await?;
        from_body(value)
    }

    /// POST whose response body is not needed.
    pub async fn post_no_response<B: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.raw.post_json(path, &to_body(body)?).await?;
        Ok(())
    }

    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.raw.post_empty(path).await?;
        Ok(())
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = self.raw.patch_json(path, &to_body(body)?).await?;
        from_body(value)
    }

    pub async fn patch_no_response<B: Serialize + Send + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.raw.patch_json(path, &to_body(body)?).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.raw.delete(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockRawApiPort;
    use mockall::predicate::eq;
    use scryer_domain::{Session, SessionId};
    use serde_json::json;

    #[tokio::test]
    async fn get_decodes_body() {
        let id = SessionId::new();
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json()
            .with(eq("/sessions"))
            .returning(move |_| {
                Ok(json!([{
                    "session_uuid": id.to_string(),
                    "session_name": "Goblin ambush",
                    "session_description": ""
                }]))
            });

        let api = Api::new(Arc::new(raw));
        let sessions: Vec<Session> = api.get("/sessions").await.unwrap();
        assert_eq!(sessions[0].session_uuid, id);
    }

    #[tokio::test]
    async fn shape_mismatch_is_parse_error() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_json().returning(|_| Ok(json!({"nope": true})));

        let api = Api::new(Arc::new(raw));
        let err = api.get::<Vec<Session>>("/sessions").await.unwrap_err();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[tokio::test]
    async fn missing_optional_is_none() {
        let mut raw = MockRawApiPort::new();
        raw.expect_get_optional_json().returning(|_| Ok(None));

        let api = Api::new(Arc::new(raw));
        let found: Option<Session> = api.get_optional("/sessions/x").await.unwrap();
        assert!(found.is_none());
    }
}
