//! AgriLog HTTP client.

use std::time::Duration;

use activity_ai::{ActivityContext, ActivitySummary};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::SyncError;
use crate::payload::NewActivityPayload;
use crate::sync::ActivitySink;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the AgriLog API, authenticated with a session bearer token.
#[derive(Clone)]
pub struct AgrilogClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl AgrilogClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Whether the server answers its health check. Network failures read as offline.
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    /// Insert one activity through the farmer or extension route.
    pub async fn create_activity(
        &self,
        payload: &NewActivityPayload,
    ) -> Result<serde_json::Value, SyncError> {
        let route = if payload.is_collected() {
            "api/extension/activities"
        } else {
            "api/farmer/activities"
        };
        let url = format!("{}/{}", self.base_url, route);

        let resp = self.authed(self.http.post(&url)).json(payload).send().await?;
        let resp = check(resp, &payload.id).await?;
        Ok(resp.json().await?)
    }

    /// Ask the server for an AI summary. The server falls back on gateway failure.
    pub async fn summarize(&self, ctx: &ActivityContext) -> Result<ActivitySummary, SyncError> {
        let url = format!("{}/api/ai/summarize", self.base_url);

        let resp = self.authed(self.http.post(&url)).json(ctx).send().await?;
        let resp = check(resp, "summary").await?;
        Ok(resp.json().await?)
    }
}

async fn check(resp: Response, entity_id: &str) -> Result<Response, SyncError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(match status {
        StatusCode::UNAUTHORIZED => SyncError::Unauthorized,
        StatusCode::CONFLICT => SyncError::Duplicate(entity_id.to_string()),
        _ => SyncError::Server {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl ActivitySink for AgrilogClient {
    async fn insert(&self, payload: &NewActivityPayload) -> Result<(), SyncError> {
        self.create_activity(payload).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trimmed() {
        let client = AgrilogClient::new("http://localhost:3000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_unreachable_server_reads_offline() {
        let client = AgrilogClient::new("http://127.0.0.1:9", None).unwrap();
        assert!(!client.health().await);
    }
}
