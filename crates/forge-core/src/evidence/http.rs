//! HTTP knowledge source.
//!
//! Speaks a two-endpoint protocol:
//!
//! - `GET {base}/resolve?name=<name>` → `{"identifier": "<id>"}`
//! - `GET {base}/docs?id=<id>&topic=<topic>&tokens=<budget>` → plain text
//!
//! `404` maps to [`KnowledgeError::NotFound`], client timeouts to
//! [`KnowledgeError::Timeout`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{KnowledgeError, KnowledgeSource};
use crate::domain::{ForgeError, Result};

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    identifier: String,
}

/// reqwest-backed [`KnowledgeSource`].
#[derive(Debug, Clone)]
pub struct HttpKnowledgeSource {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpKnowledgeSource {
    /// Build a client for `base_url`; `request_timeout` bounds every call.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("agent-forge/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|e| ForgeError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<reqwest::Response, KnowledgeError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(url = %url, "knowledge request");
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(KnowledgeError::NotFound),
            status if status.is_success() => Ok(response),
            status => Err(KnowledgeError::Transport(format!(
                "unexpected status {status} from {url}"
            ))),
        }
    }
}

fn map_transport(err: reqwest::Error) -> KnowledgeError {
    if err.is_timeout() {
        KnowledgeError::Timeout
    } else {
        KnowledgeError::Transport(err.to_string())
    }
}

#[async_trait]
impl KnowledgeSource for HttpKnowledgeSource {
    async fn resolve(&self, name: &str) -> std::result::Result<String, KnowledgeError> {
        let response = self.get("resolve", &[("name", name)]).await?;
        let body: ResolveResponse = response.json().await.map_err(map_transport)?;
        Ok(body.identifier)
    }

    async fn fetch(
        &self,
        identifier: &str,
        topic: &str,
        token_budget: u32,
    ) -> std::result::Result<String, KnowledgeError> {
        let tokens = token_budget.to_string();
        let response = self
            .get("docs", &[("id", identifier), ("topic", topic), ("tokens", &tokens)])
            .await?;
        response.text().await.map_err(map_transport)
    }
}
