//! HTTP client for the external booking API
//!
//! Constructed once at startup and handed to whoever needs it. There is no
//! process-wide instance.

use crate::config::UpstreamConfig;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Missing BOOKING_API_URL")]
    MissingBaseUrl,
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Upstream returned a non-JSON body: {0}")]
    InvalidBody(#[source] reqwest::Error),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Status and JSON body exactly as the upstream sent them
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;
        Ok(Self { client })
    }

    /// `POST {base}/chat` with the body as-is and the bearer key if set
    pub async fn post_chat(
        &self,
        config: &UpstreamConfig,
        body: &Value,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = config.endpoint("/chat").ok_or(UpstreamError::MissingBaseUrl)?;

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(UpstreamError::Transport)?;
        Self::read_json(response).await
    }

    /// `GET {base}/health`, never authenticated
    pub async fn get_health(
        &self,
        config: &UpstreamConfig,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = config
            .endpoint("/health")
            .ok_or(UpstreamError::MissingBaseUrl)?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<UpstreamResponse, UpstreamError> {
        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(UpstreamError::InvalidBody)?;
        Ok(UpstreamResponse { status, body })
    }
}
