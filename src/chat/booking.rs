//! Network-backed response generator that asks the booking API's `/chat`

use super::error::GenerateError;
use super::generator::{GenerateRequest, ResponseGenerator};
use crate::config::ConfigSource;
use crate::upstream::{UpstreamClient, UpstreamError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body sent to `POST {base}/chat`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingChatRequest<'a> {
    message: &'a str,
    agent_id: &'a str,
    conversation_id: &'a str,
}

/// Reply from the booking API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingChatResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct BookingApiResponder {
    client: UpstreamClient,
    config: ConfigSource,
}

impl BookingApiResponder {
    pub fn new(client: UpstreamClient, config: ConfigSource) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ResponseGenerator for BookingApiResponder {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        let body = serde_json::to_value(BookingChatRequest {
            message: &request.message,
            agent_id: &request.agent_id,
            conversation_id: &request.conversation_id,
        })
        .map_err(|e| GenerateError::invalid_response(format!("Cannot encode request: {e}")))?;

        let upstream = self
            .client
            .post_chat(&self.config.upstream(), &body)
            .await
            .map_err(|e| match e {
                UpstreamError::InvalidBody(_) => GenerateError::invalid_response(e.to_string()),
                UpstreamError::MissingBaseUrl => GenerateError::upstream(e.to_string()),
                UpstreamError::Transport(_) | UpstreamError::Client(_) => {
                    GenerateError::network(e.to_string())
                }
            })?;

        if !(200..300).contains(&upstream.status) {
            return Err(GenerateError::upstream(format!(
                "HTTP {}: {}",
                upstream.status, upstream.body
            )));
        }

        let parsed: BookingChatResponse = serde_json::from_value(upstream.body)
            .map_err(|e| GenerateError::invalid_response(format!("Unexpected reply: {e}")))?;

        if !parsed.success {
            let reason = parsed.error.unwrap_or_else(|| "success=false".to_string());
            return Err(GenerateError::upstream(reason));
        }

        match parsed.response.map(|r| r.trim().to_string()) {
            Some(reply) if !reply.is_empty() => Ok(reply),
            _ => Err(GenerateError::invalid_response("Empty response text")),
        }
    }
}
