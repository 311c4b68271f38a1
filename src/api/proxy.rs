//! Booking API forwarders
//!
//! Thin passthroughs: the upstream status and JSON body go back verbatim.
//! Failures collapse to fixed bodies and the cause only reaches the logs.

use super::AppState;
use crate::upstream::{UpstreamError, UpstreamResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// `POST /api/chat`
pub async fn forward_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let config = state.config.upstream();
    if config.base_url().is_none() {
        return Err(ProxyError::Chat(UpstreamError::MissingBaseUrl));
    }

    let payload: Value = serde_json::from_slice(&body).map_err(ProxyError::ChatBody)?;
    let response = state
        .upstream
        .post_chat(&config, &payload)
        .await
        .map_err(ProxyError::Chat)?;

    Ok(passthrough(response))
}

/// `GET /api/health`
pub async fn forward_health(State(state): State<AppState>) -> Result<Response, ProxyError> {
    let config = state.config.upstream();
    let response = state
        .upstream
        .get_health(&config)
        .await
        .map_err(ProxyError::Health)?;

    Ok(passthrough(response))
}

fn passthrough(response: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(response.body)).into_response()
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Chat forward failed: {0}")]
    Chat(#[source] UpstreamError),
    #[error("Chat request body is not JSON: {0}")]
    ChatBody(#[source] serde_json::Error),
    #[error("Health forward failed: {0}")]
    Health(#[source] UpstreamError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let missing = matches!(
            self,
            ProxyError::Chat(UpstreamError::MissingBaseUrl)
                | ProxyError::Health(UpstreamError::MissingBaseUrl)
        );
        if missing {
            tracing::error!("BOOKING_API_URL is not configured");
        } else {
            tracing::warn!(error = %self, "Booking API request failed");
        }

        let (status, body) = match (&self, missing) {
            (ProxyError::Health(_), true) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Missing BOOKING_API_URL" }),
            ),
            (ProxyError::Health(_), false) => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": "Upstream unreachable" }),
            ),
            (_, true) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": "Missing BOOKING_API_URL" }),
            ),
            (_, false) => (
                StatusCode::BAD_GATEWAY,
                json!({ "success": false, "error": "Upstream error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
