//! HTTP request handlers

use super::assets::{get_index_html, serve_asset};
use super::proxy::{forward_chat, forward_health};
use super::sse::sse_stream;
use super::types::{
    ConversationResponse, ErrorResponse, NewConversationResponse, SendMessageRequest,
    SendMessageResponse, SuccessResponse,
};
use super::AppState;
use crate::runtime::RuntimeError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the chat page
        .route("/", get(serve_spa))
        .route("/assets/*path", get(serve_static))
        // Booking API passthroughs
        .route("/api/chat", post(forward_chat))
        .route("/api/health", get(forward_health))
        // Conversations
        .route("/api/conversations/new", post(create_conversation))
        .route("/api/conversations/:id", get(get_conversation))
        .route("/api/conversations/:id/messages", post(send_message))
        .route("/api/conversations/:id/clear", post(clear_conversation))
        .route("/api/conversations/:id/stream", get(stream_conversation))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Page
// ============================================================

async fn serve_spa() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

async fn serve_static(Path(path): Path<String>) -> Response {
    serve_asset(&path)
}

// ============================================================
// Conversations
// ============================================================

const MAX_ID_LEN: usize = 64;

/// Reject ids that could never have come from `create`
fn validate_id(id: &str) -> Result<(), AppError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid conversation id".to_string()))
    }
}

async fn create_conversation(State(state): State<AppState>) -> Json<NewConversationResponse> {
    let (conversation_id, handle) = state.runtime.create().await;
    tracing::info!(conv_id = %conversation_id, "Created conversation");

    Json(NewConversationResponse {
        conversation_id,
        agent: handle.agent().clone(),
    })
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    validate_id(&id)?;
    let handle = state.runtime.get(&id).await?;
    let snapshot = handle.snapshot().await?;

    Ok(Json(ConversationResponse::new(
        snapshot,
        handle.agent().clone(),
    )))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    validate_id(&id)?;
    let outcome = state.runtime.submit(&id, &req.text).await?;
    Ok(Json(SendMessageResponse { outcome }))
}

async fn clear_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    validate_id(&id)?;
    state.runtime.clear(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn stream_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id(&id)?;
    // Subscribe before reading so no update falls between the two
    let rx = state.runtime.subscribe(&id).await?;
    let snapshot = state.runtime.snapshot(&id).await?;

    Ok(sse_stream(snapshot, rx))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("ask-taylor ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::NotFound => AppError::NotFound(error.to_string()),
            RuntimeError::Busy => AppError::Conflict(error.to_string()),
            RuntimeError::Closed => AppError::Internal(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
