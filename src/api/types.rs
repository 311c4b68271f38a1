//! API request and response types

use crate::chat::{Agent, Message, Snapshot, TurnOutcome, TurnPhase};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Response after creating a conversation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversationResponse {
    pub conversation_id: String,
    pub agent: Agent,
}

/// Full conversation state plus the agent persona
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub phase: TurnPhase,
    pub agent: Agent,
}

impl ConversationResponse {
    pub fn new(snapshot: Snapshot, agent: Agent) -> Self {
        Self {
            conversation_id: snapshot.conversation_id,
            messages: snapshot.messages,
            phase: snapshot.phase,
            agent,
        }
    }
}

/// How a submitted message was handled
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub outcome: TurnOutcome,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
