//! Conversation orchestrator
//!
//! Drives one turn at a time through
//! `Idle -> UserSubmitted -> AwaitingResponse -> (Failed ->) Resolved`
//! and publishes a full snapshot after every store mutation.

use super::agent::Agent;
use super::error::GenerateError;
use super::generator::{GenerateRequest, ResponseGenerator};
use super::message::{Message, MessageStore, Sender};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// The only text users see when generation fails
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

const SNAPSHOT_CHANNEL_CAPACITY: usize = 128;

/// Where the current turn stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    UserSubmitted,
    AwaitingResponse,
    Failed,
    Resolved,
}

/// What observers receive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub phase: TurnPhase,
}

/// How a submitted turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Blank input, nothing happened
    Ignored,
    Replied,
    /// Generation failed and the apology was appended
    Failed,
    /// The conversation was cleared before the reply arrived
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("A reply is already being generated for this conversation")]
    Busy,
}

/// A turn whose placeholder is in the store and whose reply is outstanding
#[derive(Debug)]
pub struct PendingTurn {
    loading_id: String,
    epoch: u64,
    request: GenerateRequest,
}

impl PendingTurn {
    pub fn request(&self) -> &GenerateRequest {
        &self.request
    }

    #[allow(dead_code)] // Inspected by tests
    pub fn loading_id(&self) -> &str {
        &self.loading_id
    }
}

pub struct Conversation {
    id: String,
    agent: Agent,
    store: MessageStore,
    phase: TurnPhase,
    /// Bumped by `clear`; turns begun in an older epoch are discarded
    epoch: u64,
    generator: Arc<dyn ResponseGenerator>,
    snapshot_tx: broadcast::Sender<Snapshot>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, generator: Arc<dyn ResponseGenerator>) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            id: id.into(),
            agent: Agent::default(),
            store: MessageStore::new(),
            phase: TurnPhase::Idle,
            epoch: 0,
            generator,
            snapshot_tx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    #[allow(dead_code)] // Inspected by tests
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> Vec<Message> {
        self.store.list()
    }

    pub fn generator(&self) -> Arc<dyn ResponseGenerator> {
        self.generator.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            conversation_id: self.id.clone(),
            messages: self.store.list(),
            phase: self.phase,
        }
    }

    /// Receive a snapshot after every mutation
    #[allow(dead_code)] // The runtime hands out subscriptions via `notifier`
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Number of live snapshot receivers
    pub fn subscriber_count(&self) -> usize {
        self.snapshot_tx.receiver_count()
    }

    /// Sender half, for handing out subscriptions without borrowing `self`
    pub fn notifier(&self) -> broadcast::Sender<Snapshot> {
        self.snapshot_tx.clone()
    }

    /// Run a whole turn: record the message, wait for the reply, record it.
    ///
    /// Holds `&mut self` across the wait, so nothing can interleave. The
    /// runtime uses `begin_turn` and `finish_turn` instead to stay responsive.
    #[allow(dead_code)]
    pub async fn submit(&mut self, text: &str) -> Result<TurnOutcome, ConversationError> {
        let Some(turn) = self.begin_turn(text)? else {
            return Ok(TurnOutcome::Ignored);
        };
        let generator = self.generator();
        let result = generator.generate(turn.request()).await;
        Ok(self.finish_turn(turn, result))
    }

    /// Append the user message and the placeholder.
    ///
    /// Returns `None` for blank input, which leaves the store untouched and
    /// notifies no one.
    pub fn begin_turn(&mut self, text: &str) -> Result<Option<PendingTurn>, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.store.loading().is_some() {
            return Err(ConversationError::Busy);
        }

        self.store.append(text, Sender::User);
        self.phase = TurnPhase::UserSubmitted;
        self.notify();

        let loading = self.store.append_loading();
        self.phase = TurnPhase::AwaitingResponse;
        self.notify();

        tracing::debug!(conv_id = %self.id, loading_id = %loading.id, "Turn started");

        Ok(Some(PendingTurn {
            loading_id: loading.id,
            epoch: self.epoch,
            request: GenerateRequest {
                conversation_id: self.id.clone(),
                agent_id: self.agent.id.clone(),
                message: text.to_string(),
            },
        }))
    }

    /// Replace the placeholder with the reply, or with the apology on failure
    pub fn finish_turn(
        &mut self,
        turn: PendingTurn,
        result: Result<String, GenerateError>,
    ) -> TurnOutcome {
        if turn.epoch != self.epoch {
            tracing::debug!(conv_id = %self.id, "Dropping reply for a cleared conversation");
            return TurnOutcome::Discarded;
        }

        match result {
            Ok(reply) => {
                self.store.remove(&turn.loading_id);
                self.store.append(reply, Sender::Agent);
                self.phase = TurnPhase::Resolved;
                self.notify();
                TurnOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(
                    conv_id = %self.id,
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Reply generation failed"
                );
                // Look the placeholder up again rather than trusting the id
                if let Some(loading_id) = self.store.loading().map(|m| m.id.clone()) {
                    self.store.remove(&loading_id);
                }
                self.store.append(ERROR_REPLY, Sender::Agent);
                self.phase = TurnPhase::Failed;
                self.notify();
                self.phase = TurnPhase::Resolved;
                self.notify();
                TurnOutcome::Failed
            }
        }
    }

    /// Drop every message and notify, whatever is in flight
    pub fn clear(&mut self) {
        self.store.clear();
        self.epoch += 1;
        self.phase = TurnPhase::Idle;
        self.notify();
        tracing::info!(conv_id = %self.id, "Conversation cleared");
    }

    fn notify(&self) {
        // No subscribers is fine
        let _ = self.snapshot_tx.send(self.snapshot());
    }
}
