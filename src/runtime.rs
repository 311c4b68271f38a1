//! Runtime for executing conversations
//!
//! Every conversation gets one background task that owns its orchestrator.
//! Handlers talk to it through a [`ConversationHandle`].

mod executor;

pub use executor::ConversationRuntime;

use crate::chat::{Agent, Conversation, GenerateError, ResponseGenerator, Snapshot, TurnOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// How long a conversation with no activity and no subscribers is kept
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

type RuntimeMap = RwLock<HashMap<String, ConversationHandle>>;

/// Messages processed by a conversation runtime
#[derive(Debug)]
pub enum Event {
    UserMessage {
        text: String,
        reply: oneshot::Sender<Result<TurnOutcome, RuntimeError>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    GetSnapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    /// Sent by the generation task back to its runtime
    GenerationComplete {
        turn_id: u64,
        result: Result<String, GenerateError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Conversation not found")]
    NotFound,
    #[error("Agent is busy, wait for the current reply")]
    Busy,
    #[error("Conversation runtime is not running")]
    Closed,
}

/// Handle to interact with a running conversation
#[derive(Debug, Clone)]
pub struct ConversationHandle {
    event_tx: mpsc::Sender<Event>,
    snapshot_tx: broadcast::Sender<Snapshot>,
    agent: Agent,
}

impl ConversationHandle {
    /// Submit user text and wait until the turn resolves
    pub async fn submit(&self, text: impl Into<String>) -> Result<TurnOutcome, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Event::UserMessage {
            text: text.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::Closed)?
    }

    pub async fn clear(&self) -> Result<(), RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Event::Clear { reply }).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Event::GetSnapshot { reply }).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Closed)
    }
}

/// Manager for all conversation runtimes.
///
/// Only [`RuntimeManager::create`] starts a runtime. A runtime stops once it
/// has been idle for `idle_timeout` with no subscribers, or once every handle
/// to it is gone, and then drops out of the map.
pub struct RuntimeManager {
    generator: Arc<dyn ResponseGenerator>,
    idle_timeout: Duration,
    runtimes: Arc<RuntimeMap>,
}

impl RuntimeManager {
    pub fn new(generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            generator,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            runtimes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Start a conversation with a fresh id
    pub async fn create(&self) -> (String, ConversationHandle) {
        let id = uuid::Uuid::new_v4().to_string();

        let conversation = Conversation::new(&id, self.generator.clone());
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = ConversationHandle {
            event_tx: event_tx.clone(),
            snapshot_tx: conversation.notifier(),
            agent: conversation.agent().clone(),
        };

        // Registered before the task starts so its cleanup always finds the entry
        {
            let mut runtimes = self.runtimes.write().await;
            runtimes.insert(id.clone(), handle.clone());
            tracing::debug!(conv_id = %id, running = runtimes.len(), "Registered conversation");
        }

        let runtime = ConversationRuntime::new(conversation, event_rx, event_tx.downgrade())
            .with_idle_timeout(self.idle_timeout);
        let conv_id = id.clone();
        // Weak so the map can be dropped while runtimes are still winding down
        let runtimes: Weak<RuntimeMap> = Arc::downgrade(&self.runtimes);
        tokio::spawn(async move {
            runtime.run().await;
            if let Some(runtimes) = runtimes.upgrade() {
                runtimes.write().await.remove(&conv_id);
            }
            tracing::info!(conv_id = %conv_id, "Conversation runtime finished");
        });

        (id, handle)
    }

    /// Look up a running conversation
    pub async fn get(&self, conversation_id: &str) -> Result<ConversationHandle, RuntimeError> {
        self.runtimes
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .ok_or(RuntimeError::NotFound)
    }

    pub async fn submit(&self, conversation_id: &str, text: &str) -> Result<TurnOutcome, RuntimeError> {
        self.get(conversation_id).await?.submit(text).await
    }

    pub async fn clear(&self, conversation_id: &str) -> Result<(), RuntimeError> {
        self.get(conversation_id).await?.clear().await
    }

    pub async fn snapshot(&self, conversation_id: &str) -> Result<Snapshot, RuntimeError> {
        self.get(conversation_id).await?.snapshot().await
    }

    /// Subscribe to conversation updates
    pub async fn subscribe(
        &self,
        conversation_id: &str,
    ) -> Result<broadcast::Receiver<Snapshot>, RuntimeError> {
        Ok(self.get(conversation_id).await?.subscribe())
    }

    /// Number of conversations currently running
    #[cfg(test)]
    pub async fn running(&self) -> usize {
        self.runtimes.read().await.len()
    }
}
