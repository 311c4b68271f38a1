//! Mock generators for testing
//!
//! These mocks let orchestrator and runtime tests run without timers or
//! network access.

use super::error::GenerateError;
use super::generator::{GenerateRequest, ResponseGenerator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Generator
// ============================================================================

/// Returns queued replies in order, then fails
#[allow(dead_code)]
pub struct MockGenerator {
    replies: Mutex<VecDeque<Result<String, GenerateError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<GenerateRequest>>,
}

#[allow(dead_code)]
impl MockGenerator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_error(&self, error: GenerateError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerateError::unknown("No mock reply queued")))
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        self.next(request)
    }
}

// ============================================================================
// Delayed Mock Generator (for in-flight testing)
// ============================================================================

/// Mock generator that sleeps before answering
pub struct DelayedMockGenerator {
    inner: MockGenerator,
    delay: Duration,
    /// Notified when a generation starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

#[allow(dead_code)]
impl DelayedMockGenerator {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockGenerator::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.inner.queue_reply(reply);
    }

    pub fn queue_error(&self, error: GenerateError) {
        self.inner.queue_error(error);
    }

    pub fn recorded_requests(&self) -> Vec<GenerateRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ResponseGenerator for DelayedMockGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        // notify_one keeps a permit if the test is not waiting yet
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerateRequest {
        GenerateRequest {
            conversation_id: "c".to_string(),
            agent_id: "default".to_string(),
            message: "m".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_generator() {
        let mock = MockGenerator::new();
        mock.queue_reply("Hello");

        assert_eq!(mock.generate(&request()).await.unwrap(), "Hello");
        // Nothing left queued
        assert!(mock.generate(&request()).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_delayed_mock_signals_start() {
        let mock = Arc::new(DelayedMockGenerator::new(Duration::from_millis(10)));
        mock.queue_reply("later");
        let started = mock.request_started.clone();

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.generate(&request()).await })
        };

        tokio::time::timeout(Duration::from_secs(1), started.notified())
            .await
            .expect("generation should start");
        assert_eq!(task.await.unwrap().unwrap(), "later");
    }
}
