//! Response generation
//!
//! The orchestrator only sees [`ResponseGenerator`]. The canned responder
//! stands in for a real assistant; the booking API responder talks to the
//! upstream service.

use super::error::GenerateError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stand-in replies for the canned responder
pub const CANNED_RESPONSES: &[&str] = &[
    "Hello! I'm your AI assistant. How can I help you today?",
    "That's an interesting question. Let me think about that...",
    "I understand what you're asking. Here's what I think:",
    "Thanks for sharing that with me. I'd be happy to help!",
    "That's a great point. Let me provide some insights on that.",
    "I see what you mean. Here's my perspective on this topic:",
];

/// Default simulated thinking time
pub const CANNED_DELAY: Range<Duration> = Duration::from_millis(1000)..Duration::from_millis(3000);

/// What the generator is answering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub conversation_id: String,
    pub agent_id: String,
    pub message: String,
}

/// Produces one agent reply per turn
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError>;
}

#[async_trait]
impl<T: ResponseGenerator + ?Sized> ResponseGenerator for Arc<T> {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        (**self).generate(request).await
    }
}

// ============================================================================
// Canned responder
// ============================================================================

/// Waits a random time, then picks a random catalog entry
pub struct CannedResponder {
    catalog: Vec<String>,
    delay: Range<Duration>,
}

impl Default for CannedResponder {
    fn default() -> Self {
        Self {
            catalog: CANNED_RESPONSES.iter().map(|s| (*s).to_string()).collect(),
            delay: CANNED_DELAY,
        }
    }
}

impl CannedResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the delay window (start inclusive, end exclusive)
    #[allow(dead_code)] // Used by tests to keep turns short
    pub fn with_delay(mut self, delay: Range<Duration>) -> Self {
        self.delay = delay;
        self
    }

    #[allow(dead_code)]
    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Uniform sample from the delay window
    fn sample_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let start = duration_millis(self.delay.start);
        let end = duration_millis(self.delay.end);
        if end <= start {
            return self.delay.start;
        }
        Duration::from_millis(rng.gen_range(start..end))
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> String {
        self.catalog
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| CANNED_RESPONSES[0].to_string())
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl ResponseGenerator for CannedResponder {
    async fn generate(&self, _request: &GenerateRequest) -> Result<String, GenerateError> {
        let (delay, reply) = {
            let mut rng = rand::thread_rng();
            (self.sample_delay(&mut rng), self.pick(&mut rng))
        };
        tokio::time::sleep(delay).await;
        Ok(reply)
    }
}

// ============================================================================
// Logging wrapper
// ============================================================================

/// Logs every generation with its duration and, on failure, the cause
pub struct LoggingGenerator {
    inner: Arc<dyn ResponseGenerator>,
    name: &'static str,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn ResponseGenerator>, name: &'static str) -> Self {
        Self { inner, name }
    }
}

#[async_trait]
impl ResponseGenerator for LoggingGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        let start = Instant::now();
        let result = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    generator = self.name,
                    conv_id = %request.conversation_id,
                    duration_ms = %duration.as_millis(),
                    reply_len = reply.len(),
                    "Response generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    generator = self.name,
                    conv_id = %request.conversation_id,
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Response generation failed"
                );
            }
        }

        result
    }
}
