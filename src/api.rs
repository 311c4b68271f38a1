//! HTTP API for Ask Taylor
//!
//! Conversation routes drive the in-process runtime. The proxy routes
//! forward to the booking API.

mod assets;
mod handlers;
mod proxy;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::ConfigSource;
use crate::runtime::RuntimeManager;
use crate::upstream::UpstreamClient;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
    pub upstream: UpstreamClient,
    pub config: ConfigSource,
}

impl AppState {
    pub fn new(runtime: RuntimeManager, upstream: UpstreamClient, config: ConfigSource) -> Self {
        Self {
            runtime: Arc::new(runtime),
            upstream,
            config,
        }
    }
}
