//! Ask Taylor - chat service
//!
//! Serves a single-page chat UI backed by per-conversation runtimes, plus
//! passthrough routes to the booking API.

mod api;
mod chat;
mod config;
mod runtime;
mod upstream;

use api::{create_router, AppState};
use chat::{BookingApiResponder, CannedResponder, LoggingGenerator, ResponseGenerator};
use config::{ConfigSource, ResponderKind, ServerConfig, UpstreamConfig};
use runtime::RuntimeManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ask_taylor=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = ServerConfig::from_env();
    let upstream = UpstreamClient::new(config.upstream_timeout)?;

    if UpstreamConfig::from_env().base_url().is_none() {
        tracing::warn!("BOOKING_API_URL is not set. /api/chat and /api/health will return 500.");
    }

    let generator: Arc<dyn ResponseGenerator> = match config.responder {
        ResponderKind::Canned => Arc::new(LoggingGenerator::new(
            Arc::new(CannedResponder::new()),
            "canned",
        )),
        ResponderKind::BookingApi => Arc::new(LoggingGenerator::new(
            Arc::new(BookingApiResponder::new(upstream.clone(), ConfigSource::Env)),
            "booking_api",
        )),
    };
    tracing::info!(responder = ?config.responder, "Response generator selected");

    // Create application state
    let runtime = RuntimeManager::new(generator).with_idle_timeout(config.conversation_idle_timeout);
    let state = AppState::new(runtime, upstream, ConfigSource::Env);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Ask Taylor server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
