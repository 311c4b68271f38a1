//! Environment-derived configuration

use crate::runtime::DEFAULT_IDLE_TIMEOUT;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the booking API lives and how to authenticate to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamConfig {
    base_url: Option<String>,
    pub api_key: Option<String>,
}

impl UpstreamConfig {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.filter(|u| !u.is_empty()),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `BOOKING_API_URL` wins over `PUBLIC_API_BASE_URL`. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self::new(
            non_empty("BOOKING_API_URL").or_else(|| non_empty("PUBLIC_API_BASE_URL")),
            non_empty("BOOKING_API_KEY"),
        )
    }

    /// Base URL with a single trailing slash removed
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|u| u.strip_suffix('/').unwrap_or(u))
    }

    /// Join the base URL with an endpoint path such as `/chat`
    pub fn endpoint(&self, path: &str) -> Option<String> {
        self.base_url().map(|base| format!("{base}{path}"))
    }
}

/// How the proxy obtains upstream settings.
///
/// Production reads the environment on every request so the target can be
/// changed without a restart.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Env,
    #[allow(dead_code)] // Injected by tests
    Fixed(UpstreamConfig),
}

impl ConfigSource {
    pub fn upstream(&self) -> UpstreamConfig {
        match self {
            ConfigSource::Env => UpstreamConfig::from_env(),
            ConfigSource::Fixed(config) => config.clone(),
        }
    }
}

/// Which response generator backs conversations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponderKind {
    #[default]
    Canned,
    BookingApi,
}

impl ResponderKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "canned" | "mock" => Some(Self::Canned),
            "booking_api" | "booking-api" | "backend" => Some(Self::BookingApi),
            _ => None,
        }
    }
}

/// Process-level settings, read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub responder: ResponderKind,
    pub upstream_timeout: Duration,
    /// Idle conversations with no subscribers are dropped after this long
    pub conversation_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            responder: ResponderKind::default(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            conversation_idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let responder = match lookup("CHAT_RESPONDER") {
            Some(value) => ResponderKind::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unknown CHAT_RESPONDER, using canned replies");
                ResponderKind::Canned
            }),
            None => defaults.responder,
        };

        let upstream_timeout = lookup("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map_or(defaults.upstream_timeout, Duration::from_secs);

        let conversation_idle_timeout = lookup("CONVERSATION_IDLE_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.conversation_idle_timeout, Duration::from_secs);

        Self {
            port,
            responder,
            upstream_timeout,
            conversation_idle_timeout,
        }
    }
}
