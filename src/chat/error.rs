//! Response generation error types

use thiserror::Error;

/// Generation failure with classification.
///
/// The kind and message are for logs only. Users always see the same
/// fixed apology text.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GenerateError {
    pub kind: GenerateErrorKind,
    pub message: String,
}

impl GenerateError {
    pub fn new(kind: GenerateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::Network, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::Upstream, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::InvalidResponse, message)
    }

    #[allow(dead_code)] // Used by test generators
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::Unknown, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateErrorKind {
    /// Could not reach the backend
    Network,
    /// Backend answered with a failure status or `success: false`
    Upstream,
    /// Backend answered with something we cannot read
    InvalidResponse,
    Unknown,
}

impl GenerateErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Upstream => "upstream",
            Self::InvalidResponse => "invalid_response",
            Self::Unknown => "unknown",
        }
    }
}
