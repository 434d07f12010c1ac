//! Backend-specific error types
//!
//! Classifies backend outcomes by status so each gateway operation can decide
//! which of them are expected (idempotent 404s, stale calendars) before
//! converting to `LinkError`.

use bizlink_domain::LinkError;
use thiserror::Error;

/// Backend operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error {status}: {message}")]
    Client { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// HTTP status for 4xx client errors.
    pub fn client_status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a 4xx with one of `statuses`.
    pub fn is_client_status(&self, statuses: &[u16]) -> bool {
        self.client_status().is_some_and(|status| statuses.contains(&status))
    }
}

impl From<BackendError> for LinkError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Auth(message) => Self::Unauthorized(message),
            BackendError::Config(message) => Self::Config(message),
            other @ (BackendError::RateLimit(_)
            | BackendError::Server(_)
            | BackendError::Client { .. }
            | BackendError::Network(_)
            | BackendError::Decode(_)) => Self::GatewayUnavailable(other.to_string()),
        }
    }
}

/// Transport failures surface from the HTTP layer as `LinkError`.
impl From<LinkError> for BackendError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::Unauthorized(message) => Self::Auth(message),
            LinkError::Config(message) => Self::Config(message),
            LinkError::GatewayUnavailable(message) => Self::Network(message),
            other => Self::Network(other.to_string()),
        }
    }
}
