//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Provider;

/// Main error type for provider linking operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LinkError {
    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Popup blocked: {0}")]
    PopupBlocked(String),

    #[error("An authorization popup is already open for this provider")]
    AlreadyInFlight,

    #[error("Another operation is in progress for this provider")]
    OperationInProgress,

    #[error("Provider is already connected")]
    AlreadyConnected,

    #[error("Provider is not connected")]
    NotConnected,

    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used to decide who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Network or backend fault; the user may retry.
    Transient,
    /// Environment restriction (popups blocked); retry after user action.
    Environment,
    /// Consumer called an operation the state machine does not allow.
    CallerContract,
    /// Upstream resource vanished; re-list and pick again.
    StaleResource,
    /// Dashboard session is invalid; escalate to the session layer.
    Session,
    /// Misconfiguration or internal bug.
    Fatal,
}

impl LinkError {
    /// Get the category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GatewayUnavailable(_) => ErrorCategory::Transient,
            Self::PopupBlocked(_) => ErrorCategory::Environment,
            Self::AlreadyInFlight
            | Self::OperationInProgress
            | Self::AlreadyConnected
            | Self::NotConnected
            | Self::Cancelled => ErrorCategory::CallerContract,
            Self::InvalidResource(_) => ErrorCategory::StaleResource,
            Self::Unauthorized(_) => ErrorCategory::Session,
            Self::Config(_) | Self::Internal(_) => ErrorCategory::Fatal,
        }
    }

    /// Whether a user-initiated retry can reasonably succeed.
    pub fn is_user_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::Environment | ErrorCategory::StaleResource
        )
    }

    /// Short, actionable message suitable for display next to the provider.
    pub fn user_message(&self, provider: Provider) -> String {
        let name = provider.display_name();
        match self {
            Self::GatewayUnavailable(_) => {
                format!("Failed to reach {name}. Please try again.")
            }
            Self::PopupBlocked(_) => {
                format!("The {name} sign-in window was blocked. Allow popups and try again.")
            }
            Self::AlreadyInFlight | Self::OperationInProgress => {
                format!("A {name} operation is already in progress.")
            }
            Self::AlreadyConnected => format!("{name} is already connected."),
            Self::NotConnected => format!("Connect {name} first."),
            Self::InvalidResource(_) => {
                "That calendar is no longer available. Refresh the list and choose again."
                    .to_string()
            }
            Self::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::Cancelled => "The operation was cancelled.".to_string(),
            Self::Config(_) | Self::Internal(_) => {
                format!("Something went wrong with {name}. Please contact support.")
            }
        }
    }

    /// Stable label suitable for metrics/logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GatewayUnavailable(_) => "gateway_unavailable",
            Self::PopupBlocked(_) => "popup_blocked",
            Self::AlreadyInFlight => "already_in_flight",
            Self::OperationInProgress => "operation_in_progress",
            Self::AlreadyConnected => "already_connected",
            Self::NotConnected => "not_connected",
            Self::InvalidResource(_) => "invalid_resource",
            Self::Unauthorized(_) => "unauthorized",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Non-fatal problem reported alongside an otherwise valid state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectionWarning {
    /// The link is established but its secondary detail could not be loaded.
    DetailFetch { provider: Provider, message: String },
}

impl std::fmt::Display for ConnectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DetailFetch { provider, message } => {
                write!(f, "{} details unavailable: {message}", provider.display_name())
            }
        }
    }
}

/// Result type alias for linking operations
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            LinkError::GatewayUnavailable("down".into()).category(),
            ErrorCategory::Transient
        );
        assert_eq!(LinkError::PopupBlocked("null".into()).category(), ErrorCategory::Environment);
        assert_eq!(LinkError::AlreadyInFlight.category(), ErrorCategory::CallerContract);
        assert_eq!(LinkError::NotConnected.category(), ErrorCategory::CallerContract);
        assert_eq!(
            LinkError::InvalidResource("cal-9".into()).category(),
            ErrorCategory::StaleResource
        );
        assert_eq!(LinkError::Unauthorized("no token".into()).category(), ErrorCategory::Session);
    }

    #[test]
    fn test_user_retryable() {
        assert!(LinkError::GatewayUnavailable("x".into()).is_user_retryable());
        assert!(LinkError::PopupBlocked("x".into()).is_user_retryable());
        assert!(LinkError::InvalidResource("x".into()).is_user_retryable());
        assert!(!LinkError::OperationInProgress.is_user_retryable());
        assert!(!LinkError::AlreadyConnected.is_user_retryable());
        assert!(!LinkError::Unauthorized("x".into()).is_user_retryable());
    }

    #[test]
    fn test_user_message_names_provider() {
        let message = LinkError::GatewayUnavailable("503".into()).user_message(Provider::Payment);
        assert_eq!(message, "Failed to reach Stripe. Please try again.");

        let message = LinkError::PopupBlocked("spawn".into()).user_message(Provider::Calendar);
        assert!(message.contains("Google Calendar"));
        assert!(message.contains("Allow popups"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(LinkError::InvalidResource("cal-2".into())).unwrap();
        assert_eq!(json["type"], "InvalidResource");
        assert_eq!(json["message"], "cal-2");
    }

    #[test]
    fn test_warning_display() {
        let warning = ConnectionWarning::DetailFetch {
            provider: Provider::Calendar,
            message: "timeout".into(),
        };
        assert_eq!(warning.to_string(), "Google Calendar details unavailable: timeout");
    }
}
