//! Commands issued by presentation layers
//!
//! Every command logs its outcome and converts failures into a
//! [`CommandError`] carrying the user-facing message for the provider.

pub mod calendar;
pub mod connection;

use std::time::Instant;

use bizlink_domain::{
    ConnectionSnapshot, ConnectionState, LinkError, Provider, ProviderAccount, Selection,
};
pub use calendar::*;
pub use connection::*;
use serde::Serialize;
use thiserror::Error;

use crate::utils::logging::log_command_execution;

/// Failure returned to presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct CommandError {
    /// Stable error label (see `LinkError::label`).
    pub kind: &'static str,
    /// Short, actionable text for display.
    pub message: String,
    /// Whether offering a retry makes sense.
    pub retryable: bool,
}

impl CommandError {
    pub fn new(provider: Provider, error: &LinkError) -> Self {
        Self {
            kind: error.label(),
            message: error.user_message(provider),
            retryable: error.is_user_retryable(),
        }
    }
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Published connection state in presentation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionView {
    pub provider: Provider,
    pub display_name: &'static str,
    pub state: ConnectionState,
    pub account: Option<ProviderAccount>,
    pub selection: Option<Selection>,
    /// Soft warning, e.g. connection detail that could not be loaded.
    pub warning: Option<String>,
    /// Payment account still needs charges or payouts enabled.
    pub setup_incomplete: bool,
}

impl From<&ConnectionSnapshot> for ConnectionView {
    fn from(snapshot: &ConnectionSnapshot) -> Self {
        let provider = snapshot.status.provider();
        let account = snapshot.status.account_summary().cloned();
        let setup_incomplete = matches!(
            &account,
            Some(ProviderAccount::Payment(payment)) if payment.setup_incomplete()
        );

        Self {
            provider,
            display_name: provider.display_name(),
            state: snapshot.state(),
            account,
            selection: snapshot.selection.clone(),
            warning: snapshot.warning.as_ref().map(ToString::to_string),
            setup_incomplete,
        }
    }
}

/// Log the command outcome and convert the error for presentation.
fn finish<T>(
    command: &str,
    provider: Provider,
    start: Instant,
    result: bizlink_domain::Result<T>,
) -> CommandResult<T> {
    log_command_execution(command, provider, start.elapsed(), result.as_ref().err());
    result.map_err(|err| CommandError::new(provider, &err))
}
