//! Connection state machine values published by the controllers

use std::fmt;

use serde::Serialize;

use super::{Provider, ProviderAccount, Selection};
use crate::errors::ConnectionWarning;

/// Lifecycle state of a provider link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not yet queried, or the last query failed.
    Unknown,
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }

    /// States in which another operation would race an in-flight transition.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current status of one provider link.
///
/// `account_summary` can only be present while the state is `Connected`; the
/// constructors drop it for every other state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    provider: Provider,
    state: ConnectionState,
    account_summary: Option<ProviderAccount>,
}

impl ConnectionStatus {
    /// Status in a state that carries no account detail.
    pub fn new(provider: Provider, state: ConnectionState) -> Self {
        Self { provider, state, account_summary: None }
    }

    /// Fresh status before anything has been queried.
    pub fn unknown(provider: Provider) -> Self {
        Self::new(provider, ConnectionState::Unknown)
    }

    /// Connected status with an optional account projection.
    pub fn connected(provider: Provider, account_summary: Option<ProviderAccount>) -> Self {
        Self { provider, state: ConnectionState::Connected, account_summary }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn account_summary(&self) -> Option<&ProviderAccount> {
        self.account_summary.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Everything an observer needs to render one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    /// Active selection; only ever set while connected.
    pub selection: Option<Selection>,
    /// Soft warning from the most recent refresh.
    pub warning: Option<ConnectionWarning>,
}

impl ConnectionSnapshot {
    pub fn unknown(provider: Provider) -> Self {
        Self { status: ConnectionStatus::unknown(provider), selection: None, warning: None }
    }

    pub fn state(&self) -> ConnectionState {
        self.status.state()
    }
}

/// How a supervised popup attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupOutcome {
    /// The window was closed (by the user or by the provider's final page).
    Closed,
    /// The optional maximum wait elapsed and the window was closed for the user.
    TimedOut,
}

/// Notifications emitted by a connection controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectionEvent {
    StateChanged { provider: Provider, from: ConnectionState, to: ConnectionState },
    PopupOpened { provider: Provider },
    PopupClosed { provider: Provider, outcome: PopupOutcome },
    SelectionChanged { provider: Provider, selection: Option<Selection> },
    Warning(ConnectionWarning),
}
