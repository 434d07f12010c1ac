//! Port interfaces for the backend gateway and the popup host

use async_trait::async_trait;
use bizlink_domain::{Provider, ProviderAccount, Result, SelectableResource, Selection};
use serde_json::{Map, Value};

/// Result of starting an authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Absolute provider URL to open in the popup.
    pub authorization_url: String,
}

/// Authoritative link status as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub connected: bool,
    /// Remaining response fields, kept for detail extraction.
    pub fields: Map<String, Value>,
}

impl StatusReport {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(fields: Map<String, Value>) -> Self {
        Self { connected: true, fields }
    }
}

/// Secondary information loaded after a link is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionDetail {
    pub account: Option<ProviderAccount>,
    pub selection: Option<Selection>,
}

/// Backend operations shared by every provider.
///
/// Implementations own transport, auth headers, retries and the mapping of
/// HTTP outcomes onto `LinkError`.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    fn provider(&self) -> Provider;

    /// Ask the backend to start an authorization flow.
    async fn initiate(&self) -> Result<AuthorizationRequest>;

    /// Query whether the backend holds a valid link.
    async fn query_status(&self) -> Result<StatusReport>;

    /// Revoke the link. Already-disconnected is success.
    async fn disconnect(&self) -> Result<()>;

    /// Load account summary or active selection for a connected report.
    async fn fetch_detail(&self, report: &StatusReport) -> Result<ConnectionDetail>;
}

/// Providers that expose a pickable sub-resource.
#[async_trait]
pub trait CalendarGateway: ProviderGateway {
    async fn list_selectable(&self) -> Result<Vec<SelectableResource>>;

    async fn commit_selection(
        &self,
        resource_id: &str,
        display_name: &str,
        description: Option<&str>,
    ) -> Result<()>;

    async fn current_selection(&self) -> Result<Option<Selection>>;
}

/// Window geometry and naming requested from the popup host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupFeatures {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Handle to an open popup window.
pub trait PopupWindow: Send {
    /// Whether the window has been closed by any party.
    fn is_closed(&mut self) -> bool;

    /// Close the window if it is still open.
    fn close(&mut self);
}

/// Host capable of opening popup windows.
pub trait PopupLauncher: Send + Sync {
    /// Open `url` in a new window.
    ///
    /// # Errors
    /// Returns `LinkError::PopupBlocked` when the environment refuses to
    /// create a window.
    fn open(&self, url: &str, features: &PopupFeatures) -> Result<Box<dyn PopupWindow>>;
}
