//! Configuration structures
//!
//! A single externally supplied [`Config`] drives every component. All
//! sections have defaults so partial files and environment overrides work.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_BACKEND_URL, DEFAULT_KEYCHAIN_ACCOUNT,
    DEFAULT_KEYCHAIN_SERVICE, DEFAULT_POPUP_HEIGHT, DEFAULT_POPUP_POLL_INTERVAL_MS,
    DEFAULT_POPUP_SETTLE_DELAY_MS, DEFAULT_POPUP_WIDTH, DEFAULT_STATUS_MAX_ATTEMPTS,
    DEFAULT_TOKEN_ENV_VAR,
};
use crate::errors::{LinkError, Result};
use crate::types::Provider;

/// Root application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub popup: PopupConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "ProviderEndpoints::calendar")]
    pub calendar: ProviderEndpoints,
    #[serde(default = "ProviderEndpoints::payment")]
    pub payment: ProviderEndpoints,
    #[serde(default)]
    pub business: BusinessProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            popup: PopupConfig::default(),
            auth: AuthConfig::default(),
            calendar: ProviderEndpoints::calendar(),
            payment: ProviderEndpoints::payment(),
            business: BusinessProfile::default(),
        }
    }
}

impl Config {
    /// Endpoints for the given provider.
    pub fn endpoints(&self, provider: Provider) -> &ProviderEndpoints {
        match provider {
            Provider::Calendar => &self.calendar,
            Provider::Payment => &self.payment,
        }
    }

    /// Reject values that would make the controllers misbehave.
    ///
    /// # Errors
    /// Returns `LinkError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            LinkError::Config(format!("invalid backend base_url {}: {e}", self.backend.base_url))
        })?;

        if self.backend.timeout_seconds == 0 {
            return Err(LinkError::Config("backend timeout must be positive".into()));
        }
        if self.backend.status_max_attempts == 0 {
            return Err(LinkError::Config("status_max_attempts must be at least 1".into()));
        }
        if self.popup.poll_interval_ms == 0 {
            return Err(LinkError::Config("popup poll interval must be positive".into()));
        }
        if self.popup.width == 0 || self.popup.height == 0 {
            return Err(LinkError::Config("popup viewport must be non-empty".into()));
        }
        if self.popup.browser.command.trim().is_empty() {
            return Err(LinkError::Config("popup browser command is empty".into()));
        }
        if self.calendar.list_resources.is_none() || self.calendar.select_resource.is_none() {
            return Err(LinkError::Config(
                "calendar endpoints must include list_resources and select_resource".into(),
            ));
        }

        Ok(())
    }
}

/// Backend service access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Attempts for idempotent reads; writes are always sent once.
    pub status_max_attempts: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_seconds: DEFAULT_BACKEND_TIMEOUT_SECS,
            status_max_attempts: DEFAULT_STATUS_MAX_ATTEMPTS,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Authorization popup supervision policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Interval between closed-window checks.
    pub poll_interval_ms: u64,
    /// Wait after closure before trusting backend state.
    pub settle_delay_ms: u64,
    /// Optional upper bound on how long a popup may stay open.
    pub max_wait_seconds: Option<u64>,
    pub width: u32,
    pub height: u32,
    pub browser: BrowserConfig,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POPUP_POLL_INTERVAL_MS,
            settle_delay_ms: DEFAULT_POPUP_SETTLE_DELAY_MS,
            max_wait_seconds: None,
            width: DEFAULT_POPUP_WIDTH,
            height: DEFAULT_POPUP_HEIGHT,
            browser: BrowserConfig::default(),
        }
    }
}

impl PopupConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_seconds.map(Duration::from_secs)
    }
}

/// Browser process used to host the popup.
///
/// Arguments may contain `{url}`, `{width}` and `{height}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            command: "chromium".to_string(),
            args: vec![
                "--app={url}".to_string(),
                "--window-size={width},{height}".to_string(),
                "--new-window".to_string(),
            ],
        }
    }
}

/// Where the dashboard session token is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenSource {
    Env { var: String },
    Keychain { service: String, account: String },
    Static { token: String },
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::Env { var: DEFAULT_TOKEN_ENV_VAR.to_string() }
    }
}

impl TokenSource {
    /// Keychain source with the default service/account names.
    pub fn default_keychain() -> Self {
        Self::Keychain {
            service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
            account: DEFAULT_KEYCHAIN_ACCOUNT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_source: TokenSource,
}

/// Backend paths for one provider, relative to `backend.base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub initiate: String,
    pub status: String,
    pub disconnect: String,
    #[serde(default)]
    pub list_resources: Option<String>,
    #[serde(default)]
    pub select_resource: Option<String>,
    #[serde(default)]
    pub selected_resource: Option<String>,
}

impl ProviderEndpoints {
    fn base(provider: Provider) -> Self {
        let slug = provider.slug();
        Self {
            initiate: format!("/oauth/{slug}/initiate"),
            status: format!("/oauth/{slug}/status"),
            disconnect: format!("/oauth/{slug}/disconnect"),
            list_resources: None,
            select_resource: None,
            selected_resource: None,
        }
    }

    /// Default calendar endpoints, including the calendar selection routes.
    pub fn calendar() -> Self {
        let slug = Provider::Calendar.slug();
        Self {
            list_resources: Some(format!("/oauth/{slug}/calendars")),
            select_resource: Some(format!("/oauth/{slug}/calendars/select")),
            selected_resource: Some(format!("/oauth/{slug}/calendars/selected")),
            ..Self::base(Provider::Calendar)
        }
    }

    pub fn payment() -> Self {
        Self::base(Provider::Payment)
    }
}

/// Branding shown by presentation layers; replaces per-deployment source
/// files with one configurable section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    pub name: String,
    pub full_name: String,
    pub website: Option<String>,
    pub description: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "BizLink".to_string(),
            full_name: "BizLink Business Dashboard".to_string(),
            website: None,
            description: "Business".to_string(),
        }
    }
}

impl BusinessProfile {
    /// Dashboard title, e.g. "Acme Spa - Dashboard".
    pub fn dashboard_title(&self) -> String {
        format!("{} - Dashboard", self.name)
    }
}
