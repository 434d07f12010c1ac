//! Application constants
//!
//! Centralized location for domain-level defaults shared by the controllers,
//! the gateways and the configuration loader.

// Popup supervision
pub const DEFAULT_POPUP_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_POPUP_SETTLE_DELAY_MS: u64 = 1000;
pub const DEFAULT_POPUP_WIDTH: u32 = 500;
pub const DEFAULT_POPUP_HEIGHT: u32 = 600;

// Backend access
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STATUS_MAX_ATTEMPTS: usize = 3;

// Dashboard session token
pub const DEFAULT_TOKEN_ENV_VAR: &str = "BIZLINK_AUTH_TOKEN";
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "bizlink.dashboard";
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "authToken";

// Observer channels
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
