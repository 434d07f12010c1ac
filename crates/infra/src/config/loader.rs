//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Probes multiple paths for a config file (JSON or TOML)
//! 2. Falls back to built-in defaults when no file exists
//! 3. Applies environment variable overrides on top
//! 4. Validates the result
//!
//! ## Environment Variables
//! - `BIZLINK_BACKEND_URL`: Backend base URL
//! - `BIZLINK_BACKEND_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `BIZLINK_POPUP_POLL_MS`: Popup closed-check interval
//! - `BIZLINK_POPUP_SETTLE_MS`: Delay after popup closure
//! - `BIZLINK_POPUP_MAX_WAIT_SECS`: Upper bound on popup lifetime (`0` disables)
//! - `BIZLINK_TOKEN_SOURCE`: `env`, `env:VAR`, `keychain`,
//!   `keychain:SERVICE:ACCOUNT` or `static:TOKEN`
//! - `BIZLINK_BROWSER`: Browser command used for popups
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./bizlink.json` or `./bizlink.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bizlink_domain::{Config, LinkError, Result, TokenSource};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LinkError::Config` if a config file is invalid, an environment
/// override cannot be parsed, or the merged config fails validation.
pub fn load() -> Result<Config> {
    let mut config = match probe_config_paths() {
        Some(path) => read_config_file(&path)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    let applied = apply_env_overrides(&mut config)?;
    if applied > 0 {
        tracing::info!(overrides = applied, "Applied configuration from environment variables");
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables only
///
/// `BIZLINK_BACKEND_URL` is required; everything else falls back to
/// defaults.
///
/// # Errors
/// Returns `LinkError::Config` if the backend URL is missing or a value is
/// invalid.
pub fn load_from_env() -> Result<Config> {
    env_var("BIZLINK_BACKEND_URL")?;

    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    config.validate()?;

    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `LinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LinkError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LinkError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    let config = read_config_file(&config_path)?;
    config.validate()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| LinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(LinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "bizlink.json", "bizlink.toml"];

    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(NAMES.iter().map(|name| cwd.join(name)));
        candidates.push(cwd.join("../config.json"));
        candidates.push(cwd.join("../config.toml"));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Apply every `BIZLINK_*` override that is set. Returns how many applied.
fn apply_env_overrides(config: &mut Config) -> Result<usize> {
    let mut applied = 0;

    if let Some(url) = env_opt("BIZLINK_BACKEND_URL") {
        config.backend.base_url = url;
        applied += 1;
    }
    if let Some(secs) = env_parse::<u64>("BIZLINK_BACKEND_TIMEOUT_SECS")? {
        config.backend.timeout_seconds = secs;
        applied += 1;
    }
    if let Some(ms) = env_parse::<u64>("BIZLINK_POPUP_POLL_MS")? {
        config.popup.poll_interval_ms = ms;
        applied += 1;
    }
    if let Some(ms) = env_parse::<u64>("BIZLINK_POPUP_SETTLE_MS")? {
        config.popup.settle_delay_ms = ms;
        applied += 1;
    }
    if let Some(secs) = env_parse::<u64>("BIZLINK_POPUP_MAX_WAIT_SECS")? {
        config.popup.max_wait_seconds = (secs > 0).then_some(secs);
        applied += 1;
    }
    if let Some(source) = env_opt("BIZLINK_TOKEN_SOURCE") {
        config.auth.token_source = parse_token_source(&source)?;
        applied += 1;
    }
    if let Some(command) = env_opt("BIZLINK_BROWSER") {
        config.popup.browser.command = command;
        applied += 1;
    }

    Ok(applied)
}

/// Parse a `BIZLINK_TOKEN_SOURCE` value.
///
/// # Errors
/// Returns `LinkError::Config` for unknown or incomplete values.
pub fn parse_token_source(value: &str) -> Result<TokenSource> {
    let (kind, rest) = match value.split_once(':') {
        Some((kind, rest)) => (kind, Some(rest)),
        None => (value, None),
    };

    match (kind.trim().to_ascii_lowercase().as_str(), rest) {
        ("env", None) => Ok(TokenSource::default()),
        ("env", Some(var)) if !var.is_empty() => Ok(TokenSource::Env { var: var.to_string() }),
        ("keychain", None) => Ok(TokenSource::default_keychain()),
        ("keychain", Some(rest)) => match rest.split_once(':') {
            Some((service, account)) if !service.is_empty() && !account.is_empty() => {
                Ok(TokenSource::Keychain { service: service.to_string(), account: account.to_string() })
            }
            _ => Err(LinkError::Config(format!("Invalid keychain token source: {value}"))),
        },
        ("static", Some(token)) if !token.is_empty() => {
            Ok(TokenSource::Static { token: token.to_string() })
        }
        _ => Err(LinkError::Config(format!("Invalid token source: {value}"))),
    }
}

/// Get required environment variable
///
/// # Errors
/// Returns `LinkError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| LinkError::Config(format!("Missing required environment variable: {key}")))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| LinkError::Config(format!("Invalid {key} ({raw}): {e}")))
        })
        .transpose()
}
