//! Dashboard session tokens
//!
//! Every backend call carries `Authorization: Bearer <token>`. The token is
//! read on each call so a re-login elsewhere is picked up without restarting.

use std::sync::Arc;

use async_trait::async_trait;
use bizlink_domain::{LinkError, TokenSource};
use keyring::Entry;
use tracing::debug;

use super::errors::BackendError;
use crate::errors::InfraError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with fixed tokens.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get the current dashboard token.
    ///
    /// # Errors
    /// Returns `BackendError::Auth` when no token is available.
    async fn access_token(&self) -> Result<String, BackendError>;
}

/// Fixed token, or none at all.
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }

    /// Provider that always reports a missing token.
    pub fn missing() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, BackendError> {
        self.token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BackendError::Auth("no dashboard token configured".into()))
    }
}

/// Token read from an environment variable on every call.
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> Result<String, BackendError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(BackendError::Auth(format!("{} is not set", self.var))),
        }
    }
}

/// Token stored in the OS keychain.
pub struct KeychainTokenProvider {
    service: String,
    account: String,
}

impl KeychainTokenProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self { service: service.into(), account: account.into() }
    }

    fn read(service: &str, account: &str) -> Result<String, LinkError> {
        let entry = Entry::new(service, account).map_err(|e| LinkError::from(InfraError::from(e)))?;
        entry.get_password().map_err(|e| LinkError::from(InfraError::from(e)))
    }
}

#[async_trait]
impl AccessTokenProvider for KeychainTokenProvider {
    async fn access_token(&self) -> Result<String, BackendError> {
        let service = self.service.clone();
        let account = self.account.clone();
        debug!(%service, %account, "Reading dashboard token from keychain");

        let token = tokio::task::spawn_blocking(move || Self::read(&service, &account))
            .await
            .map_err(|e| BackendError::Config(format!("keychain task failed: {e}")))??;

        if token.is_empty() {
            return Err(BackendError::Auth("keychain token is empty".into()));
        }
        Ok(token)
    }
}

/// Build the provider described by `source`.
pub fn token_provider(source: &TokenSource) -> Arc<dyn AccessTokenProvider> {
    match source {
        TokenSource::Env { var } => Arc::new(EnvTokenProvider::new(var.clone())),
        TokenSource::Keychain { service, account } => {
            Arc::new(KeychainTokenProvider::new(service.clone(), account.clone()))
        }
        TokenSource::Static { token } => Arc::new(StaticTokenProvider::new(token.clone())),
    }
}
