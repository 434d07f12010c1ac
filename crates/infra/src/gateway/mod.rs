//! Backend-backed implementations of the provider gateway ports

pub mod calendar;
pub mod payment;

use std::sync::Arc;

use bizlink_core::{AuthorizationRequest, StatusReport};
use bizlink_domain::{LinkError, Provider, ProviderEndpoints, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use url::Url;

pub use calendar::CalendarBackendGateway;
pub use payment::PaymentBackendGateway;

use crate::backend::{BackendClient, BackendError};

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    authorization_url: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    connected: bool,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Operations every provider shares: initiate, status and disconnect.
struct ProviderBackend {
    provider: Provider,
    client: Arc<BackendClient>,
    endpoints: ProviderEndpoints,
}

impl ProviderBackend {
    fn new(provider: Provider, client: Arc<BackendClient>, endpoints: ProviderEndpoints) -> Self {
        Self { provider, client, endpoints }
    }

    /// Never retried: each call may create a fresh OAuth state upstream.
    async fn initiate(&self) -> Result<AuthorizationRequest> {
        let response: InitiateResponse =
            self.client.post(&self.endpoints.initiate, &json!({})).await?;

        Url::parse(&response.authorization_url).map_err(|e| {
            LinkError::GatewayUnavailable(format!(
                "backend returned an invalid authorization url: {e}"
            ))
        })?;

        debug!(provider = %self.provider, "Authorization flow initiated");
        Ok(AuthorizationRequest { authorization_url: response.authorization_url })
    }

    async fn query_status(&self) -> Result<StatusReport> {
        match self.client.get::<StatusResponse>(&self.endpoints.status).await {
            Ok(status) => Ok(StatusReport { connected: status.connected, fields: status.fields }),
            Err(err) if err.is_client_status(&[404]) => {
                debug!(provider = %self.provider, "No link on record");
                Ok(StatusReport::disconnected())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        match self.client.post_ack(&self.endpoints.disconnect, &json!({})).await {
            Ok(()) => {
                info!(provider = %self.provider, "Backend link revoked");
                Ok(())
            }
            Err(err) if err.is_client_status(&[404, 409, 410]) => {
                debug!(provider = %self.provider, error = %err, "Link already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn required_endpoint<'a>(endpoint: Option<&'a String>, name: &str) -> Result<&'a str> {
    endpoint
        .map(String::as_str)
        .ok_or_else(|| LinkError::Config(format!("{name} endpoint is not configured")))
}

fn map_err_with<F>(err: BackendError, statuses: &[u16], on_match: F) -> LinkError
where
    F: FnOnce(String) -> LinkError,
{
    if err.is_client_status(statuses) {
        on_match(err.to_string())
    } else {
        err.into()
    }
}
