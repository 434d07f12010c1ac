//! Stripe gateway

use std::sync::Arc;

use async_trait::async_trait;
use bizlink_core::{AuthorizationRequest, ConnectionDetail, ProviderGateway, StatusReport};
use bizlink_domain::{
    LinkError, PaymentAccount, Provider, ProviderAccount, ProviderEndpoints, Result,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::ProviderBackend;
use crate::backend::BackendClient;

/// Account fields returned alongside `connected: true`.
#[derive(Debug, Deserialize)]
struct StripeAccountFields {
    #[serde(default)]
    account_id: Option<String>,
    #[serde(default)]
    account_name: Option<String>,
    #[serde(default)]
    account_email: Option<String>,
    #[serde(default)]
    charges_enabled: bool,
    #[serde(default)]
    payouts_enabled: bool,
}

pub struct PaymentBackendGateway {
    backend: ProviderBackend,
}

impl PaymentBackendGateway {
    pub fn new(client: Arc<BackendClient>, endpoints: ProviderEndpoints) -> Self {
        Self { backend: ProviderBackend::new(Provider::Payment, client, endpoints) }
    }
}

/// Project a connected status payload into the account summary.
fn project_account(report: &StatusReport) -> Result<PaymentAccount> {
    let fields: StripeAccountFields =
        serde_json::from_value(Value::Object(report.fields.clone())).map_err(|e| {
            LinkError::GatewayUnavailable(format!("malformed Stripe account fields: {e}"))
        })?;

    let account_id = fields
        .account_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| LinkError::GatewayUnavailable("status response has no account_id".into()))?;

    Ok(PaymentAccount {
        account_id,
        account_name: fields.account_name.filter(|s| !s.is_empty()),
        account_email: fields.account_email.filter(|s| !s.is_empty()),
        charges_enabled: fields.charges_enabled,
        payouts_enabled: fields.payouts_enabled,
    })
}

#[async_trait]
impl ProviderGateway for PaymentBackendGateway {
    fn provider(&self) -> Provider {
        Provider::Payment
    }

    #[instrument(skip(self), fields(provider = "payment"))]
    async fn initiate(&self) -> Result<AuthorizationRequest> {
        self.backend.initiate().await
    }

    #[instrument(skip(self), fields(provider = "payment"))]
    async fn query_status(&self) -> Result<StatusReport> {
        self.backend.query_status().await
    }

    #[instrument(skip(self), fields(provider = "payment"))]
    async fn disconnect(&self) -> Result<()> {
        self.backend.disconnect().await
    }

    async fn fetch_detail(&self, report: &StatusReport) -> Result<ConnectionDetail> {
        let account = project_account(report)?;
        Ok(ConnectionDetail { account: Some(ProviderAccount::Payment(account)), selection: None })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bizlink_domain::BackendConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::backend::StaticTokenProvider;

    fn gateway(server: &MockServer, attempts: usize) -> PaymentBackendGateway {
        let config = BackendConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_seconds: 5,
            status_max_attempts: attempts,
        };
        let client = BackendClient::with_backoff(
            &config,
            Arc::new(StaticTokenProvider::new("tok")),
            Duration::from_millis(5),
        )
        .unwrap();
        PaymentBackendGateway::new(Arc::new(client), ProviderEndpoints::payment())
    }

    #[tokio::test]
    async fn test_status_projects_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/oauth/stripe/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "connected": true,
                "account_id": "acct_123",
                "account_name": "Acme Spa",
                "account_email": "owner@acme.example",
                "charges_enabled": true,
                "payouts_enabled": false
            })))
            .mount(&server)
            .await;

        let gateway = gateway(&server, 1);
        let report = gateway.query_status().await.unwrap();
        assert!(report.connected);

        let detail = gateway.fetch_detail(&report).await.unwrap();
        let Some(ProviderAccount::Payment(account)) = detail.account else {
            panic!("expected payment account");
        };
        assert_eq!(account.account_id, "acct_123");
        assert_eq!(account.display_name(), "Acme Spa");
        assert!(account.setup_incomplete());
    }

    #[test]
    fn test_projection_requires_account_id() {
        let mut fields = serde_json::Map::new();
        fields.insert("account_name".into(), json!("Acme"));
        let report = StatusReport::connected(fields);

        assert!(matches!(project_account(&report), Err(LinkError::GatewayUnavailable(_))));
    }

    #[tokio::test]
    async fn test_status_404_means_disconnected() {
        let server = MockServer::start().await;
        Mock::given(path("/api/oauth/stripe/status"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let report = gateway(&server, 1).query_status().await.unwrap();
        assert!(!report.connected);
    }

    #[tokio::test]
    async fn test_status_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(path("/api/oauth/stripe/status"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/api/oauth/stripe/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"connected": false})))
            .mount(&server)
            .await;

        let report = gateway(&server, 3).query_status().await.unwrap();
        assert!(!report.connected);
    }

    #[tokio::test]
    async fn test_initiate_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/oauth/stripe/initiate"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let result = gateway(&server, 3).initiate().await;
        assert!(matches!(result, Err(LinkError::GatewayUnavailable(_))));
    }

    #[tokio::test]
    async fn test_initiate_rejects_relative_url() {
        let server = MockServer::start().await;
        Mock::given(path("/api/oauth/stripe/initiate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"authorization_url": "/oauth"})),
            )
            .mount(&server)
            .await;

        let result = gateway(&server, 1).initiate().await;
        assert!(matches!(result, Err(LinkError::GatewayUnavailable(_))));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(path("/api/oauth/stripe/disconnect"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let gateway = gateway(&server, 1);
        assert!(gateway.disconnect().await.is_ok());
        assert!(gateway.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn test_unauthorized_propagates() {
        let server = MockServer::start().await;
        Mock::given(path("/api/oauth/stripe/status"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = gateway(&server, 3).query_status().await;
        assert!(matches!(result, Err(LinkError::Unauthorized(_))));
    }
}
