//! Authenticated JSON client for the dashboard backend
//!
//! Reads retry with backoff; writes are sent exactly once.

use std::sync::Arc;
use std::time::Duration;

use bizlink_domain::BackendConfig;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::auth::AccessTokenProvider;
use super::errors::BackendError;
use crate::http::HttpClient;

/// Backend client with bearer authentication
pub struct BackendClient {
    http_client: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Errors
    /// Returns `BackendError::Config` if the HTTP client cannot be built.
    pub fn new(
        config: &BackendConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, BackendError> {
        Self::with_backoff(config, auth, Duration::from_millis(200))
    }

    /// Same as [`BackendClient::new`] with an explicit retry backoff.
    pub fn with_backoff(
        config: &BackendConfig,
        auth: Arc<dyn AccessTokenProvider>,
        base_backoff: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout())
            .max_attempts(config.status_max_attempts)
            .base_backoff(base_backoff)
            .user_agent(concat!("bizlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http_client, auth, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    /// Execute a GET request, retrying transient failures.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let request = self.authorized(Method::GET, path).await?;
        let response = self.http_client.send(request).await?;
        Self::decode(Self::check_status(response, path).await?).await
    }

    /// Execute a POST request once and decode the JSON response.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, BackendError> {
        let response = self.post_raw(path, body).await?;
        Self::decode(response).await
    }

    /// Execute a POST request once, ignoring any response body.
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post_ack<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), BackendError> {
        self.post_raw(path, body).await.map(drop)
    }

    async fn post_raw<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, BackendError> {
        let request = self.authorized(Method::POST, path).await?.json(body);
        let response = self.http_client.send_once(request).await?;
        Self::check_status(response, path).await
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, url = %url, "backend request");

        Ok(self
            .http_client
            .request(method, &url)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn check_status(response: Response, path: &str) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::map_status_error(status, path, &body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let status = response.status();

        // 204/205 carry no body
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                BackendError::Decode(format!(
                    "No content response ({}), but a body was expected",
                    status.as_u16()
                ))
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("Failed to parse response: {e}")))
    }

    /// Map HTTP status codes to backend errors
    fn map_status_error(status: StatusCode, path: &str, body: &str) -> BackendError {
        let detail = backend_detail(body);
        let message = format!("{path}: HTTP {} {}", status.as_u16(), detail);

        match status.as_u16() {
            401 | 403 => BackendError::Auth(message),
            429 => BackendError::RateLimit(message),
            400..=499 => BackendError::Client { status: status.as_u16(), message },
            _ => BackendError::Server(message),
        }
    }
}

/// Backend errors arrive as `{"detail": "..."}`; fall back to the raw body.
fn backend_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
