#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bizlink_core::PopupSupervisorConfig;
use bizlink_domain::BackendConfig;
use bizlink_infra::backend::{BackendClient, StaticTokenProvider};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "dashboard-token";

/// Backend config pointing at the mock server's `/api` prefix.
pub fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_seconds: 5,
        status_max_attempts: 2,
    }
}

pub fn backend_client(server: &MockServer) -> Arc<BackendClient> {
    let client = BackendClient::with_backoff(
        &backend_config(server),
        Arc::new(StaticTokenProvider::new(TOKEN)),
        Duration::from_millis(5),
    )
    .expect("backend client should build");
    Arc::new(client)
}

/// Popup timings short enough for real-clock tests.
pub fn fast_popup() -> PopupSupervisorConfig {
    PopupSupervisorConfig {
        poll_interval: Duration::from_millis(20),
        settle_delay: Duration::from_millis(20),
        ..PopupSupervisorConfig::default()
    }
}

/// Mount a JSON response for `verb` on `/api{route}`.
pub async fn mount_json(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(format!("/api{route}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
