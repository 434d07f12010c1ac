#![allow(dead_code)]

use std::sync::Arc;

use bizlink_core::testing::FakeLauncher;
use bizlink_domain::{AuthConfig, BackendConfig, Config, PopupConfig, TokenSource};
use bizlink_lib::AppContext;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "dashboard-token";

/// Configuration pointing at the mock server with fast popup timings.
pub fn test_config(server: &MockServer) -> Config {
    Config {
        backend: BackendConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_seconds: 5,
            status_max_attempts: 1,
        },
        popup: PopupConfig { poll_interval_ms: 10, settle_delay_ms: 10, ..PopupConfig::default() },
        auth: AuthConfig { token_source: TokenSource::Static { token: TOKEN.to_string() } },
        ..Config::default()
    }
}

/// Create an application context whose popups are served by `launcher`.
pub fn create_test_context(server: &MockServer, launcher: Arc<FakeLauncher>) -> AppContext {
    AppContext::new_with_launcher(test_config(server), launcher)
        .expect("failed to create test context")
}

/// Mount a JSON response for `verb` on `/api{route}`.
pub async fn mount_json(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(format!("/api{route}")))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
