//! Application context construction and wiring

use std::sync::Arc;

use bizlink_core::testing::FakeLauncher;
use bizlink_domain::{ConnectionState, LinkError, Provider};
use bizlink_lib::AppContext;
use wiremock::MockServer;

mod support;

use support::test_config;

#[tokio::test]
async fn test_context_starts_unknown_for_every_provider() {
    let server = MockServer::start().await;
    let ctx = AppContext::new_with_launcher(test_config(&server), Arc::new(FakeLauncher::new()))
        .expect("context should build");

    for provider in Provider::ALL {
        let controller = ctx.connection(provider);
        assert_eq!(controller.provider(), provider);
        assert_eq!(controller.state(), ConnectionState::Unknown);
    }
    assert!(ctx.calendar_selection.current_selection().is_none());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.backend.base_url = "not a url".to_string();

    let result = AppContext::new_with_launcher(config, Arc::new(FakeLauncher::new()));

    assert!(matches!(result, Err(LinkError::Config(_))));
}

#[tokio::test]
async fn test_unreachable_backend_leaves_state_unknown() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    // Nothing listens on the discard port.
    config.backend.base_url = "http://127.0.0.1:9/api".to_string();

    let ctx = AppContext::new_with_launcher(config, Arc::new(FakeLauncher::new()))
        .expect("context should build");
    let results = ctx.refresh_all().await;

    for (provider, result) in results {
        assert!(
            matches!(result, Err(LinkError::GatewayUnavailable(_))),
            "{provider} should be unavailable"
        );
        assert_eq!(ctx.connection(provider).state(), ConnectionState::Unknown);
    }
}
