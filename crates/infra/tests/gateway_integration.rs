//! Controllers driven through the HTTP gateways against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use bizlink_core::testing::FakeLauncher;
use bizlink_core::{ConnectionController, PopupSupervisor, SelectionController};
use bizlink_domain::{ConnectionState, LinkError, Provider, ProviderAccount, ProviderEndpoints};
use bizlink_infra::{CalendarBackendGateway, PaymentBackendGateway};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;

use support::{backend_client, fast_popup, mount_json, TOKEN};

fn payment_controller(server: &MockServer, launcher: Arc<FakeLauncher>) -> ConnectionController {
    let gateway = Arc::new(PaymentBackendGateway::new(
        backend_client(server),
        ProviderEndpoints::payment(),
    ));
    let popup = PopupSupervisor::new(Provider::Payment, launcher, fast_popup());
    ConnectionController::new(gateway, popup)
}

fn calendar_controllers(
    server: &MockServer,
    launcher: Arc<FakeLauncher>,
) -> (Arc<ConnectionController>, SelectionController) {
    let gateway = Arc::new(CalendarBackendGateway::new(
        backend_client(server),
        ProviderEndpoints::calendar(),
    ));
    let popup = PopupSupervisor::new(Provider::Calendar, launcher, fast_popup());
    let connection = Arc::new(ConnectionController::new(gateway.clone(), popup));
    let selection = SelectionController::new(Arc::clone(&connection), gateway);
    (connection, selection)
}

#[tokio::test]
async fn payment_connect_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/oauth/stripe/initiate"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "authorization_url": "https://connect.stripe.example/oauth?state=abc"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_json(
        &server,
        "GET",
        "/oauth/stripe/status",
        200,
        json!({
            "connected": true,
            "account_id": "acct_42",
            "account_name": "Acme Spa",
            "charges_enabled": true,
            "payouts_enabled": true
        }),
    )
    .await;

    let launcher = Arc::new(FakeLauncher::new().closing_after(Duration::from_millis(60)));
    let controller = payment_controller(&server, launcher.clone());

    let snapshot = controller.connect().await.expect("connect should succeed");

    assert_eq!(snapshot.state(), ConnectionState::Connected);
    assert_eq!(launcher.opened_urls(), vec!["https://connect.stripe.example/oauth?state=abc"]);
    let Some(ProviderAccount::Payment(account)) = snapshot.status.account_summary() else {
        panic!("expected payment account summary");
    };
    assert_eq!(account.account_id, "acct_42");
    assert!(!account.setup_incomplete());
}

#[tokio::test]
async fn payment_initiate_outage_leaves_disconnected() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/oauth/stripe/initiate", 503, json!({"detail": "down"})).await;

    let launcher = Arc::new(FakeLauncher::new());
    let controller = payment_controller(&server, launcher.clone());

    let result = controller.connect().await;

    assert!(matches!(result, Err(LinkError::GatewayUnavailable(_))));
    assert_eq!(controller.state(), ConnectionState::Disconnected);
    assert_eq!(launcher.open_count(), 0);
    let message = result.unwrap_err().user_message(Provider::Payment);
    assert_eq!(message, "Failed to reach Stripe. Please try again.");
}

#[tokio::test]
async fn calendar_selection_round_trip() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/oauth/google/status", 200, json!({"connected": true})).await;
    mount_json(&server, "GET", "/oauth/google/calendars/selected", 200, json!({"selected": false}))
        .await;
    mount_json(
        &server,
        "GET",
        "/oauth/google/calendars",
        200,
        json!({"calendars": [
            {"id": "cal-1", "summary": "Main", "primary": true},
            {"id": "cal-2", "summary": "Overflow"}
        ]}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/oauth/google/calendars/select"))
        .and(body_json(json!({
            "calendar_id": "cal-2",
            "calendar_name": "Overflow",
            "calendar_summary": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (connection, selection) = calendar_controllers(&server, Arc::new(FakeLauncher::new()));
    let snapshot = connection.refresh().await.unwrap();
    assert_eq!(snapshot.state(), ConnectionState::Connected);
    assert!(snapshot.selection.is_none());

    let listing = selection.open_picker().await.unwrap();
    let overflow = listing.get("cal-2").cloned().unwrap();
    let chosen = selection.choose(&overflow).await.unwrap();

    assert_eq!(chosen.resource_id, "cal-2");
    assert_eq!(chosen.display_name, "Overflow");
    assert_eq!(connection.snapshot().selection, Some(chosen));
}

#[tokio::test]
async fn calendar_refresh_restores_saved_selection() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/oauth/google/status", 200, json!({"connected": true})).await;
    mount_json(
        &server,
        "GET",
        "/oauth/google/calendars/selected",
        200,
        json!({
            "selected": true,
            "calendar": {"calendar_id": "cal-1", "calendar_name": "Main", "calendar_summary": "Front desk"}
        }),
    )
    .await;

    let (connection, selection) = calendar_controllers(&server, Arc::new(FakeLauncher::new()));
    connection.refresh().await.unwrap();

    let current = selection.current_selection().expect("selection restored");
    assert_eq!(current.resource_id, "cal-1");
    assert_eq!(current.description.as_deref(), Some("Front desk"));
}

#[tokio::test]
async fn calendar_detail_outage_is_a_warning() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/oauth/google/status", 200, json!({"connected": true})).await;
    mount_json(&server, "GET", "/oauth/google/calendars/selected", 500, json!({})).await;

    let (connection, _selection) = calendar_controllers(&server, Arc::new(FakeLauncher::new()));
    let snapshot = connection.refresh().await.unwrap();

    assert_eq!(snapshot.state(), ConnectionState::Connected);
    assert!(snapshot.warning.is_some());
}

#[tokio::test]
async fn expired_session_surfaces_unauthorized() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/oauth/google/status", 401, json!({"detail": "expired"})).await;

    let (connection, _selection) = calendar_controllers(&server, Arc::new(FakeLauncher::new()));
    let result = connection.refresh().await;

    assert!(matches!(result, Err(LinkError::Unauthorized(_))));
    assert_eq!(connection.state(), ConnectionState::Unknown);
}

#[tokio::test]
async fn disconnect_twice_against_backend() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/oauth/stripe/status", 200, json!({"connected": true, "account_id": "acct_1"})).await;
    Mock::given(method("POST"))
        .and(path("/api/oauth/stripe/disconnect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_json(&server, "POST", "/oauth/stripe/disconnect", 404, json!({"detail": "No link"})).await;

    let controller = payment_controller(&server, Arc::new(FakeLauncher::new()));
    controller.refresh().await.unwrap();

    let first = controller.disconnect().await.unwrap();
    let second = controller.disconnect().await.unwrap();

    assert_eq!(first.state(), ConnectionState::Disconnected);
    assert_eq!(second.state(), ConnectionState::Disconnected);
    assert!(second.status.account_summary().is_none());
}
