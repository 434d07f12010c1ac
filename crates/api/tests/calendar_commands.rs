//! Integration tests for calendar selection commands
//!
//! Tests the calendar commands:
//! - `list_calendars` - Open the picker on a fresh listing
//! - `select_calendar` - Commit a calendar from the listing
//! - `get_selected_calendar` - Read the active selection

use std::sync::Arc;

use bizlink_core::testing::FakeLauncher;
use bizlink_domain::Provider;
use bizlink_lib::{
    cancel_calendar_picker, get_connection_status, get_selected_calendar, list_calendars,
    select_calendar, AppContext,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;

use support::{create_test_context, mount_json};

// ============================================================================
// Test Setup
// ============================================================================

/// Connected calendar backend offering `cal-1` (Main, primary) and `cal-2`.
async fn connected_calendar(server: &MockServer) -> AppContext {
    mount_json(server, "GET", "/oauth/google/status", 200, json!({"connected": true})).await;
    mount_json(server, "GET", "/oauth/google/calendars/selected", 200, json!({"selected": false}))
        .await;
    mount_json(
        server,
        "GET",
        "/oauth/google/calendars",
        200,
        json!({"calendars": [
            {"id": "cal-1", "summary": "Main", "primary": true},
            {"id": "cal-2", "summary": "Overflow", "description": "Walk-ins"}
        ]}),
    )
    .await;

    let ctx = create_test_context(server, Arc::new(FakeLauncher::new()));
    get_connection_status(&ctx, Provider::Calendar).await.expect("calendar status");
    ctx
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_list_calendars_opens_picker() {
    let server = MockServer::start().await;
    let ctx = connected_calendar(&server).await;

    let calendars = list_calendars(&ctx).await.unwrap();

    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[0].id, "cal-1");
    assert!(calendars[0].is_primary);
    assert_eq!(calendars[1].description.as_deref(), Some("Walk-ins"));
    assert!(ctx.calendar_selection.is_picker_open());

    cancel_calendar_picker(&ctx);
    assert!(!ctx.calendar_selection.is_picker_open());
}

#[tokio::test]
async fn test_select_calendar_commits_listing_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/oauth/google/calendars/select"))
        .and(body_json(json!({
            "calendar_id": "cal-2",
            "calendar_name": "Overflow",
            "calendar_summary": "Walk-ins"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = connected_calendar(&server).await;

    let selection = select_calendar(&ctx, "cal-2").await.unwrap();

    assert_eq!(selection.resource_id, "cal-2");
    assert_eq!(selection.display_name, "Overflow");
    assert_eq!(get_selected_calendar(&ctx), Some(selection));
    assert!(!ctx.calendar_selection.is_picker_open());
}

#[tokio::test]
async fn test_select_unknown_calendar_makes_no_backend_call() {
    let server = MockServer::start().await;
    Mock::given(path("/api/oauth/google/calendars/select"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let ctx = connected_calendar(&server).await;

    let err = select_calendar(&ctx, "cal-404").await.unwrap_err();

    assert_eq!(err.kind, "invalid_resource");
    assert!(err.retryable);
    assert_eq!(get_selected_calendar(&ctx), None);
}

#[tokio::test]
async fn test_select_rejected_by_backend_keeps_previous_selection() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "POST",
        "/oauth/google/calendars/select",
        422,
        json!({"detail": "Calendar not found"}),
    )
    .await;
    let ctx = connected_calendar(&server).await;

    let err = select_calendar(&ctx, "cal-1").await.unwrap_err();

    assert_eq!(err.kind, "invalid_resource");
    assert_eq!(
        err.message,
        "That calendar is no longer available. Refresh the list and choose again."
    );
    assert_eq!(get_selected_calendar(&ctx), None);
    assert!(ctx.calendar_selection.is_picker_open());
}

#[tokio::test]
async fn test_list_calendars_requires_connection() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/oauth/google/status", 200, json!({"connected": false})).await;
    Mock::given(path("/api/oauth/google/calendars"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = create_test_context(&server, Arc::new(FakeLauncher::new()));
    get_connection_status(&ctx, Provider::Calendar).await.unwrap();

    let err = list_calendars(&ctx).await.unwrap_err();

    assert_eq!(err.kind, "not_connected");
    assert_eq!(err.message, "Connect Google Calendar first.");
}
