//! Provider connection commands

use std::time::Instant;

use bizlink_domain::Provider;
use serde::Serialize;
use tracing::info;

use super::{finish, CommandError, CommandResult, ConnectionView};
use crate::utils::logging::log_command_execution;
use crate::AppContext;

/// Status of one provider as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub connection: ConnectionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

/// Re-query the backend for the current link status of `provider`.
pub async fn get_connection_status(
    ctx: &AppContext,
    provider: Provider,
) -> CommandResult<ConnectionView> {
    let command_name = "connection::get_connection_status";
    let start = Instant::now();

    let result = ctx.connection(provider).refresh().await;
    finish(command_name, provider, start, result).map(|snapshot| ConnectionView::from(&snapshot))
}

/// Refresh every provider for the dashboard overview.
///
/// A provider whose status query fails is reported in its published state
/// (normally `unknown`) together with the error.
pub async fn get_dashboard_status(ctx: &AppContext) -> Vec<ProviderStatus> {
    let command_name = "connection::get_dashboard_status";
    let start = Instant::now();

    let mut statuses = Vec::with_capacity(Provider::ALL.len());
    for (provider, result) in ctx.refresh_all().await {
        let elapsed = start.elapsed();
        log_command_execution(command_name, provider, elapsed, result.as_ref().err());

        let status = match result {
            Ok(snapshot) => ProviderStatus { connection: ConnectionView::from(&snapshot), error: None },
            Err(err) => ProviderStatus {
                connection: ConnectionView::from(&ctx.connection(provider).snapshot()),
                error: Some(CommandError::new(provider, &err)),
            },
        };
        statuses.push(status);
    }
    statuses
}

/// Run the OAuth popup flow for `provider`.
///
/// Resolves once the popup has closed and the backend has been re-queried.
pub async fn connect_provider(
    ctx: &AppContext,
    provider: Provider,
) -> CommandResult<ConnectionView> {
    let command_name = "connection::connect_provider";
    let start = Instant::now();

    info!(command = command_name, %provider, "Starting provider authorization");
    let result = ctx.connection(provider).connect().await;
    finish(command_name, provider, start, result).map(|snapshot| ConnectionView::from(&snapshot))
}

/// Unlink `provider`. Local state is cleared even when the backend call fails.
pub async fn disconnect_provider(
    ctx: &AppContext,
    provider: Provider,
) -> CommandResult<ConnectionView> {
    let command_name = "connection::disconnect_provider";
    let start = Instant::now();

    let result = ctx.connection(provider).disconnect().await;
    finish(command_name, provider, start, result).map(|snapshot| ConnectionView::from(&snapshot))
}
