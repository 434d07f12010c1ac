use std::time::Duration;

use bizlink_domain::{LinkError, Provider};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "BIZLINK_LOG_FORMAT";

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Setting
/// `BIZLINK_LOG_FORMAT=json` switches to structured JSON lines. Logs go to
/// stderr so command output on stdout stays machine-readable.
///
/// Later calls are ignored once a subscriber is installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if result.is_err() {
        warn!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"connection::connect_provider"`).
/// * `provider` - Provider the command acted on.
/// * `elapsed` - Duration the command execution took.
/// * `error` - The failure, if the command did not succeed.
#[inline]
pub fn log_command_execution(
    command: &str,
    provider: Provider,
    elapsed: Duration,
    error: Option<&LinkError>,
) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, %provider, duration_ms, "command_execution_success"),
        Some(err) => warn!(
            command,
            %provider,
            duration_ms,
            error_label = error_label(err),
            error = %err,
            "command_execution_failure"
        ),
    }
}

/// Convert a `LinkError` into a stable label suitable for metrics/logging.
#[inline]
pub fn error_label(error: &LinkError) -> &'static str {
    error.label()
}
