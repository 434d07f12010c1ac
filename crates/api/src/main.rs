//! BizLink - link dashboard accounts to Google Calendar and Stripe
//!
//! Command-line entry point.

use anyhow::Context;
use bizlink_domain::{ConnectionState, Provider, ProviderAccount, SelectableResource, Selection};
use bizlink_lib::utils::logging::init_tracing;
use bizlink_lib::{
    connect_provider, disconnect_provider, get_connection_status, get_dashboard_status,
    list_calendars, select_calendar, AppContext, ConnectionView,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "bizlink", version, about = "Manage provider links for the business dashboard")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the link status of every provider
    Status,
    /// Link a provider through its authorization popup
    Connect {
        /// `calendar` or `payment`
        provider: Provider,
    },
    /// Unlink a provider
    Disconnect {
        /// `calendar` or `payment`
        provider: Provider,
    },
    /// List the calendars available for selection
    Calendars,
    /// Choose the calendar the dashboard uses
    Select {
        /// Calendar id as shown by `bizlink calendars`
        calendar_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => info!("No .env loaded: {e}"),
    }

    let cli = Cli::parse();
    let ctx = AppContext::new().context("failed to initialize BizLink")?;
    info!(title = %ctx.config.business.dashboard_title(), "BizLink starting");

    match cli.command {
        Command::Status => {
            let statuses = get_dashboard_status(&ctx).await;
            if cli.json {
                return print_json(&statuses);
            }
            for status in &statuses {
                println!("{}", render_view(&status.connection));
                if let Some(err) = &status.error {
                    println!("  error: {err}");
                }
            }
        }
        Command::Connect { provider } => {
            refresh_before(&ctx, provider).await;
            let view = tokio::select! {
                result = connect_provider(&ctx, provider) => result?,
                _ = tokio::signal::ctrl_c() => {
                    warn!(%provider, "Authorization abandoned");
                    anyhow::bail!("{} authorization abandoned", provider.display_name());
                }
            };
            print_view(&view, cli.json)?;
        }
        Command::Disconnect { provider } => {
            refresh_before(&ctx, provider).await;
            let view = disconnect_provider(&ctx, provider).await?;
            print_view(&view, cli.json)?;
        }
        Command::Calendars => {
            refresh_before(&ctx, Provider::Calendar).await;
            let calendars = list_calendars(&ctx).await?;
            if cli.json {
                return print_json(&calendars);
            }
            if calendars.is_empty() {
                println!("No calendars available.");
            }
            for calendar in &calendars {
                println!("{}", render_calendar(calendar));
            }
        }
        Command::Select { calendar_id } => {
            refresh_before(&ctx, Provider::Calendar).await;
            let selection = select_calendar(&ctx, &calendar_id).await?;
            if cli.json {
                return print_json(&selection);
            }
            println!("Using {}", render_selection(&selection));
        }
    }

    Ok(())
}

/// Load the current link state; a failure is already logged by the command.
async fn refresh_before(ctx: &AppContext, provider: Provider) {
    if let Err(err) = get_connection_status(ctx, provider).await {
        warn!(%provider, kind = err.kind, "Continuing with unknown link status");
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_view(view: &ConnectionView, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(view);
    }
    println!("{}", render_view(view));
    Ok(())
}

fn render_view(view: &ConnectionView) -> String {
    let mut line = format!("{}: {}", view.display_name, view.state);

    if view.state == ConnectionState::Connected {
        match (&view.account, &view.selection) {
            (Some(ProviderAccount::Payment(account)), _) => {
                line.push_str(&format!(" ({})", account.display_name()));
            }
            (_, Some(selection)) => {
                line.push_str(&format!(" (calendar: {})", selection.display_name));
            }
            (_, None) if view.provider.supports_selection() => {
                line.push_str(" (no calendar selected)");
            }
            _ => {}
        }
    }
    if view.setup_incomplete {
        line.push_str(" - Account Setup Incomplete");
    }
    if let Some(warning) = &view.warning {
        line.push_str(&format!("\n  warning: {warning}"));
    }
    line
}

fn render_calendar(calendar: &SelectableResource) -> String {
    let mut line = format!("{}\t{}", calendar.id, calendar.display_name);
    if calendar.is_primary {
        line.push_str(" (primary)");
    }
    if let Some(description) = &calendar.description {
        line.push_str(&format!(" - {description}"));
    }
    line
}

fn render_selection(selection: &Selection) -> String {
    match &selection.description {
        Some(description) => format!("{} - {description}", selection.display_name),
        None => selection.display_name.clone(),
    }
}
