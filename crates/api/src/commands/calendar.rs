//! Calendar selection commands

use std::time::Instant;

use bizlink_domain::{LinkError, Provider, SelectableResource, Selection};
use tracing::info;

use super::{finish, CommandResult};
use crate::AppContext;

/// Open the calendar picker and return the calendars the user can choose from.
///
/// The picker stays open until a calendar is selected or the picker is
/// cancelled.
pub async fn list_calendars(ctx: &AppContext) -> CommandResult<Vec<SelectableResource>> {
    let command_name = "calendar::list_calendars";
    let start = Instant::now();

    let result = ctx.calendar_selection.open_picker().await;
    finish(command_name, Provider::Calendar, start, result).map(|listing| listing.into_iter().collect())
}

/// Select the calendar with id `calendar_id` from a freshly fetched listing.
///
/// An id the backend does not offer is rejected without a commit.
pub async fn select_calendar(ctx: &AppContext, calendar_id: &str) -> CommandResult<Selection> {
    let command_name = "calendar::select_calendar";
    let start = Instant::now();

    info!(command = command_name, calendar_id, "Selecting calendar");
    let result = choose_by_id(ctx, calendar_id).await;
    finish(command_name, Provider::Calendar, start, result)
}

/// Close the picker, discarding any listing still loading.
pub fn cancel_calendar_picker(ctx: &AppContext) {
    ctx.calendar_selection.cancel_picker();
}

/// Calendar currently in use, if one has been chosen.
pub fn get_selected_calendar(ctx: &AppContext) -> Option<Selection> {
    ctx.calendar_selection.current_selection()
}

async fn choose_by_id(ctx: &AppContext, calendar_id: &str) -> bizlink_domain::Result<Selection> {
    let selection = &ctx.calendar_selection;
    let listing = selection.open_picker().await?;

    let Some(resource) = listing.get(calendar_id).cloned() else {
        selection.cancel_picker();
        return Err(LinkError::InvalidResource(format!("calendar {calendar_id} is not available")));
    };

    selection.choose(&resource).await
}
