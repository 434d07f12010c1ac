//! Google Calendar gateway

use std::sync::Arc;

use async_trait::async_trait;
use bizlink_core::{
    AuthorizationRequest, CalendarGateway, ConnectionDetail, ProviderGateway, StatusReport,
};
use bizlink_domain::{
    LinkError, Provider, ProviderEndpoints, Result, SelectableResource, Selection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{map_err_with, required_endpoint, ProviderBackend};
use crate::backend::BackendClient;

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    calendars: Vec<CalendarEntry>,
}

#[derive(Debug, Deserialize)]
struct CalendarEntry {
    id: String,
    summary: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    primary: Option<bool>,
}

impl From<CalendarEntry> for SelectableResource {
    fn from(entry: CalendarEntry) -> Self {
        Self {
            id: entry.id,
            display_name: entry.summary,
            description: entry.description.filter(|d| !d.is_empty()),
            is_primary: entry.primary.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize)]
struct SelectCalendarRequest<'a> {
    calendar_id: &'a str,
    calendar_name: &'a str,
    calendar_summary: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SelectedCalendarResponse {
    #[serde(default)]
    selected: bool,
    #[serde(default)]
    calendar: Option<SelectedCalendar>,
}

#[derive(Debug, Deserialize)]
struct SelectedCalendar {
    calendar_id: String,
    calendar_name: String,
    #[serde(default)]
    calendar_summary: Option<String>,
}

pub struct CalendarBackendGateway {
    backend: ProviderBackend,
}

impl CalendarBackendGateway {
    pub fn new(client: Arc<BackendClient>, endpoints: ProviderEndpoints) -> Self {
        Self { backend: ProviderBackend::new(Provider::Calendar, client, endpoints) }
    }

    fn endpoints(&self) -> &ProviderEndpoints {
        &self.backend.endpoints
    }
}

#[async_trait]
impl ProviderGateway for CalendarBackendGateway {
    fn provider(&self) -> Provider {
        Provider::Calendar
    }

    #[instrument(skip(self), fields(provider = "calendar"))]
    async fn initiate(&self) -> Result<AuthorizationRequest> {
        self.backend.initiate().await
    }

    #[instrument(skip(self), fields(provider = "calendar"))]
    async fn query_status(&self) -> Result<StatusReport> {
        self.backend.query_status().await
    }

    #[instrument(skip(self), fields(provider = "calendar"))]
    async fn disconnect(&self) -> Result<()> {
        self.backend.disconnect().await
    }

    async fn fetch_detail(&self, _report: &StatusReport) -> Result<ConnectionDetail> {
        let selection = self.current_selection().await?;
        Ok(ConnectionDetail { account: None, selection })
    }
}

#[async_trait]
impl CalendarGateway for CalendarBackendGateway {
    #[instrument(skip(self), fields(provider = "calendar"))]
    async fn list_selectable(&self) -> Result<Vec<SelectableResource>> {
        let path = required_endpoint(self.endpoints().list_resources.as_ref(), "list_resources")?;

        let response: CalendarListResponse =
            self.backend.client.get(path).await.map_err(|err| {
                map_err_with(err, &[400, 404, 409, 412], |_| LinkError::NotConnected)
            })?;

        debug!(count = response.calendars.len(), "Listed calendars");
        Ok(response.calendars.into_iter().map(SelectableResource::from).collect())
    }

    #[instrument(skip(self, display_name, description), fields(provider = "calendar"))]
    async fn commit_selection(
        &self,
        resource_id: &str,
        display_name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let path =
            required_endpoint(self.endpoints().select_resource.as_ref(), "select_resource")?;
        let body = SelectCalendarRequest {
            calendar_id: resource_id,
            calendar_name: display_name,
            calendar_summary: description,
        };

        self.backend
            .client
            .post_ack(path, &body)
            .await
            .map_err(|err| map_err_with(err, &[400, 404, 409, 410, 422], LinkError::InvalidResource))
    }

    #[instrument(skip(self), fields(provider = "calendar"))]
    async fn current_selection(&self) -> Result<Option<Selection>> {
        let Some(path) = self.endpoints().selected_resource.as_deref() else {
            return Ok(None);
        };

        match self.backend.client.get::<SelectedCalendarResponse>(path).await {
            Ok(SelectedCalendarResponse { selected: true, calendar: Some(calendar) }) => {
                Ok(Some(Selection {
                    resource_id: calendar.calendar_id,
                    display_name: calendar.calendar_name,
                    description: calendar.calendar_summary.filter(|s| !s.is_empty()),
                }))
            }
            Ok(_) => Ok(None),
            Err(err) if err.is_client_status(&[404]) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
