//! Calendar picker and selection commit

use std::sync::Arc;

use bizlink_domain::{LinkError, Result, SelectableResource, Selection};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::connection::ConnectionController;
use crate::ports::CalendarGateway;

/// One fetched list of selectable resources.
///
/// Owned and finite; iterating consumes it. Open the picker again for a
/// fresh listing.
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceListing {
    resources: Vec<SelectableResource>,
}

impl ResourceListing {
    /// Number of resources offered.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether there is nothing to choose from.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource with the given id.
    pub fn get(&self, id: &str) -> Option<&SelectableResource> {
        self.resources.iter().find(|resource| resource.id == id)
    }

    /// The resource flagged as primary, if any.
    pub fn primary(&self) -> Option<&SelectableResource> {
        self.resources.iter().find(|resource| resource.is_primary)
    }
}

impl IntoIterator for ResourceListing {
    type Item = SelectableResource;
    type IntoIter = std::vec::IntoIter<SelectableResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

enum Picker {
    Closed,
    Loading,
    /// Listing fetched during the given connected session.
    Open { session: u64, resources: Vec<SelectableResource> },
}

struct PickerState {
    picker: Picker,
    /// Bumped whenever the picker is opened, cancelled or closed.
    ticket: u64,
}

/// Lists a connected provider's resources and commits the user's choice.
///
/// A listing belongs to the connected session it was fetched in; once the
/// connection leaves `Connected` it is discarded and the picker must be
/// opened again.
pub struct SelectionController {
    connection: Arc<ConnectionController>,
    gateway: Arc<dyn CalendarGateway>,
    state: Mutex<PickerState>,
}

impl SelectionController {
    /// Picker for the provider driven by `connection`.
    pub fn new(connection: Arc<ConnectionController>, gateway: Arc<dyn CalendarGateway>) -> Self {
        Self {
            connection,
            gateway,
            state: Mutex::new(PickerState { picker: Picker::Closed, ticket: 0 }),
        }
    }

    /// Fetch a fresh listing and open the picker on it.
    ///
    /// # Errors
    /// - `LinkError::NotConnected` unless the provider is connected
    /// - `LinkError::Cancelled` if the picker was cancelled while loading
    /// - Any gateway error from the listing
    #[instrument(skip(self))]
    pub async fn open_picker(&self) -> Result<ResourceListing> {
        let session = self.connected_session()?;

        let ticket = {
            let mut state = self.state.lock();
            state.ticket += 1;
            state.picker = Picker::Loading;
            state.ticket
        };

        let result = self.gateway.list_selectable().await;

        let mut state = self.state.lock();
        if state.ticket != ticket {
            debug!("Listing arrived after the picker was cancelled");
            return Err(LinkError::Cancelled);
        }
        if self.connection.connected_session() != Some(session) {
            debug!("Connection changed while listing");
            state.picker = Picker::Closed;
            state.ticket += 1;
            return Err(LinkError::Cancelled);
        }

        match result {
            Ok(resources) => {
                debug!(count = resources.len(), "Picker opened");
                state.picker = Picker::Open { session, resources: resources.clone() };
                Ok(ResourceListing { resources })
            }
            Err(err) => {
                warn!(error = %err, "Failed to list calendars");
                state.picker = Picker::Closed;
                Err(err)
            }
        }
    }

    /// Commit `resource` as the active selection.
    ///
    /// # Errors
    /// - `LinkError::InvalidResource` if `resource` is not in the open
    ///   listing (no backend call) or the backend rejects it; the picker
    ///   stays open in the latter case
    /// - `LinkError::NotConnected` unless the provider is connected
    #[instrument(skip(self, resource), fields(resource_id = %resource.id))]
    pub async fn choose(&self, resource: &SelectableResource) -> Result<Selection> {
        let current = self.connected_session()?;

        let ticket = {
            let mut state = self.state.lock();
            if matches!(state.picker, Picker::Open { session, .. } if session != current) {
                debug!("Discarding listing from an earlier connection");
                state.picker = Picker::Closed;
                state.ticket += 1;
            }
            match &state.picker {
                Picker::Open { resources, .. }
                    if resources.iter().any(|r| r.id == resource.id) =>
                {
                    state.ticket
                }
                Picker::Open { .. } => {
                    return Err(LinkError::InvalidResource(format!(
                        "{} is not in the current listing",
                        resource.id
                    )))
                }
                Picker::Closed | Picker::Loading => {
                    return Err(LinkError::InvalidResource(format!(
                        "no listing is open for {}",
                        resource.id
                    )))
                }
            }
        };

        self.gateway
            .commit_selection(&resource.id, &resource.display_name, resource.description.as_deref())
            .await
            .inspect_err(|err| warn!(error = %err, "Selection rejected"))?;

        let selection = Selection::from(resource);
        self.connection.record_selection(selection.clone())?;

        let mut state = self.state.lock();
        if state.ticket == ticket {
            state.picker = Picker::Closed;
            state.ticket += 1;
        }
        info!(display_name = %selection.display_name, "Calendar selected");
        Ok(selection)
    }

    /// Close the picker and drop any listing still in flight.
    pub fn cancel_picker(&self) {
        let mut state = self.state.lock();
        state.ticket += 1;
        state.picker = Picker::Closed;
    }

    /// Whether a listing from the current connected session is open.
    pub fn is_picker_open(&self) -> bool {
        let Some(current) = self.connection.connected_session() else {
            return false;
        };
        matches!(self.state.lock().picker, Picker::Open { session, .. } if session == current)
    }

    /// The committed selection, if any.
    pub fn current_selection(&self) -> Option<Selection> {
        self.connection.snapshot().selection
    }

    fn connected_session(&self) -> Result<u64> {
        self.connection.connected_session().ok_or(LinkError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bizlink_domain::{ConnectionState, Provider};

    use super::*;
    use crate::popup::{PopupSupervisor, PopupSupervisorConfig};
    use crate::testing::{resource, CallCounts, FakeGateway, FakeLauncher};

    async fn connected() -> (Arc<FakeGateway>, SelectionController) {
        let gateway = Arc::new(FakeGateway::new(Provider::Calendar).with_connected(true));
        let popup = PopupSupervisor::new(
            Provider::Calendar,
            Arc::new(FakeLauncher::new()),
            PopupSupervisorConfig::default(),
        );
        let connection = Arc::new(ConnectionController::new(gateway.clone(), popup));
        connection.refresh().await.unwrap();
        let selection = SelectionController::new(connection, gateway.clone());
        (gateway, selection)
    }

    fn main_and_overflow() -> Vec<SelectableResource> {
        vec![
            SelectableResource {
                id: "cal-1".into(),
                display_name: "Main".into(),
                description: None,
                is_primary: true,
            },
            SelectableResource {
                id: "cal-2".into(),
                display_name: "Overflow".into(),
                description: None,
                is_primary: false,
            },
        ]
    }

    #[tokio::test]
    async fn test_choose_from_listing() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));

        let listing = selection.open_picker().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.primary().map(|r| r.id.as_str()), Some("cal-1"));
        let overflow = listing.get("cal-2").cloned().unwrap();

        let chosen = selection.choose(&overflow).await.unwrap();

        assert_eq!(chosen.resource_id, "cal-2");
        assert_eq!(chosen.display_name, "Overflow");
        assert_eq!(selection.current_selection(), Some(chosen.clone()));
        assert!(!selection.is_picker_open());
        assert_eq!(gateway.committed(), vec![chosen]);
    }

    #[tokio::test]
    async fn test_choose_unknown_id_makes_no_backend_call() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));
        selection.open_picker().await.unwrap();

        let result = selection.choose(&resource("cal-9", false)).await;

        assert!(matches!(result, Err(LinkError::InvalidResource(_))));
        assert_eq!(CallCounts::get(&gateway.calls.commit), 0);
        assert!(selection.current_selection().is_none());
        assert!(selection.is_picker_open());
    }

    #[tokio::test]
    async fn test_choose_without_open_picker_is_rejected() {
        let (gateway, selection) = connected().await;

        let result = selection.choose(&resource("cal-1", true)).await;

        assert!(matches!(result, Err(LinkError::InvalidResource(_))));
        assert_eq!(CallCounts::get(&gateway.calls.commit), 0);
    }

    #[tokio::test]
    async fn test_backend_rejection_keeps_picker_open() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));
        let listing = selection.open_picker().await.unwrap();
        let main = listing.into_iter().next().unwrap();
        gateway.set_commit_result(Err(LinkError::InvalidResource("gone".into())));

        let result = selection.choose(&main).await;

        assert!(matches!(result, Err(LinkError::InvalidResource(_))));
        assert!(selection.is_picker_open());
        assert!(selection.current_selection().is_none());
    }

    #[tokio::test]
    async fn test_open_picker_requires_connection() {
        let gateway = Arc::new(FakeGateway::new(Provider::Calendar));
        let popup = PopupSupervisor::new(
            Provider::Calendar,
            Arc::new(FakeLauncher::new()),
            PopupSupervisorConfig::default(),
        );
        let connection = Arc::new(ConnectionController::new(gateway.clone(), popup));
        connection.refresh().await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        let selection = SelectionController::new(connection, gateway.clone());

        assert_eq!(selection.open_picker().await, Err(LinkError::NotConnected));
        assert_eq!(CallCounts::get(&gateway.calls.list), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_listing() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));
        gateway.set_list_delay(Duration::from_secs(2));
        let selection = Arc::new(selection);

        let picker = Arc::clone(&selection);
        let pending = tokio::spawn(async move { picker.open_picker().await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        selection.cancel_picker();

        assert_eq!(pending.await.unwrap(), Err(LinkError::Cancelled));
        assert!(!selection.is_picker_open());
    }

    #[tokio::test]
    async fn test_listing_does_not_survive_reconnect() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));
        let listing = selection.open_picker().await.unwrap();
        let main = listing.get("cal-1").cloned().unwrap();

        selection.connection.disconnect().await.unwrap();
        gateway.set_connected(true);
        selection.connection.refresh().await.unwrap();

        assert!(!selection.is_picker_open());
        let result = selection.choose(&main).await;
        assert!(matches!(result, Err(LinkError::InvalidResource(_))));
        assert_eq!(CallCounts::get(&gateway.calls.commit), 0);

        // A fresh listing is fetched and accepted.
        let listing = selection.open_picker().await.unwrap();
        assert_eq!(CallCounts::get(&gateway.calls.list), 2);
        let main = listing.get("cal-1").cloned().unwrap();
        assert_eq!(selection.choose(&main).await.unwrap().resource_id, "cal-1");
    }

    #[tokio::test]
    async fn test_refresh_while_connected_keeps_picker_open() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));
        selection.open_picker().await.unwrap();

        selection.connection.refresh().await.unwrap();

        assert!(selection.is_picker_open());
    }

    #[tokio::test]
    async fn test_disconnect_clears_selection() {
        let (gateway, selection) = connected().await;
        gateway.set_resources(Ok(main_and_overflow()));
        let listing = selection.open_picker().await.unwrap();
        let main = listing.get("cal-1").cloned().unwrap();
        selection.choose(&main).await.unwrap();

        selection.connection.disconnect().await.unwrap();

        assert!(selection.current_selection().is_none());
        assert_eq!(selection.open_picker().await, Err(LinkError::NotConnected));
    }
}
