//! Per-provider connection controller
//!
//! Owns the provider's `ConnectionSnapshot` and is its only writer. Every
//! operation is check-and-set under a short-held lock, so a racing call is
//! rejected rather than queued. Each transition bumps an epoch; async work
//! records the epoch it started from and its result is dropped if another
//! transition happened in between.

use std::sync::Arc;

use bizlink_domain::constants::EVENT_CHANNEL_CAPACITY;
use bizlink_domain::{
    ConnectionEvent, ConnectionSnapshot, ConnectionState, ConnectionStatus, ConnectionWarning,
    LinkError, Provider, Result, Selection,
};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::popup::{PopupPhase, PopupSupervisor};
use crate::ports::ProviderGateway;

struct ControllerState {
    snapshot: ConnectionSnapshot,
    epoch: u64,
    /// Bumped on every entry into `Connected`.
    session: u64,
}

/// Drives one provider through Unknown / Disconnected / Connecting /
/// Connected / Disconnecting.
pub struct ConnectionController {
    provider: Provider,
    gateway: Arc<dyn ProviderGateway>,
    popup: PopupSupervisor,
    state: Mutex<ControllerState>,
    snapshot_tx: watch::Sender<ConnectionSnapshot>,
    events_tx: broadcast::Sender<ConnectionEvent>,
}

impl ConnectionController {
    /// Controller for the gateway's provider, starting in `Unknown`.
    pub fn new(gateway: Arc<dyn ProviderGateway>, popup: PopupSupervisor) -> Self {
        let provider = gateway.provider();
        let initial = ConnectionSnapshot::unknown(provider);
        let (snapshot_tx, _) = watch::channel(initial.clone());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            provider,
            gateway,
            popup,
            state: Mutex::new(ControllerState { snapshot: initial, epoch: 0, session: 0 }),
            snapshot_tx,
            events_tx,
        }
    }

    /// Provider this controller drives.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.lock().snapshot.state()
    }

    /// Latest snapshot plus change notifications.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Transition, popup and warning events. Lagging receivers miss events.
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events_tx.subscribe()
    }

    /// Phase of this provider's popup supervisor.
    pub fn popup_phase(&self) -> PopupPhase {
        self.popup.phase()
    }

    /// Re-query the backend and publish the authoritative state.
    ///
    /// # Errors
    /// - `LinkError::OperationInProgress` while connecting or disconnecting
    /// - Any gateway error from the status query; the state becomes `Unknown`
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn refresh(&self) -> Result<ConnectionSnapshot> {
        let epoch = {
            let state = self.state.lock();
            if state.snapshot.state().is_transitional() {
                return Err(LinkError::OperationInProgress);
            }
            state.epoch
        };

        match self.load_snapshot().await {
            Ok(snapshot) => Ok(self.apply_if_current(epoch, snapshot)),
            Err(err) => {
                warn!(error = %err, "Status query failed");
                self.apply_if_current(epoch, ConnectionSnapshot::unknown(self.provider));
                Err(err)
            }
        }
    }

    /// Run the full authorization flow.
    ///
    /// The status re-query after the popup closes is authoritative: a closed
    /// popup with no backend link ends in `Disconnected` without an error.
    /// An attempt never leaves the controller in `Unknown`.
    ///
    /// # Errors
    /// - `LinkError::AlreadyConnected` / `LinkError::OperationInProgress`
    /// - `GatewayUnavailable` or `PopupBlocked` from the attempt itself
    /// - Any gateway error from the status re-query; the state becomes
    ///   `Disconnected`
    #[instrument(skip(self), fields(provider = %self.provider, attempt_id = %Uuid::now_v7()))]
    pub async fn connect(&self) -> Result<ConnectionSnapshot> {
        let epoch = {
            let mut state = self.state.lock();
            match state.snapshot.state() {
                ConnectionState::Connected => return Err(LinkError::AlreadyConnected),
                ConnectionState::Connecting | ConnectionState::Disconnecting => {
                    return Err(LinkError::OperationInProgress)
                }
                ConnectionState::Unknown | ConnectionState::Disconnected => {}
            }
            self.transition(&mut state, self.bare(ConnectionState::Connecting));
            state.epoch
        };

        // Reverts to Disconnected on every early return and on abandonment.
        let _revert = TransitionGuard { controller: self, epoch };

        let request = self.gateway.initiate().await.inspect_err(|err| {
            warn!(error = %err, "Failed to initiate authorization");
        })?;

        let completion = self.popup.open(&request.authorization_url)?;
        self.emit(ConnectionEvent::PopupOpened { provider: self.provider });

        let outcome = completion.wait().await?;
        self.emit(ConnectionEvent::PopupClosed { provider: self.provider, outcome });
        debug!(?outcome, "Popup finished; querying status");

        match self.load_snapshot().await {
            Ok(snapshot) => {
                let snapshot = self.apply_if_current(epoch, snapshot);
                if snapshot.status.is_connected() {
                    info!("Provider connected");
                } else {
                    info!("Popup closed without a backend link");
                }
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "Status query after popup failed");
                self.apply_if_current(epoch, self.bare(ConnectionState::Disconnected));
                Err(err)
            }
        }
    }

    /// Revoke the link. The local state is cleared whatever the backend says.
    ///
    /// # Errors
    /// - `LinkError::OperationInProgress` while connecting or disconnecting
    /// - Transport or authorization failures, reported after the local clear
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn disconnect(&self) -> Result<ConnectionSnapshot> {
        let epoch = {
            let mut state = self.state.lock();
            if state.snapshot.state().is_transitional() {
                return Err(LinkError::OperationInProgress);
            }
            self.transition(&mut state, self.bare(ConnectionState::Disconnecting));
            state.epoch
        };
        let _revert = TransitionGuard { controller: self, epoch };

        let result = self.gateway.disconnect().await;
        let snapshot = self.apply_if_current(epoch, self.bare(ConnectionState::Disconnected));

        match result {
            Ok(()) => {
                info!("Provider disconnected");
                Ok(snapshot)
            }
            Err(LinkError::NotConnected | LinkError::InvalidResource(_)) => {
                debug!("Link already gone upstream");
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "Backend disconnect failed; local state cleared");
                Err(err)
            }
        }
    }

    /// Identifies the current stretch of `Connected`, or `None` when not
    /// connected. Leaving and re-entering `Connected` yields a new value.
    pub(crate) fn connected_session(&self) -> Option<u64> {
        let state = self.state.lock();
        state.snapshot.status.is_connected().then_some(state.session)
    }

    /// Record a committed selection. Only valid while connected.
    pub(crate) fn record_selection(&self, selection: Selection) -> Result<ConnectionSnapshot> {
        let mut state = self.state.lock();
        if !state.snapshot.status.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let next = ConnectionSnapshot { selection: Some(selection), ..state.snapshot.clone() };
        self.transition(&mut state, next);
        Ok(state.snapshot.clone())
    }

    async fn load_snapshot(&self) -> Result<ConnectionSnapshot> {
        let report = self.gateway.query_status().await?;
        if !report.connected {
            return Ok(self.bare(ConnectionState::Disconnected));
        }

        match self.gateway.fetch_detail(&report).await {
            Ok(detail) => Ok(ConnectionSnapshot {
                status: ConnectionStatus::connected(self.provider, detail.account),
                selection: detail.selection,
                warning: None,
            }),
            Err(err) => Ok(ConnectionSnapshot {
                status: ConnectionStatus::connected(self.provider, None),
                selection: None,
                warning: Some(ConnectionWarning::DetailFetch {
                    provider: self.provider,
                    message: err.to_string(),
                }),
            }),
        }
    }

    fn bare(&self, state: ConnectionState) -> ConnectionSnapshot {
        ConnectionSnapshot {
            status: ConnectionStatus::new(self.provider, state),
            selection: None,
            warning: None,
        }
    }

    /// Publish `next` unless another transition happened since `epoch`.
    /// Returns whatever snapshot is current afterwards.
    fn apply_if_current(&self, epoch: u64, next: ConnectionSnapshot) -> ConnectionSnapshot {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!(provider = %self.provider, "Discarding stale result");
            return state.snapshot.clone();
        }
        self.transition(&mut state, next);
        state.snapshot.clone()
    }

    fn transition(&self, state: &mut ControllerState, next: ConnectionSnapshot) {
        let from = state.snapshot.state();
        let to = next.state();
        let selection_changed = state.snapshot.selection != next.selection;

        state.snapshot = next;
        state.epoch += 1;
        if to == ConnectionState::Connected && from != ConnectionState::Connected {
            state.session += 1;
        }
        self.snapshot_tx.send_replace(state.snapshot.clone());

        if from != to {
            debug!(provider = %self.provider, from = %from, to = %to, "State changed");
            self.emit(ConnectionEvent::StateChanged { provider: self.provider, from, to });
        }
        if selection_changed {
            self.emit(ConnectionEvent::SelectionChanged {
                provider: self.provider,
                selection: state.snapshot.selection.clone(),
            });
        }
        if let Some(warning) = &state.snapshot.warning {
            warn!(provider = %self.provider, %warning, "Connection detail unavailable");
            self.emit(ConnectionEvent::Warning(warning.clone()));
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        // No receivers is fine.
        let _ = self.events_tx.send(event);
    }
}

/// Sets `Disconnected` on drop unless the controller moved past `epoch`.
struct TransitionGuard<'a> {
    controller: &'a ConnectionController,
    epoch: u64,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        let controller = self.controller;
        let mut state = controller.state.lock();
        if state.epoch == self.epoch {
            debug!(provider = %controller.provider, "Operation ended early; reverting");
            controller.transition(&mut state, controller.bare(ConnectionState::Disconnected));
        }
    }
}
