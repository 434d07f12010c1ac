//! Popup supervision
//!
//! Opens one authorization window per provider, polls it until it closes and
//! reports the outcome after a settle delay so the backend has finished its
//! callback processing before anyone asks for status.

use std::sync::Arc;
use std::time::Duration;

use bizlink_domain::{LinkError, PopupConfig, PopupOutcome, Provider, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::ports::{PopupFeatures, PopupLauncher, PopupWindow};

/// Lifecycle of a single popup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPhase {
    Idle,
    Opening,
    Open,
    Closed,
    OpenFailed,
}

impl PopupPhase {
    fn is_in_flight(self) -> bool {
        matches!(self, Self::Opening | Self::Open)
    }
}

/// Phase of the most recent attempt. Writers that hold an older `attempt`
/// leave it alone.
#[derive(Debug)]
struct PhaseCell {
    phase: PopupPhase,
    attempt: u64,
}

type SharedPhase = Arc<Mutex<PhaseCell>>;

fn set_phase(cell: &Mutex<PhaseCell>, attempt: u64, phase: PopupPhase) {
    let mut cell = cell.lock();
    if cell.attempt == attempt {
        cell.phase = phase;
    }
}

/// Timing and geometry for supervised popups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSupervisorConfig {
    /// How often the window is checked for closure
    pub poll_interval: Duration,
    /// Wait after closure before the outcome is reported
    pub settle_delay: Duration,
    /// Close the window after this long; `None` waits indefinitely
    pub max_wait: Option<Duration>,
    pub width: u32,
    pub height: u32,
}

impl Default for PopupSupervisorConfig {
    fn default() -> Self {
        Self::from(&PopupConfig::default())
    }
}

impl From<&PopupConfig> for PopupSupervisorConfig {
    fn from(config: &PopupConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            settle_delay: config.settle_delay(),
            max_wait: config.max_wait(),
            width: config.width,
            height: config.height,
        }
    }
}

/// Pending result of an open popup.
///
/// Dropping the completion abandons the attempt: the supervisor is free for
/// a new popup at once, polling stops, the window handle is released and no
/// outcome is ever produced.
#[must_use = "dropping a PopupCompletion abandons the popup"]
pub struct PopupCompletion {
    outcome: oneshot::Receiver<PopupOutcome>,
    phase: SharedPhase,
    attempt: u64,
    _abandon: DropGuard,
}

impl PopupCompletion {
    /// Wait until the window has closed and the settle delay has elapsed.
    ///
    /// # Errors
    /// Returns `LinkError::Cancelled` if supervision stopped without an
    /// outcome.
    pub async fn wait(mut self) -> Result<PopupOutcome> {
        (&mut self.outcome).await.map_err(|_| LinkError::Cancelled)
    }
}

impl Drop for PopupCompletion {
    fn drop(&mut self) {
        let mut cell = self.phase.lock();
        if cell.attempt == self.attempt && cell.phase.is_in_flight() {
            cell.phase = PopupPhase::Closed;
        }
    }
}

/// Per-provider popup supervisor.
pub struct PopupSupervisor {
    provider: Provider,
    launcher: Arc<dyn PopupLauncher>,
    config: PopupSupervisorConfig,
    phase: SharedPhase,
}

impl PopupSupervisor {
    /// Idle supervisor opening windows through `launcher`.
    pub fn new(
        provider: Provider,
        launcher: Arc<dyn PopupLauncher>,
        config: PopupSupervisorConfig,
    ) -> Self {
        let phase = PhaseCell { phase: PopupPhase::Idle, attempt: 0 };
        Self { provider, launcher, config, phase: Arc::new(Mutex::new(phase)) }
    }

    /// Provider whose popups this supervisor opens.
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Phase of the latest attempt.
    pub fn phase(&self) -> PopupPhase {
        self.phase.lock().phase
    }

    /// Open `url` and start supervising the window.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - `LinkError::AlreadyInFlight` while a popup for this provider is open
    /// - `LinkError::PopupBlocked` when the host refused to create a window
    pub fn open(&self, url: &str) -> Result<PopupCompletion> {
        let attempt = {
            let mut cell = self.phase.lock();
            if cell.phase.is_in_flight() {
                return Err(LinkError::AlreadyInFlight);
            }
            cell.attempt += 1;
            cell.phase = PopupPhase::Opening;
            cell.attempt
        };

        let features = PopupFeatures {
            name: format!("{}-oauth", self.provider.slug()),
            width: self.config.width,
            height: self.config.height,
        };

        let window = match self.launcher.open(url, &features) {
            Ok(window) => window,
            Err(err) => {
                set_phase(&self.phase, attempt, PopupPhase::OpenFailed);
                warn!(provider = %self.provider, error = %err, "Popup could not be opened");
                return Err(match err {
                    LinkError::PopupBlocked(reason) => LinkError::PopupBlocked(reason),
                    other => LinkError::PopupBlocked(other.to_string()),
                });
            }
        };

        set_phase(&self.phase, attempt, PopupPhase::Open);
        info!(provider = %self.provider, "Authorization popup opened");

        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let task = SupervisionTask {
            provider: self.provider,
            config: self.config.clone(),
            phase: Arc::clone(&self.phase),
            attempt,
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run(window, tx));

        Ok(PopupCompletion {
            outcome: rx,
            phase: Arc::clone(&self.phase),
            attempt,
            _abandon: cancel.drop_guard(),
        })
    }
}

struct SupervisionTask {
    provider: Provider,
    config: PopupSupervisorConfig,
    phase: SharedPhase,
    attempt: u64,
    cancel: CancellationToken,
}

impl SupervisionTask {
    async fn run(self, mut window: Box<dyn PopupWindow>, tx: oneshot::Sender<PopupOutcome>) {
        let started = Instant::now();

        let outcome = loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!(provider = %self.provider, "Popup supervision abandoned");
                    return;
                }
                () = tokio::time::sleep(self.config.poll_interval) => {
                    if window.is_closed() {
                        break PopupOutcome::Closed;
                    }
                    if self.config.max_wait.is_some_and(|max| started.elapsed() >= max) {
                        window.close();
                        break PopupOutcome::TimedOut;
                    }
                }
            }
        };

        drop(window);
        set_phase(&self.phase, self.attempt, PopupPhase::Closed);
        debug!(provider = %self.provider, ?outcome, "Popup closed; settling");

        tokio::select! {
            () = self.cancel.cancelled() => {
                debug!(provider = %self.provider, "Popup abandoned during settle delay");
            }
            () = tokio::time::sleep(self.config.settle_delay) => {
                // Receiver may already be gone; nothing left to notify.
                let _ = tx.send(outcome);
            }
        }
    }
}
