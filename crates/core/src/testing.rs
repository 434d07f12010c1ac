//! In-memory gateways and popup hosts for tests.
//!
//! Available to downstream crates through the `test-utils` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bizlink_domain::{LinkError, Provider, Result, SelectableResource, Selection};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::ports::{
    AuthorizationRequest, CalendarGateway, ConnectionDetail, PopupFeatures, PopupLauncher,
    PopupWindow, ProviderGateway, StatusReport,
};

/// Call counters for a [`FakeGateway`].
#[derive(Debug, Default)]
pub struct CallCounts {
    pub initiate: AtomicUsize,
    pub status: AtomicUsize,
    pub disconnect: AtomicUsize,
    pub detail: AtomicUsize,
    pub list: AtomicUsize,
    pub commit: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Scripted gateway. Status results are consumed in order; once the queue is
/// empty the fallback report is returned.
pub struct FakeGateway {
    provider: Provider,
    pub calls: CallCounts,
    initiate_result: Mutex<Result<AuthorizationRequest>>,
    status_queue: Mutex<VecDeque<Result<StatusReport>>>,
    status_fallback: Mutex<StatusReport>,
    status_delay: Mutex<Duration>,
    disconnect_result: Mutex<Result<()>>,
    detail_result: Mutex<Result<ConnectionDetail>>,
    resources: Mutex<Result<Vec<SelectableResource>>>,
    list_delay: Mutex<Duration>,
    commit_result: Mutex<Result<()>>,
    committed: Mutex<Vec<Selection>>,
}

impl FakeGateway {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            calls: CallCounts::default(),
            initiate_result: Mutex::new(Ok(AuthorizationRequest {
                authorization_url: format!("https://auth.example.com/{}", provider.slug()),
            })),
            status_queue: Mutex::new(VecDeque::new()),
            status_fallback: Mutex::new(StatusReport::disconnected()),
            status_delay: Mutex::new(Duration::ZERO),
            disconnect_result: Mutex::new(Ok(())),
            detail_result: Mutex::new(Ok(ConnectionDetail::default())),
            resources: Mutex::new(Ok(Vec::new())),
            list_delay: Mutex::new(Duration::ZERO),
            commit_result: Mutex::new(Ok(())),
            committed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_connected(self, connected: bool) -> Self {
        self.set_connected(connected);
        self
    }

    pub fn set_connected(&self, connected: bool) {
        *self.status_fallback.lock() = StatusReport { connected, ..StatusReport::default() };
    }

    pub fn push_status(&self, result: Result<StatusReport>) {
        self.status_queue.lock().push_back(result);
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock() = delay;
    }

    pub fn set_initiate_result(&self, result: Result<AuthorizationRequest>) {
        *self.initiate_result.lock() = result;
    }

    pub fn set_disconnect_result(&self, result: Result<()>) {
        *self.disconnect_result.lock() = result;
    }

    pub fn set_detail_result(&self, result: Result<ConnectionDetail>) {
        *self.detail_result.lock() = result;
    }

    pub fn set_resources(&self, result: Result<Vec<SelectableResource>>) {
        *self.resources.lock() = result;
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock() = delay;
    }

    pub fn set_commit_result(&self, result: Result<()>) {
        *self.commit_result.lock() = result;
    }

    /// Selections the backend accepted, in order.
    pub fn committed(&self) -> Vec<Selection> {
        self.committed.lock().clone()
    }
}

#[async_trait]
impl ProviderGateway for FakeGateway {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn initiate(&self) -> Result<AuthorizationRequest> {
        self.calls.initiate.fetch_add(1, Ordering::SeqCst);
        self.initiate_result.lock().clone()
    }

    async fn query_status(&self) -> Result<StatusReport> {
        self.calls.status.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let queued = self.status_queue.lock().pop_front();
        queued.unwrap_or_else(|| Ok(self.status_fallback.lock().clone()))
    }

    async fn disconnect(&self) -> Result<()> {
        self.calls.disconnect.fetch_add(1, Ordering::SeqCst);
        let result = self.disconnect_result.lock().clone();
        if result.is_ok() {
            self.set_connected(false);
        }
        result
    }

    async fn fetch_detail(&self, _report: &StatusReport) -> Result<ConnectionDetail> {
        self.calls.detail.fetch_add(1, Ordering::SeqCst);
        self.detail_result.lock().clone()
    }
}

#[async_trait]
impl CalendarGateway for FakeGateway {
    async fn list_selectable(&self) -> Result<Vec<SelectableResource>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.resources.lock().clone()
    }

    async fn commit_selection(
        &self,
        resource_id: &str,
        display_name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        self.calls.commit.fetch_add(1, Ordering::SeqCst);
        let result = self.commit_result.lock().clone();
        if result.is_ok() {
            self.committed.lock().push(Selection {
                resource_id: resource_id.to_string(),
                display_name: display_name.to_string(),
                description: description.map(str::to_string),
            });
        }
        result
    }

    async fn current_selection(&self) -> Result<Option<Selection>> {
        Ok(self.committed.lock().last().cloned())
    }
}

/// Shared view of a [`FakeWindow`].
#[derive(Debug, Clone, Default)]
pub struct WindowHandle {
    closed: Arc<AtomicBool>,
    closed_by_host: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl WindowHandle {
    /// Simulate the user (or the provider's last page) closing the window.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the supervisor closed the window itself.
    pub fn closed_by_host(&self) -> bool {
        self.closed_by_host.load(Ordering::SeqCst)
    }

    /// Whether the supervisor released the window.
    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

/// Window that reports closed after `close_after` or when its handle says so.
pub struct FakeWindow {
    handle: WindowHandle,
    opened_at: Instant,
    close_after: Option<Duration>,
}

impl PopupWindow for FakeWindow {
    fn is_closed(&mut self) -> bool {
        if self.handle.closed.load(Ordering::SeqCst) {
            return true;
        }
        self.close_after.is_some_and(|after| self.opened_at.elapsed() >= after)
    }

    fn close(&mut self) {
        self.handle.closed_by_host.store(true, Ordering::SeqCst);
        self.handle.closed.store(true, Ordering::SeqCst);
    }
}

impl Drop for FakeWindow {
    fn drop(&mut self) {
        self.handle.dropped.store(true, Ordering::SeqCst);
    }
}

/// Popup host that records opened URLs and hands out [`FakeWindow`]s.
#[derive(Default)]
pub struct FakeLauncher {
    blocked: AtomicBool,
    close_after: Mutex<Option<Duration>>,
    opened: Mutex<Vec<(String, PopupFeatures)>>,
    windows: Mutex<Vec<WindowHandle>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Windows opened from now on close by themselves after `after`.
    pub fn closing_after(self, after: Duration) -> Self {
        *self.close_after.lock() = Some(after);
        self
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn last_features(&self) -> Option<PopupFeatures> {
        self.opened.lock().last().map(|(_, features)| features.clone())
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn last_window(&self) -> Option<WindowHandle> {
        self.windows.lock().last().cloned()
    }
}

impl PopupLauncher for FakeLauncher {
    fn open(&self, url: &str, features: &PopupFeatures) -> Result<Box<dyn PopupWindow>> {
        if self.blocked.load(Ordering::SeqCst) {
            return Err(LinkError::PopupBlocked("window creation refused".into()));
        }
        let handle = WindowHandle::default();
        self.opened.lock().push((url.to_string(), features.clone()));
        self.windows.lock().push(handle.clone());
        Ok(Box::new(FakeWindow {
            handle,
            opened_at: Instant::now(),
            close_after: *self.close_after.lock(),
        }))
    }
}

/// Resource with the given id, named after it.
pub fn resource(id: &str, is_primary: bool) -> SelectableResource {
    SelectableResource {
        id: id.to_string(),
        display_name: format!("Calendar {id}"),
        description: None,
        is_primary,
    }
}
