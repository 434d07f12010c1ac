//! # BizLink Core
//!
//! Provider connection lifecycle - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for backend gateways and popup windows
//! - The popup supervisor
//! - Connection and selection state machines
//!
//! ## Architecture Principles
//! - Only depends on `bizlink-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Controllers are the only writers of connection state

pub mod connection;
pub mod popup;
pub mod ports;
pub mod selection;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use connection::ConnectionController;
pub use popup::{PopupCompletion, PopupPhase, PopupSupervisor, PopupSupervisorConfig};
pub use ports::{
    AuthorizationRequest, CalendarGateway, ConnectionDetail, PopupFeatures, PopupLauncher,
    PopupWindow, ProviderGateway, StatusReport,
};
pub use selection::{ResourceListing, SelectionController};
