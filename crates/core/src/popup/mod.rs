//! Authorization popup supervision

pub mod supervisor;

pub use supervisor::{PopupCompletion, PopupPhase, PopupSupervisor, PopupSupervisorConfig};
