//! # BizLink App
//!
//! Application layer - commands and main entry point.
//!
//! This crate contains:
//! - Commands (presentation → controllers bridge)
//! - Application context (dependency injection)
//! - Tracing setup and the `bizlink` binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Presentation layers only issue commands and render the returned views

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
