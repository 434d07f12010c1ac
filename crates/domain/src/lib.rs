//! # BizLink Domain
//!
//! Business domain types for linking dashboard accounts to third-party
//! providers.
//!
//! This crate contains:
//! - Provider, connection and selection types
//! - The `LinkError` taxonomy and Result alias
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other BizLink crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
