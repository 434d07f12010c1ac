//! # BizLink Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client with retry support
//! - Backend client, token providers and provider gateways
//! - Browser-process popup launcher
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `bizlink-core`
//! - Contains all "impure" code (network, processes, keychain)

pub mod backend;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod popup;

// Re-export commonly used items
pub use backend::{token_provider, AccessTokenProvider, BackendClient, BackendError};
pub use errors::InfraError;
pub use gateway::{CalendarBackendGateway, PaymentBackendGateway};
pub use http::{HttpClient, HttpClientBuilder};
pub use popup::BrowserPopupLauncher;
