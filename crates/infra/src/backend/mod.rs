//! Dashboard backend access
//!
//! The backend holds provider credentials and performs every OAuth exchange;
//! this module only talks to it over authenticated JSON HTTP.

pub mod auth;
pub mod client;
pub mod errors;

pub use auth::{
    token_provider, AccessTokenProvider, EnvTokenProvider, KeychainTokenProvider,
    StaticTokenProvider,
};
pub use client::BackendClient;
pub use errors::BackendError;
