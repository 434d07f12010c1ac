//! Domain types and models

pub mod account;
pub mod connection;
pub mod provider;
pub mod selection;

pub use account::{PaymentAccount, ProviderAccount};
pub use connection::{
    ConnectionEvent, ConnectionSnapshot, ConnectionState, ConnectionStatus, PopupOutcome,
};
pub use provider::Provider;
pub use selection::{SelectableResource, Selection};
