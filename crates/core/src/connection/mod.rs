//! Connection lifecycle state machine

pub mod controller;

pub use controller::ConnectionController;
