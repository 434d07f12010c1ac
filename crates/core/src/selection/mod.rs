//! Sub-resource selection within an established connection

pub mod controller;

pub use controller::{ResourceListing, SelectionController};
