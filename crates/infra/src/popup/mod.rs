//! Popup hosts

pub mod browser;

pub use browser::{BrowserPopupLauncher, BrowserWindow};
