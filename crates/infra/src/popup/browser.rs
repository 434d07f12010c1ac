//! Browser process as popup window
//!
//! Each popup is a dedicated browser process in app mode. The window counts
//! as closed once the process has exited.

use std::process::Stdio;

use bizlink_core::{PopupFeatures, PopupLauncher, PopupWindow};
use bizlink_domain::{BrowserConfig, LinkError, Result};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Launches popups through a configurable browser command.
#[derive(Debug, Clone)]
pub struct BrowserPopupLauncher {
    config: BrowserConfig,
}

impl BrowserPopupLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn render_args(&self, url: &str, features: &PopupFeatures) -> Vec<String> {
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{url}", url)
                    .replace("{width}", &features.width.to_string())
                    .replace("{height}", &features.height.to_string())
            })
            .collect()
    }
}

impl PopupLauncher for BrowserPopupLauncher {
    fn open(&self, url: &str, features: &PopupFeatures) -> Result<Box<dyn PopupWindow>> {
        let args = self.render_args(url, features);
        debug!(command = %self.config.command, name = %features.name, "Launching popup browser");

        let child = Command::new(&self.config.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                LinkError::PopupBlocked(format!("failed to launch {}: {e}", self.config.command))
            })?;

        Ok(Box::new(BrowserWindow { child, exited: false }))
    }
}

/// Running browser process backing one popup.
pub struct BrowserWindow {
    child: Child,
    exited: bool,
}

impl PopupWindow for BrowserWindow {
    fn is_closed(&mut self) -> bool {
        if self.exited {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "Popup browser exited");
                self.exited = true;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "Cannot observe popup browser; treating as closed");
                self.exited = true;
            }
        }
        self.exited
    }

    fn close(&mut self) {
        if self.exited {
            return;
        }
        if let Err(err) = self.child.start_kill() {
            warn!(error = %err, "Failed to close popup browser");
        }
    }
}
