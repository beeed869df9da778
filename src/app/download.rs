//! User-triggered download of the previewed document.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{DownloadLauncher, ResourceLocator};

/// Builds the download-flagged href and hands it to a launcher
#[derive(Clone)]
pub struct DownloadTrigger {
    launcher: Arc<dyn DownloadLauncher>,
}

impl DownloadTrigger {
    pub fn new(launcher: Arc<dyn DownloadLauncher>) -> Self {
        Self { launcher }
    }

    /// Launch a download. No-op returning `false` without a locator.
    pub fn trigger(&self, locator: Option<&ResourceLocator>) -> bool {
        let Some(locator) = locator else {
            debug!("Download requested without a resource locator, ignoring");
            return false;
        };

        let href = locator.download_href();
        if locator.is_inline() {
            info!("Launching download of inline document");
        } else {
            info!(href = %href, "Launching document download");
        }
        self.launcher.launch(&href);
        true
    }
}
