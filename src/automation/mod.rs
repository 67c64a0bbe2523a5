//! Browser automation boundary
//!
//! This module contains everything the orchestration layer needs from a
//! browser:
//! - The `PageAutomation` / `Browser` / `BrowserLauncher` traits
//! - `ScopedPage`, a page guard that always closes its page
//! - Site selectors and extraction scripts
//! - A Chromium driver behind the `chromium` feature

#[cfg(feature = "chromium")]
mod chromium;
mod scoped;
pub mod selectors;
mod traits;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumLauncher;
pub use scoped::ScopedPage;
pub use traits::{
    AutomationError, AutomationResult, Browser, BrowserLauncher, ElementHandle, PageAutomation,
};

use crate::config::Settings;
use std::sync::Arc;

/// Returns the launcher of the driver compiled into this build
#[cfg(feature = "chromium")]
pub fn default_launcher(settings: &Settings) -> crate::Result<Arc<dyn BrowserLauncher>> {
    Ok(Arc::new(ChromiumLauncher::new(settings.headless)))
}

/// Returns the launcher of the driver compiled into this build
#[cfg(not(feature = "chromium"))]
pub fn default_launcher(_settings: &Settings) -> crate::Result<Arc<dyn BrowserLauncher>> {
    Err(crate::LinkreachError::Resource {
        stage: "launch".to_string(),
        message: "no browser driver compiled in; rebuild with `--features chromium`".to_string(),
    })
}
