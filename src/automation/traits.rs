//! Driver-facing traits and error types
//!
//! The orchestration layer only ever talks to a browser through these
//! traits. A concrete driver (see the `chromium` feature) or a scripted
//! test double implements them.

use crate::session::SessionArtifact;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a page-automation driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("element handle {0} is no longer attached")]
    StaleElement(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),

    #[error("browser resource error: {0}")]
    Resource(String),
}

impl AutomationError {
    /// Page or browser could not be created or closed
    pub fn is_resource(&self) -> bool {
        matches!(self, Self::Resource(_))
    }

    /// A UI element that should be there is not
    pub fn is_missing_element(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. } | Self::Timeout { .. } | Self::StaleElement(_)
        )
    }
}

/// Result type for driver operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Opaque reference to an element located on a page
///
/// Drivers choose the id; it is only meaningful to the page that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One isolated page (tab) inside a browser
#[async_trait]
pub trait PageAutomation: Send + Sync {
    /// Navigates to `url` and waits for the load to settle
    async fn navigate(&self, url: &str) -> AutomationResult<()>;

    /// Finds the first element matching `selector`, if any
    async fn locate(&self, selector: &str) -> AutomationResult<Option<ElementHandle>>;

    /// Visible text of an element
    async fn read_text(&self, element: &ElementHandle) -> AutomationResult<String>;

    async fn click(&self, element: &ElementHandle) -> AutomationResult<()>;

    /// Types `text` into an element as keyboard input
    async fn type_text(&self, element: &ElementHandle, text: &str) -> AutomationResult<()>;

    async fn current_url(&self) -> AutomationResult<String>;

    /// Waits until `selector` matches, failing with `Timeout` after `timeout`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> AutomationResult<ElementHandle>;

    /// Waits for the navigation triggered by the previous interaction
    async fn wait_for_navigation(&self, timeout: Duration) -> AutomationResult<()>;

    /// Evaluates a script in the page and returns its JSON result
    async fn evaluate(&self, script: &str) -> AutomationResult<serde_json::Value>;

    /// Captures the page's authentication cookies
    async fn cookies(&self) -> AutomationResult<SessionArtifact>;

    /// Installs previously captured cookies
    async fn set_cookies(&self, artifact: &SessionArtifact) -> AutomationResult<()>;

    /// Drops every cookie of the browsing context
    async fn clear_cookies(&self) -> AutomationResult<()>;

    async fn close(&self) -> AutomationResult<()>;
}

/// A running browser that hands out isolated pages
#[async_trait]
pub trait Browser: Send + Sync {
    async fn new_page(&self) -> AutomationResult<Arc<dyn PageAutomation>>;

    async fn close(&self) -> AutomationResult<()>;
}

/// Starts a browser on first use
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> AutomationResult<Arc<dyn Browser>>;
}
