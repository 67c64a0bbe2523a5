use crate::automation::{AutomationResult, Browser, PageAutomation};
use std::ops::Deref;
use std::sync::Arc;

/// A page that is closed on every exit path
///
/// Callers run their work against the page and then call [`release`].
/// If the guard is dropped without being released (an early `?`, a
/// panic, or a cancelled future) the close is handed to the runtime.
///
/// [`release`]: ScopedPage::release
pub struct ScopedPage {
    page: Arc<dyn PageAutomation>,
    task: &'static str,
    released: bool,
}

impl ScopedPage {
    /// Opens a fresh page for `task`
    pub async fn open(browser: &dyn Browser, task: &'static str) -> AutomationResult<Self> {
        let page = browser.new_page().await?;
        tracing::trace!(task, "page opened");
        Ok(Self::new(page, task))
    }

    pub fn new(page: Arc<dyn PageAutomation>, task: &'static str) -> Self {
        Self {
            page,
            task,
            released: false,
        }
    }

    /// Closes the page, logging rather than returning a close failure
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.page.close().await {
            tracing::warn!(task = self.task, error = %e, "failed to close page");
        } else {
            tracing::trace!(task = self.task, "page closed");
        }
    }
}

impl Deref for ScopedPage {
    type Target = dyn PageAutomation;

    fn deref(&self) -> &Self::Target {
        &*self.page
    }
}

impl Drop for ScopedPage {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let page = Arc::clone(&self.page);
        let task = self.task;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::warn!(task, error = %e, "failed to close abandoned page");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(task, "page abandoned outside a runtime; left open");
            }
        }
    }
}
