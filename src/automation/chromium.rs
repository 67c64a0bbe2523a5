//! Chromium DevTools driver
//!
//! Implements the automation traits on top of `chromiumoxide`. Element
//! handles are kept in a per-page table keyed by a generated id.

use crate::automation::{
    AutomationError, AutomationResult, Browser, BrowserLauncher, ElementHandle, PageAutomation,
};
use crate::session::SessionArtifact;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{ClearBrowserCookiesParams, CookieParam};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser as CdpBrowser, BrowserConfig, Page};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Interval between two element lookups while waiting for a selector
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Launches a local Chromium through the DevTools protocol
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
}

impl ChromiumLauncher {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> AutomationResult<Arc<dyn Browser>> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(AutomationError::Resource)?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| AutomationError::Resource(format!("failed to launch browser: {}", e)))?;

        // the handler must be polled for the connection to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "devtools handler event error");
                }
            }
        });

        tracing::info!(headless = self.headless, "browser launched");
        Ok(Arc::new(ChromiumBrowser {
            browser: Mutex::new(browser),
            handler_task,
        }))
    }
}

struct ChromiumBrowser {
    browser: Mutex<CdpBrowser>,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_page(&self) -> AutomationResult<Arc<dyn PageAutomation>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| AutomationError::Resource(format!("failed to open page: {}", e)))?;
        Ok(Arc::new(ChromiumPage::new(page)))
    }

    async fn close(&self) -> AutomationResult<()> {
        let mut browser = self.browser.lock().await;
        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| AutomationError::Resource(format!("failed to close browser: {}", e)));
        self.handler_task.abort();
        result
    }
}

struct ChromiumPage {
    page: Page,
    elements: Mutex<HashMap<String, Element>>,
    next_id: AtomicU64,
}

impl ChromiumPage {
    fn new(page: Page) -> Self {
        Self {
            page,
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    async fn register(&self, element: Element) -> ElementHandle {
        let id = format!("el-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.elements.lock().await.insert(id.clone(), element);
        ElementHandle::new(id)
    }
}

fn protocol(e: impl std::fmt::Display) -> AutomationError {
    AutomationError::Protocol(e.to_string())
}

#[async_trait]
impl PageAutomation for ChromiumPage {
    async fn navigate(&self, url: &str) -> AutomationResult<()> {
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| AutomationError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn locate(&self, selector: &str) -> AutomationResult<Option<ElementHandle>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(self.register(element).await)),
            Err(_) => Ok(None),
        }
    }

    async fn read_text(&self, element: &ElementHandle) -> AutomationResult<String> {
        let elements = self.elements.lock().await;
        let node = elements
            .get(element.id())
            .ok_or_else(|| AutomationError::StaleElement(element.id().to_string()))?;
        let text = node.inner_text().await.map_err(protocol)?;
        Ok(text.unwrap_or_default())
    }

    async fn click(&self, element: &ElementHandle) -> AutomationResult<()> {
        let elements = self.elements.lock().await;
        let node = elements
            .get(element.id())
            .ok_or_else(|| AutomationError::StaleElement(element.id().to_string()))?;
        node.click().await.map(|_| ()).map_err(protocol)
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> AutomationResult<()> {
        let elements = self.elements.lock().await;
        let node = elements
            .get(element.id())
            .ok_or_else(|| AutomationError::StaleElement(element.id().to_string()))?;
        node.click().await.map_err(protocol)?;
        node.type_str(text).await.map(|_| ()).map_err(protocol)
    }

    async fn current_url(&self) -> AutomationResult<String> {
        let url = self.page.url().await.map_err(protocol)?;
        Ok(url.unwrap_or_default())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> AutomationResult<ElementHandle> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(self.register(element).await);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AutomationError::Timeout {
                    what: selector.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> AutomationResult<()> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AutomationError::Navigation {
                url: self.current_url().await.unwrap_or_default(),
                message: e.to_string(),
            }),
            Err(_) => Err(AutomationError::Timeout {
                what: "navigation".to_string(),
                timeout,
            }),
        }
    }

    async fn evaluate(&self, script: &str) -> AutomationResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| AutomationError::Script(e.to_string()))?;
        // scripts that return nothing come back without a value
        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn cookies(&self) -> AutomationResult<SessionArtifact> {
        let cookies = self.page.get_cookies().await.map_err(protocol)?;
        let bytes = serde_json::to_vec(&cookies).map_err(protocol)?;
        Ok(SessionArtifact::from_bytes(bytes))
    }

    async fn set_cookies(&self, artifact: &SessionArtifact) -> AutomationResult<()> {
        let params: Vec<CookieParam> = serde_json::from_slice(artifact.as_bytes()).map_err(protocol)?;
        self.page.set_cookies(params).await.map(|_| ()).map_err(protocol)
    }

    async fn clear_cookies(&self) -> AutomationResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map(|_| ())
            .map_err(protocol)
    }

    async fn close(&self) -> AutomationResult<()> {
        self.elements.lock().await.clear();
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| AutomationError::Resource(format!("failed to close page: {}", e)))
    }
}
