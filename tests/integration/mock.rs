//! Scripted browser double
//!
//! `MockSite` plays the remote site: it decides where navigations land,
//! which elements exist and what extraction scripts return, and records
//! every interaction so tests can assert exact click sequences.

use async_trait::async_trait;
use linkreach::automation::{
    selectors, AutomationError, AutomationResult, Browser, BrowserLauncher, ElementHandle,
    PageAutomation,
};
use linkreach::config::{Cooldown, Settings};
use linkreach::session::{SessionArtifact, SessionResult, SessionStore};
use linkreach::throttle::RateLimiter;
use linkreach::ProfileRecord;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const FEED: &str = "https://www.linkedin.com/feed/";
pub const LOGIN: &str = "https://www.linkedin.com/login";
pub const CHALLENGE: &str = "https://www.linkedin.com/checkpoint/challenge/AgESfx";
pub const FRESH_COOKIES: &str = r#"[{"name":"li_at","value":"fresh","domain":".linkedin.com","path":"/"}]"#;
pub const CACHED_COOKIES: &str = r#"[{"name":"li_at","value":"cached","domain":".linkedin.com","path":"/"}]"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate(String),
    Click(String),
    Type { selector: String, text: String },
    Evaluate(&'static str),
    SetCookies,
    ClearCookies,
    PageOpened,
    PageClosed,
}

/// Where the credential form submission lands
#[derive(Debug, Clone)]
pub enum LoginLanding {
    Feed,

    /// The challenge resolves after `Some(n)` URL reads; `None` never resolves
    Checkpoint(Option<usize>),

    Elsewhere(String),
}

#[derive(Debug, Clone)]
pub struct SiteScript {
    /// Whether installed cached cookies are still accepted
    pub cached_session_valid: bool,
    pub login_landing: LoginLanding,

    /// Text of the profile's primary action; `None` removes the button
    pub primary_label: Option<String>,

    /// Selectors that never appear
    pub missing: HashSet<String>,

    /// Selectors that fail this many lookups before appearing
    pub flaky: HashMap<String, usize>,

    /// Search results by page number
    pub search_pages: HashMap<usize, Result<Value, AutomationError>>,

    pub profile: Value,
    pub company: Value,

    /// Navigations to URLs containing this fail
    pub fail_navigation: Option<String>,
}

impl Default for SiteScript {
    fn default() -> Self {
        Self {
            cached_session_valid: true,
            login_landing: LoginLanding::Feed,
            primary_label: None,
            missing: HashSet::new(),
            flaky: HashMap::new(),
            search_pages: HashMap::new(),
            profile: Value::Null,
            company: Value::Null,
            fail_navigation: None,
        }
    }
}

impl SiteScript {
    pub fn with_label(label: &str) -> Self {
        Self {
            primary_label: Some(label.to_string()),
            ..Self::default()
        }
    }

    pub fn missing(mut self, selector: &str) -> Self {
        self.missing.insert(selector.to_string());
        self
    }

    pub fn flaky(mut self, selector: &str, failures: usize) -> Self {
        self.flaky.insert(selector.to_string(), failures);
        self
    }

    pub fn search_page(mut self, page: usize, ids: &[&str]) -> Self {
        self.search_pages.insert(page, Ok(cards(ids)));
        self
    }

    pub fn failing_search_page(mut self, page: usize) -> Self {
        self.search_pages.insert(
            page,
            Err(AutomationError::Script("Cannot read properties of null".to_string())),
        );
        self
    }
}

/// Search result cards as returned by the extraction script
pub fn cards(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({
                    "id": id,
                    "link": format!("https://www.linkedin.com/in/{}", id),
                    "name": format!("Person {}", id),
                    "title": "Data Analyst",
                    "location": "Lisbon",
                    "buttonText": "Connect",
                })
            })
            .collect(),
    )
}

struct SiteState {
    script: SiteScript,
    session_valid: bool,
    checkpoint_reads: usize,
    open_pages: usize,
    opened_pages: usize,
    events: Vec<Event>,
}

pub struct MockSite {
    state: Mutex<SiteState>,
    launches: AtomicUsize,
}

impl MockSite {
    pub fn new(script: SiteScript) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SiteState {
                script,
                session_valid: false,
                checkpoint_reads: 0,
                open_pages: 0,
                opened_pages: 0,
                events: Vec::new(),
            }),
            launches: AtomicUsize::new(0),
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SiteState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn record(&self, event: Event) {
        self.with_state(|s| s.events.push(event));
    }

    pub fn events(&self) -> Vec<Event> {
        self.with_state(|s| s.events.clone())
    }

    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Click(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Type { selector, text } => Some((selector, text)),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn evaluations(&self, tag: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Evaluate(t) if *t == tag))
            .count()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn open_pages(&self) -> usize {
        self.with_state(|s| s.open_pages)
    }

    pub fn opened_pages(&self) -> usize {
        self.with_state(|s| s.opened_pages)
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn set_label(&self, label: &str) {
        self.with_state(|s| s.script.primary_label = Some(label.to_string()));
    }

    /// Consumes one flaky failure of `selector` if any remain
    fn present(&self, selector: &str) -> bool {
        self.with_state(|s| {
            if s.script.missing.contains(selector) {
                return false;
            }
            if selector == selectors::PRIMARY_ACTION && s.script.primary_label.is_none() {
                return false;
            }
            match s.script.flaky.get_mut(selector) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    false
                }
                _ => true,
            }
        })
    }
}

pub struct MockLauncher {
    site: Arc<MockSite>,
}

impl MockLauncher {
    pub fn new(site: Arc<MockSite>) -> Arc<Self> {
        Arc::new(Self { site })
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self) -> AutomationResult<Arc<dyn Browser>> {
        self.site.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockBrowser::new(Arc::clone(&self.site))))
    }
}

pub struct MockBrowser {
    site: Arc<MockSite>,
}

impl MockBrowser {
    pub fn new(site: Arc<MockSite>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn new_page(&self) -> AutomationResult<Arc<dyn PageAutomation>> {
        self.site.with_state(|s| {
            s.open_pages += 1;
            s.opened_pages += 1;
            s.events.push(Event::PageOpened);
        });
        Ok(Arc::new(MockPage {
            site: Arc::clone(&self.site),
            url: Mutex::new("about:blank".to_string()),
        }))
    }

    async fn close(&self) -> AutomationResult<()> {
        Ok(())
    }
}

pub struct MockPage {
    site: Arc<MockSite>,
    url: Mutex<String>,
}

impl MockPage {
    fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_string();
    }

    fn url(&self) -> String {
        self.url.lock().unwrap().clone()
    }

    fn search_page_number(&self) -> usize {
        url::Url::parse(&self.url())
            .ok()
            .and_then(|u| {
                u.query_pairs()
                    .find(|(k, _)| k == "page")
                    .and_then(|(_, v)| v.parse().ok())
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl PageAutomation for MockPage {
    async fn navigate(&self, url: &str) -> AutomationResult<()> {
        self.site.record(Event::Navigate(url.to_string()));

        let (failing, session_valid) = self.site.with_state(|s| {
            let failing = s
                .script
                .fail_navigation
                .as_deref()
                .is_some_and(|needle| url.contains(needle));
            (failing, s.session_valid)
        });
        if failing {
            return Err(AutomationError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        if url.starts_with(FEED) && !session_valid {
            self.set_url(LOGIN);
        } else {
            self.set_url(url);
        }
        Ok(())
    }

    async fn locate(&self, selector: &str) -> AutomationResult<Option<ElementHandle>> {
        Ok(self.site.present(selector).then(|| ElementHandle::new(selector)))
    }

    async fn read_text(&self, element: &ElementHandle) -> AutomationResult<String> {
        let text = match element.id() {
            selectors::PRIMARY_ACTION => self
                .site
                .with_state(|s| s.script.primary_label.clone())
                .unwrap_or_default(),
            selectors::CHECKPOINT_HEADER => "Let's do a quick security check".to_string(),
            selectors::CHECKPOINT_EXPLANATION => "Enter the code we sent to your email".to_string(),
            _ => String::new(),
        };
        Ok(text)
    }

    async fn click(&self, element: &ElementHandle) -> AutomationResult<()> {
        self.site.record(Event::Click(element.id().to_string()));

        if element.id() == selectors::LOGIN_SUBMIT {
            let landing = self.site.with_state(|s| s.script.login_landing.clone());
            match landing {
                LoginLanding::Feed => {
                    self.site.with_state(|s| s.session_valid = true);
                    self.set_url(FEED);
                }
                LoginLanding::Checkpoint(_) => self.set_url(CHALLENGE),
                LoginLanding::Elsewhere(url) => self.set_url(&url),
            }
        }
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> AutomationResult<()> {
        self.site.record(Event::Type {
            selector: element.id().to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn current_url(&self) -> AutomationResult<String> {
        let url = self.url();
        if url != CHALLENGE {
            return Ok(url);
        }

        let resolved = self.site.with_state(|s| {
            s.checkpoint_reads += 1;
            match s.script.login_landing {
                LoginLanding::Checkpoint(Some(after)) if s.checkpoint_reads >= after => {
                    s.session_valid = true;
                    true
                }
                _ => false,
            }
        });
        if resolved {
            self.set_url(FEED);
        }
        Ok(self.url())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> AutomationResult<ElementHandle> {
        if self.site.present(selector) {
            Ok(ElementHandle::new(selector))
        } else {
            Err(AutomationError::Timeout {
                what: selector.to_string(),
                timeout,
            })
        }
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> AutomationResult<()> {
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> AutomationResult<Value> {
        if script == selectors::EXTRACT_SEARCH_RESULTS {
            self.site.record(Event::Evaluate("search"));
            let page = self.search_page_number();
            return self.site.with_state(|s| match s.script.search_pages.get(&page) {
                Some(Ok(value)) => Ok(value.clone()),
                Some(Err(e)) => Err(e.clone()),
                None => Ok(json!([])),
            });
        }
        if script == selectors::SCROLL_STEP {
            self.site.record(Event::Evaluate("scroll"));
            return Ok(Value::Bool(true));
        }
        if script == selectors::EXTRACT_COMPANY {
            self.site.record(Event::Evaluate("company"));
            return Ok(self.site.with_state(|s| s.script.company.clone()));
        }

        self.site.record(Event::Evaluate("profile"));
        Ok(self.site.with_state(|s| s.script.profile.clone()))
    }

    async fn cookies(&self) -> AutomationResult<SessionArtifact> {
        Ok(SessionArtifact::from_bytes(FRESH_COOKIES))
    }

    async fn set_cookies(&self, _artifact: &SessionArtifact) -> AutomationResult<()> {
        self.site.record(Event::SetCookies);
        self.site
            .with_state(|s| s.session_valid = s.script.cached_session_valid);
        Ok(())
    }

    async fn clear_cookies(&self) -> AutomationResult<()> {
        self.site.record(Event::ClearCookies);
        self.site.with_state(|s| s.session_valid = false);
        Ok(())
    }

    async fn close(&self) -> AutomationResult<()> {
        self.site.with_state(|s| {
            s.open_pages -= 1;
            s.events.push(Event::PageClosed);
        });
        Ok(())
    }
}

/// In-memory session store counting writes
#[derive(Default)]
pub struct MemoryStore {
    artifact: Mutex<Option<SessionArtifact>>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl MemoryStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn holding(bytes: &str) -> Arc<Self> {
        let store = Self::default();
        *store.artifact.lock().unwrap() = Some(SessionArtifact::from_bytes(bytes));
        Arc::new(store)
    }

    pub fn current(&self) -> Option<SessionArtifact> {
        self.artifact.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Option<SessionArtifact> {
        self.current()
    }

    fn save(&self, artifact: &SessionArtifact) -> SessionResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.artifact.lock().unwrap() = Some(artifact.clone());
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.artifact.lock().unwrap() = None;
        Ok(())
    }
}

/// Settings with zero cooldown and short timeouts
pub fn test_settings() -> Settings {
    Settings {
        cooldown: Cooldown::fixed(0.0),
        checkpoint_timeout_seconds: 5,
        failure_grace_seconds: 30,
        ..Settings::default()
    }
}

pub fn limiter(settings: &Settings) -> RateLimiter {
    RateLimiter::new(settings.cooldown, CancellationToken::new())
}

pub fn profile(id: &str) -> ProfileRecord {
    ProfileRecord::from_id(id, format!("https://www.linkedin.com/in/{}/", id))
}
