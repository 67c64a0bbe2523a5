//! Composition root
//!
//! A `Client` owns everything one account needs for one run:
//! - The resolved settings
//! - A browser, launched lazily and shared by every operation
//! - The session store and the rate limiter
//! - A lane that serializes engagement actions

use crate::automation::{selectors, Browser, BrowserLauncher, PageAutomation, ScopedPage};
use crate::company::CompanyAdmin;
use crate::config::{Cooldown, Settings};
use crate::engage::{EngagementAction, EngagementError, EngagementOutcome, EngagementStateMachine};
use crate::records::{CompanyRecord, ProfileRecord, RawProfile};
use crate::search::{SearchCollector, SearchParams};
use crate::session::{AuthOutcome, AuthenticationFlow, Credentials, FileSessionStore, SessionStore};
use crate::throttle::RateLimiter;
use crate::{LinkreachError, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio_util::sync::CancellationToken;

/// Main client structure
pub struct Client {
    settings: Arc<Settings>,
    launcher: Arc<dyn BrowserLauncher>,
    browser: OnceCell<Arc<dyn Browser>>,
    store: Arc<dyn SessionStore>,
    limiter: RateLimiter,
    engagement_lane: Mutex<()>,
}

impl Client {
    /// Creates a client with a file-backed session store under `cache_dir`
    ///
    /// # Arguments
    ///
    /// * `settings` - The resolved settings
    /// * `launcher` - Starts the browser on first use
    pub fn new(settings: Settings, launcher: Arc<dyn BrowserLauncher>) -> Self {
        let store = Arc::new(FileSessionStore::new(&settings.cache_dir));
        Self::with_store(settings, launcher, store)
    }

    /// Creates a client with an explicit session store
    pub fn with_store(
        settings: Settings,
        launcher: Arc<dyn BrowserLauncher>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let limiter = RateLimiter::new(settings.cooldown, CancellationToken::new());
        Self {
            settings: Arc::new(settings),
            launcher,
            browser: OnceCell::new(),
            store,
            limiter,
            engagement_lane: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Token that cancels every pending wait of this client
    pub fn cancellation_token(&self) -> CancellationToken {
        self.limiter.cancellation().clone()
    }

    /// Returns the shared browser, launching it on the first call
    ///
    /// Concurrent first callers wait for a single launch.
    pub async fn browser(&self) -> Result<Arc<dyn Browser>> {
        let browser = self
            .browser
            .get_or_try_init(|| async {
                let browser = self
                    .launcher
                    .launch()
                    .await
                    .map_err(|e| LinkreachError::from_automation("launch", e))?;
                tracing::info!("browser ready");
                Ok::<_, LinkreachError>(browser)
            })
            .await?;
        Ok(Arc::clone(browser))
    }

    /// Logs in, reusing the cached session when it is still valid
    ///
    /// # Returns
    ///
    /// * `Ok(AuthOutcome)` - How the session was established
    /// * `Err(LinkreachError::Authentication)` - Login failed; operator action needed
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthOutcome> {
        let browser = self.browser().await?;
        AuthenticationFlow::new(&self.settings, self.store.as_ref(), &self.limiter)
            .login(browser.as_ref(), credentials)
            .await
    }

    /// Collects up to `limit` people matching `params`, in page order
    pub async fn search_people(&self, params: SearchParams, limit: usize) -> Result<Vec<ProfileRecord>> {
        let browser = self.browser().await?;
        SearchCollector::new(&self.settings, browser.as_ref(), &self.limiter)
            .collect(params, limit)
            .await
    }

    /// Runs one engagement action; actions of one client never overlap
    pub async fn engage(
        &self,
        profile: &ProfileRecord,
        action: &EngagementAction,
        cooldown: Option<Cooldown>,
    ) -> EngagementOutcome {
        let _lane = self.engagement_lane.lock().await;

        let browser = match self.browser().await {
            Ok(browser) => browser,
            Err(err) => {
                return EngagementOutcome::Failed(EngagementError::Resource {
                    stage: "launch".to_string(),
                    message: err.to_string(),
                })
            }
        };

        EngagementStateMachine::new(&self.settings, browser.as_ref(), &self.limiter)
            .engage(profile, action, cooldown)
            .await
    }

    pub async fn visit(&self, profile: &ProfileRecord, scroll: bool) -> EngagementOutcome {
        self.engage(profile, &EngagementAction::Visit { scroll }, None).await
    }

    pub async fn connect(&self, profile: &ProfileRecord, note: Option<String>) -> EngagementOutcome {
        self.engage(profile, &EngagementAction::Connect { note }, None).await
    }

    pub async fn message(&self, profile: &ProfileRecord, body: impl Into<String>) -> EngagementOutcome {
        let action = EngagementAction::Message { body: body.into() };
        self.engage(profile, &action, None).await
    }

    /// Opens a profile directly and extracts its record, experiences included
    pub async fn fetch_profile(&self, profile_id: &str) -> Result<ProfileRecord> {
        tracing::info!(task = "profile", profile = profile_id, "task started");
        let browser = self.browser().await?;

        let page = ScopedPage::open(browser.as_ref(), "profile")
            .await
            .map_err(|e| LinkreachError::from_automation("profile/open-page", e))?;
        let result = self.extract_profile(&*page, profile_id).await;
        self.limiter.wait(None, None).await;
        page.release().await;

        match &result {
            Ok(record) => tracing::info!(
                task = "profile",
                profile = profile_id,
                experiences = record.experiences.len(),
                "outcome"
            ),
            Err(err) => tracing::warn!(task = "profile", profile = profile_id, error = %err, "outcome"),
        }
        result
    }

    async fn extract_profile(&self, page: &dyn PageAutomation, profile_id: &str) -> Result<ProfileRecord> {
        let stage = format!("profile/{}", profile_id);
        let automation = |e| LinkreachError::from_automation(&stage, e);

        page.navigate(&self.settings.profile_url(profile_id))
            .await
            .map_err(automation)?;
        page.wait_for(selectors::PROFILE_MAIN, self.settings.element_timeout())
            .await
            .map_err(automation)?;

        let script = selectors::extract_profile_script(&self.settings.button_labels.show_more);
        let value = page.evaluate(&script).await.map_err(automation)?;

        let missing = || LinkreachError::TransientNetwork {
            stage: stage.clone(),
            message: format!("no profile record could be extracted for {}", profile_id),
        };
        if value.is_null() {
            return Err(missing());
        }
        let raw: RawProfile = serde_json::from_value(value).map_err(|e| LinkreachError::TransientNetwork {
            stage: stage.clone(),
            message: format!("unexpected profile shape: {}", e),
        })?;
        raw.into_record().ok_or_else(missing)
    }

    /// Reads a company page this account administers
    pub async fn fetch_company(&self, company_id: &str) -> Result<CompanyRecord> {
        let browser = self.browser().await?;
        CompanyAdmin::new(&self.settings, browser.as_ref(), &self.limiter)
            .fetch_company(company_id)
            .await
    }

    /// Invites the first person matching `name` to follow `company`
    pub async fn invite_to_follow(&self, company: &CompanyRecord, name: &str) -> EngagementOutcome {
        let _lane = self.engagement_lane.lock().await;

        let browser = match self.browser().await {
            Ok(browser) => browser,
            Err(err) => {
                return EngagementOutcome::Failed(EngagementError::Resource {
                    stage: "launch".to_string(),
                    message: err.to_string(),
                })
            }
        };

        CompanyAdmin::new(&self.settings, browser.as_ref(), &self.limiter)
            .invite_to_follow(company, name)
            .await
    }

    /// Closes the browser if one was launched
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(browser) = self.browser.get() {
            browser
                .close()
                .await
                .map_err(|e| LinkreachError::from_automation("shutdown", e))?;
            tracing::info!("browser closed");
        }
        Ok(())
    }
}
