//! Login state machine
//!
//! ```text
//! Start ─► TryCachedSession ─► Authenticated
//!   │            │
//!   │            ▼
//!   └─► NeedsCredentialLogin ─► SubmittingCredentials ─► Authenticated
//!                                   │           │
//!                                   ▼           ▼
//!                               Checkpoint ─► Failed
//!                                   │
//!                                   ▼
//!                             Authenticated
//! ```

use crate::automation::{selectors, Browser, PageAutomation, ScopedPage};
use crate::config::Settings;
use crate::session::{Credentials, SessionArtifact, SessionStore};
use crate::throttle::{ensure_active, pause, RateLimiter};
use crate::{LinkreachError, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Interval between two checkpoint polls
const CHECKPOINT_TICK: Duration = Duration::from_secs(1);

/// States of the login state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    Start,
    TryCachedSession,
    NeedsCredentialLogin,
    SubmittingCredentials,
    Checkpoint,
    Authenticated,
    Failed,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TryCachedSession => "try_cached_session",
            Self::NeedsCredentialLogin => "needs_credential_login",
            Self::SubmittingCredentials => "submitting_credentials",
            Self::Checkpoint => "checkpoint",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Failed)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful login was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The cached session was still accepted
    CachedSession,

    /// Credentials were accepted without a challenge
    CredentialLogin,

    /// Credentials were accepted after a verification challenge
    CheckpointCleared,
}

/// Where a URL sits relative to the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    /// The authenticated landing page
    Landing,

    /// An identity verification interstitial
    Challenge,

    Other,
}

/// Classifies a page URL relative to the configured main address
///
/// URLs on another host, or outside the main address's path prefix, are
/// never treated as part of the login flow.
pub fn classify_url(settings: &Settings, url: &str) -> UrlClass {
    let (Ok(base), Ok(parsed)) = (Url::parse(&settings.main_address), Url::parse(url)) else {
        return UrlClass::Other;
    };
    let same_origin = parsed.host_str() == base.host_str()
        && parsed.port_or_known_default() == base.port_or_known_default();
    if !same_origin {
        return UrlClass::Other;
    }

    let prefix = base.path().trim_end_matches('/');
    let Some(rest) = parsed.path().strip_prefix(prefix) else {
        return UrlClass::Other;
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        return UrlClass::Other;
    }
    let path = rest.trim_matches('/');

    if path == "feed" || path.starts_with("feed/") {
        UrlClass::Landing
    } else if path.starts_with("checkpoint/") || path == "checkpoint" {
        UrlClass::Challenge
    } else {
        UrlClass::Other
    }
}

/// Drives a login through the cached session, credentials and checkpoint
pub struct AuthenticationFlow<'a> {
    settings: &'a Settings,
    store: &'a dyn SessionStore,
    limiter: &'a RateLimiter,
}

/// Mutable bookkeeping of one login attempt
#[derive(Default)]
struct Attempt {
    cached: Option<SessionArtifact>,
    last_url: String,
    failure: Option<String>,
}

impl<'a> AuthenticationFlow<'a> {
    pub fn new(settings: &'a Settings, store: &'a dyn SessionStore, limiter: &'a RateLimiter) -> Self {
        Self {
            settings,
            store,
            limiter,
        }
    }

    /// Runs the state machine on a fresh page of `browser`
    ///
    /// The page is released on every path. A failed login is reported
    /// only after the configured grace delay.
    pub async fn login(&self, browser: &dyn Browser, credentials: &Credentials) -> Result<AuthOutcome> {
        tracing::info!(task = "login", "task started");

        let page = ScopedPage::open(browser, "login")
            .await
            .map_err(|e| LinkreachError::from_automation("login", e))?;
        let result = self.run(&*page, credentials).await;
        page.release().await;

        match result {
            Ok(outcome) => {
                tracing::info!(task = "login", outcome = ?outcome, "outcome");
                Ok(outcome)
            }
            Err(err @ LinkreachError::Authentication { .. }) => {
                tracing::error!(task = "login", error = %err, "outcome");
                pause(self.settings.failure_grace(), self.limiter.cancellation()).await;
                Err(err)
            }
            Err(err) => {
                tracing::error!(task = "login", error = %err, "outcome");
                Err(err)
            }
        }
    }

    /// Runs the state machine against an already open page
    pub async fn run(&self, page: &dyn PageAutomation, credentials: &Credentials) -> Result<AuthOutcome> {
        let mut attempt = Attempt::default();
        let mut state = AuthState::Start;
        let mut previous = AuthState::Start;

        while !state.is_terminal() {
            ensure_active(self.limiter.cancellation())?;

            let next = match state {
                AuthState::Start => {
                    attempt.cached = self.store.load();
                    if attempt.cached.is_some() {
                        AuthState::TryCachedSession
                    } else {
                        AuthState::NeedsCredentialLogin
                    }
                }
                AuthState::TryCachedSession => self.try_cached_session(page, &mut attempt).await?,
                AuthState::NeedsCredentialLogin => AuthState::SubmittingCredentials,
                AuthState::SubmittingCredentials => {
                    self.submit_credentials(page, credentials, &mut attempt).await?
                }
                AuthState::Checkpoint => self.poll_checkpoint(page, &mut attempt).await?,
                AuthState::Authenticated | AuthState::Failed => state,
            };

            tracing::info!(task = "login", from = %state, to = %next, "state transition");
            previous = state;
            state = next;
        }

        if state == AuthState::Failed {
            return Err(LinkreachError::Authentication {
                stage: previous.to_string(),
                message: attempt
                    .failure
                    .unwrap_or_else(|| format!("ended on {}", attempt.last_url)),
            });
        }

        match previous {
            AuthState::TryCachedSession => Ok(AuthOutcome::CachedSession),
            stage => {
                self.persist_session(page).await?;
                if stage == AuthState::Checkpoint {
                    Ok(AuthOutcome::CheckpointCleared)
                } else {
                    Ok(AuthOutcome::CredentialLogin)
                }
            }
        }
    }

    async fn try_cached_session(&self, page: &dyn PageAutomation, attempt: &mut Attempt) -> Result<AuthState> {
        let stage = "login/cached-session";
        let Some(artifact) = attempt.cached.take() else {
            return Ok(AuthState::NeedsCredentialLogin);
        };

        if let Err(e) = page.set_cookies(&artifact).await {
            tracing::warn!(error = %e, "cached session could not be applied");
            self.invalidate_session(page).await;
            return Ok(AuthState::NeedsCredentialLogin);
        }

        page.navigate(&self.settings.feed_url())
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;
        self.limiter.wait(Some(1.0), Some(3.0)).await;

        let url = page
            .current_url()
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;
        attempt.last_url = url.clone();

        if classify_url(self.settings, &url) == UrlClass::Landing {
            tracing::info!("logged in from cached session");
            return Ok(AuthState::Authenticated);
        }

        tracing::info!(url = %url, "cached session rejected");
        self.invalidate_session(page).await;
        Ok(AuthState::NeedsCredentialLogin)
    }

    /// Drops a stale session on both sides so it cannot be reused
    async fn invalidate_session(&self, page: &dyn PageAutomation) {
        if let Err(e) = page.clear_cookies().await {
            tracing::warn!(error = %e, "failed to drop browser cookies");
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear session cache");
        }
    }

    async fn submit_credentials(
        &self,
        page: &dyn PageAutomation,
        credentials: &Credentials,
        attempt: &mut Attempt,
    ) -> Result<AuthState> {
        let stage = "login/credentials";
        let automation = |e| LinkreachError::from_automation(stage, e);

        page.navigate(&self.settings.login_url()).await.map_err(automation)?;

        let timeout = self.settings.element_timeout();
        let fields = (
            page.wait_for(selectors::LOGIN_USERNAME, timeout).await,
            page.locate(selectors::LOGIN_PASSWORD).await.map_err(automation)?,
        );
        let (username, password) = match fields {
            (Ok(username), Some(password)) => (username, password),
            _ => {
                attempt.failure = Some("login form not found".to_string());
                return Ok(AuthState::Failed);
            }
        };

        page.type_text(&username, credentials.username()).await.map_err(automation)?;
        page.type_text(&password, credentials.password()).await.map_err(automation)?;

        let Some(submit) = page.locate(selectors::LOGIN_SUBMIT).await.map_err(automation)? else {
            attempt.failure = Some("login submit button not found".to_string());
            return Ok(AuthState::Failed);
        };
        page.click(&submit).await.map_err(automation)?;

        if let Err(e) = page.wait_for_navigation(timeout).await {
            tracing::debug!(error = %e, "no navigation observed after submitting credentials");
        }

        let url = page.current_url().await.map_err(automation)?;
        tracing::info!(url = %url, "credentials submitted");
        attempt.last_url = url.clone();

        Ok(match classify_url(self.settings, &url) {
            UrlClass::Landing => AuthState::Authenticated,
            UrlClass::Challenge => AuthState::Checkpoint,
            UrlClass::Other => {
                attempt.failure = Some(format!("unexpected page after login: {}", url));
                AuthState::Failed
            }
        })
    }

    /// Polls a verification challenge once per tick until it resolves or times out
    async fn poll_checkpoint(&self, page: &dyn PageAutomation, attempt: &mut Attempt) -> Result<AuthState> {
        let ticks = self.settings.checkpoint_timeout_seconds;
        let cancel = self.limiter.cancellation();

        for tick in 0..ticks {
            ensure_active(cancel)?;

            match page.current_url().await {
                Ok(url) => {
                    if url != attempt.last_url {
                        tracing::info!(url = %url, tick, "checkpoint url changed");
                        attempt.last_url = url.clone();
                    }
                    if classify_url(self.settings, &url) == UrlClass::Landing {
                        return Ok(AuthState::Authenticated);
                    }
                }
                Err(e) => tracing::warn!(error = %e, tick, "could not read checkpoint url"),
            }

            match describe_challenge(page).await {
                Ok((header, explanation)) => {
                    tracing::info!(header = %header, explanation = %explanation, tick, "checkpoint pending")
                }
                Err(e) => tracing::debug!(error = %e, tick, "could not read checkpoint page"),
            }

            if !pause(CHECKPOINT_TICK, cancel).await {
                return Err(LinkreachError::Cancelled);
            }
        }

        // the challenge may have cleared during the last tick
        ensure_active(cancel)?;
        match page.current_url().await {
            Ok(url) => {
                attempt.last_url = url.clone();
                if classify_url(self.settings, &url) == UrlClass::Landing {
                    return Ok(AuthState::Authenticated);
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not read checkpoint url"),
        }

        attempt.failure = Some(format!(
            "checkpoint not resolved within {}s",
            self.settings.checkpoint_timeout_seconds
        ));
        Ok(AuthState::Failed)
    }

    async fn persist_session(&self, page: &dyn PageAutomation) -> Result<()> {
        let artifact = page
            .cookies()
            .await
            .map_err(|e| LinkreachError::from_automation("login/persist", e))?;
        self.store.save(&artifact)?;
        tracing::info!(bytes = artifact.len(), "session persisted");
        Ok(())
    }
}

/// Reads the challenge header and its explanation
async fn describe_challenge(
    page: &dyn PageAutomation,
) -> crate::automation::AutomationResult<(String, String)> {
    let header = match page.locate(selectors::CHECKPOINT_HEADER).await? {
        Some(node) => page.read_text(&node).await?,
        None => {
            return Err(crate::automation::AutomationError::ElementNotFound {
                selector: selectors::CHECKPOINT_HEADER.to_string(),
            })
        }
    };
    let explanation = match page.locate(selectors::CHECKPOINT_EXPLANATION).await? {
        Some(node) => page.read_text(&node).await?,
        None => String::new(),
    };
    Ok((header.trim().to_string(), explanation.trim().to_string()))
}
