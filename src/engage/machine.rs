use crate::automation::{selectors, Browser, ElementHandle, PageAutomation, ScopedPage};
use crate::config::{Cooldown, Settings};
use crate::engage::{classify_affordance, Affordance, EngagementAction, EngagementError, EngagementOutcome};
use crate::records::ProfileRecord;
use crate::throttle::{pause, RateLimiter};
use std::time::Duration;

/// Settle time after opening the overflow menu or submitting a form
const SETTLE: Duration = Duration::from_millis(500);

type Step<T> = Result<T, EngagementError>;

/// Executes one action against one profile
///
/// ```text
/// detected    Connect action                         outcome
/// Message     -                                      AlreadyConnected
/// Connect     primary -> [add note -> type] -> send  Sent
/// Follow      overflow -> connect -> [note] -> send  Sent
/// Unknown     -                                      Failed(UnknownState)
/// ```
///
/// Work on the page is bracketed by two cooldown waits, and the page is
/// released on every path.
pub struct EngagementStateMachine<'a> {
    settings: &'a Settings,
    browser: &'a dyn Browser,
    limiter: &'a RateLimiter,
}

impl<'a> EngagementStateMachine<'a> {
    pub fn new(settings: &'a Settings, browser: &'a dyn Browser, limiter: &'a RateLimiter) -> Self {
        Self {
            settings,
            browser,
            limiter,
        }
    }

    /// Runs `action` on `profile`; `cooldown` overrides the configured pacing
    pub async fn engage(
        &self,
        profile: &ProfileRecord,
        action: &EngagementAction,
        cooldown: Option<Cooldown>,
    ) -> EngagementOutcome {
        tracing::info!(
            task = action.kind(),
            profile = %profile.id,
            name = %profile.name,
            "task started"
        );

        let outcome = match self.attempt(profile, action, cooldown).await {
            Ok(outcome) => outcome,
            Err(err) => EngagementOutcome::Failed(err),
        };

        match &outcome {
            EngagementOutcome::Failed(err) => {
                tracing::warn!(task = action.kind(), profile = %profile.id, error = %err, "outcome")
            }
            other => tracing::info!(task = action.kind(), profile = %profile.id, outcome = %other, "outcome"),
        }
        outcome
    }

    async fn attempt(
        &self,
        profile: &ProfileRecord,
        action: &EngagementAction,
        cooldown: Option<Cooldown>,
    ) -> Step<EngagementOutcome> {
        if self.limiter.cancellation().is_cancelled() {
            return Err(EngagementError::Cancelled);
        }
        if let EngagementAction::Message { body } = action {
            if body.trim().is_empty() {
                return Ok(EngagementOutcome::Skipped("empty message body".to_string()));
            }
        }

        let bounds = cooldown.unwrap_or_else(|| self.limiter.cooldown());
        let page = ScopedPage::open(self.browser, action.kind())
            .await
            .map_err(|e| EngagementError::from_automation("open-page", None, e))?;

        let result = self.run(&*page, profile, action, bounds).await;

        self.limiter.wait_within(bounds).await;
        page.release().await;

        if self.limiter.cancellation().is_cancelled() && result.is_err() {
            return Err(EngagementError::Cancelled);
        }
        result
    }

    async fn run(
        &self,
        page: &dyn PageAutomation,
        profile: &ProfileRecord,
        action: &EngagementAction,
        bounds: Cooldown,
    ) -> Step<EngagementOutcome> {
        let url = self.settings.profile_url(&profile.id);
        page.navigate(&url)
            .await
            .map_err(|e| EngagementError::from_automation("navigate", None, e))?;
        page.wait_for(selectors::PROFILE_MAIN, self.settings.element_timeout())
            .await
            .map_err(|e| EngagementError::from_automation("profile-load", None, e))?;

        self.limiter.wait_within(bounds).await;
        if self.limiter.cancellation().is_cancelled() {
            return Err(EngagementError::Cancelled);
        }

        match action {
            EngagementAction::Visit { scroll } => {
                if *scroll {
                    self.scroll_to_bottom(page).await;
                }
                Ok(EngagementOutcome::Sent)
            }
            EngagementAction::Connect { note } => {
                let (state, label, primary) = self.detect(page).await?;
                tracing::debug!(profile = %profile.id, state = %state, "relationship detected");
                match state {
                    Affordance::Message => Ok(EngagementOutcome::AlreadyConnected),
                    Affordance::Connect => {
                        self.click(page, &primary, selectors::PRIMARY_ACTION).await?;
                        self.send_invitation(page, note.as_deref()).await?;
                        Ok(EngagementOutcome::Sent)
                    }
                    Affordance::Follow => {
                        let menu = self.require(page, selectors::OVERFLOW_MENU).await?;
                        self.click(page, &menu, selectors::OVERFLOW_MENU).await?;
                        self.settle().await;
                        let entry = self.require(page, selectors::OVERFLOW_CONNECT).await?;
                        self.click(page, &entry, selectors::OVERFLOW_CONNECT).await?;
                        self.send_invitation(page, note.as_deref()).await?;
                        Ok(EngagementOutcome::Sent)
                    }
                    Affordance::Unknown => Err(EngagementError::UnknownState { label }),
                }
            }
            EngagementAction::Message { body } => {
                let (state, _, primary) = self.detect(page).await?;
                if state != Affordance::Message {
                    return Err(EngagementError::NoMessageAffordance { found: state });
                }
                let composer = self.open_composer(page, &primary).await?;
                page.type_text(&composer, body)
                    .await
                    .map_err(|e| EngagementError::from_automation("message", Some(selectors::MESSAGE_COMPOSER), e))?;
                let send = self.require(page, selectors::MESSAGE_SEND).await?;
                self.click(page, &send, selectors::MESSAGE_SEND).await?;
                self.settle().await;
                Ok(EngagementOutcome::Sent)
            }
        }
    }

    /// Reads and classifies the primary action label
    async fn detect(&self, page: &dyn PageAutomation) -> Step<(Affordance, String, ElementHandle)> {
        let primary = page
            .locate(selectors::PRIMARY_ACTION)
            .await
            .map_err(|e| EngagementError::from_automation("detect", Some(selectors::PRIMARY_ACTION), e))?
            .ok_or_else(|| EngagementError::MissingAffordance {
                selector: selectors::PRIMARY_ACTION.to_string(),
            })?;
        let label = page
            .read_text(&primary)
            .await
            .map_err(|e| EngagementError::from_automation("detect", Some(selectors::PRIMARY_ACTION), e))?;

        let state = classify_affordance(&label, &self.settings.button_labels);
        Ok((state, label.trim().to_string(), primary))
    }

    /// Confirms the invitation modal, adding `note` when one is given
    async fn send_invitation(&self, page: &dyn PageAutomation, note: Option<&str>) -> Step<()> {
        self.require(page, selectors::INVITE_ACTIONBAR).await?;

        if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
            let add_note = self.require(page, selectors::INVITE_ADD_NOTE).await?;
            self.click(page, &add_note, selectors::INVITE_ADD_NOTE).await?;
            let field = self.require(page, selectors::INVITE_NOTE).await?;
            page.type_text(&field, note)
                .await
                .map_err(|e| EngagementError::from_automation("connect", Some(selectors::INVITE_NOTE), e))?;
        }

        let send = self.require(page, selectors::INVITE_SEND).await?;
        self.click(page, &send, selectors::INVITE_SEND).await?;
        self.settle().await;
        Ok(())
    }

    /// Clicks the message button and waits for the composer, retrying the click once
    async fn open_composer(&self, page: &dyn PageAutomation, button: &ElementHandle) -> Step<ElementHandle> {
        let timeout = self.settings.element_timeout();
        self.click(page, button, selectors::PRIMARY_ACTION).await?;

        match page.wait_for(selectors::MESSAGE_COMPOSER, timeout).await {
            Ok(composer) => return Ok(composer),
            Err(e) if e.is_missing_element() => {
                tracing::debug!(error = %e, "message composer did not open; retrying");
            }
            Err(e) => return Err(EngagementError::from_automation("message", None, e)),
        }

        let button = self.require(page, selectors::PRIMARY_ACTION).await?;
        self.click(page, &button, selectors::PRIMARY_ACTION).await?;
        self.require(page, selectors::MESSAGE_COMPOSER).await
    }

    /// Scrolls in fixed steps until the budget is used up
    async fn scroll_to_bottom(&self, page: &dyn PageAutomation) {
        let scroll = self.settings.scroll;
        for step in 0..scroll.steps() {
            if let Err(e) = page.evaluate(selectors::SCROLL_STEP).await {
                tracing::debug!(step, error = %e, "scroll step failed");
                return;
            }
            if !pause(scroll.step(), self.limiter.cancellation()).await {
                return;
            }
        }
    }

    async fn require(&self, page: &dyn PageAutomation, selector: &str) -> Step<ElementHandle> {
        page.wait_for(selector, self.settings.element_timeout())
            .await
            .map_err(|e| EngagementError::from_automation("wait", Some(selector), e))
    }

    async fn click(&self, page: &dyn PageAutomation, element: &ElementHandle, selector: &str) -> Step<()> {
        page.click(element)
            .await
            .map_err(|e| EngagementError::from_automation("click", Some(selector), e))
    }

    async fn settle(&self) {
        pause(SETTLE, self.limiter.cancellation()).await;
    }
}
