//! Company page administration
//!
//! Reads the admin dashboard of a company page and invites people to
//! follow it.

use crate::automation::{selectors, AutomationError, Browser, PageAutomation, ScopedPage};
use crate::config::Settings;
use crate::engage::{EngagementError, EngagementOutcome};
use crate::records::{CompanyRecord, RawCompany};
use crate::throttle::RateLimiter;
use crate::{LinkreachError, Result};

/// Seconds to let typeahead suggestions arrive
const SUGGESTION_WAIT: (f64, f64) = (5.0, 7.0);

/// Seconds to hold after confirming an invitation
const CONFIRM_WAIT: (f64, f64) = (1.0, 2.0);

pub const NOT_INVITABLE: &str = "invitation already sent or profile not found";

/// Operations on a company page administered by the account
pub struct CompanyAdmin<'a> {
    settings: &'a Settings,
    browser: &'a dyn Browser,
    limiter: &'a RateLimiter,
}

impl<'a> CompanyAdmin<'a> {
    pub fn new(settings: &'a Settings, browser: &'a dyn Browser, limiter: &'a RateLimiter) -> Self {
        Self {
            settings,
            browser,
            limiter,
        }
    }

    fn dashboard_url(&self, company_id: &str) -> String {
        self.settings
            .endpoint(&format!("company/{}/admin/dashboard/", company_id))
    }

    fn invite_url(&self, company_id: &str) -> String {
        self.settings
            .endpoint(&format!("company/{}/admin/analytics/followers/?invite=true", company_id))
    }

    /// Reads name, follower count and images from the admin dashboard
    pub async fn fetch_company(&self, company_id: &str) -> Result<CompanyRecord> {
        tracing::info!(task = "company", company = company_id, "task started");

        let page = ScopedPage::open(self.browser, "company")
            .await
            .map_err(|e| LinkreachError::from_automation("company/open-page", e))?;
        let result = self.extract_company(&*page, company_id).await;
        page.release().await;

        match &result {
            Ok(record) => tracing::info!(
                task = "company",
                company = company_id,
                name = %record.name,
                followers = record.follower_count,
                "outcome"
            ),
            Err(err) => tracing::warn!(task = "company", company = company_id, error = %err, "outcome"),
        }
        result
    }

    async fn extract_company(&self, page: &dyn PageAutomation, company_id: &str) -> Result<CompanyRecord> {
        let stage = "company/details";
        page.navigate(&self.dashboard_url(company_id))
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;

        let value = page
            .evaluate(selectors::EXTRACT_COMPANY)
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;
        if value.is_null() {
            return Err(LinkreachError::TransientNetwork {
                stage: stage.to_string(),
                message: format!("no company details found for {}", company_id),
            });
        }

        let raw: RawCompany = serde_json::from_value(value).map_err(|e| LinkreachError::TransientNetwork {
            stage: stage.to_string(),
            message: format!("unexpected company details shape: {}", e),
        })?;
        let link = page
            .current_url()
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;

        Ok(raw.into_record(company_id, link))
    }

    /// Invites the first person matching `name` to follow the company
    pub async fn invite_to_follow(&self, company: &CompanyRecord, name: &str) -> EngagementOutcome {
        tracing::info!(task = "invite", company = %company.name, invitee = name, "task started");

        if self.limiter.cancellation().is_cancelled() {
            return EngagementOutcome::Failed(EngagementError::Cancelled);
        }

        let outcome = match ScopedPage::open(self.browser, "invite").await {
            Ok(page) => {
                let result = self.send_invite(&*page, company, name).await;
                page.release().await;
                match result {
                    Ok(outcome) => outcome,
                    Err(err) => EngagementOutcome::Failed(err),
                }
            }
            Err(e) => EngagementOutcome::Failed(EngagementError::from_automation("open-page", None, e)),
        };

        tracing::info!(task = "invite", company = %company.name, invitee = name, outcome = %outcome, "outcome");
        outcome
    }

    async fn send_invite(
        &self,
        page: &dyn PageAutomation,
        company: &CompanyRecord,
        name: &str,
    ) -> std::result::Result<EngagementOutcome, EngagementError> {
        let fail = |selector: Option<&str>| {
            let selector = selector.map(str::to_string);
            move |e: AutomationError| EngagementError::from_automation("invite", selector.as_deref(), e)
        };

        page.navigate(&self.invite_url(&company.id))
            .await
            .map_err(fail(None))?;
        let input = page
            .wait_for(selectors::INVITE_TYPEAHEAD, self.settings.element_timeout())
            .await
            .map_err(fail(Some(selectors::INVITE_TYPEAHEAD)))?;
        page.type_text(&input, name)
            .await
            .map_err(fail(Some(selectors::INVITE_TYPEAHEAD)))?;

        self.limiter
            .wait(Some(SUGGESTION_WAIT.0), Some(SUGGESTION_WAIT.1))
            .await;
        if self.limiter.cancellation().is_cancelled() {
            return Err(EngagementError::Cancelled);
        }

        let Some(checkbox) = page
            .locate(selectors::INVITE_FIRST_CHECKBOX)
            .await
            .map_err(fail(Some(selectors::INVITE_FIRST_CHECKBOX)))?
        else {
            return Ok(EngagementOutcome::Skipped(NOT_INVITABLE.to_string()));
        };
        page.click(&checkbox)
            .await
            .map_err(fail(Some(selectors::INVITE_FIRST_CHECKBOX)))?;

        let confirm = page
            .locate(selectors::INVITE_CONFIRM)
            .await
            .map_err(fail(Some(selectors::INVITE_CONFIRM)))?
            .ok_or_else(|| EngagementError::MissingAffordance {
                selector: selectors::INVITE_CONFIRM.to_string(),
            })?;
        page.click(&confirm)
            .await
            .map_err(fail(Some(selectors::INVITE_CONFIRM)))?;

        self.limiter.wait(Some(CONFIRM_WAIT.0), Some(CONFIRM_WAIT.1)).await;
        Ok(EngagementOutcome::Sent)
    }
}
