use crate::automation::{selectors, Browser, PageAutomation, ScopedPage};
use crate::config::Settings;
use crate::records::{ProfileRecord, RawProfile};
use crate::search::SearchParams;
use crate::throttle::{ensure_active, RateLimiter};
use crate::{LinkreachError, Result};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;

/// Results shown on one search page
pub const PAGE_SIZE: usize = 10;

/// Lazy, finite sequence of search results
///
/// Records arrive in page order. Per-page failures are skipped; an `Err`
/// item (cancellation or a dead browser) ends the stream.
pub type ProfileStream<'a> = BoxStream<'a, Result<ProfileRecord>>;

/// Number of result pages needed to reach `limit` records
pub fn pages_for(limit: usize) -> usize {
    limit.div_ceil(PAGE_SIZE)
}

/// Paginated people search with page-level failure isolation
///
/// Duplicate ids across pages are passed through unchanged.
#[derive(Clone, Copy)]
pub struct SearchCollector<'a> {
    settings: &'a Settings,
    browser: &'a dyn Browser,
    limiter: &'a RateLimiter,
}

struct Cursor<'a> {
    collector: SearchCollector<'a>,
    params: SearchParams,
    limit: usize,
    pages: usize,
    next_page: usize,
    emitted: usize,
    buffer: VecDeque<ProfileRecord>,
    finished: bool,
}

impl<'a> SearchCollector<'a> {
    pub fn new(settings: &'a Settings, browser: &'a dyn Browser, limiter: &'a RateLimiter) -> Self {
        Self {
            settings,
            browser,
            limiter,
        }
    }

    /// Streams up to `limit` records; pages are fetched on demand
    pub fn search(self, params: SearchParams, limit: usize) -> ProfileStream<'a> {
        let pages = pages_for(limit);
        tracing::info!(task = "search", keywords = %params.keywords, limit, pages, "task started");

        let cursor = Cursor {
            collector: self,
            params,
            limit,
            pages,
            next_page: 1,
            emitted: 0,
            buffer: VecDeque::new(),
            finished: false,
        };

        stream::unfold(cursor, |mut cursor| async move {
            loop {
                if cursor.finished || cursor.emitted >= cursor.limit {
                    return None;
                }
                if let Some(record) = cursor.buffer.pop_front() {
                    cursor.emitted += 1;
                    return Some((Ok(record), cursor));
                }
                if cursor.next_page > cursor.pages {
                    tracing::info!(task = "search", found = cursor.emitted, "outcome");
                    return None;
                }

                let page = cursor.next_page;
                cursor.next_page += 1;
                match cursor.collector.collect_page(&cursor.params, page, cursor.pages).await {
                    Ok(records) => cursor.buffer.extend(records),
                    Err(err) => {
                        cursor.finished = true;
                        tracing::error!(task = "search", page, error = %err, "outcome");
                        return Some((Err(err), cursor));
                    }
                }
            }
        })
        .boxed()
    }

    /// Drains the stream into a vector
    pub async fn collect(self, params: SearchParams, limit: usize) -> Result<Vec<ProfileRecord>> {
        let mut stream = self.search(params, limit);
        let mut records = Vec::with_capacity(limit.min(PAGE_SIZE * 10));
        while let Some(item) = stream.next().await {
            records.push(item?);
        }
        Ok(records)
    }

    /// Fetches one page; recoverable failures yield an empty page
    ///
    /// Cancellation and a lost browser or page end the search instead.
    async fn collect_page(&self, params: &SearchParams, page: usize, pages: usize) -> Result<Vec<ProfileRecord>> {
        ensure_active(self.limiter.cancellation())?;
        if page > 1 {
            self.limiter.wait(None, None).await;
            ensure_active(self.limiter.cancellation())?;
        }

        let url = params.page_url(self.settings, page)?;
        let scoped = ScopedPage::open(self.browser, "search")
            .await
            .map_err(|e| LinkreachError::from_automation("search/open-page", e))?;
        let result = self.extract_page(&*scoped, &url).await;
        scoped.release().await;

        match result {
            Ok(records) => {
                tracing::info!(page, pages, found = records.len(), "search page collected");
                Ok(records)
            }
            Err(err @ (LinkreachError::Cancelled | LinkreachError::Resource { .. })) => Err(err),
            Err(err) => {
                tracing::warn!(page, pages, error = %err, "search page skipped");
                Ok(Vec::new())
            }
        }
    }

    async fn extract_page(&self, page: &dyn PageAutomation, url: &str) -> Result<Vec<ProfileRecord>> {
        let stage = "search/page";
        page.navigate(url)
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;
        page.wait_for(selectors::SEARCH_RESULT_CARD, self.settings.element_timeout())
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;

        let value = page
            .evaluate(selectors::EXTRACT_SEARCH_RESULTS)
            .await
            .map_err(|e| LinkreachError::from_automation(stage, e))?;
        let raw: Vec<RawProfile> =
            serde_json::from_value(value).map_err(|e| LinkreachError::TransientNetwork {
                stage: stage.to_string(),
                message: format!("unexpected search result shape: {}", e),
            })?;

        let total = raw.len();
        let records: Vec<ProfileRecord> = raw.into_iter().filter_map(RawProfile::into_record).collect();
        if records.len() < total {
            tracing::debug!(dropped = total - records.len(), "search cards without a profile id");
        }
        Ok(records)
    }
}
