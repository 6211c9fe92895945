//! Per-thread navigation
//!
//! Reads the summary fields from a thread's list item, opens its detail page
//! in a separate view, extracts the responses and always returns to the list
//! view before handing back a row.

use chrono::NaiveDateTime;
use std::time::Duration;
use url::Url;

use super::comment::CommentExtractor;
use crate::browser::{wait_for, Browser, DetailView};
use crate::config::Config;
use crate::models::{ThreadResponses, ThreadRow, ThreadSummary, NOT_AVAILABLE};
use crate::parser::{ForumSelectors, TimestampResolver};
use crate::utils::error::ExtractError;

/// Turns one thread-summary item into a row
pub struct ThreadNavigator<'c> {
    selectors: &'c ForumSelectors,
    resolver: &'c TimestampResolver,
    organization: &'c str,
    base_url: &'c Url,
    response_timeout: Duration,
    poll_interval: Duration,
    extractor: CommentExtractor<'c>,
}

impl<'c> ThreadNavigator<'c> {
    /// Navigator resolving relative detail links against `base_url`
    pub fn new(config: &'c Config, resolver: &'c TimestampResolver, base_url: &'c Url) -> Self {
        Self {
            selectors: &config.selectors,
            resolver,
            organization: &config.crawler.organization,
            base_url,
            response_timeout: config.response_timeout(),
            poll_interval: config.poll_interval(),
            extractor: CommentExtractor::new(
                &config.selectors,
                resolver,
                &config.crawler.organization,
                config.post_expand_delay(),
            ),
        }
    }

    /// Process one thread
    ///
    /// Never fails: a thread that cannot be opened degrades to the failure row.
    /// On return the list view is active again.
    pub async fn process_thread<B: Browser>(
        &self,
        browser: &mut B,
        summary: &ThreadSummary<B::Element>,
    ) -> ThreadRow {
        let position = summary.position;
        match self.try_process(browser, summary).await {
            Ok(row) => {
                tracing::info!(
                    position,
                    has_response = row.has_response(),
                    "Processed thread"
                );
                row
            }
            Err(e) => {
                tracing::warn!(position, error = %e, "Failed to process thread");
                ThreadRow::failed()
            }
        }
    }

    async fn try_process<B: Browser>(
        &self,
        browser: &mut B,
        summary: &ThreadSummary<B::Element>,
    ) -> Result<ThreadRow, ExtractError> {
        let item = &summary.element;
        let position = summary.position;

        let query = self.question_text(browser, item, position).await;
        let (query_timestamp, query_instant) = self.query_timestamp(browser, item, position).await;
        let link = self.detail_link(browser, item).await?;

        tracing::debug!(position, url = %link, "Opening thread");
        let mut view = DetailView::open(browser, link.as_str()).await?;
        let responses = self
            .collect_responses(view.browser(), position, query_instant)
            .await;
        view.close().await;

        Ok(match responses {
            Some(responses) => {
                ThreadRow::from_parts(query, query_timestamp, &responses, self.organization)
            }
            None => ThreadRow::without_response(query, query_timestamp),
        })
    }

    /// Question title, `N/A` when unavailable
    async fn question_text<B: Browser>(
        &self,
        browser: &mut B,
        item: &B::Element,
        position: usize,
    ) -> String {
        let text = match browser.find(Some(item), &self.selectors.question_text).await {
            Ok(Some(title)) => browser.text(&title).await.map_err(ExtractError::from),
            Ok(None) => Err(ExtractError::MissingElement(
                self.selectors.question_text.clone(),
            )),
            Err(e) => Err(e.into()),
        };

        match text {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                tracing::debug!(position, "Empty question title");
                NOT_AVAILABLE.to_string()
            }
            Err(e) => {
                tracing::warn!(position, error = %e, "Failed to read question title");
                NOT_AVAILABLE.to_string()
            }
        }
    }

    /// Formatted query instant, `N/A` and `None` when unreadable
    async fn query_timestamp<B: Browser>(
        &self,
        browser: &mut B,
        item: &B::Element,
        position: usize,
    ) -> (String, Option<NaiveDateTime>) {
        let raw = match browser.find(Some(item), &self.selectors.query_timestamp).await {
            Ok(Some(stamp)) => browser.text(&stamp).await.ok(),
            Ok(None) | Err(_) => None,
        };

        match raw.as_deref().and_then(|raw| self.resolver.parse(raw)) {
            Some(instant) => (TimestampResolver::format_instant(instant), Some(instant)),
            None => {
                tracing::debug!(position, raw = ?raw, "Unresolved query timestamp");
                (NOT_AVAILABLE.to_string(), None)
            }
        }
    }

    /// Absolute detail URL of a thread
    async fn detail_link<B: Browser>(
        &self,
        browser: &mut B,
        item: &B::Element,
    ) -> Result<Url, ExtractError> {
        let anchor = browser
            .find(Some(item), &self.selectors.detail_link)
            .await?
            .ok_or_else(|| ExtractError::MissingElement(self.selectors.detail_link.clone()))?;

        let attribute = &self.selectors.detail_link_attribute;
        let href = browser
            .attribute(&anchor, attribute)
            .await?
            .filter(|href| !href.trim().is_empty())
            .ok_or_else(|| ExtractError::MissingAttribute {
                selector: self.selectors.detail_link.clone(),
                attribute: attribute.clone(),
            })?;

        self.base_url
            .join(href.trim())
            .map_err(|e| ExtractError::InvalidLink(format!("{href}: {e}")))
    }

    /// Responses from the detail view, `None` when there is nothing to read
    async fn collect_responses<B: Browser>(
        &self,
        browser: &mut B,
        position: usize,
        query_instant: Option<NaiveDateTime>,
    ) -> Option<ThreadResponses> {
        let Some(container) = wait_for(
            browser,
            None,
            &self.selectors.response_container,
            self.response_timeout,
            self.poll_interval,
        )
        .await
        else {
            tracing::debug!(position, "Response container not found");
            return None;
        };

        match self
            .extractor
            .extract(browser, &container, query_instant)
            .await
        {
            Ok(responses) if responses.is_empty() => None,
            Ok(responses) => Some(responses),
            Err(e) => {
                tracing::warn!(position, error = %e, "Failed to extract responses");
                None
            }
        }
    }
}
