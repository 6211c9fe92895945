//! Comment extraction from a thread's detail view
//!
//! Walks the comment items inside a response container in encounter order.
//! Every comment is extracted in isolation: a failing step degrades only that
//! comment (or only that field), never its siblings.

use chrono::NaiveDateTime;
use std::time::Duration;

use crate::browser::{settle, Browser};
use crate::models::{ResponseRecord, ResponseRole, ThreadResponses, TimestampPair};
use crate::parser::{ForumSelectors, TimestampResolver};
use crate::utils::error::ExtractError;
use crate::utils::truncate_text;

/// Extracts role-tagged responses from a response container
pub struct CommentExtractor<'c> {
    selectors: &'c ForumSelectors,
    resolver: &'c TimestampResolver,
    organization: &'c str,
    post_expand_delay: Duration,
}

impl<'c> CommentExtractor<'c> {
    pub fn new(
        selectors: &'c ForumSelectors,
        resolver: &'c TimestampResolver,
        organization: &'c str,
        post_expand_delay: Duration,
    ) -> Self {
        Self {
            selectors,
            resolver,
            organization,
            post_expand_delay,
        }
    }

    /// Extract every comment in `container`
    ///
    /// `query_instant` is the resolved query time; when it is `None` comment
    /// ages are resolved against the current instant instead.
    ///
    /// # Errors
    /// Fails only when the comment items themselves cannot be listed.
    pub async fn extract<B: Browser>(
        &self,
        browser: &mut B,
        container: &B::Element,
        query_instant: Option<NaiveDateTime>,
    ) -> Result<ThreadResponses, ExtractError> {
        let comments = browser
            .find_all(Some(container), &self.selectors.comment)
            .await?;

        tracing::debug!(count = comments.len(), "Found comments");

        let anchor = query_instant.unwrap_or_else(|| self.resolver.now());
        let mut records = Vec::with_capacity(comments.len());
        for (i, comment) in comments.iter().enumerate() {
            let record = self
                .extract_comment(browser, comment, i + 1, query_instant, anchor)
                .await;
            records.push(record);
        }

        Ok(ThreadResponses::new(records))
    }

    async fn extract_comment<B: Browser>(
        &self,
        browser: &mut B,
        comment: &B::Element,
        index: usize,
        query_instant: Option<NaiveDateTime>,
        anchor: NaiveDateTime,
    ) -> ResponseRecord {
        let role = self.classify(browser, comment, index).await;
        let timing = self
            .timing(browser, comment, index, query_instant, anchor)
            .await;

        let text = match self.body_text(browser, comment).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(index, error = %e, "Failed to extract comment body");
                None
            }
        };

        ResponseRecord {
            index,
            role,
            text,
            timing,
        }
    }

    /// Author role from the label; `Unknown` when the label is unavailable
    async fn classify<B: Browser>(
        &self,
        browser: &mut B,
        comment: &B::Element,
        index: usize,
    ) -> ResponseRole {
        let label = match browser
            .find(Some(comment), &self.selectors.author_label)
            .await
        {
            Ok(Some(label)) => label,
            Ok(None) => {
                tracing::debug!(index, "No author label");
                return ResponseRole::Unknown;
            }
            Err(e) => {
                tracing::debug!(index, error = %e, "Author label lookup failed");
                return ResponseRole::Unknown;
            }
        };

        match browser.text(&label).await {
            Ok(text) => ResponseRole::classify(&text, self.organization),
            Err(e) => {
                tracing::debug!(index, error = %e, "Author label unreadable");
                ResponseRole::Unknown
            }
        }
    }

    /// Raw comment age and its distance from the query
    async fn timing<B: Browser>(
        &self,
        browser: &mut B,
        comment: &B::Element,
        index: usize,
        query_instant: Option<NaiveDateTime>,
        anchor: NaiveDateTime,
    ) -> Option<TimestampPair> {
        let age = match browser.find(Some(comment), &self.selectors.comment_age).await {
            Ok(Some(age)) => age,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(index, error = %e, "Comment age lookup failed");
                return None;
            }
        };

        let raw = match browser.text(&age).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(index, error = %e, "Comment age unreadable");
                return None;
            }
        };

        let category = self.resolver.diff(anchor, &raw);
        if !category.is_resolved() {
            tracing::debug!(index, raw = %raw, "Unresolved comment timestamp");
        }

        Some(TimestampPair {
            query_instant,
            response_raw: raw,
            response_category: category,
        })
    }

    /// Expand a truncated post, then join its non-empty text spans
    async fn body_text<B: Browser>(
        &self,
        browser: &mut B,
        comment: &B::Element,
    ) -> Result<String, ExtractError> {
        let body = browser
            .find(Some(comment), &self.selectors.comment_body)
            .await?
            .ok_or_else(|| ExtractError::MissingElement(self.selectors.comment_body.clone()))?;

        self.expand_post(browser, &body).await;

        let inner = browser
            .find(Some(&body), &self.selectors.body_inner)
            .await?
            .ok_or_else(|| ExtractError::MissingElement(self.selectors.body_inner.clone()))?;

        let spans = browser
            .find_all(Some(&inner), &self.selectors.text_span)
            .await?;

        let mut parts = Vec::with_capacity(spans.len());
        for span in &spans {
            let text = browser.text(span).await?;
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }

        let joined = parts.join(" ");
        tracing::trace!(spans = spans.len(), text = %truncate_text(&joined, 80), "Extracted comment body");
        Ok(joined)
    }

    /// Click the "expand post" control when present
    async fn expand_post<B: Browser>(&self, browser: &mut B, body: &B::Element) {
        let link = match browser.find(Some(body), &self.selectors.expand_link).await {
            Ok(Some(link)) => link,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(error = %e, "Expand link lookup failed");
                return;
            }
        };

        match browser.click(&link).await {
            Ok(()) => {
                tracing::debug!("Expanded truncated post");
                settle(self.post_expand_delay).await;
            }
            Err(e) => tracing::debug!(error = %e, "Failed to expand post"),
        }
    }
}
