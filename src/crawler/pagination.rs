//! Thread list pagination
//!
//! The forum list reveals older threads through a "View More" control instead
//! of page links. The expander keeps activating that control until it is gone
//! (or the expansion cap is hit), then collects every thread-summary item.

use std::time::Duration;

use crate::browser::{settle, wait_for, Browser};
use crate::config::Config;
use crate::models::ThreadSummary;
use crate::parser::ForumSelectors;
use crate::utils::error::CrawlerError;

/// Result of expanding the thread list
#[derive(Debug, Clone)]
pub struct Expansion<E> {
    /// Every thread-summary item present after expansion, in list order
    pub threads: Vec<ThreadSummary<E>>,

    /// Number of reveal-more activations
    pub expansions: usize,

    /// Expansion stopped at the configured cap while the control was still present
    pub capped: bool,
}

/// Reveals all thread-summary items in the list view
pub struct PaginationExpander<'c> {
    selectors: &'c ForumSelectors,
    list_timeout: Duration,
    poll_interval: Duration,
    expand_delay: Duration,
    max_expansions: usize,
}

impl<'c> PaginationExpander<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            selectors: &config.selectors,
            list_timeout: config.list_timeout(),
            poll_interval: config.poll_interval(),
            expand_delay: config.expand_delay(),
            max_expansions: config.crawler.max_expansions,
        }
    }

    /// Expand the list in the active view and collect its items
    ///
    /// # Errors
    /// `ListNotReady` when no thread item appears within the list timeout;
    /// browser errors when the final item lookup fails.
    pub async fn expand_all<B: Browser>(
        &self,
        browser: &mut B,
    ) -> Result<Expansion<B::Element>, CrawlerError> {
        if wait_for(
            browser,
            None,
            &self.selectors.thread_item,
            self.list_timeout,
            self.poll_interval,
        )
        .await
        .is_none()
        {
            return Err(CrawlerError::ListNotReady(self.list_timeout.as_secs()));
        }

        let mut expansions = 0;
        let mut capped = false;

        loop {
            let control = match browser
                .find_by_text(None, &self.selectors.view_more, &self.selectors.view_more_text)
                .await
            {
                Ok(Some(control)) => control,
                Ok(None) => {
                    tracing::debug!(expansions, "No reveal-more control, list fully expanded");
                    break;
                }
                Err(e) => {
                    tracing::debug!(expansions, error = %e, "Reveal-more lookup failed, stopping");
                    break;
                }
            };

            if expansions >= self.max_expansions {
                tracing::warn!(
                    max_expansions = self.max_expansions,
                    "Reveal-more control still present at expansion cap, stopping"
                );
                capped = true;
                break;
            }

            if let Err(e) = browser.click(&control).await {
                tracing::debug!(expansions, error = %e, "Reveal-more control not clickable, stopping");
                break;
            }

            expansions += 1;
            tracing::debug!(expansions, "Revealed more threads");
            settle(self.expand_delay).await;
        }

        let threads: Vec<_> = browser
            .find_all(None, &self.selectors.thread_item)
            .await?
            .into_iter()
            .enumerate()
            .map(|(i, element)| ThreadSummary {
                position: i + 1,
                element,
            })
            .collect();

        tracing::info!(threads = threads.len(), expansions, "Thread list expanded");

        Ok(Expansion {
            threads,
            expansions,
            capped,
        })
    }
}
