//! Forum crawling
//!
//! This module wires the crawl together: expand the thread list, walk the
//! first `sample_size` threads one at a time, and collect one row per thread.
//!
//! - [`pagination`] - reveal-more expansion of the thread list
//! - [`thread`] - per-thread navigation through a scoped detail view
//! - [`comment`] - per-comment extraction inside a detail view

pub mod comment;
pub mod pagination;
pub mod thread;

use anyhow::{Context, Result};
use std::time::Instant;
use tokio::sync::watch;
use url::Url;

use crate::browser::Browser;
use crate::config::Config;
use crate::models::CrawlStats;
use crate::parser::TimestampResolver;
use crate::storage::{ResultCollector, ResultTable};
use crate::utils::error::CrawlerError;

pub use comment::CommentExtractor;
pub use pagination::{Expansion, PaginationExpander};
pub use thread::ThreadNavigator;

/// Handle for stopping a running crawl between threads
#[derive(Clone)]
pub struct ShutdownHandle {
    sender: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request the crawl to stop after the current thread
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
    }
}

/// Sequential forum crawler
pub struct ForumCrawler {
    config: Config,
    resolver: TimestampResolver,
    base_url: Url,
    shutdown: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ForumCrawler {
    /// Create a crawler anchored to the local wall clock
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let base_url = Url::parse(&config.crawler.target_url)
            .with_context(|| format!("Invalid target URL: {}", config.crawler.target_url))?;
        let (shutdown, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            resolver: TimestampResolver::new(),
            base_url,
            shutdown,
            shutdown_rx,
        })
    }

    /// Replace the timestamp resolver (fixed reference clock for replays)
    #[must_use]
    pub fn with_resolver(mut self, resolver: TimestampResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Handle that stops the crawl between threads
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: self.shutdown.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawl the configured thread list
    ///
    /// Always returns an aligned table. Crawl-level failures (unreachable
    /// target, thread list that never appears, failed list lookup) and
    /// shutdown requests set `stats.aborted` and end the crawl early with
    /// whatever rows were collected.
    pub async fn run<B: Browser>(&self, browser: &mut B) -> (ResultTable, CrawlStats) {
        let start = Instant::now();
        let mut collector = ResultCollector::new();
        let mut stats = CrawlStats::default();

        tracing::info!(
            url = %self.base_url,
            sample_size = self.config.crawler.sample_size,
            "Starting crawl"
        );

        match self.crawl(browser, &mut collector, &mut stats).await {
            Ok(()) => {}
            Err(CrawlerError::ListNotReady(secs)) => {
                tracing::warn!(timeout_secs = secs, "Thread list never appeared, no threads to process");
                stats.aborted = true;
            }
            Err(e) => {
                tracing::error!(error = %e, "Crawl aborted");
                stats.aborted = true;
            }
        }

        let table = collector.finalize();
        stats.padded_cells = table.padded_cells();

        tracing::info!(
            rows = table.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            success_rate = %format!("{:.1}%", stats.success_rate() * 100.0),
            "Crawl finished: {stats}"
        );

        (table, stats)
    }

    async fn crawl<B: Browser>(
        &self,
        browser: &mut B,
        collector: &mut ResultCollector,
        stats: &mut CrawlStats,
    ) -> Result<(), CrawlerError> {
        browser.navigate(self.base_url.as_str()).await?;

        let expansion = PaginationExpander::new(&self.config)
            .expand_all(browser)
            .await?;
        stats.threads_discovered = expansion.threads.len();
        stats.expansions = expansion.expansions;

        let navigator = ThreadNavigator::new(&self.config, &self.resolver, &self.base_url);
        let sample: Vec<_> = expansion
            .threads
            .iter()
            .take(self.config.crawler.sample_size)
            .collect();

        tracing::info!(
            discovered = expansion.threads.len(),
            sampled = sample.len(),
            "Processing threads"
        );

        for summary in sample {
            if *self.shutdown_rx.borrow() {
                tracing::warn!(position = summary.position, "Shutdown requested, stopping crawl");
                stats.aborted = true;
                break;
            }

            let row = navigator.process_thread(browser, summary).await;
            stats.record_row(&row);
            collector.append_row(row);
        }

        Ok(())
    }

    /// Crawl, then release the session whatever the outcome
    pub async fn run_session<B: Browser>(&self, mut browser: B) -> (ResultTable, CrawlStats) {
        let outcome = self.run(&mut browser).await;
        if let Err(e) = browser.quit().await {
            tracing::warn!(error = %e, "Failed to close browser session");
        }
        outcome
    }
}

/// Crawl with a fresh crawler and release the session afterwards
///
/// The session is released even when the configuration is rejected.
pub async fn run_session<B: Browser>(browser: B, config: &Config) -> Result<(ResultTable, CrawlStats)> {
    match ForumCrawler::new(config.clone()) {
        Ok(crawler) => Ok(crawler.run_session(browser).await),
        Err(e) => {
            if let Err(quit_err) = browser.quit().await {
                tracing::warn!(error = %quit_err, "Failed to close browser session");
            }
            Err(e)
        }
    }
}
