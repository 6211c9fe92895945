//! forum-harvest - Community forum thread crawler
//!
//! Drives a browser session through a community forum's thread list, opens
//! each thread's detail view, and flattens the question plus its responses
//! into one row per thread.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`browser`] - Browsing session abstraction (WebDriver and offline fixtures)
//! - [`crawler`] - Pagination, thread navigation and comment extraction
//! - [`parser`] - DOM selectors and timestamp resolution
//! - [`models`] - Core data structures and types
//! - [`storage`] - Result collection and table export
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use forum_harvest::browser::WebDriverBrowser;
//! use forum_harvest::config::Config;
//! use forum_harvest::crawler::run_session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let browser = WebDriverBrowser::connect(&config.browser).await?;
//!     let (table, stats) = run_session(browser, &config).await?;
//!     println!("{} rows, {stats}", table.len());
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::browser::{Browser, FixtureBrowser, WebDriverBrowser};
    pub use crate::config::Config;
    pub use crate::crawler::{run_session, ForumCrawler};
    pub use crate::error::{Error, ErrorCategory, HarvestErrorTrait, Result};
    pub use crate::models::{CrawlStats, ResponseRole, ThreadRow};
    pub use crate::parser::{ForumSelectors, TimestampResolver};
    pub use crate::storage::{ResultTable, TableExporter};
}
