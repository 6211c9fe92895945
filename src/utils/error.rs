//! Error types for the forum crawler
//!
//! This module defines the domain error types used throughout the application.

use thiserror::Error;

/// Errors raised by a browsing session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// WebDriver protocol or transport failure
    #[error("WebDriver error: {0}")]
    Driver(String),

    /// CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Element handle belongs to a view that is closed or not active
    #[error("Stale element reference")]
    StaleElement,

    /// Element exists but cannot receive the action
    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    /// Requested page is not known to the session
    #[error("Unknown page: {0}")]
    UnknownPage(String),

    /// No view is currently active
    #[error("No active view")]
    NoActiveView,
}

/// Errors that can occur while extracting data from a thread
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Required element not found
    #[error("Element not found: {0}")]
    MissingElement(String),

    /// Required attribute missing on an element
    #[error("Attribute '{attribute}' missing on {selector}")]
    MissingAttribute { selector: String, attribute: String },

    /// Detail link could not be resolved to an absolute URL
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// Underlying browser failure
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

/// Crawl-level errors
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Browser error
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Extraction error
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Thread list never appeared within the timeout
    #[error("Thread list not ready after {0} seconds")]
    ListNotReady(u64),
}

impl BrowserError {
    /// Check if retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Driver(_) | Self::NotInteractable(_))
    }
}

impl ExtractError {
    /// Check if retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Browser(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

impl CrawlerError {
    /// Check if retrying the same operation may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Browser(e) => e.is_recoverable(),
            Self::Extract(e) => e.is_recoverable(),
            Self::ListNotReady(_) => true,
        }
    }
}
