//! Unified error handling for the forum-harvest crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`HarvestErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::utils::error::{BrowserError, CrawlerError, ExtractError};

/// Common trait for all forum-harvest error types
pub trait HarvestErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Browser session errors (driver, stale handles, views)
    Browser,
    /// DOM extraction errors
    Extraction,
    /// Output and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short human-readable description of the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Browser => "browser error",
            Self::Extraction => "extraction error",
            Self::Storage => "storage error",
            Self::Config => "configuration error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the forum-harvest crate
#[derive(Error, Debug)]
pub enum Error {
    /// Browser session errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Crawl-level errors
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl HarvestErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Browser(e) => e.is_recoverable(),
            Self::Extract(e) => e.is_recoverable(),
            Self::Crawler(e) => e.is_recoverable(),
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) | Self::Csv(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Browser(_) => ErrorCategory::Browser,
            Self::Extract(_) => ErrorCategory::Extraction,
            Self::Crawler(e) => match e {
                CrawlerError::Extract(_) => ErrorCategory::Extraction,
                CrawlerError::Browser(_) | CrawlerError::ListNotReady(_) => ErrorCategory::Browser,
            },
            Self::Io(_) | Self::Json(_) | Self::Csv(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
