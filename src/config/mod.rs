//! Configuration management for the forum crawler
//!
//! This module handles loading and validating configuration from environment variables,
//! files, and command-line arguments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::parser::selectors::ForumSelectors;

/// Default forum topic crawled when no URL is given
pub const DEFAULT_TARGET_URL: &str =
    "https://customer.cradlepoint.com/s/topic/0TO38000000Q3MGGA0/security";

/// Upper bound for the bounded waits, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Crawler configuration
    pub crawler: CrawlerConfig,

    /// Browser session configuration
    pub browser: BrowserConfig,

    /// DOM selectors for the forum layout
    pub selectors: ForumSelectors,

    /// Output configuration
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Crawler-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Thread list URL
    pub target_url: String,

    /// Name token identifying organization staff in author labels
    pub organization: String,

    /// Maximum number of threads processed per run
    pub sample_size: usize,

    /// Maximum number of reveal-more activations
    pub max_expansions: usize,

    /// Wait for the thread list, in seconds
    pub list_timeout_secs: u64,

    /// Wait for a thread's response container, in seconds
    pub response_timeout_secs: u64,

    /// Pause after each reveal-more activation, in milliseconds
    pub expand_delay_ms: u64,

    /// Pause after expanding a truncated post, in milliseconds
    pub post_expand_delay_ms: u64,

    /// Polling interval for bounded waits, in milliseconds
    pub poll_interval_ms: u64,
}

/// Supported WebDriver browsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    /// Parse from a CLI/env string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Some(Self::Chrome),
            "firefox" | "gecko" => Some(Self::Firefox),
            _ => None,
        }
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Browser to drive
    pub kind: BrowserKind,

    /// WebDriver server endpoint (chromedriver, geckodriver, selenium)
    pub webdriver_url: String,

    /// Run without a visible window
    pub headless: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output table path; `.json` selects JSON, anything else CSV
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            organization: String::from("Cradlepoint"),
            sample_size: 15,
            max_expansions: 200,
            list_timeout_secs: 10,
            response_timeout_secs: 10,
            expand_delay_ms: 2000,
            post_expand_delay_ms: 1000,
            poll_interval_ms: 250,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chrome,
            webdriver_url: String::from("http://localhost:9515"),
            headless: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("forum_threads.csv"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FORUM_HARVEST_TARGET_URL") {
            config.crawler.target_url = url;
        }

        if let Ok(organization) = std::env::var("FORUM_HARVEST_ORGANIZATION") {
            config.crawler.organization = organization;
        }

        if let Some(sample_size) = env_parse::<usize>("FORUM_HARVEST_SAMPLE_SIZE") {
            config.crawler.sample_size = sample_size;
        }

        if let Some(max_expansions) = env_parse::<usize>("FORUM_HARVEST_MAX_EXPANSIONS") {
            config.crawler.max_expansions = max_expansions;
        }

        if let Some(timeout) = env_parse::<u64>("FORUM_HARVEST_LIST_TIMEOUT") {
            config.crawler.list_timeout_secs = timeout;
        }

        if let Some(timeout) = env_parse::<u64>("FORUM_HARVEST_RESPONSE_TIMEOUT") {
            config.crawler.response_timeout_secs = timeout;
        }

        if let Ok(kind) = std::env::var("FORUM_HARVEST_BROWSER") {
            config.browser.kind = BrowserKind::parse(&kind)
                .with_context(|| format!("Unknown browser in FORUM_HARVEST_BROWSER: {kind}"))?;
        }

        if let Ok(webdriver_url) = std::env::var("FORUM_HARVEST_WEBDRIVER_URL") {
            config.browser.webdriver_url = webdriver_url;
        }

        if let Some(headless) = env_parse::<bool>("FORUM_HARVEST_HEADLESS") {
            config.browser.headless = headless;
        }

        if let Ok(path) = std::env::var("FORUM_HARVEST_OUTPUT") {
            config.output.path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("FORUM_HARVEST_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("FORUM_HARVEST_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.crawler.target_url)
            .with_context(|| format!("target_url is not a valid URL: {}", self.crawler.target_url))?;

        if self.crawler.organization.trim().is_empty() {
            anyhow::bail!("organization must not be empty");
        }

        if self.crawler.sample_size == 0 {
            anyhow::bail!("sample_size must be greater than 0");
        }

        if self.crawler.max_expansions == 0 {
            anyhow::bail!("max_expansions must be greater than 0");
        }

        for (name, secs) in [
            ("list_timeout_secs", self.crawler.list_timeout_secs),
            ("response_timeout_secs", self.crawler.response_timeout_secs),
        ] {
            if secs == 0 || secs > MAX_TIMEOUT_SECS {
                anyhow::bail!("{name} must be between 1 and {MAX_TIMEOUT_SECS}");
            }
        }

        if self.crawler.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        self.selectors
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid selectors: {e}"))?;

        Ok(())
    }

    /// Wait for the thread list as Duration
    #[must_use]
    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.list_timeout_secs)
    }

    /// Wait for a response container as Duration
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.crawler.response_timeout_secs)
    }

    /// Pause after a reveal-more activation as Duration
    #[must_use]
    pub fn expand_delay(&self) -> Duration {
        Duration::from_millis(self.crawler.expand_delay_ms)
    }

    /// Pause after expanding a post as Duration
    #[must_use]
    pub fn post_expand_delay(&self) -> Duration {
        Duration::from_millis(self.crawler.post_expand_delay_ms)
    }

    /// Polling interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.crawler.poll_interval_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_sample_size() {
        let mut config = Config::default();
        config.crawler.sample_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_target_url() {
        let mut config = Config::default();
        config.crawler.target_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = Config::default();
        config.crawler.list_timeout_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawler.response_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawler.response_timeout_secs = MAX_TIMEOUT_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversion() {
        let config = Config::default();
        assert_eq!(config.list_timeout(), Duration::from_secs(10));
        assert_eq!(config.expand_delay(), Duration::from_millis(2000));
        assert_eq!(config.post_expand_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            sample_size = 3

            [browser]
            kind = "firefox"
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.sample_size, 3);
        assert_eq!(config.crawler.organization, "Cradlepoint");
        assert_eq!(config.browser.kind, BrowserKind::Firefox);
        assert_eq!(config.output.path, PathBuf::from("forum_threads.csv"));
    }

    #[test]
    fn test_browser_kind_parse() {
        assert_eq!(BrowserKind::parse("Chrome"), Some(BrowserKind::Chrome));
        assert_eq!(BrowserKind::parse("gecko"), Some(BrowserKind::Firefox));
        assert_eq!(BrowserKind::parse("lynx"), None);
    }
}
