//! Common test utilities

use chrono::{NaiveDate, NaiveDateTime};
use forum_harvest::config::Config;
use forum_harvest::crawler::ForumCrawler;
use forum_harvest::parser::TimestampResolver;

/// Fixed "now" for deterministic relative timestamps
pub fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

/// Configuration crawling `target_url` without any real-time pauses
pub fn fast_config(target_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.target_url = target_url.to_string();
    config.crawler.list_timeout_secs = 1;
    config.crawler.response_timeout_secs = 1;
    config.crawler.expand_delay_ms = 0;
    config.crawler.post_expand_delay_ms = 0;
    config.crawler.poll_interval_ms = 10;
    config
}

/// Crawler anchored to [`reference_time`]
pub fn crawler(config: Config) -> ForumCrawler {
    ForumCrawler::new(config)
        .expect("valid test configuration")
        .with_resolver(TimestampResolver::with_reference(reference_time()))
}
