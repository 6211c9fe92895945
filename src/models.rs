// Core data structures for the forum crawler

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parser::timestamp::RelativeCategory;

/// Cell sentinel for any unresolved or failed field
pub const NOT_AVAILABLE: &str = "N/A";

/// Response cell for a thread without any comment
pub const NO_RESPONSE: &str = "No response";

/// Query cell for a thread that failed as a whole
pub const ERROR_LOADING_QUERY: &str = "Error loading query";

/// Response cell for a thread that failed as a whole
pub const ERROR_LOADING_RESPONSE: &str = "Error loading response";

/// Thread-summary element discovered in the list view
///
/// Opaque handle to the list item plus its position in discovery order.
/// Consumed once by the thread navigator.
#[derive(Debug, Clone)]
pub struct ThreadSummary<E> {
    /// 1-based discovery position
    pub position: usize,

    /// Browser handle of the list item
    pub element: E,
}

/// Author role of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseRole {
    Unknown,
    OrgResponse,
    CustomerResponse,
}

impl ResponseRole {
    /// Classify an author label against the organization's name token
    pub fn classify(label: &str, organization: &str) -> Self {
        if label.contains(organization) {
            Self::OrgResponse
        } else {
            Self::CustomerResponse
        }
    }

    /// Human-readable label, e.g. `Cradlepoint Response`
    pub fn label(&self, organization: &str) -> String {
        match self {
            Self::Unknown => "Unknown Response".to_string(),
            Self::OrgResponse => format!("{organization} Response"),
            Self::CustomerResponse => "Customer Response".to_string(),
        }
    }
}

/// Timing of one response relative to its query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampPair {
    /// Resolved query instant, `None` when the query timestamp was unreadable
    pub query_instant: Option<NaiveDateTime>,

    /// Raw timestamp text as shown on the comment
    pub response_raw: String,

    /// Coarsest-unit distance between query and response
    pub response_category: RelativeCategory,
}

/// One comment extracted from a thread's detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    /// 1-based position within the thread's response list
    pub index: usize,

    /// Classified author role
    pub role: ResponseRole,

    /// Joined body text; `None` when body extraction failed
    pub text: Option<String>,

    /// Comment timing; `None` when the comment age was absent or unreadable
    pub timing: Option<TimestampPair>,
}

impl ResponseRecord {
    /// Render as `"<Role> <index>: <text> "`
    ///
    /// Comments whose body held no text render as an empty string.
    pub fn render(&self, organization: &str) -> String {
        let label = self.role.label(organization);
        match &self.text {
            None => format!("{label} {}: {NO_RESPONSE} ", self.index),
            Some(text) if text.is_empty() => String::new(),
            Some(text) => format!("{label} {}: {text} ", self.index),
        }
    }
}

/// Ordered responses of one thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadResponses {
    pub records: Vec<ResponseRecord>,
}

impl ThreadResponses {
    pub fn new(records: Vec<ResponseRecord>) -> Self {
        Self { records }
    }

    /// Thread had no comment elements at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Concatenated, role-tagged response text or `No response`
    pub fn summary(&self, organization: &str) -> String {
        if self.records.is_empty() {
            return NO_RESPONSE.to_string();
        }

        let joined: String = self
            .records
            .iter()
            .map(|record| record.render(organization))
            .collect();
        joined.trim().to_string()
    }

    /// Timing of the first comment that carries a timestamp
    pub fn first_timing(&self) -> Option<&TimestampPair> {
        self.records.iter().find_map(|record| record.timing.as_ref())
    }
}

/// One output row per processed thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRow {
    pub query: String,
    pub query_timestamp: String,
    pub response: String,
    pub response_timestamp: String,
    pub timestamp_diff: String,
}

impl ThreadRow {
    /// Assemble a row from extracted parts
    pub fn from_parts(
        query: String,
        query_timestamp: String,
        responses: &ThreadResponses,
        organization: &str,
    ) -> Self {
        let (response_timestamp, timestamp_diff) = match responses.first_timing() {
            Some(timing) => (
                timing.response_raw.clone(),
                timing.response_category.to_string(),
            ),
            None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
        };

        Self {
            query,
            query_timestamp,
            response: responses.summary(organization),
            response_timestamp,
            timestamp_diff,
        }
    }

    /// Row for a thread whose response container never appeared
    pub fn without_response(query: String, query_timestamp: String) -> Self {
        Self {
            query,
            query_timestamp,
            response: NO_RESPONSE.to_string(),
            response_timestamp: NOT_AVAILABLE.to_string(),
            timestamp_diff: NOT_AVAILABLE.to_string(),
        }
    }

    /// Row for a thread that failed as a whole
    pub fn failed() -> Self {
        Self {
            query: ERROR_LOADING_QUERY.to_string(),
            query_timestamp: NOT_AVAILABLE.to_string(),
            response: ERROR_LOADING_RESPONSE.to_string(),
            response_timestamp: NOT_AVAILABLE.to_string(),
            timestamp_diff: NOT_AVAILABLE.to_string(),
        }
    }

    /// Whether this row is the whole-thread failure row
    pub fn is_failed(&self) -> bool {
        self.query == ERROR_LOADING_QUERY && self.response == ERROR_LOADING_RESPONSE
    }

    /// Whether any response text was captured
    pub fn has_response(&self) -> bool {
        self.response != NO_RESPONSE && self.response != ERROR_LOADING_RESPONSE
    }
}

/// Crawl statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    /// Thread summaries present after pagination
    pub threads_discovered: usize,

    /// Threads processed (bounded by the sample size)
    pub threads_processed: usize,

    /// Reveal-more activations
    pub expansions: usize,

    /// Rows with at least one response
    pub with_response: usize,

    /// Rows without any response
    pub without_response: usize,

    /// Rows degraded to the failure sentinels
    pub failed: usize,

    /// Cells added by the final alignment pass
    pub padded_cells: usize,

    /// Crawl stopped early: list discovery failed or shutdown was requested
    pub aborted: bool,
}

impl CrawlStats {
    /// Record the outcome of one processed thread
    pub fn record_row(&mut self, row: &ThreadRow) {
        self.threads_processed += 1;
        if row.is_failed() {
            self.failed += 1;
        } else if row.has_response() {
            self.with_response += 1;
        } else {
            self.without_response += 1;
        }
    }

    /// Share of processed threads that produced a usable row (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.threads_processed == 0 {
            return 1.0;
        }
        (self.threads_processed - self.failed) as f64 / self.threads_processed as f64
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discovered={} processed={} with_response={} without_response={} failed={} expansions={}",
            self.threads_discovered,
            self.threads_processed,
            self.with_response,
            self.without_response,
            self.failed,
            self.expansions
        )
    }
}
