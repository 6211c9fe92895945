//! CSS selectors for the community forum layout
//!
//! The defaults target the Salesforce community feed markup (`cuf-*` classes)
//! used by the supported forum. Every selector can be overridden from the
//! `[selectors]` section of the configuration file.

use scraper::Selector;
use serde::{Deserialize, Serialize};

/// Selector set describing where each piece of a thread lives in the DOM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumSelectors {
    /// Repeatable thread-summary item in the list view
    pub thread_item: String,

    /// Question title text, scoped to a thread item
    pub question_text: String,

    /// Query timestamp, scoped to a thread item
    pub query_timestamp: String,

    /// Element carrying the detail link, scoped to a thread item
    pub detail_link: String,

    /// Attribute holding the detail URL
    pub detail_link_attribute: String,

    /// Candidate elements for the reveal-more control
    pub view_more: String,

    /// Text the reveal-more control must contain
    pub view_more_text: String,

    /// Response container in the detail view
    pub response_container: String,

    /// Comment item, scoped to the response container
    pub comment: String,

    /// Comment body, scoped to a comment
    pub comment_body: String,

    /// Author role label, scoped to a comment
    pub author_label: String,

    /// Relative age of a comment, scoped to a comment
    pub comment_age: String,

    /// Collapsed "expand post" control, scoped to a comment body
    pub expand_link: String,

    /// Inner text wrapper, scoped to a comment body
    pub body_inner: String,

    /// Text spans, scoped to the inner text wrapper
    pub text_span: String,
}

impl Default for ForumSelectors {
    fn default() -> Self {
        Self {
            thread_item: ".cuf-feedElementIterationItem".to_string(),
            question_text: ".cuf-questionTitle .uiOutputText".to_string(),
            query_timestamp: ".cuf-timestamp".to_string(),
            detail_link: ".cuf-feedElement-wrap".to_string(),
            detail_link_attribute: "href".to_string(),
            view_more: "button".to_string(),
            view_more_text: "View More".to_string(),
            response_container: ".cuf-feedback".to_string(),
            comment: ".cuf-commentLi".to_string(),
            comment_body: ".cuf-feedBodyText".to_string(),
            author_label: "span.cuf-entityAdditionalLabel.uiOutputText".to_string(),
            comment_age: ".cuf-commentAge".to_string(),
            expand_link: "a.cuf-more:not(.hidden)".to_string(),
            body_inner: ".feedBodyInner".to_string(),
            text_span: "span.uiOutputText".to_string(),
        }
    }
}

impl ForumSelectors {
    /// Iterate over every CSS selector with its field name
    pub fn entries(&self) -> [(&'static str, &str); 14] {
        [
            ("thread_item", &self.thread_item),
            ("question_text", &self.question_text),
            ("query_timestamp", &self.query_timestamp),
            ("detail_link", &self.detail_link),
            ("view_more", &self.view_more),
            ("response_container", &self.response_container),
            ("comment", &self.comment),
            ("comment_body", &self.comment_body),
            ("author_label", &self.author_label),
            ("comment_age", &self.comment_age),
            ("expand_link", &self.expand_link),
            ("body_inner", &self.body_inner),
            ("text_span", &self.text_span),
            ("detail_link_attribute", &self.detail_link_attribute),
        ]
    }

    /// Check that every selector parses as CSS
    ///
    /// # Errors
    /// Returns the name of the first field holding an invalid selector
    pub fn validate(&self) -> Result<(), String> {
        for (name, css) in self.entries() {
            if css.trim().is_empty() {
                return Err(format!("selector '{name}' must not be empty"));
            }
            if name == "detail_link_attribute" {
                continue;
            }
            if Selector::parse(css).is_err() {
                return Err(format!("selector '{name}' is not valid CSS: {css}"));
            }
        }

        if self.view_more_text.trim().is_empty() {
            return Err("view_more_text must not be empty".to_string());
        }

        Ok(())
    }
}
