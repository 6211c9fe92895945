//! Browsing session abstraction
//!
//! The crawler never talks to a concrete browser. It drives a [`Browser`]
//! session that can locate elements, read their text, click them and manage
//! views (tabs/windows). Two sessions are provided:
//!
//! - [`webdriver::WebDriverBrowser`] - live session over the W3C WebDriver protocol
//! - [`fixture::FixtureBrowser`] - in-memory pages for offline replays and tests
//!
//! Bounded waits ([`wait_for`]) and scoped detail views ([`view::DetailView`])
//! are built on top of the trait and work with either session.

pub mod fixture;
pub mod view;
pub mod webdriver;

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::Instant;

use crate::utils::error::BrowserError;

pub use fixture::FixtureBrowser;
pub use view::DetailView;
pub use webdriver::WebDriverBrowser;

/// Result alias for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// A single-threaded browsing session
///
/// All locators are CSS selectors. Scoped lookups only match descendants of
/// the scope element. Element handles are only valid while their view is the
/// active one.
#[async_trait(?Send)]
pub trait Browser {
    /// Handle to a DOM element
    type Element: Clone + Debug;

    /// Handle to a view (tab or window)
    type View: Clone + Debug + PartialEq;

    /// Load a URL in the active view
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// URL loaded in the active view
    async fn current_url(&mut self) -> BrowserResult<String>;

    /// Locate every element matching `selector`
    async fn find_all(
        &mut self,
        scope: Option<&Self::Element>,
        selector: &str,
    ) -> BrowserResult<Vec<Self::Element>>;

    /// Rendered text of an element, whitespace-normalized
    async fn text(&mut self, element: &Self::Element) -> BrowserResult<String>;

    /// Attribute value of an element
    async fn attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
    ) -> BrowserResult<Option<String>>;

    /// Click an element
    async fn click(&mut self, element: &Self::Element) -> BrowserResult<()>;

    /// Handle of the active view
    async fn current_view(&mut self) -> BrowserResult<Self::View>;

    /// Handles of every open view
    async fn views(&mut self) -> BrowserResult<Vec<Self::View>>;

    /// Open `url` in a new view and make it active
    async fn open_view(&mut self, url: &str) -> BrowserResult<Self::View>;

    /// Make `view` the active view
    async fn switch_to(&mut self, view: &Self::View) -> BrowserResult<()>;

    /// Close the active view
    ///
    /// No view is active afterwards until [`Browser::switch_to`] is called.
    async fn close_view(&mut self) -> BrowserResult<()>;

    /// End the session and release the browser
    async fn quit(self) -> BrowserResult<()>
    where
        Self: Sized;

    /// Locate the first element matching `selector`
    async fn find(
        &mut self,
        scope: Option<&Self::Element>,
        selector: &str,
    ) -> BrowserResult<Option<Self::Element>> {
        Ok(self.find_all(scope, selector).await?.into_iter().next())
    }

    /// Locate the first element matching `selector` whose text contains `needle`
    async fn find_by_text(
        &mut self,
        scope: Option<&Self::Element>,
        selector: &str,
        needle: &str,
    ) -> BrowserResult<Option<Self::Element>> {
        for element in self.find_all(scope, selector).await? {
            match self.text(&element).await {
                Ok(text) if text.contains(needle) => return Ok(Some(element)),
                Ok(_) => {}
                Err(e) => {
                    tracing::trace!(selector, error = %e, "Skipping unreadable candidate");
                }
            }
        }
        Ok(None)
    }
}

/// Deadline offset used when `now + timeout` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Poll until an element matching `selector` is present
///
/// Returns `None` once `timeout` elapses. Lookup errors while polling count as
/// absence, so a timeout always means "feature absent" rather than failure.
pub async fn wait_for<B: Browser + ?Sized>(
    browser: &mut B,
    scope: Option<&B::Element>,
    selector: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Option<B::Element> {
    let start = Instant::now();
    let deadline = start
        .checked_add(timeout)
        .unwrap_or_else(|| start + FAR_FUTURE);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match browser.find(scope, selector).await {
            Ok(Some(element)) => {
                tracing::trace!(selector, attempt, "Wait condition satisfied");
                return Some(element);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::trace!(selector, attempt, error = %e, "Lookup failed while waiting");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(
                selector,
                attempt,
                timeout_ms = timeout.as_millis() as u64,
                "Wait timed out"
            );
            return None;
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Pause the control flow to let asynchronous rendering settle
pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
