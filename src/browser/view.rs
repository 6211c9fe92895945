//! Scoped detail views
//!
//! A [`DetailView`] opens a URL in a new view and guarantees that, once it is
//! closed, the session is back on the view that was active before: every other
//! view is closed and the origin is re-selected. Closing is async, so it cannot
//! live in `Drop`; dropping an unclosed view is logged as an error instead.

use super::{Browser, BrowserResult};

/// A detail page opened in its own view
pub struct DetailView<'a, B: Browser> {
    browser: &'a mut B,
    origin: B::View,
    released: bool,
}

impl<'a, B: Browser> DetailView<'a, B> {
    /// Open `url` in a new view and switch to it
    ///
    /// On failure the origin view is restored before the error is returned.
    pub async fn open(browser: &'a mut B, url: &str) -> BrowserResult<Self> {
        let origin = browser.current_view().await?;

        if let Err(e) = browser.open_view(url).await {
            tracing::warn!(url, error = %e, "Failed to open detail view");
            restore_origin(browser, &origin).await;
            return Err(e);
        }

        tracing::debug!(url, "Opened detail view");
        Ok(Self {
            browser,
            origin,
            released: false,
        })
    }

    /// Session positioned on the detail view
    pub fn browser(&mut self) -> &mut B {
        &mut *self.browser
    }

    /// View that was active before the detail view was opened
    pub fn origin(&self) -> &B::View {
        &self.origin
    }

    /// Close every view except the origin and switch back to it
    ///
    /// Never fails; cleanup problems are logged.
    pub async fn close(mut self) {
        let closed = restore_origin(&mut *self.browser, &self.origin).await;
        tracing::debug!(closed, "Closed detail view");
        self.released = true;
    }
}

impl<B: Browser> Drop for DetailView<'_, B> {
    fn drop(&mut self) {
        if !self.released {
            tracing::error!("Detail view dropped without being closed; origin view not restored");
        }
    }
}

/// Close all non-origin views and re-select the origin
///
/// Returns the number of views closed.
async fn restore_origin<B: Browser + ?Sized>(browser: &mut B, origin: &B::View) -> usize {
    let views = match browser.views().await {
        Ok(views) => views,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list views during cleanup");
            Vec::new()
        }
    };

    let mut closed = 0;
    for view in views.iter().filter(|view| *view != origin) {
        if let Err(e) = browser.switch_to(view).await {
            tracing::warn!(?view, error = %e, "Failed to switch to view for closing");
            continue;
        }
        match browser.close_view().await {
            Ok(()) => closed += 1,
            Err(e) => tracing::warn!(?view, error = %e, "Failed to close view"),
        }
    }

    if let Err(e) = browser.switch_to(origin).await {
        tracing::error!(error = %e, "Failed to switch back to origin view");
    }

    closed
}
