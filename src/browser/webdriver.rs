//! Live browsing session over the W3C WebDriver protocol
//!
//! Talks to a running chromedriver/geckodriver (or Selenium grid) through
//! `thirtyfour`. Views map to WebDriver window handles.

use async_trait::async_trait;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;

use super::{Browser, BrowserResult};
use crate::config::{BrowserConfig, BrowserKind};
use crate::utils::error::BrowserError;
use crate::utils::normalize_whitespace;

fn driver_error(e: WebDriverError) -> BrowserError {
    BrowserError::Driver(e.to_string())
}

/// WebDriver-backed browsing session
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Start a session on the configured WebDriver endpoint
    pub async fn connect(config: &BrowserConfig) -> BrowserResult<Self> {
        tracing::info!(
            kind = ?config.kind,
            endpoint = %config.webdriver_url,
            headless = config.headless,
            "Starting WebDriver session"
        );

        let driver = match config.kind {
            BrowserKind::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                if config.headless {
                    caps.set_headless().map_err(driver_error)?;
                }
                caps.add_arg("--window-size=1920,1080")
                    .map_err(driver_error)?;
                WebDriver::new(config.webdriver_url.as_str(), caps).await
            }
            BrowserKind::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if config.headless {
                    caps.set_headless().map_err(driver_error)?;
                }
                WebDriver::new(config.webdriver_url.as_str(), caps).await
            }
        }
        .map_err(driver_error)?;

        Ok(Self { driver })
    }
}

#[async_trait(?Send)]
impl Browser for WebDriverBrowser {
    type Element = WebElement;
    type View = WindowHandle;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        tracing::debug!(url, "Navigating");
        self.driver.goto(url).await.map_err(driver_error)
    }

    async fn current_url(&mut self) -> BrowserResult<String> {
        let url = self.driver.current_url().await.map_err(driver_error)?;
        Ok(url.to_string())
    }

    async fn find_all(
        &mut self,
        scope: Option<&WebElement>,
        selector: &str,
    ) -> BrowserResult<Vec<WebElement>> {
        let found = match scope {
            Some(element) => element.find_all(By::Css(selector)).await,
            None => self.driver.find_all(By::Css(selector)).await,
        };
        found.map_err(driver_error)
    }

    async fn text(&mut self, element: &WebElement) -> BrowserResult<String> {
        let text = element.text().await.map_err(driver_error)?;
        Ok(normalize_whitespace(&text))
    }

    async fn attribute(&mut self, element: &WebElement, name: &str) -> BrowserResult<Option<String>> {
        element.attr(name).await.map_err(driver_error)
    }

    async fn click(&mut self, element: &WebElement) -> BrowserResult<()> {
        element.click().await.map_err(driver_error)
    }

    async fn current_view(&mut self) -> BrowserResult<WindowHandle> {
        self.driver.window().await.map_err(driver_error)
    }

    async fn views(&mut self) -> BrowserResult<Vec<WindowHandle>> {
        self.driver.windows().await.map_err(driver_error)
    }

    async fn open_view(&mut self, url: &str) -> BrowserResult<WindowHandle> {
        let handle = self.driver.new_tab().await.map_err(driver_error)?;
        self.driver
            .switch_to_window(handle.clone())
            .await
            .map_err(driver_error)?;
        self.driver.goto(url).await.map_err(driver_error)?;
        Ok(handle)
    }

    async fn switch_to(&mut self, view: &WindowHandle) -> BrowserResult<()> {
        self.driver
            .switch_to_window(view.clone())
            .await
            .map_err(driver_error)
    }

    async fn close_view(&mut self) -> BrowserResult<()> {
        self.driver.close_window().await.map_err(driver_error)
    }

    async fn quit(self) -> BrowserResult<()> {
        tracing::info!("Ending WebDriver session");
        self.driver.quit().await.map_err(driver_error)
    }
}
