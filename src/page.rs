use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::Page as CrPage;
use chromiumoxide::page::ScreenshotParams;
use tracing::debug;

use crate::driver::{FieldLocator, ScreenshotFormat};
use crate::element::ChromeElement;
use crate::error::{Error, Result};

/// Interval between element lookups while waiting for a locator to resolve.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wrapper around the chromiumoxide tab the scenario drives.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self {
            inner,
            default_timeout,
        }
    }

    /// Navigate to the given URL and wait for the page to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;
        Ok(())
    }

    /// Resolve a locator, polling until the element appears or the default
    /// timeout elapses.
    pub async fn locate(&self, locator: &FieldLocator) -> Result<ChromeElement> {
        let selector = locator.css_selector();
        let start = Instant::now();

        loop {
            match self.inner.find_element(selector.as_str()).await {
                Ok(el) => {
                    return Ok(ChromeElement::new(el, self.inner.clone(), locator.to_string()));
                }
                Err(e) if start.elapsed() < self.default_timeout => {
                    debug!(%locator, error = %e, "element not present yet");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => {
                    return Err(Error::ElementNotFound(format!(
                        "{locator} (after {:?}): {e}",
                        self.default_timeout
                    )));
                }
            }
        }
    }

    /// Capture the visible viewport and save it to a file.
    pub async fn save_screenshot(&self, path: &Path, format: ScreenshotFormat) -> Result<()> {
        let params = match format {
            ScreenshotFormat::Png => ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build(),
            ScreenshotFormat::Jpeg(quality) => ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Jpeg)
                .quality(i64::from(quality.min(100)))
                .build(),
        };
        self.inner
            .save_screenshot(params, path)
            .await
            .map_err(|e| Error::ScreenshotError(e.to_string()))?;
        Ok(())
    }
}
