use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::{SessionBuilder, SessionConfig};
use crate::driver::{FieldLocator, FormDriver, ScreenshotFormat};
use crate::element::ChromeElement;
use crate::error::{Error, Result};
use crate::page::Page;

/// Chrome flags that keep the automated window quiet without affecting forms.
const DEFAULT_ARGS: &[&str] = &[
    "disable-extensions",
    "no-default-browser-check",
    "no-first-run",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
    "disable-translate",
];

/// A launched Chrome instance with one tab.
pub struct ChromeSession {
    browser: CrBrowser,
    page: Page,
    closed: bool,
    handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeSession {
    /// Create a new SessionBuilder for configuring and launching a browser.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Launch Chrome with the given configuration and open a blank tab.
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        for arg in DEFAULT_ARGS {
            builder = builder.arg(*arg);
        }

        // chromiumoxide adds the `--` prefix, ("key", "value") becomes --key=value
        if let Some(ref locale) = config.locale {
            builder = builder.arg(("lang", locale.as_str()));
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder.viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        });

        let cr_config = builder.build().map_err(Error::SessionError)?;

        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| Error::SessionError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler error");
                }
            }
        });

        let cr_page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(Error::SessionError(format!("failed to open tab: {e}")));
            }
        };

        info!(headless = config.headless, "browser session opened");

        Ok(Self {
            browser,
            page: Page::new(cr_page, config.default_timeout),
            closed: false,
            handler_task,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::SessionError("session is closed".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FormDriver for ChromeSession {
    type Element = ChromeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        info!(url, "navigating");
        self.page.goto(url).await
    }

    async fn locate(&self, locator: &FieldLocator) -> Result<ChromeElement> {
        self.ensure_open()?;
        self.page.locate(locator).await
    }

    async fn save_screenshot(&self, path: &Path, format: ScreenshotFormat) -> Result<()> {
        self.ensure_open()?;
        self.page.save_screenshot(path, format).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| Error::SessionError(format!("failed to close browser: {e}")));

        // Chrome never exits on its own if the close command was lost, so
        // waiting on it would block forever.
        let reaped = match Reap::after(&closed) {
            Reap::Wait => self.browser.wait().await.map(|_| ()),
            Reap::Kill => {
                warn!("close command failed, killing Chrome");
                self.browser.kill().await.unwrap_or(Ok(()))
            }
        };
        self.handler_task.abort();
        info!("browser session closed");

        closed?;
        reaped?;
        Ok(())
    }
}

/// How the Chrome process is reaped once the close command has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reap {
    Wait,
    Kill,
}

impl Reap {
    fn after(closed: &Result<()>) -> Self {
        match closed {
            Ok(()) => Reap::Wait,
            Err(_) => Reap::Kill,
        }
    }
}
