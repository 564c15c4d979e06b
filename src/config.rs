use std::path::PathBuf;
use std::time::Duration;

use crate::browser::ChromeSession;
use crate::error::Result;

/// Page the scenario fills in.
pub const DEFAULT_TARGET_URL: &str = "http://localhost:8000/site/register/";

/// File name of the screenshot written after the form is filled.
pub const SCREENSHOT_FILE_NAME: &str = "selenium.jpg";

pub struct SessionConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
    /// Browser UI language. The date editor expects a year/month/day segment
    /// order, which is what `ja-JP` renders.
    pub locale: Option<String>,
    /// How long `locate` polls for an element before giving up (default: 30s).
    pub default_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // The operator inspects the filled form in the live window.
            headless: false,
            viewport_width: 1280,
            viewport_height: 1024,
            chrome_path: None,
            locale: Some("ja-JP".to_string()),
            default_timeout: Duration::from_secs(30),
        }
    }
}

pub struct SessionBuilder {
    config: SessionConfig,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = Some(locale.into());
        self
    }

    /// Set how long element lookups poll before failing.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    pub fn build_config(self) -> SessionConfig {
        self.config
    }

    pub async fn launch(self) -> Result<ChromeSession> {
        ChromeSession::launch(self.build_config()).await
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What the scenario runner fills in and where it leaves its artifacts.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub target_url: String,
    pub screenshot_path: PathBuf,
    /// JPEG quality of the screenshot (0-100).
    pub screenshot_quality: u8,
    /// Keep the session open until the operator presses Enter.
    pub wait_for_operator: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            screenshot_path: default_screenshot_path(),
            screenshot_quality: 90,
            wait_for_operator: true,
        }
    }
}

/// `selenium.jpg` on the desktop, or in the working directory when the
/// platform has no desktop directory.
pub fn default_screenshot_path() -> PathBuf {
    dirs::desktop_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SCREENSHOT_FILE_NAME)
}
