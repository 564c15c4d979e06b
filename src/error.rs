use thiserror::Error;

use crate::date::Segment;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element not interactable: {0}")]
    ElementNotInteractable(String),

    #[error("Browser session error: {0}")]
    SessionError(String),

    #[error("Navigation failed: {0}")]
    NavigationError(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotError(String),

    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("Date out of range: {0}")]
    InvalidDate(String),

    #[error("Date widget focus is on the {actual} segment, expected {expected}")]
    SegmentFocus { expected: Segment, actual: Segment },

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
