use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Identifies an element on the page by its `id` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLocator(String);

impl FieldLocator {
    pub fn id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CSS attribute selector matching this id, quoted so any id is safe to embed.
    pub fn css_selector(&self) -> String {
        let quoted = serde_json::Value::String(self.0.clone()).to_string();
        format!("[id={quoted}]")
    }
}

impl fmt::Display for FieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<&str> for FieldLocator {
    fn from(id: &str) -> Self {
        Self::id(id)
    }
}

/// Special keys dispatched to elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Delete,
    ArrowLeft,
    ArrowRight,
}

impl Key {
    /// DOM `KeyboardEvent.key` name, as understood by CDP key definitions.
    pub fn name(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Delete => "Delete",
            Key::ArrowLeft => "ArrowLeft",
            Key::ArrowRight => "ArrowRight",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Snapshot of one `<option>` in a select widget.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SelectOption {
    pub index: usize,
    pub value: String,
    pub text: String,
    pub selected: bool,
}

/// Encoding used when saving a screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenshotFormat {
    Png,
    /// Lossy JPEG with the given quality (0-100).
    Jpeg(u8),
}

/// A located element handle.
#[async_trait]
pub trait FieldElement: Send + Sync {
    /// Sends `text` as keystrokes to the element, keeping the current caret or
    /// segment focus if the element already has focus.
    async fn send_keys(&self, text: &str) -> Result<()>;

    async fn press_key(&self, key: Key) -> Result<()>;

    /// Native activation (a click).
    async fn click(&self) -> Result<()>;

    /// Empties an editable field. Composite widgets reject this with
    /// [`crate::Error::ElementNotInteractable`].
    async fn clear(&self) -> Result<()>;

    /// Submits the form owning this element.
    async fn submit(&self) -> Result<()>;

    /// Checked state for radios and checkboxes.
    async fn is_selected(&self) -> Result<bool>;

    /// Current `value` as rendered by the widget.
    async fn value(&self) -> Result<String>;

    async fn is_multiple(&self) -> Result<bool>;

    /// Live option state of a select widget, in document order.
    async fn options(&self) -> Result<Vec<SelectOption>>;

    /// Sets the selectedness of the option at `index`, firing change events.
    async fn set_option_selected(&self, index: usize, selected: bool) -> Result<()>;
}

/// An open browser session. Implemented by Chrome and by the in-memory fake.
#[async_trait]
pub trait FormDriver: Send + Sync {
    type Element: FieldElement;

    async fn navigate(&self, url: &str) -> Result<()>;

    /// Resolves a locator to a live element, failing with
    /// [`crate::Error::ElementNotFound`] if nothing matches.
    async fn locate(&self, locator: &FieldLocator) -> Result<Self::Element>;

    async fn save_screenshot(&self, path: &Path, format: ScreenshotFormat) -> Result<()>;

    /// Releases the session. Further calls on the driver fail.
    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_selector_quotes_id() {
        assert_eq!(FieldLocator::id("id_checked").css_selector(), r#"[id="id_checked"]"#);
        assert_eq!(FieldLocator::id(r#"a"b"#).css_selector(), r#"[id="a\"b"]"#);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::ArrowLeft.name(), "ArrowLeft");
        assert_eq!(Key::Delete.to_string(), "Delete");
    }
}
