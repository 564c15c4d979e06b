use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::element::Element as CrElement;
use chromiumoxide::page::Page as CrPage;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::driver::{FieldElement, Key, SelectOption};
use crate::error::{Error, Result};

/// Result of a DOM-side operation that the page may refuse.
#[derive(Debug, serde::Deserialize)]
struct Outcome {
    ok: bool,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    reason: String,
}

impl Outcome {
    fn into_result(self) -> Result<()> {
        match (self.ok, self.missing) {
            (true, _) => Ok(()),
            (false, true) => Err(Error::ElementNotFound(self.reason)),
            (false, false) => Err(Error::ElementNotInteractable(self.reason)),
        }
    }
}

const FOCUS_JS: &str = r#"
    function() {
        if (document.activeElement !== this) {
            this.focus();
        }
        return JSON.stringify({ ok: true });
    }
"#;

// Composite inputs reject clear the same way WebDriver's "user-editable" check does.
const CLEAR_JS: &str = r#"
    function() {
        const blocked = ['date', 'datetime-local', 'month', 'time', 'week',
            'checkbox', 'radio', 'button', 'submit', 'reset', 'file', 'image',
            'hidden', 'range', 'color'];
        const isInput = this.tagName === 'INPUT' && !blocked.includes(this.type);
        const editable = isInput || this.tagName === 'TEXTAREA' || this.isContentEditable;
        if (!editable || this.readOnly || this.disabled) {
            return JSON.stringify({
                ok: false,
                reason: 'Element must be user-editable in order to clear it'
            });
        }
        this.focus();
        if (this.isContentEditable && !isInput && this.tagName !== 'TEXTAREA') {
            this.innerHTML = '';
        } else {
            this.value = '';
        }
        this.dispatchEvent(new Event('input', { bubbles: true }));
        this.dispatchEvent(new Event('change', { bubbles: true }));
        this.blur();
        return JSON.stringify({ ok: true });
    }
"#;

const SUBMIT_JS: &str = r#"
    function() {
        const form = this.form || this.closest('form');
        if (!form) {
            return JSON.stringify({ ok: false, missing: true, reason: 'element is not inside a form' });
        }
        const submitter = ['submit', 'image'].includes(this.type) ? this : undefined;
        if (typeof form.requestSubmit === 'function') {
            form.requestSubmit(submitter);
        } else {
            form.submit();
        }
        return JSON.stringify({ ok: true });
    }
"#;

const IS_SELECTED_JS: &str = r#"
    function() { return JSON.stringify(!!(this.checked || this.selected)); }
"#;

const VALUE_JS: &str = r#"
    function() { return JSON.stringify(this.value == null ? '' : String(this.value)); }
"#;

const IS_MULTIPLE_JS: &str = r#"
    function() { return JSON.stringify(!!this.multiple); }
"#;

const OPTIONS_JS: &str = r#"
    function() {
        if (!this.options) {
            return JSON.stringify(null);
        }
        return JSON.stringify(Array.from(this.options).map((o, i) => ({
            index: i,
            value: o.value,
            text: (o.text || '').trim(),
            selected: o.selected
        })));
    }
"#;

/// A chromiumoxide element behind the [`FieldElement`] seam.
pub struct ChromeElement {
    inner: CrElement,
    page: CrPage,
    label: String,
}

impl ChromeElement {
    pub(crate) fn new(inner: CrElement, page: CrPage, label: String) -> Self {
        Self { inner, page, label }
    }

    /// Calls `function` with `this` bound to the element and decodes the JSON
    /// string it returns.
    async fn call_json<T: DeserializeOwned>(&self, function: &str) -> Result<T> {
        let returns = self.inner.call_js_fn(function, false).await?;
        if let Some(details) = returns.exception_details {
            return Err(Error::JsError(format!("{}: {}", self.label, details.text)));
        }
        let raw = returns
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::JsError(format!("{}: script returned no value", self.label)))?;
        serde_json::from_str(raw).map_err(|e| Error::JsError(e.to_string()))
    }

    async fn run(&self, function: &str) -> Result<()> {
        self.call_json::<Outcome>(function).await?.into_result()
    }

    /// Typed keystrokes for characters with a key definition, IME-style
    /// insertion for the rest (e.g. Japanese text).
    async fn type_run(&self, run: &str, ascii: bool) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        if ascii {
            self.inner.type_str(run).await?;
        } else {
            self.page.execute(InsertTextParams::new(run)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FieldElement for ChromeElement {
    async fn send_keys(&self, text: &str) -> Result<()> {
        debug!(element = %self.label, text, "send keys");
        self.run(FOCUS_JS).await?;

        let mut run = String::new();
        let mut run_ascii = true;
        for c in text.chars() {
            let ascii = c.is_ascii_graphic() || c == ' ';
            if ascii != run_ascii {
                self.type_run(&run, run_ascii).await?;
                run.clear();
                run_ascii = ascii;
            }
            run.push(c);
        }
        self.type_run(&run, run_ascii).await
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        debug!(element = %self.label, %key, "press key");
        self.run(FOCUS_JS).await?;
        self.inner.press_key(key.name()).await?;
        Ok(())
    }

    async fn click(&self) -> Result<()> {
        debug!(element = %self.label, "click");
        self.inner.click().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.run(CLEAR_JS)
            .await
            .map_err(|e| match e {
                Error::ElementNotInteractable(reason) => {
                    Error::ElementNotInteractable(format!("{}: {reason}", self.label))
                }
                other => other,
            })
    }

    async fn submit(&self) -> Result<()> {
        debug!(element = %self.label, "submit");
        self.run(SUBMIT_JS).await
    }

    async fn is_selected(&self) -> Result<bool> {
        self.call_json(IS_SELECTED_JS).await
    }

    async fn value(&self) -> Result<String> {
        self.call_json(VALUE_JS).await
    }

    async fn is_multiple(&self) -> Result<bool> {
        self.call_json(IS_MULTIPLE_JS).await
    }

    async fn options(&self) -> Result<Vec<SelectOption>> {
        self.call_json::<Option<Vec<SelectOption>>>(OPTIONS_JS)
            .await?
            .ok_or_else(|| {
                Error::ElementNotInteractable(format!("{} is not a select element", self.label))
            })
    }

    async fn set_option_selected(&self, index: usize, selected: bool) -> Result<()> {
        let js = format!(
            r#"
            function() {{
                const option = this.options ? this.options[{index}] : undefined;
                if (!option) {{
                    return JSON.stringify({{ ok: false, missing: true, reason: 'no option at index {index}' }});
                }}
                option.selected = {selected};
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return JSON.stringify({{ ok: true }});
            }}
            "#,
        );
        self.run(&js).await
    }
}
