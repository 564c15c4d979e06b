use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::date::{Segment, SEGMENT_WIDTHS};
use crate::driver::{FieldElement, FieldLocator, FormDriver, Key, ScreenshotFormat, SelectOption};
use crate::error::{Error, Result};
use crate::scenario::form;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One call made against the fake page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Navigate(String),
    Keys(String, String),
    Key(String, Key),
    Click(String),
    Clear(String),
    Submit(String),
    SelectOption(String, usize, bool),
    Screenshot(PathBuf),
}

#[derive(Debug, Clone)]
enum WidgetKind {
    Text,
    TextArea,
    Date(DateField),
    Checkbox,
    Radio { group: String },
    Select { multiple: bool, options: Vec<SelectOption> },
    Button,
}

#[derive(Debug, Clone)]
struct Widget {
    kind: WidgetKind,
    text: String,
    checked: bool,
}

impl Widget {
    fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            text: String::new(),
            checked: false,
        }
    }

    fn value(&self) -> String {
        match &self.kind {
            WidgetKind::Text | WidgetKind::TextArea => self.text.clone(),
            WidgetKind::Date(field) => field.value(),
            WidgetKind::Checkbox | WidgetKind::Radio { .. } => "on".to_string(),
            WidgetKind::Select { options, .. } => options
                .iter()
                .find(|o| o.selected)
                .map(|o| o.value.clone())
                .unwrap_or_default(),
            WidgetKind::Button => String::new(),
        }
    }
}

/// Simulated Chrome date input: year, month and day segments.
///
/// Typed digits accumulate in the focused segment. The first digit after
/// focus arrives replaces the segment's content, and a segment that reaches
/// its width passes focus to the next one.
#[derive(Debug, Clone)]
struct DateField {
    segments: [Option<u32>; 3],
    focus: Segment,
    typed: usize,
}

impl DateField {
    fn new(initial: Option<NaiveDate>) -> Self {
        let segments = match initial {
            Some(date) => [
                u32::try_from(date.year()).ok(),
                Some(date.month()),
                Some(date.day()),
            ],
            None => [None; 3],
        };
        Self {
            segments,
            focus: Segment::Year,
            typed: 0,
        }
    }

    fn type_char(&mut self, c: char) {
        let Some(digit) = c.to_digit(10) else {
            return;
        };
        let i = self.focus.index();
        let current = if self.typed == 0 {
            0
        } else {
            self.segments[i].unwrap_or(0)
        };
        self.segments[i] = Some(current * 10 + digit);
        self.typed += 1;
        if self.typed == SEGMENT_WIDTHS[i] {
            self.move_to(self.focus.next());
        }
    }

    fn press(&mut self, key: Key) {
        match key {
            Key::Delete => {
                self.segments[self.focus.index()] = None;
                self.typed = 0;
            }
            Key::ArrowLeft => self.move_to(self.focus.prev()),
            Key::ArrowRight => self.move_to(self.focus.next()),
            Key::Enter => {}
        }
    }

    fn move_to(&mut self, segment: Segment) {
        self.focus = segment;
        self.typed = 0;
    }

    fn value(&self) -> String {
        let [Some(year), Some(month), Some(day)] = self.segments else {
            return String::new();
        };
        match i32::try_from(year)
            .ok()
            .filter(|y| *y >= 1)
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
        {
            Some(_) => format!("{year:04}-{month:02}-{day:02}"),
            None => String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    url: Option<String>,
    widgets: HashMap<String, Widget>,
    interactions: Vec<Interaction>,
    submissions: usize,
    closed: bool,
    close_calls: usize,
}

fn lock(state: &Mutex<PageState>) -> MutexGuard<'_, PageState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ensure_open(state: &PageState) -> Result<()> {
    if state.closed {
        Err(Error::SessionError("session is closed".into()))
    } else {
        Ok(())
    }
}

fn not_clearable(id: &str) -> Error {
    Error::ElementNotInteractable(format!(
        "#{id}: Element must be user-editable in order to clear it"
    ))
}

/// A fake browser session holding one page. Clones share the same page.
///
/// The date input mimics Chrome's three-segment widget: digits only, focus
/// moves on when a segment fills, and native clear is refused.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registration form the scenario targets, with today's date
    /// pre-filled in the date field.
    pub fn registration_form(today: NaiveDate) -> Self {
        let options = [("1", "select1"), ("2", "select2"), ("3", "select3")];
        Self::new()
            .with_text(form::INPUT_TEXT, "")
            .with_text_area(form::TEXT_AREA, "")
            .with_date(form::REGISTRATION_DATE, Some(today))
            .with_radio(form::PUSHED_1, "pushed", false)
            .with_radio("id_pushed_2", "pushed", true)
            .with_checkbox(form::CHECKED, false)
            .with_checkbox(form::CHECKED_MULTIPLE_1, false)
            .with_checkbox(form::CHECKED_MULTIPLE_2, false)
            .with_select(form::SELECTED, false, &options)
            .with_select(form::SELECTED_MULTIPLE, true, &options)
            .with_button(form::SAVE)
    }

    fn with_widget(self, id: &str, widget: Widget) -> Self {
        lock(&self.state).widgets.insert(id.to_string(), widget);
        self
    }

    pub fn with_text(self, id: &str, value: &str) -> Self {
        let mut widget = Widget::new(WidgetKind::Text);
        widget.text = value.to_string();
        self.with_widget(id, widget)
    }

    pub fn with_text_area(self, id: &str, value: &str) -> Self {
        let mut widget = Widget::new(WidgetKind::TextArea);
        widget.text = value.to_string();
        self.with_widget(id, widget)
    }

    pub fn with_date(self, id: &str, initial: Option<NaiveDate>) -> Self {
        self.with_widget(id, Widget::new(WidgetKind::Date(DateField::new(initial))))
    }

    pub fn with_checkbox(self, id: &str, checked: bool) -> Self {
        let mut widget = Widget::new(WidgetKind::Checkbox);
        widget.checked = checked;
        self.with_widget(id, widget)
    }

    pub fn with_radio(self, id: &str, group: &str, checked: bool) -> Self {
        let mut widget = Widget::new(WidgetKind::Radio {
            group: group.to_string(),
        });
        widget.checked = checked;
        self.with_widget(id, widget)
    }

    /// A select whose options are `(value, text)` pairs, none selected.
    pub fn with_select(self, id: &str, multiple: bool, options: &[(&str, &str)]) -> Self {
        let options = options
            .iter()
            .enumerate()
            .map(|(index, (value, text))| SelectOption {
                index,
                value: value.to_string(),
                text: text.to_string(),
                selected: false,
            })
            .collect();
        self.with_widget(id, Widget::new(WidgetKind::Select { multiple, options }))
    }

    pub fn with_button(self, id: &str) -> Self {
        self.with_widget(id, Widget::new(WidgetKind::Button))
    }

    /// Handle to `id` without going through `locate`.
    pub fn element(&self, id: &str) -> FakeElement {
        FakeElement {
            id: id.to_string(),
            state: Arc::clone(&self.state),
        }
    }

    /// Current `value` of a widget, `None` if it does not exist.
    pub fn field_value(&self, id: &str) -> Option<String> {
        lock(&self.state).widgets.get(id).map(Widget::value)
    }

    pub fn is_checked(&self, id: &str) -> bool {
        lock(&self.state)
            .widgets
            .get(id)
            .is_some_and(|w| w.checked)
    }

    pub fn selected_values(&self, id: &str) -> Vec<String> {
        match lock(&self.state).widgets.get(id).map(|w| &w.kind) {
            Some(WidgetKind::Select { options, .. }) => options
                .iter()
                .filter(|o| o.selected)
                .map(|o| o.value.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn url(&self) -> Option<String> {
        lock(&self.state).url.clone()
    }

    pub fn submissions(&self) -> usize {
        lock(&self.state).submissions
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn close_calls(&self) -> usize {
        lock(&self.state).close_calls
    }

    /// Drains the interaction log.
    pub fn take_interactions(&self) -> Vec<Interaction> {
        std::mem::take(&mut lock(&self.state).interactions)
    }
}

#[async_trait]
impl FormDriver for FakePage {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = lock(&self.state);
        ensure_open(&state)?;
        state.interactions.push(Interaction::Navigate(url.to_string()));
        state.url = Some(url.to_string());
        Ok(())
    }

    async fn locate(&self, locator: &FieldLocator) -> Result<FakeElement> {
        let state = lock(&self.state);
        ensure_open(&state)?;
        if !state.widgets.contains_key(locator.as_str()) {
            return Err(Error::ElementNotFound(locator.to_string()));
        }
        Ok(self.element(locator.as_str()))
    }

    async fn save_screenshot(&self, path: &Path, format: ScreenshotFormat) -> Result<()> {
        {
            let mut state = lock(&self.state);
            ensure_open(&state)?;
            state
                .interactions
                .push(Interaction::Screenshot(path.to_path_buf()));
        }
        let magic = match format {
            ScreenshotFormat::Png => PNG_MAGIC,
            ScreenshotFormat::Jpeg(_) => JPEG_MAGIC,
        };
        tokio::fs::write(path, magic)
            .await
            .map_err(|e| Error::ScreenshotError(e.to_string()))
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.closed = true;
        state.close_calls += 1;
        Ok(())
    }
}

/// Element handle into a [`FakePage`].
#[derive(Debug, Clone)]
pub struct FakeElement {
    id: String,
    state: Arc<Mutex<PageState>>,
}

impl FakeElement {
    fn with_widget<T>(
        &self,
        interaction: Option<Interaction>,
        f: impl FnOnce(&mut Widget) -> Result<T>,
    ) -> Result<T> {
        let mut state = lock(&self.state);
        ensure_open(&state)?;
        if let Some(interaction) = interaction {
            state.interactions.push(interaction);
        }
        let widget = state
            .widgets
            .get_mut(&self.id)
            .ok_or_else(|| Error::ElementNotFound(format!("#{}", self.id)))?;
        f(widget)
    }
}

#[async_trait]
impl FieldElement for FakeElement {
    async fn send_keys(&self, text: &str) -> Result<()> {
        let interaction = Interaction::Keys(self.id.clone(), text.to_string());
        self.with_widget(Some(interaction), |widget| {
            match &mut widget.kind {
                WidgetKind::Text | WidgetKind::TextArea => widget.text.push_str(text),
                WidgetKind::Date(field) => text.chars().for_each(|c| field.type_char(c)),
                _ => {}
            }
            Ok(())
        })
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        let interaction = Interaction::Key(self.id.clone(), key);
        self.with_widget(Some(interaction), |widget| {
            match &mut widget.kind {
                WidgetKind::TextArea if key == Key::Enter => widget.text.push('\n'),
                WidgetKind::Date(field) => field.press(key),
                _ => {}
            }
            Ok(())
        })
    }

    async fn click(&self) -> Result<()> {
        let mut state = lock(&self.state);
        ensure_open(&state)?;
        state.interactions.push(Interaction::Click(self.id.clone()));
        let kind = state
            .widgets
            .get(&self.id)
            .map(|w| w.kind.clone())
            .ok_or_else(|| Error::ElementNotFound(format!("#{}", self.id)))?;
        match kind {
            WidgetKind::Checkbox => {
                if let Some(widget) = state.widgets.get_mut(&self.id) {
                    widget.checked = !widget.checked;
                }
            }
            WidgetKind::Radio { group } => {
                for (id, widget) in state.widgets.iter_mut() {
                    if let WidgetKind::Radio { group: other } = &widget.kind {
                        if *other == group {
                            widget.checked = *id == self.id;
                        }
                    }
                }
            }
            WidgetKind::Button => state.submissions += 1,
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let interaction = Interaction::Clear(self.id.clone());
        self.with_widget(Some(interaction), |widget| match widget.kind {
            WidgetKind::Text | WidgetKind::TextArea => {
                widget.text.clear();
                Ok(())
            }
            _ => Err(not_clearable(&self.id)),
        })
    }

    async fn submit(&self) -> Result<()> {
        let mut state = lock(&self.state);
        ensure_open(&state)?;
        state.interactions.push(Interaction::Submit(self.id.clone()));
        if !state.widgets.contains_key(&self.id) {
            return Err(Error::ElementNotFound(format!("#{}", self.id)));
        }
        state.submissions += 1;
        Ok(())
    }

    async fn is_selected(&self) -> Result<bool> {
        self.with_widget(None, |widget| Ok(widget.checked))
    }

    async fn value(&self) -> Result<String> {
        self.with_widget(None, |widget| Ok(widget.value()))
    }

    async fn is_multiple(&self) -> Result<bool> {
        self.with_widget(None, |widget| {
            Ok(matches!(widget.kind, WidgetKind::Select { multiple: true, .. }))
        })
    }

    async fn options(&self) -> Result<Vec<SelectOption>> {
        self.with_widget(None, |widget| match &widget.kind {
            WidgetKind::Select { options, .. } => Ok(options.clone()),
            _ => Err(Error::ElementNotInteractable(format!(
                "#{} is not a select element",
                self.id
            ))),
        })
    }

    async fn set_option_selected(&self, index: usize, selected: bool) -> Result<()> {
        let interaction = Interaction::SelectOption(self.id.clone(), index, selected);
        self.with_widget(Some(interaction), |widget| {
            let WidgetKind::Select { multiple, options } = &mut widget.kind else {
                return Err(Error::ElementNotInteractable(format!(
                    "#{} is not a select element",
                    self.id
                )));
            };
            if index >= options.len() {
                return Err(Error::ElementNotFound(format!(
                    "option {index} in #{}",
                    self.id
                )));
            }
            if selected && !*multiple {
                options.iter_mut().for_each(|o| o.selected = false);
            }
            options[index].selected = selected;
            Ok(())
        })
    }
}
