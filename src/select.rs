use tracing::debug;

use crate::driver::{FieldElement, SelectOption};
use crate::error::{Error, Result};

/// Selection on a `<select>` element. Reads the live options on every call.
pub struct SelectController<'a, E: FieldElement + ?Sized> {
    element: &'a E,
}

impl<'a, E: FieldElement + ?Sized> SelectController<'a, E> {
    pub fn new(element: &'a E) -> Self {
        Self { element }
    }

    pub async fn is_multiple(&self) -> Result<bool> {
        self.element.is_multiple().await
    }

    pub async fn options(&self) -> Result<Vec<SelectOption>> {
        self.element.options().await
    }

    /// Options currently selected, in document order.
    pub async fn selected_options(&self) -> Result<Vec<SelectOption>> {
        Ok(self
            .options()
            .await?
            .into_iter()
            .filter(|o| o.selected)
            .collect())
    }

    pub async fn select_by_index(&self, index: usize) -> Result<()> {
        let option = self.find(|o| o.index == index, || format!("index {index}")).await?;
        self.set(option, true).await
    }

    pub async fn select_by_value(&self, value: &str) -> Result<()> {
        let option = self.find(|o| o.value == value, || format!("value {value:?}")).await?;
        self.set(option, true).await
    }

    pub async fn select_by_text(&self, text: &str) -> Result<()> {
        let option = self.find(|o| o.text == text, || format!("text {text:?}")).await?;
        self.set(option, true).await
    }

    pub async fn deselect_by_index(&self, index: usize) -> Result<()> {
        self.ensure_multiple().await?;
        let option = self.find(|o| o.index == index, || format!("index {index}")).await?;
        self.set(option, false).await
    }

    pub async fn deselect_by_value(&self, value: &str) -> Result<()> {
        self.ensure_multiple().await?;
        let option = self.find(|o| o.value == value, || format!("value {value:?}")).await?;
        self.set(option, false).await
    }

    pub async fn deselect_by_text(&self, text: &str) -> Result<()> {
        self.ensure_multiple().await?;
        let option = self.find(|o| o.text == text, || format!("text {text:?}")).await?;
        self.set(option, false).await
    }

    pub async fn deselect_all(&self) -> Result<()> {
        self.ensure_multiple().await?;
        for option in self.selected_options().await? {
            self.set(option, false).await?;
        }
        Ok(())
    }

    /// First option matching `predicate`; duplicates after it are ignored.
    async fn find(
        &self,
        predicate: impl Fn(&SelectOption) -> bool,
        describe: impl FnOnce() -> String,
    ) -> Result<SelectOption> {
        self.options()
            .await?
            .into_iter()
            .find(|o| predicate(o))
            .ok_or_else(|| Error::ElementNotFound(format!("no option with {}", describe())))
    }

    async fn set(&self, option: SelectOption, selected: bool) -> Result<()> {
        if option.selected == selected {
            return Ok(());
        }
        debug!(index = option.index, value = %option.value, selected, "toggling option");
        self.element.set_option_selected(option.index, selected).await
    }

    async fn ensure_multiple(&self) -> Result<()> {
        if self.is_multiple().await? {
            Ok(())
        } else {
            Err(Error::ElementNotInteractable(
                "You may only deselect options of a multi-select".into(),
            ))
        }
    }
}
