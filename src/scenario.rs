//! The registration-form choreography.
//!
//! Steps run in a fixed order with no branching or retry. Any failure stops
//! the run, and [`ScenarioRunner::run_and_release`] still closes the session.

use chrono::{Local, NaiveDate};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::date::{DateValue, DateWidgetEditor};
use crate::driver::{FieldElement, FieldLocator, FormDriver, Key, ScreenshotFormat};
use crate::error::{Error, Result};
use crate::fields::{self, TextInput};
use crate::select::SelectController;

/// Element ids on the registration page.
pub mod form {
    pub const INPUT_TEXT: &str = "id_input_text";
    pub const TEXT_AREA: &str = "id_text_area";
    pub const REGISTRATION_DATE: &str = "id_registration_date";
    pub const PUSHED_1: &str = "id_pushed_1";
    pub const CHECKED: &str = "id_checked";
    pub const CHECKED_MULTIPLE_1: &str = "id_checked_multiple_1";
    pub const CHECKED_MULTIPLE_2: &str = "id_checked_multiple_2";
    pub const SELECTED: &str = "id_selected";
    pub const SELECTED_MULTIPLE: &str = "id_selected_multiple";
    pub const SAVE: &str = "save";
}

pub struct ScenarioRunner {
    config: ScenarioConfig,
    today: NaiveDate,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig) -> Self {
        Self {
            config,
            today: Local::now().date_naive(),
        }
    }

    /// Fix the date the date-field values are computed from.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Date typed first: one year, one month and one day before today, so it
    /// differs from the page's default in every segment.
    pub fn first_date(&self) -> Result<DateValue> {
        DateValue::offset(self.today, -1, -1, -1)
            .ok_or_else(|| Error::InvalidDate(format!("{} -1y -1m -1d", self.today)))
    }

    /// Date typed after clearing: one year, one month and one day after today.
    pub fn second_date(&self) -> Result<DateValue> {
        DateValue::offset(self.today, 1, 1, 1)
            .ok_or_else(|| Error::InvalidDate(format!("{} +1y +1m +1d", self.today)))
    }

    /// Runs the scenario, waits for the operator if configured, and always
    /// closes the session afterwards.
    ///
    /// A scenario failure takes precedence over a failure to close.
    pub async fn run_and_release<D: FormDriver>(&self, mut driver: D) -> Result<()> {
        let mut outcome = self.run(&driver).await;
        if outcome.is_ok() && self.config.wait_for_operator {
            outcome = wait_for_operator().await;
        }

        let released = driver.close().await;
        match (outcome, released) {
            (Err(e), Err(close_err)) => {
                warn!(error = %close_err, "failed to release browser session");
                Err(e)
            }
            (outcome, released) => outcome.and(released),
        }
    }

    /// Navigates to the target page and fills in every field in order,
    /// finishing with a screenshot and a submit.
    pub async fn run<D: FormDriver + ?Sized>(&self, driver: &D) -> Result<()> {
        driver.navigate(&self.config.target_url).await?;

        edit_text_field(driver).await?;
        edit_text_area(driver).await?;
        self.edit_date_field(driver).await?;
        edit_radio_field(driver).await?;
        edit_checkbox_field(driver).await?;
        edit_multi_checkbox_field(driver).await?;
        edit_select_field(driver).await?;
        edit_multi_select_field(driver).await?;
        self.save_screenshot(driver).await?;
        submit_form(driver).await?;

        info!("scenario finished");
        Ok(())
    }

    async fn edit_date_field<D: FormDriver + ?Sized>(&self, driver: &D) -> Result<()> {
        info!(field = form::REGISTRATION_DATE, "editing date field");
        let element = driver.locate(&FieldLocator::id(form::REGISTRATION_DATE)).await?;
        let mut editor = DateWidgetEditor::new(&element);

        editor.set(&self.first_date()?).await?;
        editor.recenter().await?;
        editor.clear().await?;
        editor.recenter().await?;
        editor.set(&self.second_date()?).await
    }

    async fn save_screenshot<D: FormDriver + ?Sized>(&self, driver: &D) -> Result<()> {
        let path = &self.config.screenshot_path;
        info!(path = %path.display(), "saving screenshot");
        driver
            .save_screenshot(path, ScreenshotFormat::Jpeg(self.config.screenshot_quality))
            .await
    }
}

async fn edit_text_field<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    info!(field = form::INPUT_TEXT, "editing text field");
    let element = driver.locate(&FieldLocator::id(form::INPUT_TEXT)).await?;
    fields::append_text(&element, &[TextInput::Text("テキスト"), TextInput::Text("txt")]).await?;
    fields::clear_text(&element).await
}

async fn edit_text_area<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    info!(field = form::TEXT_AREA, "editing textarea");
    let element = driver.locate(&FieldLocator::id(form::TEXT_AREA)).await?;
    fields::append_text(
        &element,
        &[
            TextInput::Text("テキスト"),
            TextInput::Key(Key::Enter),
            TextInput::Text("txt"),
        ],
    )
    .await?;
    fields::clear_text(&element).await
}

async fn edit_radio_field<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    info!(field = form::PUSHED_1, "selecting radio");
    let element = driver.locate(&FieldLocator::id(form::PUSHED_1)).await?;
    fields::toggle(&element).await
}

async fn edit_checkbox_field<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    toggle_checkbox(driver, form::CHECKED).await
}

async fn edit_multi_checkbox_field<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    toggle_checkbox(driver, form::CHECKED_MULTIPLE_1).await?;
    toggle_checkbox(driver, form::CHECKED_MULTIPLE_2).await
}

async fn toggle_checkbox<D: FormDriver + ?Sized>(driver: &D, id: &str) -> Result<()> {
    info!(field = id, "toggling checkbox");
    let element = driver.locate(&FieldLocator::id(id)).await?;
    fields::toggle(&element).await
}

async fn edit_select_field<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    info!(field = form::SELECTED, "editing select");
    let element = driver.locate(&FieldLocator::id(form::SELECTED)).await?;
    let select = SelectController::new(&element);

    select.select_by_index(2).await?;
    select.select_by_value("1").await?;
    select.select_by_text("select3").await
}

async fn edit_multi_select_field<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    info!(field = form::SELECTED_MULTIPLE, "editing multi-select");
    let element = driver.locate(&FieldLocator::id(form::SELECTED_MULTIPLE)).await?;
    let select = SelectController::new(&element);

    for value in ["1", "2", "3"] {
        select.select_by_value(value).await?;
    }
    select.deselect_by_value("2").await?;
    select.deselect_all().await?;
    select.select_by_value("2").await
}

async fn submit_form<D: FormDriver + ?Sized>(driver: &D) -> Result<()> {
    info!(field = form::SAVE, "submitting form");
    let element = driver.locate(&FieldLocator::id(form::SAVE)).await?;
    element.submit().await
}

async fn wait_for_operator() -> Result<()> {
    println!("Press Enter to close the browser");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(())
}
