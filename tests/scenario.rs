use chrono::NaiveDate;
use form_runner::config::ScenarioConfig;
use form_runner::fake::{FakePage, Interaction};
use form_runner::scenario::form;
use form_runner::{Error, Key, ScenarioRunner};
use tempfile::TempDir;

const TARGET: &str = "http://localhost:8000/site/register/";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn runner(dir: &TempDir) -> ScenarioRunner {
    let config = ScenarioConfig {
        target_url: TARGET.to_string(),
        screenshot_path: dir.path().join("selenium.jpg"),
        screenshot_quality: 80,
        wait_for_operator: false,
    };
    ScenarioRunner::new(config).with_today(today())
}

#[test]
fn test_scenario_dates_bracket_today() {
    let dir = TempDir::new().unwrap();
    let runner = runner(&dir);

    assert_eq!(runner.first_date().unwrap().display_value(), "2025-09-18");
    assert_eq!(runner.second_date().unwrap().display_value(), "2027-11-20");
}

#[tokio::test]
async fn test_full_scenario_leaves_expected_form_state() {
    let dir = TempDir::new().unwrap();
    let page = FakePage::registration_form(today());

    runner(&dir)
        .run_and_release(page.clone())
        .await
        .expect("scenario failed");

    assert_eq!(page.url().as_deref(), Some(TARGET));
    assert_eq!(page.field_value(form::INPUT_TEXT).as_deref(), Some(""));
    assert_eq!(page.field_value(form::TEXT_AREA).as_deref(), Some(""));
    assert_eq!(
        page.field_value(form::REGISTRATION_DATE).as_deref(),
        Some("2027-11-20")
    );
    assert!(page.is_checked(form::PUSHED_1));
    assert!(!page.is_checked("id_pushed_2"));
    assert!(page.is_checked(form::CHECKED));
    assert!(page.is_checked(form::CHECKED_MULTIPLE_1));
    assert!(page.is_checked(form::CHECKED_MULTIPLE_2));
    assert_eq!(page.selected_values(form::SELECTED), ["3"]);
    assert_eq!(page.selected_values(form::SELECTED_MULTIPLE), ["2"]);
    assert_eq!(page.submissions(), 1);
    assert!(page.is_closed());
    assert_eq!(page.close_calls(), 1);

    let shot = std::fs::read(dir.path().join("selenium.jpg")).unwrap();
    assert_eq!(&shot[0..3], &[0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn test_date_field_keystroke_sequence() {
    let dir = TempDir::new().unwrap();
    let page = FakePage::registration_form(today());

    runner(&dir).run_and_release(page.clone()).await.unwrap();

    let date = form::REGISTRATION_DATE.to_string();
    let date_calls: Vec<Interaction> = page
        .take_interactions()
        .into_iter()
        .filter(|i| match i {
            Interaction::Keys(id, _) | Interaction::Key(id, _) | Interaction::Clear(id) => {
                *id == date
            }
            _ => false,
        })
        .collect();

    let key = |k| Interaction::Key(date.clone(), k);
    let mut expected = vec![
        Interaction::Keys(date.clone(), "0020250918".into()),
        key(Key::ArrowLeft),
        key(Key::ArrowLeft),
    ];
    for _ in 0..3 {
        expected.push(key(Key::Delete));
        expected.push(key(Key::ArrowRight));
    }
    expected.push(key(Key::ArrowLeft));
    expected.push(key(Key::ArrowLeft));
    expected.push(Interaction::Keys(date.clone(), "0020271120".into()));

    assert_eq!(date_calls, expected);
}

#[tokio::test]
async fn test_screenshot_precedes_submit() {
    let dir = TempDir::new().unwrap();
    let page = FakePage::registration_form(today());

    runner(&dir).run_and_release(page.clone()).await.unwrap();

    let interactions = page.take_interactions();
    let tail: Vec<&Interaction> = interactions.iter().rev().take(2).collect();
    assert!(matches!(tail[0], Interaction::Submit(id) if id == form::SAVE));
    assert!(matches!(tail[1], Interaction::Screenshot(_)));
}

#[tokio::test]
async fn test_missing_element_aborts_and_releases_session() {
    let dir = TempDir::new().unwrap();
    // No select elements: the run stops at the first select step.
    let page = FakePage::new()
        .with_text(form::INPUT_TEXT, "")
        .with_text_area(form::TEXT_AREA, "")
        .with_date(form::REGISTRATION_DATE, Some(today()))
        .with_radio(form::PUSHED_1, "pushed", false)
        .with_checkbox(form::CHECKED, false)
        .with_checkbox(form::CHECKED_MULTIPLE_1, false)
        .with_checkbox(form::CHECKED_MULTIPLE_2, false)
        .with_button(form::SAVE);

    let err = runner(&dir)
        .run_and_release(page.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ElementNotFound(ref msg) if msg.contains(form::SELECTED)));
    assert!(page.is_checked(form::CHECKED_MULTIPLE_2));
    assert_eq!(page.submissions(), 0);
    assert!(page.is_closed());
    assert!(!dir.path().join("selenium.jpg").exists());
}

#[tokio::test]
async fn test_scenario_on_closed_session_is_session_error() {
    let dir = TempDir::new().unwrap();
    let mut page = FakePage::registration_form(today());
    form_runner::FormDriver::close(&mut page).await.unwrap();

    let err = runner(&dir).run(&page).await.unwrap_err();

    assert!(matches!(err, Error::SessionError(_)));
}
