use chrono::NaiveDate;
use form_runner::date::MAX_YEAR;
use form_runner::fake::FakePage;
use form_runner::{DateValue, DateWidgetEditor, FieldElement, Segment};
use futures::executor::block_on;
use proptest::prelude::*;

fn date_value() -> impl Strategy<Value = DateValue> {
    (1i32..=MAX_YEAR, 1u32..=12, 1u32..=31)
        .prop_filter_map("not a calendar date", |(y, m, d)| DateValue::new(y, m, d))
}

fn prior_content() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((1i32..=9999, 1u32..=12, 1u32..=28))
        .prop_map(|ymd| ymd.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)))
}

proptest! {
    #[test]
    fn set_displays_the_typed_date(date in date_value(), prior in prior_content()) {
        let page = FakePage::new().with_date("d", prior);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);

        block_on(editor.set(&date)).unwrap();

        prop_assert_eq!(block_on(element.value()).unwrap(), date.display_value());
        prop_assert_eq!(editor.focus(), Segment::Day);
    }

    #[test]
    fn clear_always_empties(prior in prior_content(), repeats in 1usize..3) {
        let page = FakePage::new().with_date("d", prior);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);

        for _ in 0..repeats {
            block_on(editor.clear()).unwrap();
            block_on(editor.recenter()).unwrap();
        }

        prop_assert_eq!(block_on(element.value()).unwrap(), "");
        prop_assert_eq!(editor.focus(), Segment::Year);
    }

    #[test]
    fn second_value_is_independent_of_first(first in date_value(), second in date_value()) {
        let page = FakePage::new().with_date("d", None);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);

        block_on(async {
            editor.set(&first).await?;
            editor.recenter().await?;
            editor.clear().await?;
            editor.recenter().await?;
            editor.set(&second).await
        }).unwrap();

        prop_assert_eq!(block_on(element.value()).unwrap(), second.display_value());
    }
}
