use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::debug;

use crate::driver::{FieldElement, Key};
use crate::error::{Error, Result};

/// Largest year a [`DateValue`] holds, the last year chrono represents.
///
/// The HTML date input stops at 275760-09-13, so every year up to this one
/// is accepted by the widget in full.
pub const MAX_YEAR: i32 = 262_142;

/// Digits typed for each segment, in focus order.
pub const SEGMENT_WIDTHS: [usize; 3] = [6, 2, 2];

/// A focusable part of the date widget, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Year,
    Month,
    Day,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Year, Segment::Month, Segment::Day];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Segment reached by a move-right; the last segment stays put.
    pub fn next(self) -> Segment {
        match self {
            Segment::Year => Segment::Month,
            Segment::Month | Segment::Day => Segment::Day,
        }
    }

    /// Segment reached by a move-left; the first segment stays put.
    pub fn prev(self) -> Segment {
        match self {
            Segment::Year | Segment::Month => Segment::Year,
            Segment::Day => Segment::Month,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Segment::Year => "year",
            Segment::Month => "month",
            Segment::Day => "day",
        })
    }
}

/// A date in the range the widget accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateValue(NaiveDate);

impl DateValue {
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::from_date)
    }

    pub fn from_date(date: NaiveDate) -> Option<Self> {
        (1..=MAX_YEAR).contains(&date.year()).then_some(Self(date))
    }

    /// `base` moved by `years`, then `months`, then `days`.
    ///
    /// Years and months clamp to the last day of the target month
    /// (Feb 29 minus one year is Feb 28), days shift exactly.
    pub fn offset(base: NaiveDate, years: i32, months: i32, days: i64) -> Option<Self> {
        let date = shift_months(base, years.checked_mul(12)?)?;
        let date = shift_months(date, months)?;
        let date = if days >= 0 {
            date.checked_add_days(Days::new(days.unsigned_abs()))?
        } else {
            date.checked_sub_days(Days::new(days.unsigned_abs()))?
        };
        Self::from_date(date)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn as_date(&self) -> NaiveDate {
        self.0
    }

    /// Digits typed into the widget: `YYYYYYMMDD`.
    pub fn keystrokes(&self) -> String {
        format!("{:06}{:02}{:02}", self.year(), self.month(), self.day())
    }

    /// The `value` the widget reports once this date is set (`YYYY-MM-DD`).
    pub fn display_value(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year(), self.month(), self.day())
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_value())
    }
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

/// Sets and clears a composite date widget while tracking segment focus.
///
/// The widget only takes digits, jumps to the next segment once one is full
/// and refuses a native clear. Which segment holds focus is never exposed,
/// so the editor tracks it. A freshly located element receives keystrokes in its year segment, so the
/// editor starts with [`Segment::Year`] focused. Every operation states the
/// focus it requires and the focus it leaves behind.
pub struct DateWidgetEditor<'a, E: FieldElement + ?Sized> {
    element: &'a E,
    focus: Segment,
}

impl<'a, E: FieldElement + ?Sized> DateWidgetEditor<'a, E> {
    pub fn new(element: &'a E) -> Self {
        Self {
            element,
            focus: Segment::Year,
        }
    }

    /// Segment that will receive the next keystroke.
    pub fn focus(&self) -> Segment {
        self.focus
    }

    /// Types `date` as one keystroke sequence.
    ///
    /// Requires [`Segment::Year`] focus; leaves [`Segment::Day`] focused.
    pub async fn set(&mut self, date: &DateValue) -> Result<()> {
        self.expect_focus(Segment::Year)?;
        let keys = date.keystrokes();
        debug!(date = %date, keys = %keys, "typing date");
        self.element.send_keys(&keys).await?;
        self.focus = Segment::Day;
        Ok(())
    }

    /// Moves focus back to the year segment with move-left keys.
    ///
    /// From [`Segment::Day`], where `set` and `clear` leave focus, this sends
    /// exactly two keys. Leaves [`Segment::Year`] focused.
    pub async fn recenter(&mut self) -> Result<()> {
        while self.focus != Segment::Year {
            self.element.press_key(Key::ArrowLeft).await?;
            self.focus = self.focus.prev();
        }
        Ok(())
    }

    /// Empties every segment with (delete, move-right) per segment.
    ///
    /// Requires [`Segment::Year`] focus; leaves [`Segment::Day`] focused.
    /// Clearing empty segments is a no-op, so this is idempotent.
    pub async fn clear(&mut self) -> Result<()> {
        self.expect_focus(Segment::Year)?;
        for segment in Segment::ALL {
            debug!(%segment, "clearing date segment");
            self.element.press_key(Key::Delete).await?;
            self.element.press_key(Key::ArrowRight).await?;
            self.focus = segment.next();
        }
        Ok(())
    }

    fn expect_focus(&self, expected: Segment) -> Result<()> {
        if self.focus == expected {
            Ok(())
        } else {
            Err(Error::SegmentFocus {
                expected,
                actual: self.focus,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakePage, Interaction};

    fn date(y: i32, m: u32, d: u32) -> DateValue {
        DateValue::new(y, m, d).unwrap()
    }

    #[test]
    fn test_keystrokes_are_zero_padded() {
        assert_eq!(date(2016, 1, 1).keystrokes(), "0020160101");
        assert_eq!(date(99_999, 12, 31).keystrokes(), "0999991231");
        assert_eq!(date(MAX_YEAR, 12, 31).keystrokes(), "2621421231");
        assert_eq!(date(7, 3, 9).display_value(), "0007-03-09");
    }

    #[test]
    fn test_rejects_out_of_range_years() {
        assert!(DateValue::new(0, 1, 1).is_none());
        assert!(DateValue::new(MAX_YEAR + 1, 1, 1).is_none());
        assert!(DateValue::new(275_760, 1, 1).is_none());
        assert!(DateValue::new(2023, 2, 29).is_none());
    }

    #[test]
    fn test_offset_applies_years_then_months_then_days() {
        let base = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        // 2023-03-31 -> 2023-02-28 (clamped) -> 2023-02-27
        assert_eq!(DateValue::offset(base, -1, -1, -1), Some(date(2023, 2, 27)));
        // 2025-03-31 -> 2025-04-30 (clamped) -> 2025-05-01
        assert_eq!(DateValue::offset(base, 1, 1, 1), Some(date(2025, 5, 1)));

        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        // Year first: Feb 28, then Jan 28. A single 13-month step would give Jan 29.
        assert_eq!(DateValue::offset(leap, -1, -1, 0), Some(date(2023, 1, 28)));
    }

    #[test]
    fn test_segment_moves_saturate() {
        assert_eq!(Segment::Day.next(), Segment::Day);
        assert_eq!(Segment::Year.prev(), Segment::Year);
        assert_eq!(Segment::Month.next(), Segment::Day);
    }

    #[tokio::test]
    async fn test_set_leaves_day_focused() {
        let page = FakePage::new().with_date("d", None);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);

        editor.set(&date(2025, 9, 18)).await.unwrap();

        assert_eq!(editor.focus(), Segment::Day);
        assert_eq!(element.value().await.unwrap(), "2025-09-18");
    }

    #[tokio::test]
    async fn test_recenter_sends_two_left_keys_from_day() {
        let page = FakePage::new().with_date("d", None);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);
        editor.set(&date(2025, 9, 18)).await.unwrap();
        page.take_interactions();

        editor.recenter().await.unwrap();

        assert_eq!(editor.focus(), Segment::Year);
        assert_eq!(
            page.take_interactions(),
            vec![
                Interaction::Key("d".into(), Key::ArrowLeft),
                Interaction::Key("d".into(), Key::ArrowLeft),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_without_recenter_is_refused() {
        let page = FakePage::new().with_date("d", None);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);
        editor.set(&date(2025, 9, 18)).await.unwrap();
        page.take_interactions();

        let err = editor.clear().await.unwrap_err();

        assert!(matches!(
            err,
            Error::SegmentFocus {
                expected: Segment::Year,
                actual: Segment::Day
            }
        ));
        assert!(page.take_interactions().is_empty());
        assert_eq!(element.value().await.unwrap(), "2025-09-18");
    }

    #[tokio::test]
    async fn test_set_twice_without_recenter_is_refused() {
        let page = FakePage::new().with_date("d", None);
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);
        editor.set(&date(2025, 9, 18)).await.unwrap();

        let err = editor.set(&date(2020, 1, 1)).await.unwrap_err();
        assert!(matches!(err, Error::SegmentFocus { .. }));
    }

    #[tokio::test]
    async fn test_clear_sends_delete_and_right_per_segment() {
        let page = FakePage::new().with_date("d", NaiveDate::from_ymd_opt(2026, 10, 19));
        let element = page.element("d");
        let mut editor = DateWidgetEditor::new(&element);

        editor.clear().await.unwrap();

        assert_eq!(editor.focus(), Segment::Day);
        assert_eq!(element.value().await.unwrap(), "");
        let keys: Vec<Key> = page
            .take_interactions()
            .into_iter()
            .filter_map(|i| match i {
                Interaction::Key(_, key) => Some(key),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            [Key::Delete, Key::ArrowRight].repeat(3),
        );
    }
}
