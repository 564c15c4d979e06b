//! Setters for plain text fields, textareas, radios and checkboxes.

use tracing::debug;

use crate::driver::{FieldElement, Key};
use crate::error::Result;

/// One fragment of input for a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInput<'a> {
    Text(&'a str),
    Key(Key),
}

/// Appends each fragment to the field's current content.
///
/// Fragments are sent as separate input events, never joined client-side, so
/// special keys such as [`Key::Enter`] can sit between them.
pub async fn append_text<E: FieldElement + ?Sized>(
    element: &E,
    fragments: &[TextInput<'_>],
) -> Result<()> {
    for fragment in fragments {
        match *fragment {
            TextInput::Text(text) => element.send_keys(text).await?,
            TextInput::Key(key) => element.press_key(key).await?,
        }
    }
    Ok(())
}

/// Empties a text field or textarea.
///
/// Composite widgets such as date inputs refuse this; use
/// [`crate::date::DateWidgetEditor::clear`] for those.
pub async fn clear_text<E: FieldElement + ?Sized>(element: &E) -> Result<()> {
    element.clear().await
}

/// Activates a radio or checkbox once. A second toggle unchecks a checkbox.
pub async fn toggle<E: FieldElement + ?Sized>(element: &E) -> Result<()> {
    element.click().await
}

/// Toggles only if the current checked state differs from `checked`.
pub async fn set_checked<E: FieldElement + ?Sized>(element: &E, checked: bool) -> Result<()> {
    if element.is_selected().await? != checked {
        debug!(checked, "toggling to reach requested state");
        toggle(element).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fake::{FakePage, Interaction};

    #[tokio::test]
    async fn test_fragments_append_separately() {
        let page = FakePage::new().with_text_area("t", "x");
        let element = page.element("t");

        append_text(
            &element,
            &[TextInput::Text("テキスト"), TextInput::Key(Key::Enter), TextInput::Text("txt")],
        )
        .await
        .unwrap();

        assert_eq!(page.field_value("t").as_deref(), Some("xテキスト\ntxt"));
        assert_eq!(
            page.take_interactions(),
            vec![
                Interaction::Keys("t".into(), "テキスト".into()),
                Interaction::Key("t".into(), Key::Enter),
                Interaction::Keys("t".into(), "txt".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_clear_empties_text() {
        let page = FakePage::new().with_text("t", "abc");
        clear_text(&page.element("t")).await.unwrap();
        assert_eq!(page.field_value("t").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_clear_rejected_on_date() {
        let page = FakePage::new().with_date("d", None);
        let err = clear_text(&page.element("d")).await.unwrap_err();
        assert!(matches!(err, Error::ElementNotInteractable(_)));
    }

    #[tokio::test]
    async fn test_two_toggles_restore_checkbox() {
        let page = FakePage::new().with_checkbox("c", false);
        let element = page.element("c");

        toggle(&element).await.unwrap();
        assert!(page.is_checked("c"));

        toggle(&element).await.unwrap();
        assert!(!page.is_checked("c"));
    }

    #[tokio::test]
    async fn test_set_checked_is_idempotent() {
        let page = FakePage::new().with_checkbox("c", true);
        let element = page.element("c");

        set_checked(&element, true).await.unwrap();
        assert!(page.is_checked("c"));
        assert!(page.take_interactions().is_empty());

        set_checked(&element, false).await.unwrap();
        assert!(!page.is_checked("c"));
    }
}
