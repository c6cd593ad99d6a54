//! Interaction classification.
//!
//! Knowing what a user can do with the target element feeds two places:
//! the action list surfaced next to each candidate, and the action-fit
//! component of the score (a `name`d text input is a better typing target
//! than an anonymous div, even if both selectors are unique).

use apuntar_dom::{Document, NodeId};
use serde::Serialize;

/// What kind of interaction the target element affords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Actionable {
    /// Free-text entry: text-like inputs and textareas.
    TextEntry,
    /// Checkbox or radio.
    Toggle,
    /// Select dropdown.
    Chooser,
    /// Click target: buttons, links, submit controls.
    Trigger,
    /// Anything else; click is the only safe default.
    Generic,
}

/// A concrete interaction, rendered as a Cypress-style method suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// `.click()`
    Click,
    /// `.type(...)`
    Type,
    /// `.clear()`
    Clear,
    /// `.check()`
    Check,
    /// `.uncheck()`
    Uncheck,
    /// `.select(...)`
    Select,
}

impl Action {
    /// Method-call suffix for appending to a rendered locator.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Click => ".click()",
            Self::Type => ".type('...')",
            Self::Clear => ".clear()",
            Self::Check => ".check()",
            Self::Uncheck => ".uncheck()",
            Self::Select => ".select('...')",
        }
    }
}

const TEXT_INPUT_TYPES: &[&str] = &[
    "text", "email", "password", "search", "tel", "url", "number", "date", "time",
];

/// Classify the interaction kind of an element.
#[must_use]
pub fn classify(doc: &Document, id: NodeId) -> Actionable {
    let Some(data) = doc.element(id) else {
        return Actionable::Generic;
    };
    match data.tag.as_str() {
        "textarea" => Actionable::TextEntry,
        "select" => Actionable::Chooser,
        "button" | "a" => Actionable::Trigger,
        "input" => match data.attr("type").unwrap_or("text") {
            "checkbox" | "radio" => Actionable::Toggle,
            "submit" | "button" | "reset" | "image" => Actionable::Trigger,
            t if TEXT_INPUT_TYPES.contains(&t) => Actionable::TextEntry,
            _ => Actionable::Generic,
        },
        _ => {
            if matches!(data.attr("role"), Some("button" | "menuitem" | "link" | "tab")) {
                Actionable::Trigger
            } else {
                Actionable::Generic
            }
        }
    }
}

/// The interactions worth offering for an element, most specific first.
#[must_use]
pub fn available_actions(kind: Actionable) -> Vec<Action> {
    match kind {
        Actionable::TextEntry => vec![Action::Type, Action::Clear, Action::Click],
        Actionable::Toggle => vec![Action::Check, Action::Uncheck, Action::Click],
        Actionable::Chooser => vec![Action::Select, Action::Click],
        Actionable::Trigger | Actionable::Generic => vec![Action::Click],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuntar_dom::{el, DocumentBuilder};

    fn classify_one(builder: apuntar_dom::ElementBuilder) -> Actionable {
        let doc = DocumentBuilder::new().body_child(builder).build();
        let id = doc
            .all_elements()
            .into_iter()
            .last()
            .unwrap();
        classify(&doc, id)
    }

    #[test]
    fn inputs_split_by_type() {
        assert_eq!(classify_one(el("input").attr("type", "email")), Actionable::TextEntry);
        assert_eq!(classify_one(el("input")), Actionable::TextEntry);
        assert_eq!(classify_one(el("input").attr("type", "checkbox")), Actionable::Toggle);
        assert_eq!(classify_one(el("input").attr("type", "submit")), Actionable::Trigger);
        assert_eq!(classify_one(el("input").attr("type", "file")), Actionable::Generic);
    }

    #[test]
    fn role_button_div_is_trigger() {
        assert_eq!(classify_one(el("div").attr("role", "button")), Actionable::Trigger);
        assert_eq!(classify_one(el("div")), Actionable::Generic);
    }

    #[test]
    fn actions_follow_kind() {
        assert_eq!(
            available_actions(Actionable::Toggle),
            vec![Action::Check, Action::Uncheck, Action::Click]
        );
        assert_eq!(available_actions(Actionable::Generic), vec![Action::Click]);
    }
}
