//! Target normalization.
//!
//! A pointer press usually lands on an icon, a glyph span, or a text node
//! wrapper rather than the control the user means. `resolve_target` climbs
//! from the pointed-at element to the nearest interactive ancestor, keeping
//! the original element's text as a secondary anchor for text strategies.

use crate::strategies::PREFERRED_TEST_ATTRS;
use crate::text::{element_text, is_good_text};
use apuntar_dom::{Document, NodeId, SelectorList};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum ancestor levels to climb while searching for an interactive host.
pub const SNAP_DEPTH: usize = 6;

/// Side length under which a leaf inline element is treated as decorative.
const SMALL_LEAF_PX: f32 = 40.0;

const INTERESTING: &str = "button, a, input, select, textarea, label, \
     [role=\"button\"], [role=\"menuitem\"], .select2-container, .select2-choice, \
     .select2-selection, .select2-selection__rendered";

fn interesting_selector() -> &'static SelectorList {
    static SEL: OnceLock<SelectorList> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    SEL.get_or_init(|| SelectorList::parse(INTERESTING).unwrap())
}

fn icon_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| Regex::new(r"(?i)\b(icon|ico|fa|glyph|svg|caret|chevron|arrow)\b").unwrap())
}

/// Outcome of snapping: the element locators should target, plus the
/// originally pointed-at element and its display text when they differ.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTarget {
    /// Element all strategies run against.
    pub element: NodeId,
    /// The element originally pointed at, when snapping moved away from it.
    pub original: Option<NodeId>,
}

impl ResolvedTarget {
    fn kept(element: NodeId) -> Self {
        Self { element, original: None }
    }

    /// Display text of the original element when it is distinct and usable.
    #[must_use]
    pub fn original_text(&self, doc: &Document) -> Option<String> {
        let orig = self.original?;
        let text = element_text(doc, orig);
        if is_good_text(&text) && text != element_text(doc, self.element) {
            Some(text)
        } else {
            None
        }
    }
}

fn is_interesting(doc: &Document, id: NodeId) -> bool {
    interesting_selector().matches(doc, id)
}

fn has_preferred_attr(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|e| PREFERRED_TEST_ATTRS.iter().any(|a| e.attr(a).is_some()))
}

/// Whether `id` is a decorative leaf: an icon tag, an icon-classed inline
/// wrapper with no element children, or a tiny inline leaf. Elements with
/// unknown layout are never treated as small leaves.
fn is_decorative_leaf(doc: &Document, id: NodeId) -> bool {
    let Some(data) = doc.element(id) else {
        return false;
    };
    if matches!(data.tag.as_str(), "i" | "svg" | "path" | "use") {
        return true;
    }
    let leaf = doc.element_children(id).next().is_none();
    if leaf
        && matches!(data.tag.as_str(), "span" | "b" | "strong" | "em")
        && data.classes().any(|c| icon_class_re().is_match(c))
    {
        return true;
    }
    if leaf && !is_interesting(doc, id) {
        if let Some(layout) = data.layout {
            return layout.inline
                && layout.width <= SMALL_LEAF_PX
                && layout.height <= SMALL_LEAF_PX;
        }
    }
    false
}

/// Resolve the element locators should target.
///
/// The pointed-at element is kept unchanged when it carries good text of
/// its own, or when it is a decorative leaf (climbing past a glyph would
/// select the wrapper instead of what the user pointed at). Otherwise the
/// walk starts at the element itself and climbs up to [`SNAP_DEPTH`]
/// levels looking for an interactive node, an id, or a preferred test
/// attribute. When nothing qualifies the original element stands.
#[must_use]
pub fn resolve_target(doc: &Document, raw: NodeId) -> ResolvedTarget {
    if is_good_text(&element_text(doc, raw)) {
        return ResolvedTarget::kept(raw);
    }
    if is_decorative_leaf(doc, raw) {
        return ResolvedTarget::kept(raw);
    }

    let mut depth = 0usize;
    let mut node = Some(raw);
    while let Some(id) = node {
        if depth >= SNAP_DEPTH {
            break;
        }
        let Some(data) = doc.element(id) else {
            break;
        };
        if data.tag == "body" || data.tag == "html" {
            break;
        }
        if is_interesting(doc, id) || data.id().is_some() || has_preferred_attr(doc, id) {
            if id == raw {
                return ResolvedTarget::kept(raw);
            }
            tracing::debug!(
                from = ?raw,
                to = ?id,
                depth,
                "snapped to interactive ancestor"
            );
            return ResolvedTarget { element: id, original: Some(raw) };
        }
        node = doc.parent_element(id);
        depth += 1;
    }

    ResolvedTarget::kept(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuntar_dom::{el, DocumentBuilder};

    fn find(doc: &Document, tag: &str) -> NodeId {
        doc.all_elements()
            .into_iter()
            .find(|id| doc.element(*id).is_some_and(|e| e.tag == tag))
            .unwrap()
    }

    #[test]
    fn span_with_good_text_is_kept_unchanged() {
        let doc = DocumentBuilder::new()
            .body_child(el("a").attr("href", "/settings").child(el("span").text("Settings")))
            .build();
        let span = find(&doc, "span");
        let resolved = resolve_target(&doc, span);
        assert_eq!(resolved.element, span);
        assert!(resolved.original.is_none());
    }

    #[test]
    fn icon_glyph_inside_button_stays_put() {
        let doc = DocumentBuilder::new()
            .body_child(el("button").attr("id", "save").child(el("i").class("fa fa-save")))
            .build();
        let icon = find(&doc, "i");
        let resolved = resolve_target(&doc, icon);
        assert_eq!(resolved.element, icon);
        assert!(resolved.original.is_none());
    }

    #[test]
    fn interesting_element_with_text_is_kept() {
        let doc = DocumentBuilder::new()
            .body_child(el("div").child(el("button").text("Submit")))
            .build();
        let button = find(&doc, "button");
        let resolved = resolve_target(&doc, button);
        assert_eq!(resolved.element, button);
        assert!(resolved.original.is_none());
    }

    #[test]
    fn textless_control_is_kept_by_the_walk_itself() {
        let doc = DocumentBuilder::new()
            .body_child(el("div").child(el("button")))
            .build();
        let button = find(&doc, "button");
        let resolved = resolve_target(&doc, button);
        assert_eq!(resolved.element, button);
        assert!(resolved.original.is_none());
    }

    #[test]
    fn tiny_inline_leaf_is_kept_as_the_target() {
        let doc = DocumentBuilder::new()
            .body_child(
                el("label")
                    .attr("for", "agree")
                    .child(el("span").layout(12.0, 12.0, true)),
            )
            .build();
        let span = find(&doc, "span");
        let resolved = resolve_target(&doc, span);
        assert_eq!(resolved.element, span);
    }

    #[test]
    fn bare_wrapper_span_climbs_to_the_anchor() {
        // No text and no layout info: not decorative, not labeled, so the
        // walk climbs to the enclosing link.
        let doc = DocumentBuilder::new()
            .body_child(el("a").attr("href", "#").child(el("span")))
            .build();
        let span = find(&doc, "span");
        let resolved = resolve_target(&doc, span);
        assert_eq!(resolved.element, find(&doc, "a"));
        assert_eq!(resolved.original, Some(span));
    }

    #[test]
    fn orphan_div_deep_in_plain_wrappers_stays_put() {
        let doc = DocumentBuilder::new()
            .body_child(el("div").child(el("div").child(el("div").child(el("p").text("hi")))))
            .build();
        let p = find(&doc, "p");
        let resolved = resolve_target(&doc, p);
        assert_eq!(resolved.element, p);
    }
}
