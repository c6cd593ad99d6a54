//! Text extraction and text-match predicates.
//!
//! The display text of an element drives both the snap heuristic and every
//! text-based strategy. Extraction order: `placeholder`/`value` for form
//! inputs, then `aria-label`, then `title`, then the element's own direct
//! text nodes, and finally the full descendant text truncated to 50 chars.

use apuntar_dom::{Document, NodeId};
use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of text considered usable for a text locator.
pub const MAX_TEXT_LEN: usize = 50;

/// Minimum length of text considered usable for a text locator.
pub const MIN_TEXT_LEN: usize = 2;

fn dynamic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Digit runs of 4+, hex-looking runs of 6+, or a double underscore:
        // the fingerprints of generated ids and build hashes.
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)\b\d{4,}\b|\b[a-f0-9]{6,}\b|__").unwrap()
    })
}

/// Whether a token looks auto-generated (digit runs, hex runs, `__`).
///
/// A blunt heuristic, kept for compatibility with how test engineers
/// already triage selectors: it will flag some stable version-bearing
/// identifiers and miss short numeric codes. Treat as a tunable, not a
/// correctness guarantee.
#[must_use]
pub fn looks_dynamic(s: &str) -> bool {
    dynamic_re().is_match(s)
}

/// Cap display text at [`MAX_TEXT_LEN`] characters, marking the cut.
fn clamp_display(text: String) -> String {
    if text.chars().count() > MAX_TEXT_LEN {
        let truncated: String = text.chars().take(MAX_TEXT_LEN - 3).collect();
        return format!("{truncated}...");
    }
    text
}

/// Canonical display text for an element.
#[must_use]
pub fn element_text(doc: &Document, id: NodeId) -> String {
    let Some(data) = doc.element(id) else {
        return String::new();
    };

    if data.tag == "input" || data.tag == "textarea" {
        if let Some(placeholder) = data.attr("placeholder").filter(|v| !v.is_empty()) {
            return placeholder.to_string();
        }
        if let Some(value) = data.attr("value").filter(|v| !v.is_empty()) {
            return value.to_string();
        }
        return String::new();
    }

    // A select reads as its chosen option's label, not the concatenation
    // of every option.
    if data.tag == "select" {
        let options: Vec<NodeId> = doc
            .descendant_elements(id)
            .into_iter()
            .filter(|o| doc.element(*o).is_some_and(|e| e.tag == "option"))
            .collect();
        let chosen = options
            .iter()
            .copied()
            .find(|o| doc.element(*o).is_some_and(|e| e.attr("selected").is_some()))
            .or_else(|| options.first().copied());
        return chosen
            .map_or_else(String::new, |o| clamp_display(doc.direct_text(o).trim().to_string()));
    }

    if let Some(label) = data.attr("aria-label").filter(|v| !v.is_empty()) {
        return label.to_string();
    }
    if let Some(title) = data.attr("title").filter(|v| !v.is_empty()) {
        return title.to_string();
    }

    let direct = doc.direct_text(id).trim().to_string();
    if !direct.is_empty() {
        return clamp_display(direct);
    }

    clamp_display(doc.full_text(id).trim().to_string())
}

/// Whether `text` is usable as a text-locator anchor: bounded length, not
/// whitespace, not dynamic-looking.
#[must_use]
pub fn is_good_text(text: &str) -> bool {
    let len = text.chars().count();
    if !(MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&len) {
        return false;
    }
    if text.trim().is_empty() {
        return false;
    }
    !looks_dynamic(text)
}

/// Reduce text matches to the deepest ones, the way runtime text matchers
/// resolve nested hits: an ancestor whose text only comes from a matching
/// descendant is not a separate match.
fn deepest_matches(doc: &Document, matches: &[NodeId]) -> Vec<NodeId> {
    matches
        .iter()
        .copied()
        .filter(|m| !matches.iter().any(|o| o != m && doc.is_ancestor(*m, *o)))
        .collect()
}

/// Whether a text match for `text` (optionally restricted to `tag_filter`)
/// resolves unambiguously to `el`.
///
/// This is an O(document) scan; callers gate it through the budget guard.
#[must_use]
pub fn is_unique_by_text(
    doc: &Document,
    el: NodeId,
    text: &str,
    tag_filter: Option<&str>,
) -> bool {
    let mut matches: Vec<NodeId> = Vec::new();
    for id in doc.all_elements() {
        if let Some(tag) = tag_filter {
            if doc.element(id).map_or(true, |e| e.tag != tag) {
                continue;
            }
        }
        if element_text(doc, id) == text {
            matches.push(id);
        }
    }
    deepest_matches(doc, &matches) == [el]
}

/// Whether a text match for `text` inside `scope` resolves unambiguously
/// to `el`.
#[must_use]
pub fn is_unique_by_text_in(doc: &Document, el: NodeId, text: &str, scope: NodeId) -> bool {
    let mut matches: Vec<NodeId> = Vec::new();
    for id in doc.descendant_elements(scope) {
        if element_text(doc, id) == text {
            matches.push(id);
        }
    }
    deepest_matches(doc, &matches) == [el]
}

/// All candidate texts for `el`: the pre-snap original's text first (when
/// distinct and good), then the element's own text, then the texts of
/// descendants, deduplicated, shortest first after the priority entry.
#[must_use]
pub fn all_candidate_texts(
    doc: &Document,
    el: NodeId,
    original_text: Option<&str>,
) -> Vec<String> {
    let mut texts: Vec<String> = Vec::new();
    if let Some(orig) = original_text {
        if !orig.is_empty() {
            texts.push(orig.to_string());
        }
    }
    let main = element_text(doc, el);
    if !main.is_empty() {
        texts.push(main.clone());
    }
    for child in doc.descendant_elements(el) {
        let child_text = element_text(doc, child);
        if !child_text.is_empty() && child_text != main && child_text.chars().count() >= MIN_TEXT_LEN
        {
            texts.push(child_text);
        }
    }

    let mut seen = std::collections::HashSet::new();
    texts.retain(|t| seen.insert(t.clone()));

    // Shorter text is a more precise match; the original's text stays first.
    match original_text {
        Some(orig) if texts.first().is_some_and(|t| t == orig) => {
            texts[1..].sort_by_key(|t| t.chars().count());
        }
        _ => texts.sort_by_key(|t| t.chars().count()),
    }
    texts
}
