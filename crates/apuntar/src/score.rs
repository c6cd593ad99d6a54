//! Robustness scoring.
//!
//! Scores are a signed sum of feature contributions: one anchor bonus for
//! the strongest stable hook the locator has, minus structural fragility
//! penalties, plus context bonuses. The raw sum ranks candidates; for
//! display it is squashed onto 0..=100 with a tanh curve so that a strong
//! test-attribute anchor lands in the 90s and a bare positional path in
//! the 20s without either saturating the scale.

use crate::actionable::Actionable;
use crate::address::{Address, AddressKind};
use crate::strategies::{GENERIC_ATTRS, PREFERRED_TEST_ATTRS};
use crate::text::looks_dynamic;

// Anchor bonuses, strongest hook wins.
const ANCHOR_TEST_ATTR: i32 = 90;
const ANCHOR_ID: i32 = 80;
const ANCHOR_ROLE_ARIA: i32 = 60;
const ANCHOR_CLASS: i32 = 40;
const ANCHOR_OTHER_ATTR: i32 = 30;
const ANCHOR_SCOPED_TEXT: i32 = 45;
const ANCHOR_GLOBAL_TEXT: i32 = 35;

// Fragility penalties.
const PENALTY_NTH: i32 = -25;
const PENALTY_POSITIONAL_KIND: i32 = -15;
const PENALTY_ABSOLUTE_PATH: i32 = -60;
const PENALTY_DIGIT_RATIO_MAX: i32 = 30;
const PENALTY_PER_DEPTH: i32 = -8;
const PENALTY_PER_EXTRA_TOKEN: i32 = -6;
const PENALTY_PER_EXTRA_SEGMENT: i32 = -4;
const PENALTY_ADJACENT_SIBLING: i32 = -12;
const PENALTY_PER_ATTR: i32 = -3;
const PENALTY_UNKNOWN_DATA_ATTR: i32 = -5;

// Context bonuses.
const BONUS_CONTAINER_STABLE: i32 = 12;
const BONUS_CONTAINER: i32 = 5;
const BONUS_VISIBILITY: i32 = 6;
const BONUS_ACTION_FIT_STRONG: i32 = 10;
const BONUS_ACTION_FIT_WEAK: i32 = 6;
const PENALTY_ACTION_MISFIT: i32 = -6;
const BONUS_SIMPLE_FORM: i32 = 12;

const RESILIENCE_DEFAULT: i32 = 5;
const RESILIENCE_SEMANTIC: i32 = 10;
const RESILIENCE_STRUCTURAL: i32 = 1;

/// Structural features pulled out of a selector string.
#[derive(Debug, Default)]
struct Features {
    element_segments: usize,
    attr_tokens: usize,
    unknown_data_attrs: usize,
    pseudo_tokens: usize,
    nth_tokens: usize,
    adjacent_combinators: usize,
    has_test_attr: bool,
    has_role: bool,
    has_aria_label: bool,
    has_other_attr: bool,
    /// Digit-free id anchor present.
    has_stable_id: bool,
    /// Digit-free class anchor present.
    has_stable_class: bool,
    /// Only tag names and structural pseudos, no attribute or class hooks.
    tags_only: bool,
    digit_chars: usize,
    ident_chars: usize,
}

fn attr_name_of(token: &str) -> &str {
    let inner = token.trim_start_matches('[').trim_end_matches(']');
    inner
        .split(|c| c == '=' || c == '^' || c == '$' || c == '*' || c == '~')
        .next()
        .unwrap_or(inner)
        .trim_matches('@')
}

#[allow(clippy::too_many_lines)]
fn extract(selector: &str) -> Features {
    let mut f = Features { tags_only: true, ..Features::default() };

    // Coarse token scan; scoring needs shape, not a full parse.
    let mut chars = selector.chars();
    let mut token = String::new();
    let mut segment_open = false;

    let flush = |token: &mut String, f: &mut Features, segment_open: &mut bool| {
        if token.is_empty() {
            return;
        }
        let t = token.as_str();
        let bracket_inner = t.strip_prefix('[').and_then(|r| r.strip_suffix(']'));
        if bracket_inner.is_some_and(|r| !r.is_empty() && r.chars().all(|c| c.is_ascii_digit())) {
            // XPath positional predicate, same fragility as :nth-child.
            f.nth_tokens += 1;
        } else if t.starts_with('[') || t.starts_with('@') {
            f.attr_tokens += 1;
            f.tags_only = false;
            let name = attr_name_of(t);
            if PREFERRED_TEST_ATTRS.contains(&name) {
                f.has_test_attr = true;
            } else if name == "role" {
                f.has_role = true;
            } else if name == "aria-label" {
                f.has_aria_label = true;
            } else if name.starts_with("data-") {
                f.unknown_data_attrs += 1;
            } else if GENERIC_ATTRS.contains(&name) {
                f.has_other_attr = true;
            }
        } else if let Some(id) = t.strip_prefix('#') {
            f.tags_only = false;
            if !looks_dynamic(id) {
                f.has_stable_id = true;
            }
        } else if let Some(class) = t.strip_prefix('.') {
            f.tags_only = false;
            if !looks_dynamic(class) {
                f.has_stable_class = true;
            }
        } else if let Some(pseudo) = t.strip_prefix(':') {
            f.pseudo_tokens += 1;
            if pseudo.starts_with("nth-") || pseudo.starts_with("first-")
                || pseudo.starts_with("last-") || pseudo.starts_with("only-")
            {
                f.nth_tokens += 1;
            }
        } else if !*segment_open {
            // Bare tag opens a segment; ids/classes glued to it were
            // counted above, the segment itself counts once.
            *segment_open = true;
        }
        for c in t.chars() {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                f.ident_chars += 1;
                if c.is_ascii_digit() {
                    f.digit_chars += 1;
                }
            }
        }
        token.clear();
    };

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                flush(&mut token, &mut f, &mut segment_open);
                token.push('[');
                for inner in chars.by_ref() {
                    token.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
                flush(&mut token, &mut f, &mut segment_open);
            }
            '#' | '.' | ':' | '@' => {
                flush(&mut token, &mut f, &mut segment_open);
                token.push(c);
            }
            ' ' | '>' | '~' | '/' => {
                flush(&mut token, &mut f, &mut segment_open);
                if segment_open {
                    f.element_segments += 1;
                    segment_open = false;
                }
            }
            '+' => {
                flush(&mut token, &mut f, &mut segment_open);
                f.adjacent_combinators += 1;
                if segment_open {
                    f.element_segments += 1;
                    segment_open = false;
                }
            }
            '(' => {
                // Swallow pseudo/predicate arguments; they are not hooks.
                flush(&mut token, &mut f, &mut segment_open);
                let mut depth = 1;
                for inner in chars.by_ref() {
                    match inner {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => token.push(c),
        }
    }
    flush(&mut token, &mut f, &mut segment_open);
    if segment_open {
        f.element_segments += 1;
    }
    f.element_segments = f.element_segments.max(1);
    f
}

fn anchor_bonus(addr: &Address, f: &Features) -> i32 {
    if let Some(c) = &addr.constraints {
        return if c.scope.is_some() { ANCHOR_SCOPED_TEXT } else { ANCHOR_GLOBAL_TEXT };
    }
    if f.has_test_attr {
        ANCHOR_TEST_ATTR
    } else if f.has_stable_id {
        ANCHOR_ID
    } else if f.has_role && f.has_aria_label {
        ANCHOR_ROLE_ARIA
    } else if f.has_stable_class {
        ANCHOR_CLASS
    } else if f.has_other_attr || f.has_role || f.has_aria_label {
        ANCHOR_OTHER_ATTR
    } else {
        0
    }
}

fn digit_ratio_penalty(f: &Features) -> i32 {
    if f.ident_chars == 0 {
        return 0;
    }
    let ratio = f.digit_chars as f64 / f.ident_chars as f64;
    -(((ratio * 60.0).round() as i32).min(PENALTY_DIGIT_RATIO_MAX))
}

fn action_fit(addr: &Address, f: &Features, actionable: Actionable) -> i32 {
    let form_anchor = f.has_test_attr || f.has_other_attr;
    match actionable {
        Actionable::TextEntry | Actionable::Toggle | Actionable::Chooser => {
            if form_anchor || f.has_stable_id {
                BONUS_ACTION_FIT_STRONG
            } else if addr.kind == AddressKind::Positional {
                PENALTY_ACTION_MISFIT
            } else {
                0
            }
        }
        Actionable::Trigger => {
            if addr.constraints.is_some() || f.has_role {
                BONUS_ACTION_FIT_WEAK
            } else if addr.kind == AddressKind::Positional {
                PENALTY_ACTION_MISFIT
            } else {
                0
            }
        }
        Actionable::Generic => 0,
    }
}

fn resilience(addr: &Address, f: &Features, absolute: bool) -> i32 {
    if f.has_test_attr || (f.has_role && f.has_aria_label) {
        RESILIENCE_SEMANTIC
    } else if absolute || f.nth_tokens > 0 || addr.kind == AddressKind::Positional {
        RESILIENCE_STRUCTURAL
    } else {
        RESILIENCE_DEFAULT
    }
}

/// Raw signed robustness score for a verified address.
#[must_use]
pub fn score_address(addr: &Address, actionable: Actionable) -> i32 {
    let f = extract(&addr.selector);
    let mut score = addr.meta.prior;

    score += anchor_bonus(addr, &f);

    let absolute = f.tags_only && addr.constraints.is_none() && f.element_segments >= 3;
    if absolute {
        score += PENALTY_ABSOLUTE_PATH;
    }
    score += PENALTY_NTH * i32::try_from(f.nth_tokens).unwrap_or(i32::MAX);
    if addr.kind == AddressKind::Positional {
        score += PENALTY_POSITIONAL_KIND;
    }
    score += digit_ratio_penalty(&f);

    let depth = f.element_segments;
    if depth > 2 {
        score += PENALTY_PER_DEPTH * i32::try_from(depth - 2).unwrap_or(i32::MAX);
    }
    if depth > 1 {
        score += PENALTY_PER_EXTRA_SEGMENT * i32::try_from(depth - 1).unwrap_or(i32::MAX);
    }
    let tokens = f.attr_tokens + f.pseudo_tokens;
    if tokens > 2 {
        score += PENALTY_PER_EXTRA_TOKEN * i32::try_from(tokens - 2).unwrap_or(i32::MAX);
    }
    score += PENALTY_ADJACENT_SIBLING * i32::try_from(f.adjacent_combinators).unwrap_or(i32::MAX);
    score += PENALTY_PER_ATTR * i32::try_from(f.attr_tokens).unwrap_or(i32::MAX);
    score += PENALTY_UNKNOWN_DATA_ATTR * i32::try_from(f.unknown_data_attrs).unwrap_or(i32::MAX);

    if let Some(c) = &addr.constraints {
        let len = c.text.chars().count();
        score += if len <= 25 {
            0
        } else if len <= 50 {
            -8
        } else {
            -20
        };
        if let Some(scope) = &c.scope {
            score += if looks_dynamic(scope) { BONUS_CONTAINER } else { BONUS_CONTAINER_STABLE };
        }
        if c.visible_scope {
            score += BONUS_VISIBILITY;
        }
    }

    score += action_fit(addr, &f, actionable);
    score += resilience(addr, &f, absolute);

    // A single short segment with at most two hooks survives refactors far
    // better than anything compound.
    let simple = depth == 1
        && f.adjacent_combinators == 0
        && tokens + usize::from(f.has_stable_id) + usize::from(f.has_stable_class) <= 2
        && addr.constraints.is_none()
        && !f.tags_only;
    if simple {
        score += BONUS_SIMPLE_FORM;
    }
    score
}

/// Squash a raw score onto the 0..=100 display scale.
#[must_use]
pub fn normalize(raw: i32) -> u8 {
    let squashed = 50.0 + 50.0 * (f64::from(raw) / 80.0).tanh();
    squashed.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Meta, TextConstraints, Tier};
    use apuntar_dom::NodeId;

    fn meta() -> Meta {
        Meta { strategy: "test", prior: 0, tier: Tier::Core }
    }

    fn css(selector: &str) -> Address {
        Address::css(selector, meta(), NodeId::default())
    }

    // =========================================================================
    // anchors
    // =========================================================================

    #[test]
    fn test_attr_outranks_id_outranks_class() {
        let test_attr = score_address(&css("[data-testid=\"save\"]"), Actionable::Generic);
        let id = score_address(&css("#save-btn"), Actionable::Generic);
        let class = score_address(&css(".save-btn"), Actionable::Generic);
        assert!(test_attr > id, "{test_attr} vs {id}");
        assert!(id > class, "{id} vs {class}");
    }

    #[test]
    fn digit_bearing_id_drops_below_stable_class() {
        let digit_id = score_address(&css("#item-48291"), Actionable::Generic);
        let class = score_address(&css(".item-row"), Actionable::Generic);
        assert!(digit_id < class, "{digit_id} vs {class}");
    }

    // =========================================================================
    // fragility
    // =========================================================================

    #[test]
    fn positional_scores_far_below_attribute_anchor() {
        let pos = Address::positional("li:nth-child(3)", meta(), NodeId::default());
        let pos_score = normalize(score_address(&pos, Actionable::Generic));
        let anchor = normalize(score_address(&css("#submit-btn"), Actionable::Generic));
        assert!(anchor >= 80, "anchor normalized to {anchor}");
        assert!(i32::from(anchor) - i32::from(pos_score) > 40);
    }

    #[test]
    fn absolute_path_is_floor_but_nonzero() {
        let abs = Address::positional(
            "html > body > div:nth-of-type(2) > ul > li:nth-of-type(3)",
            meta(),
            NodeId::default(),
        );
        let raw = score_address(&abs, Actionable::Generic);
        let norm = normalize(raw);
        assert!(raw < -100);
        assert!(norm < 20);
    }

    #[test]
    fn adjacent_sibling_costs_more_than_child() {
        let sib = score_address(&css("#anchor + div"), Actionable::Generic);
        let child = score_address(&css("#anchor > div"), Actionable::Generic);
        assert!(sib < child);
    }

    // =========================================================================
    // text and context
    // =========================================================================

    #[test]
    fn scoped_text_beats_global_text() {
        let scoped = Address::text(
            TextConstraints {
                text: "OK".into(),
                scope: Some(".modal".into()),
                tag: None,
                visible_scope: true,
            },
            meta(),
            NodeId::default(),
        );
        let global = Address::text(
            TextConstraints { text: "OK".into(), scope: None, tag: None, visible_scope: false },
            meta(),
            NodeId::default(),
        );
        let s = score_address(&scoped, Actionable::Trigger);
        let g = score_address(&global, Actionable::Trigger);
        assert!(s > g);
    }

    #[test]
    fn long_text_is_penalized() {
        let short = Address::text(
            TextConstraints { text: "Save".into(), scope: None, tag: None, visible_scope: false },
            meta(),
            NodeId::default(),
        );
        let long = Address::text(
            TextConstraints {
                text: "a".repeat(47) + "...",
                scope: None,
                tag: None,
                visible_scope: false,
            },
            meta(),
            NodeId::default(),
        );
        assert!(
            score_address(&short, Actionable::Generic)
                > score_address(&long, Actionable::Generic)
        );
    }

    #[test]
    fn name_anchor_fits_text_entry() {
        let with_fit = score_address(&css("[name=\"email\"]"), Actionable::TextEntry);
        let without = score_address(&css("[name=\"email\"]"), Actionable::Generic);
        assert!(with_fit > without);
    }

    // =========================================================================
    // normalization
    // =========================================================================

    #[test]
    fn normalize_is_monotonic_and_bounded() {
        assert!(normalize(-1000) <= 2);
        assert!(normalize(1000) >= 98);
        assert_eq!(normalize(0), 50);
        let mut prev = normalize(-200);
        for raw in (-200..=200).step_by(10) {
            let n = normalize(raw);
            assert!(n >= prev);
            prev = n;
        }
    }
}
