//! Text-anchored strategies.
//!
//! Text is what the user actually sees, which makes it the most readable
//! anchor and the one most sensitive to copy changes; scoring balances the
//! two. Uniqueness here is checked by scanning display text, not through
//! the CSS oracle, because no selector engine shipped to a page can match
//! on trimmed text content.

use super::{class_selector, id_selector, Ctx, Strategy};
use crate::address::{Address, Meta, TextConstraints, Tier};
use crate::budget::StrategyCost;
use crate::text::{
    all_candidate_texts, is_good_text, is_unique_by_text, is_unique_by_text_in, looks_dynamic,
};
use regex::Regex;
use std::sync::OnceLock;

/// Text-anchored strategy family.
pub struct Textual;

fn floating_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(modal|dialog|dropdown|popup|popover|sidebar|panel|datepicker|menu)\b")
            .unwrap()
    })
}

fn meta(strategy: &'static str) -> Meta {
    Meta { strategy, prior: 0, tier: Tier::Text }
}

fn push_text(
    ctx: &Ctx<'_>,
    out: &mut Vec<Address>,
    text: &str,
    scope: Option<String>,
    tag: Option<String>,
    visible_scope: bool,
    strategy: &'static str,
) {
    out.push(Address::text(
        TextConstraints { text: text.to_string(), scope, tag, visible_scope },
        meta(strategy),
        ctx.el,
    ));
}

/// Floating containers (modals, dropdowns) often exist several times in
/// the DOM with only one visible; scoping to them needs the visibility
/// filter to stay faithful at runtime even though the snapshot cannot
/// check it.
fn floating_scope(ctx: &Ctx<'_>) -> Option<(apuntar_dom::NodeId, String)> {
    for ancestor in ctx.doc.ancestors(ctx.el) {
        let data = ctx.doc.element(ancestor)?;
        if data.tag == "body" {
            return None;
        }
        let floating = data.classes().any(|c| floating_re().is_match(c))
            || data.id().is_some_and(|id| floating_re().is_match(id));
        if !floating {
            continue;
        }
        if let Some(id) = data.id().filter(|v| !looks_dynamic(v)) {
            return Some((ancestor, id_selector(id)));
        }
        if let Some(class) = data.classes().find(|c| floating_re().is_match(c) && !looks_dynamic(c))
        {
            return Some((ancestor, class_selector(class)));
        }
    }
    None
}

/// Smallest ancestor with a stable hook inside which the text is unique.
fn smallest_unique_scope(
    ctx: &Ctx<'_>,
    text: &str,
) -> Option<(apuntar_dom::NodeId, String)> {
    for ancestor in ctx.doc.ancestors(ctx.el) {
        let data = ctx.doc.element(ancestor)?;
        if data.tag == "body" || data.tag == "html" {
            return None;
        }
        let hook = data
            .id()
            .filter(|v| !looks_dynamic(v))
            .map(|id| id_selector(id))
            .or_else(|| {
                data.classes()
                    .find(|c| !c.is_empty() && !looks_dynamic(c))
                    .map(class_selector)
            });
        let Some(selector) = hook else {
            continue;
        };
        if ctx.oracle.resolves_to_one(&selector) == Some(ancestor)
            && is_unique_by_text_in(ctx.doc, ctx.el, text, ancestor)
        {
            return Some((ancestor, selector));
        }
    }
    None
}

impl Strategy for Textual {
    fn name(&self) -> &'static str {
        "text"
    }
    fn tier(&self) -> Tier {
        Tier::Text
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Expensive
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let tag = ctx.tag().to_string();
        // Form controls surface placeholder/value as display text, which a
        // runtime text matcher cannot see.
        if matches!(tag.as_str(), "input" | "textarea" | "select") {
            return;
        }
        for text in all_candidate_texts(ctx.doc, ctx.el, ctx.original_text) {
            if !is_good_text(&text) {
                continue;
            }
            if is_unique_by_text(ctx.doc, ctx.el, &text, None) {
                push_text(ctx, out, &text, None, None, false, "text");
                continue;
            }
            if is_unique_by_text(ctx.doc, ctx.el, &text, Some(&tag)) {
                push_text(ctx, out, &text, None, Some(tag.clone()), false, "tag-text");
                continue;
            }
            if let Some((node, scope)) = floating_scope(ctx) {
                if is_unique_by_text_in(ctx.doc, ctx.el, &text, node) {
                    push_text(ctx, out, &text, Some(scope), None, true, "floating-text");
                    continue;
                }
            }
            if let Some((_, scope)) = smallest_unique_scope(ctx, &text) {
                push_text(ctx, out, &text, Some(scope), None, false, "scoped-text");
            }
        }
    }
}
