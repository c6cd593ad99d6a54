//! Structural-position strategies: `:nth-child` shapes, sibling anchors,
//! and the calendar-cell special case.
//!
//! Everything here is brittle by construction and scored accordingly; the
//! point is to always have *something* when an element carries no stable
//! hook of its own.

use super::{class_selector, id_selector, Ctx, Strategy};
use crate::address::{Address, Meta, TextConstraints, Tier};
use crate::budget::StrategyCost;
use crate::text::{element_text, is_unique_by_text_in, looks_dynamic};
use apuntar_dom::NodeId;
use regex::Regex;
use std::sync::OnceLock;

/// Structural-position strategy.
pub struct Positional;

fn calendar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| Regex::new(r"(?i)\b(calendar|datepicker|day|month)\b").unwrap())
}

fn today_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| Regex::new(r"(?i)\b(today|selected|current)\b").unwrap())
}

/// Compact selector for an element usable as a local anchor: stable id,
/// else stable class, else nothing.
fn local_anchor(ctx: &Ctx<'_>, id: NodeId) -> Option<String> {
    let data = ctx.doc.element(id)?;
    if let Some(el_id) = data.id().filter(|v| !looks_dynamic(v)) {
        return Some(id_selector(el_id));
    }
    data.classes()
        .find(|c| !c.is_empty() && !looks_dynamic(c))
        .map(class_selector)
}

fn ancestor_scoped(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    let tag = ctx.tag().to_string();
    let siblings = ctx.doc.element_siblings(ctx.el);
    let first = siblings.first() == Some(&ctx.el);
    let last = siblings.last() == Some(&ctx.el);
    let nth_child = ctx.doc.nth_child_index(ctx.el);
    let nth_of_type = ctx.doc.nth_of_type_index(ctx.el);

    // Climb until some ancestor scope pins the position down. The direct
    // parent may fall back to its bare tag; further up only anchored
    // ancestors are worth a descendant-combinator scope.
    for (depth, ancestor) in ctx.doc.ancestors(ctx.el).take(6).enumerate() {
        let anchor = local_anchor(ctx, ancestor);
        let (prefix, glue) = if depth == 0 {
            let Some(p) = anchor.or_else(|| ctx.doc.element(ancestor).map(|a| a.tag.clone()))
            else {
                return;
            };
            (p, " > ")
        } else {
            let Some(p) = anchor else { continue };
            (p, " ")
        };

        let mut pushed = false;
        if first {
            pushed |=
                ctx.push_positional(out, format!("{prefix}{glue}{tag}:first-child"), "positional");
        }
        if last {
            pushed |=
                ctx.push_positional(out, format!("{prefix}{glue}{tag}:last-child"), "positional");
        }
        if let Some(n) = nth_child {
            pushed |= ctx.push_positional(
                out,
                format!("{prefix}{glue}{tag}:nth-child({n})"),
                "positional",
            );
        }
        if let Some(n) = nth_of_type {
            pushed |= ctx.push_positional(
                out,
                format!("{prefix}{glue}{tag}:nth-of-type({n})"),
                "positional",
            );
        }
        if pushed {
            return;
        }
    }
}

fn sibling_anchored(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    let tag = ctx.tag().to_string();
    if let Some(prev) = ctx.doc.previous_element_sibling(ctx.el) {
        if let Some(anchor) = local_anchor(ctx, prev) {
            ctx.push_positional(out, format!("{anchor} + {tag}"), "sibling");
        }
    }
    // A stable earlier sibling further away still works with `~`, as long
    // as the target is the only such tag after it.
    let siblings = ctx.doc.element_siblings(ctx.el);
    let own_pos = siblings.iter().position(|s| *s == ctx.el);
    if let Some(pos) = own_pos {
        for earlier in siblings[..pos].iter().rev().skip(1) {
            if let Some(anchor) = local_anchor(ctx, *earlier) {
                if ctx.push_positional(out, format!("{anchor} ~ {tag}"), "sibling") {
                    break;
                }
            }
        }
    }
}

/// Nearest calendar-looking ancestor within six levels.
fn calendar_container(ctx: &Ctx<'_>) -> Option<NodeId> {
    ctx.doc.ancestors(ctx.el).take(6).find(|ancestor| {
        ctx.doc.element(*ancestor).is_some_and(|data| {
            data.classes().any(|c| calendar_re().is_match(c))
                || data.id().is_some_and(|id| calendar_re().is_match(id))
        })
    })
}

/// Day cells inside calendar-looking containers: anchor on the container
/// and the day number, which outlives any row/column reshuffle.
fn calendar_cell(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    let text = element_text(ctx.doc, ctx.el);
    let Ok(day) = text.trim().parse::<u8>() else {
        return;
    };
    if !(1..=31).contains(&day) {
        return;
    }
    if let Some(ancestor) = calendar_container(ctx) {
        let Some(scope) = local_anchor(ctx, ancestor) else {
            return;
        };
        if ctx.oracle.resolves_to_one(&scope) == Some(ancestor)
            && is_unique_by_text_in(ctx.doc, ctx.el, text.trim(), ancestor)
        {
            out.push(Address::text(
                TextConstraints {
                    text: text.trim().to_string(),
                    scope: Some(scope),
                    tag: Some(ctx.tag().to_string()),
                    visible_scope: false,
                },
                Meta { strategy: "calendar-day", prior: 0, tier: Tier::Positional },
                ctx.el,
            ));
        }
    }
}

/// Offset from a marked "today"/"selected" cell in the same row, rendered
/// as a chain of adjacent-sibling combinators. Forward offsets only; CSS
/// has no previous-sibling combinator.
fn calendar_offset(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    if calendar_container(ctx).is_none() {
        return;
    }
    let tag = ctx.tag().to_string();
    let siblings = ctx.doc.element_siblings(ctx.el);
    let Some(pos) = siblings.iter().position(|s| *s == ctx.el) else {
        return;
    };
    for (i, sib) in siblings[..pos].iter().enumerate() {
        let Some(data) = ctx.doc.element(*sib) else {
            continue;
        };
        let Some(mark) = data.classes().find(|c| today_re().is_match(c)) else {
            continue;
        };
        let steps = pos - i;
        if steps > 7 {
            continue;
        }
        let mut selector = class_selector(mark);
        for _ in 0..steps {
            selector.push_str(" + ");
            selector.push_str(&tag);
        }
        if ctx.push_positional(out, selector, "calendar-offset") {
            return;
        }
    }
}

impl Strategy for Positional {
    fn name(&self) -> &'static str {
        "positional"
    }
    fn tier(&self) -> Tier {
        Tier::Positional
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Moderate
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        ancestor_scoped(ctx, out);
        sibling_anchored(ctx, out);
        calendar_cell(ctx, out);
        calendar_offset(ctx, out);
    }
}
