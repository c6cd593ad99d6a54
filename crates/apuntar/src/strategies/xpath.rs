//! XPath strategies: attribute mirrors, class containment, id-relative
//! descents, and the absolute path.
//!
//! These carry a small negative prior so the CSS spelling of the same
//! anchor always outranks them; they exist for hosts whose tooling wants
//! XPath and as a `contains(@class, ...)` fallback for multi-class soup.

use super::{Ctx, Strategy, GENERIC_ATTRS, PREFERRED_TEST_ATTRS};
use crate::address::{Address, Tier};
use crate::budget::StrategyCost;
use crate::text::looks_dynamic;
use apuntar_dom::NodeId;

pub(super) const XPATH_PRIOR: i32 = -10;

/// XPath string literal for `value`, using `concat()` when the value mixes
/// quote characters.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    // Both quote kinds present: stitch pieces around the single quotes.
    let mut parts: Vec<String> = Vec::new();
    for (i, piece) in value.split('\'').enumerate() {
        if i > 0 {
            parts.push("\"'\"".to_string());
        }
        if !piece.is_empty() {
            parts.push(format!("'{piece}'"));
        }
    }
    format!("concat({})", parts.join(","))
}

/// `/html/body/...` path with same-tag positional predicates. Resolves for
/// any attached element.
#[must_use]
pub fn absolute_xpath(ctx: &Ctx<'_>, target: NodeId) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut node = Some(target);
    while let Some(id) = node {
        let data = ctx.doc.element(id)?;
        if data.tag == "html" {
            segments.push("html".to_string());
            break;
        }
        let n = ctx.doc.nth_of_type_index(id)?;
        if n == 1 && ctx.doc.element_siblings(id).iter().filter(|s| {
            ctx.doc.element(**s).is_some_and(|e| e.tag == data.tag)
        }).count() == 1 {
            segments.push(data.tag.clone());
        } else {
            segments.push(format!("{}[{n}]", data.tag));
        }
        node = ctx.doc.parent_element(id);
    }
    segments.reverse();
    Some(format!("/{}", segments.join("/")))
}

/// XPath mirror strategy.
pub struct XPathMirrors;

impl Strategy for XPathMirrors {
    fn name(&self) -> &'static str {
        "xpath"
    }
    fn tier(&self) -> Tier {
        Tier::XPath
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Moderate
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(data) = ctx.doc.element(ctx.el) else {
            return;
        };
        let tag = ctx.tag().to_string();

        for name in PREFERRED_TEST_ATTRS.iter().chain(GENERIC_ATTRS) {
            let Some(value) = data.attr(name).filter(|v| !v.is_empty()) else {
                continue;
            };
            if looks_dynamic(value) && *name != "id" {
                continue;
            }
            let expr = format!("//{tag}[@{name}={}]", xpath_literal(value));
            ctx.push_xpath(out, expr, self.name(), XPATH_PRIOR);
        }

        if let (Some(role), Some(label)) = (data.attr("role"), data.attr("aria-label")) {
            if !role.is_empty() && !label.is_empty() {
                let expr = format!(
                    "//{tag}[@role={} and @aria-label={}]",
                    xpath_literal(role),
                    xpath_literal(label)
                );
                ctx.push_xpath(out, expr, self.name(), XPATH_PRIOR);
            }
        }

        for class in data.classes().filter(|c| !c.is_empty() && !looks_dynamic(c)) {
            let expr = format!("//{tag}[contains(@class,{})]", xpath_literal(class));
            if ctx.push_xpath(out, expr, self.name(), XPATH_PRIOR) {
                break;
            }
        }

        // Descend from the nearest stable-id ancestor; when the bare
        // descent is ambiguous, qualify with the per-parent position.
        for ancestor in ctx.doc.ancestors(ctx.el) {
            let Some(anc) = ctx.doc.element(ancestor) else {
                break;
            };
            if anc.tag == "body" || anc.tag == "html" {
                break;
            }
            if let Some(id) = anc.id().filter(|v| !looks_dynamic(v)) {
                let expr = format!("//*[@id={}]//{tag}", xpath_literal(id));
                if !ctx.push_xpath(out, expr, self.name(), XPATH_PRIOR) {
                    if let Some(n) = ctx.doc.nth_of_type_index(ctx.el) {
                        let indexed = format!("//*[@id={}]//{tag}[{n}]", xpath_literal(id));
                        ctx.push_xpath(out, indexed, self.name(), XPATH_PRIOR);
                    }
                }
                break;
            }
        }
    }
}
