//! Last-resort strategies: partial attribute matches, structural pseudo
//! classes, minimal unique suffixes, and the absolute path that always
//! resolves.

use super::xpath::{absolute_xpath, XPATH_PRIOR};
use super::{class_selector, Ctx, Strategy};
use crate::address::{Address, Tier};
use crate::budget::StrategyCost;
use crate::text::looks_dynamic;
use apuntar_dom::NodeId;

const AGGRESSIVE_PRIOR: i32 = -10;

/// Absolute CSS path from `html` to `target`, indexing only the segments
/// that have same-tag siblings. Resolves for any attached element.
#[must_use]
pub fn absolute_css_path(ctx: &Ctx<'_>, target: NodeId) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut node = Some(target);
    while let Some(id) = node {
        let data = ctx.doc.element(id)?;
        if data.tag == "html" {
            segments.push("html".to_string());
            break;
        }
        let same_tag = ctx
            .doc
            .element_siblings(id)
            .iter()
            .filter(|s| ctx.doc.element(**s).is_some_and(|e| e.tag == data.tag))
            .count();
        if same_tag > 1 {
            let n = ctx.doc.nth_of_type_index(id)?;
            segments.push(format!("{}:nth-of-type({n})", data.tag));
        } else {
            segments.push(data.tag.clone());
        }
        node = ctx.doc.parent_element(id);
    }
    segments.reverse();
    Some(segments.join(" > "))
}

/// Attribute-value tokens worth partial-matching: delimited, letter-bearing,
/// stable pieces of URL-ish values.
fn stable_tokens(value: &str) -> Vec<&str> {
    value
        .split(['/', '?', '&', '-', '_', '.', '='])
        .filter(|t| t.len() >= 3 && t.chars().any(|c| c.is_ascii_alphabetic()))
        .filter(|t| !looks_dynamic(t))
        .collect()
}

/// Aggressive strategy family.
pub struct Aggressive;

fn partial_attributes(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    let Some(data) = ctx.doc.element(ctx.el) else {
        return;
    };
    let tag = ctx.tag().to_string();
    for name in ["href", "src", "action", "value"] {
        let Some(value) = data.attr(name).filter(|v| !v.is_empty()) else {
            continue;
        };
        // Prefix up to the first dynamic-looking piece (and the mirror
        // suffix after the last one) keeps the stable parts of templated
        // URLs.
        if looks_dynamic(value) {
            let stable_prefix: String = value
                .chars()
                .take_while(|c| !c.is_ascii_digit())
                .collect();
            if stable_prefix.len() >= 4 {
                let selector = format!(
                    "{tag}[{name}^=\"{}\"]",
                    stable_prefix.replace('"', "\\\"")
                );
                if push_aggressive(ctx, out, selector) {
                    continue;
                }
            }
            let stable_suffix: String = value
                .chars()
                .rev()
                .take_while(|c| !c.is_ascii_digit())
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            if stable_suffix.len() >= 4 {
                let selector = format!(
                    "{tag}[{name}$=\"{}\"]",
                    stable_suffix.replace('"', "\\\"")
                );
                if push_aggressive(ctx, out, selector) {
                    continue;
                }
            }
        }
        for token in stable_tokens(value) {
            let selector = format!("{tag}[{name}*=\"{token}\"]");
            if push_aggressive(ctx, out, selector) {
                break;
            }
        }
    }
}

fn structural_pseudos(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    let tag = ctx.tag().to_string();
    let Some(parent) = ctx.doc.parent_element(ctx.el) else {
        return;
    };
    let prefix = ctx
        .doc
        .element(parent)
        .and_then(|p| {
            p.id()
                .filter(|v| !looks_dynamic(v))
                .map(|id| super::id_selector(id))
                .or_else(|| {
                    p.classes()
                        .find(|c| !c.is_empty() && !looks_dynamic(c))
                        .map(class_selector)
                })
        });
    let Some(prefix) = prefix else { return };
    let pseudos = [
        ":only-of-type",
        ":first-of-type",
        ":last-of-type",
        ":only-child",
        ":nth-child(odd)",
        ":nth-child(even)",
    ];
    for pseudo in pseudos {
        if push_aggressive(ctx, out, format!("{prefix} > {tag}{pseudo}")) {
            return;
        }
    }
}

/// Shortest `tag.class` suffix chain that becomes unique, capped at four
/// segments.
fn minimal_suffix(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    let mut segments: Vec<String> = Vec::new();
    let mut node = Some(ctx.el);
    while let Some(id) = node {
        let Some(data) = ctx.doc.element(id) else {
            break;
        };
        if data.tag == "body" || data.tag == "html" || segments.len() >= 4 {
            break;
        }
        let segment = data
            .classes()
            .find(|c| !c.is_empty() && !looks_dynamic(c))
            .map_or_else(|| data.tag.clone(), |c| format!("{}{}", data.tag, class_selector(c)));
        segments.insert(0, segment);
        if segments.len() > 1 && push_aggressive(ctx, out, segments.join(" > ")) {
            return;
        }
        node = ctx.doc.parent_element(id);
    }
}

fn bare_tag(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    push_aggressive(ctx, out, ctx.tag().to_string());
}

fn push_aggressive(ctx: &Ctx<'_>, out: &mut Vec<Address>, selector: String) -> bool {
    if ctx.oracle.is_unique_css(&selector, ctx.el) {
        out.push(Address::css(
            selector,
            crate::address::Meta { strategy: "aggressive", prior: AGGRESSIVE_PRIOR, tier: Tier::Aggressive },
            ctx.el,
        ));
        true
    } else {
        false
    }
}

impl Strategy for Aggressive {
    fn name(&self) -> &'static str {
        "aggressive"
    }
    fn tier(&self) -> Tier {
        Tier::Aggressive
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Expensive
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        bare_tag(ctx, out);
        partial_attributes(ctx, out);
        structural_pseudos(ctx, out);
        minimal_suffix(ctx, out);
    }
}

/// The unconditional absolute paths, CSS and XPath. These are what makes
/// generation total: every attached element gets at least one locator.
pub struct AbsolutePath;

impl Strategy for AbsolutePath {
    fn name(&self) -> &'static str {
        "absolute-path"
    }
    fn tier(&self) -> Tier {
        Tier::Aggressive
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Cheap
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        if let Some(path) = absolute_css_path(ctx, ctx.el) {
            ctx.push_positional(out, path, self.name());
        }
        if let Some(expr) = absolute_xpath(ctx, ctx.el) {
            ctx.push_xpath(out, expr, self.name(), XPATH_PRIOR);
        }
    }
}
