//! Stable-scope strategies: anchor on a uniquely-identifiable ancestor and
//! qualify the target inside it.
//!
//! The scope selector must itself resolve to exactly one element, so the
//! composed locator inherits uniqueness from the anchor even when the
//! target atom is generic (`form#login input`).

use super::{attr_selector, class_selector, id_selector, Ctx, Strategy, GENERIC_ATTRS,
            PREFERRED_TEST_ATTRS};
use crate::address::{Address, Tier};
use crate::budget::StrategyCost;
use crate::text::looks_dynamic;
use apuntar_dom::NodeId;

/// Maximum ancestor levels searched for a stable anchor.
const MAX_ANCHOR_DEPTH: usize = 10;

/// Maximum segments in the structural chain from anchor to target.
const MAX_CHAIN_DEPTH: usize = 8;

/// Scope-anchored strategy.
pub struct StableScope;

/// A uniquely-resolvable ancestor selector.
struct Anchor {
    node: NodeId,
    selector: String,
}

fn find_anchor(ctx: &Ctx<'_>) -> Option<Anchor> {
    for (depth, ancestor) in ctx.doc.ancestors(ctx.el).enumerate() {
        if depth >= MAX_ANCHOR_DEPTH {
            break;
        }
        let Some(data) = ctx.doc.element(ancestor) else {
            break;
        };
        if data.tag == "body" || data.tag == "html" {
            break;
        }

        let mut candidates: Vec<String> = Vec::new();
        if let Some(id) = data.id().filter(|id| !looks_dynamic(id)) {
            candidates.push(id_selector(id));
        }
        for name in PREFERRED_TEST_ATTRS {
            if let Some(value) = data.attr(name).filter(|v| !v.is_empty()) {
                candidates.push(attr_selector(name, value));
            }
        }
        for class in data.classes().filter(|c| !c.is_empty() && !looks_dynamic(c)) {
            candidates.push(class_selector(class));
        }

        for selector in candidates {
            if ctx.oracle.resolves_to_one(&selector) == Some(ancestor) {
                return Some(Anchor { node: ancestor, selector });
            }
        }
    }
    None
}

/// Target atoms worth qualifying inside a scope, cheapest first.
fn target_atoms(ctx: &Ctx<'_>) -> Vec<String> {
    let Some(data) = ctx.doc.element(ctx.el) else {
        return Vec::new();
    };
    let tag = ctx.tag().to_string();
    let mut atoms = vec![tag.clone()];

    for name in PREFERRED_TEST_ATTRS {
        if let Some(value) = data.attr(name).filter(|v| !v.is_empty()) {
            atoms.push(attr_selector(name, value));
        }
    }
    let classes: Vec<&str> = data
        .classes()
        .filter(|c| !c.is_empty() && !looks_dynamic(c))
        .take(3)
        .collect();
    for class in &classes {
        atoms.push(class_selector(class));
        atoms.push(format!("{tag}{}", class_selector(class)));
    }
    if let [first, second, ..] = classes.as_slice() {
        atoms.push(format!("{}{}", class_selector(first), class_selector(second)));
    }
    if let (Some(role), Some(label)) = (data.attr("role"), data.attr("aria-label")) {
        if !role.is_empty() && !label.is_empty() {
            atoms.push(format!(
                "{}{}",
                attr_selector("role", role),
                attr_selector("aria-label", label)
            ));
        }
    }
    for name in GENERIC_ATTRS {
        if *name == "id" {
            continue;
        }
        if let Some(value) = data.attr(name).filter(|v| !v.is_empty() && !looks_dynamic(v)) {
            atoms.push(attr_selector(name, value));
        }
    }
    atoms
}

/// `tag:nth-of-type(i) > ... > tag:nth-of-type(j)` from just below `anchor`
/// down to the target.
fn structural_chain(ctx: &Ctx<'_>, anchor: NodeId) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut node = ctx.el;
    while node != anchor {
        if segments.len() >= MAX_CHAIN_DEPTH {
            return None;
        }
        let data = ctx.doc.element(node)?;
        let n = ctx.doc.nth_of_type_index(node)?;
        segments.push(format!("{}:nth-of-type({n})", data.tag));
        node = ctx.doc.parent_element(node)?;
    }
    segments.reverse();
    Some(segments.join(" > "))
}

impl Strategy for StableScope {
    fn name(&self) -> &'static str {
        "stable-scope"
    }
    fn tier(&self) -> Tier {
        Tier::Core
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Moderate
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(anchor) = find_anchor(ctx) else {
            return;
        };

        let mut emitted = 0usize;
        for atom in target_atoms(ctx) {
            let descendant = format!("{} {atom}", anchor.selector);
            if ctx.push_css(out, descendant, self.name(), Tier::Core) {
                emitted += 1;
            } else if ctx.doc.parent_element(ctx.el) == Some(anchor.node) {
                let child = format!("{} > {atom}", anchor.selector);
                if ctx.push_css(out, child, self.name(), Tier::Core) {
                    emitted += 1;
                }
            }
            if emitted >= 3 {
                return;
            }
        }

        // No atom was unique inside the scope; fall back to the structural
        // chain, which always resolves.
        if emitted == 0 {
            if let Some(chain) = structural_chain(ctx, anchor.node) {
                let selector = format!("{} > {chain}", anchor.selector);
                ctx.push_positional(out, selector, self.name());
            }
        }
    }
}
