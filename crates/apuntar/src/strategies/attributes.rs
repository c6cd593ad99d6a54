//! Attribute-anchored strategies: ids, test attributes, allow-listed
//! generic attributes, and auto-discovered stable attributes.

use super::{attr_selector, id_selector, Ctx, Strategy, GENERIC_ATTRS, PREFERRED_TEST_ATTRS};
use crate::address::{Address, Tier};
use crate::budget::StrategyCost;
use crate::text::looks_dynamic;

/// `#id` anchor. Digit-bearing ids are still emitted; scoring demotes them.
pub struct ById;

impl Strategy for ById {
    fn name(&self) -> &'static str {
        "id"
    }
    fn tier(&self) -> Tier {
        Tier::Core
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Cheap
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(id) = ctx.doc.element(ctx.el).and_then(|e| e.id()) else {
            return;
        };
        let id = id.to_string();
        if !ctx.push_css(out, id_selector(&id), self.name(), Tier::Core) {
            // Duplicate ids happen; tag-qualifying sometimes disambiguates.
            let qualified = format!("{}{}", ctx.tag(), id_selector(&id));
            ctx.push_css(out, qualified, self.name(), Tier::Core);
        }
    }
}

/// Dedicated test attributes (`data-testid` and friends), in preference
/// order, bare and tag-qualified.
pub struct TestAttributes;

impl Strategy for TestAttributes {
    fn name(&self) -> &'static str {
        "test-attribute"
    }
    fn tier(&self) -> Tier {
        Tier::Core
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Cheap
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(data) = ctx.doc.element(ctx.el) else {
            return;
        };
        for name in PREFERRED_TEST_ATTRS {
            let Some(value) = data.attr(name).filter(|v| !v.is_empty()) else {
                continue;
            };
            let bare = attr_selector(name, value);
            if !ctx.push_css(out, bare, self.name(), Tier::Core) {
                let qualified = format!("{}{}", ctx.tag(), attr_selector(name, value));
                ctx.push_css(out, qualified, self.name(), Tier::Core);
            }
        }
    }
}

/// Allow-listed ordinary attributes, plus the `role` + `aria-label` pair
/// and any remaining `data-*` attributes.
pub struct GenericAttributes;

impl Strategy for GenericAttributes {
    fn name(&self) -> &'static str {
        "attribute"
    }
    fn tier(&self) -> Tier {
        Tier::Core
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Cheap
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(data) = ctx.doc.element(ctx.el) else {
            return;
        };

        for name in GENERIC_ATTRS {
            if *name == "id" || PREFERRED_TEST_ATTRS.contains(name) {
                continue;
            }
            let Some(value) = data.attr(name).filter(|v| !v.is_empty()) else {
                continue;
            };
            if looks_dynamic(value) {
                continue;
            }
            let bare = attr_selector(name, value);
            if !ctx.push_css(out, bare, self.name(), Tier::Core) {
                let qualified = format!("{}{}", ctx.tag(), attr_selector(name, value));
                ctx.push_css(out, qualified, self.name(), Tier::Core);
            }
        }

        // role + aria-label is a semantic anchor even when neither is
        // unique alone.
        if let (Some(role), Some(label)) = (data.attr("role"), data.attr("aria-label")) {
            if !role.is_empty() && !label.is_empty() {
                let combined =
                    format!("{}{}", attr_selector("role", role), attr_selector("aria-label", label));
                ctx.push_css(out, combined, self.name(), Tier::Core);
            }
        }

        // Unrecognized data-* attributes still beat positional paths.
        for (name, value) in &data.attrs {
            if !name.starts_with("data-")
                || PREFERRED_TEST_ATTRS.contains(&name.as_str())
                || value.is_empty()
                || looks_dynamic(value)
            {
                continue;
            }
            ctx.push_css(out, attr_selector(name, value), self.name(), Tier::Core);
        }
    }
}

/// Auto-discovery over attributes outside every allow-list: short,
/// letter-bearing, non-dynamic values that happen to be unique.
pub struct DiscoveredAttributes;

fn discoverable(value: &str) -> bool {
    let len = value.chars().count();
    (2..=50).contains(&len)
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && !looks_dynamic(value)
}

impl Strategy for DiscoveredAttributes {
    fn name(&self) -> &'static str {
        "discovered-attribute"
    }
    fn tier(&self) -> Tier {
        Tier::Core
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Cheap
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(data) = ctx.doc.element(ctx.el) else {
            return;
        };
        for (name, value) in &data.attrs {
            if GENERIC_ATTRS.contains(&name.as_str())
                || PREFERRED_TEST_ATTRS.contains(&name.as_str())
                || name.starts_with("data-")
                || name == "class"
                || name == "style"
                || !discoverable(value)
            {
                continue;
            }
            let selector = format!("{}{}", ctx.tag(), attr_selector(name, value));
            ctx.push_css(out, selector, self.name(), Tier::Core);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::BudgetGuard;
    use crate::config::GeneratorConfig;
    use crate::oracle::UniquenessOracle;
    use apuntar_dom::{el, Document, DocumentBuilder, NodeId};

    fn find(doc: &Document, tag: &str) -> NodeId {
        doc.all_elements()
            .into_iter()
            .find(|id| doc.element(*id).is_some_and(|e| e.tag == tag))
            .unwrap()
    }

    fn run(strategy: &dyn Strategy, doc: &Document, el: NodeId) -> Vec<String> {
        let config = GeneratorConfig::default();
        let oracle = UniquenessOracle::new(doc);
        let budget = BudgetGuard::start(&config);
        let ctx = Ctx { doc, el, original_text: None, oracle: &oracle, budget: &budget, config: &config };
        let mut out = Vec::new();
        strategy.generate(&ctx, &mut out);
        out.into_iter().map(|a| a.selector).collect()
    }

    #[test]
    fn id_strategy_emits_hash_selector() {
        let doc = DocumentBuilder::new()
            .body_child(el("button").id("save-btn").text("Save"))
            .build();
        let selectors = run(&ById, &doc, find(&doc, "button"));
        assert_eq!(selectors, vec!["#save-btn"]);
    }

    #[test]
    fn test_attribute_bare_then_qualified_on_collision() {
        let doc = DocumentBuilder::new()
            .body_child(el("div").attr("data-testid", "row"))
            .body_child(el("span").attr("data-testid", "row"))
            .build();
        let selectors = run(&TestAttributes, &doc, find(&doc, "span"));
        assert_eq!(selectors, vec!["span[data-testid=\"row\"]"]);
    }

    #[test]
    fn generic_attributes_skip_dynamic_values() {
        let doc = DocumentBuilder::new()
            .body_child(
                el("input")
                    .attr("name", "email")
                    .attr("value", "session-9912345"),
            )
            .build();
        let selectors = run(&GenericAttributes, &doc, find(&doc, "input"));
        assert!(selectors.contains(&"[name=\"email\"]".to_string()));
        assert!(!selectors.iter().any(|s| s.contains("9912345")));
    }

    #[test]
    fn role_aria_pair_combines() {
        let doc = DocumentBuilder::new()
            .body_child(el("div").attr("role", "button").attr("aria-label", "Close"))
            .body_child(el("div").attr("role", "button").attr("aria-label", "Open"))
            .build();
        let target = find(&doc, "div");
        let selectors = run(&GenericAttributes, &doc, target);
        assert!(selectors.contains(&"[role=\"button\"][aria-label=\"Close\"]".to_string()));
    }

    #[test]
    fn discovery_picks_up_framework_attributes() {
        let doc = DocumentBuilder::new()
            .body_child(el("button").attr("ng-click", "save()").text("Save"))
            .build();
        let selectors = run(&DiscoveredAttributes, &doc, find(&doc, "button"));
        assert_eq!(selectors, vec!["button[ng-click=\"save()\"]"]);
    }
}
