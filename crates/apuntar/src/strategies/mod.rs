//! Candidate strategy families.
//!
//! Each strategy inspects the resolved target and emits zero or more
//! verified [`Address`]es. Strategies are parameterized rather than
//! enumerated: one attribute strategy covers every allow-listed attribute,
//! one positional strategy covers the `:nth-*` shapes. The session runs
//! them tier by tier through the budget guard.

mod attributes;
mod classes;
mod fallback;
mod positional;
mod scope;
mod textual;
mod xpath;

pub use fallback::absolute_css_path;

use crate::address::{Address, Meta, Tier};
use crate::budget::{BudgetGuard, StrategyCost};
use crate::config::GeneratorConfig;
use crate::oracle::UniquenessOracle;
use apuntar_dom::{css_escape, Document, NodeId};

/// Attributes placed on elements specifically for test automation, in
/// preference order.
pub const PREFERRED_TEST_ATTRS: &[&str] = &[
    "data-testid",
    "data-test",
    "data-cy",
    "data-qa",
    "data-test-id",
    "data-automation-id",
    "for",
];

/// Ordinary attributes stable enough to anchor on.
pub const GENERIC_ATTRS: &[&str] = &[
    "id",
    "name",
    "type",
    "placeholder",
    "href",
    "value",
    "role",
    "aria-label",
    "title",
    "for",
];

/// Everything a strategy needs to look at.
pub struct Ctx<'a> {
    /// Document snapshot.
    pub doc: &'a Document,
    /// Resolved target element.
    pub el: NodeId,
    /// Display text of the pre-snap original, when distinct and usable.
    pub original_text: Option<&'a str>,
    /// Shared uniqueness oracle for this run.
    pub oracle: &'a UniquenessOracle<'a>,
    /// Live budget.
    pub budget: &'a BudgetGuard,
    /// Run configuration.
    pub config: &'a GeneratorConfig,
}

impl Ctx<'_> {
    /// Tag name of the target.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.doc.element(self.el).map_or("", |e| e.tag.as_str())
    }

    /// Verify a CSS selector against the oracle and push it on success.
    pub fn push_css(
        &self,
        out: &mut Vec<Address>,
        selector: String,
        strategy: &'static str,
        tier: Tier,
    ) -> bool {
        if self.oracle.is_unique_css(&selector, self.el) {
            out.push(Address::css(selector, Meta { strategy, prior: 0, tier }, self.el));
            true
        } else {
            false
        }
    }

    /// Like [`Ctx::push_css`] but tagged positional.
    pub fn push_positional(
        &self,
        out: &mut Vec<Address>,
        selector: String,
        strategy: &'static str,
    ) -> bool {
        if self.oracle.is_unique_css(&selector, self.el) {
            out.push(Address::positional(
                selector,
                Meta { strategy, prior: 0, tier: Tier::Positional },
                self.el,
            ));
            true
        } else {
            false
        }
    }

    /// Verify an XPath expression and push it on success.
    pub fn push_xpath(
        &self,
        out: &mut Vec<Address>,
        expr: String,
        strategy: &'static str,
        prior: i32,
    ) -> bool {
        if self.oracle.is_unique_xpath(&expr, self.el) {
            out.push(Address::xpath(expr, Meta { strategy, prior, tier: Tier::XPath }, self.el));
            true
        } else {
            false
        }
    }
}

/// One candidate generator family.
pub trait Strategy {
    /// Stable name, carried into candidate provenance.
    fn name(&self) -> &'static str;
    /// Bucketing tier.
    fn tier(&self) -> Tier;
    /// Budget cost class.
    fn cost(&self) -> StrategyCost;
    /// Emit verified addresses for the context's target.
    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>);
}

/// The full strategy set in run order.
#[must_use]
pub fn registry() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(attributes::ById),
        Box::new(attributes::TestAttributes),
        Box::new(attributes::GenericAttributes),
        Box::new(attributes::DiscoveredAttributes),
        Box::new(classes::Classes),
        Box::new(scope::StableScope),
        Box::new(positional::Positional),
        Box::new(textual::Textual),
        Box::new(xpath::XPathMirrors),
        Box::new(fallback::Aggressive),
        Box::new(fallback::AbsolutePath),
    ]
}

/// Run the absolute-path fallback directly, bypassing budget gates. The
/// non-emptiness guarantee rests on this: even a fully expired budget
/// still yields the absolute locators.
pub fn absolute_fallback(ctx: &Ctx<'_>, out: &mut Vec<Address>) {
    fallback::AbsolutePath.generate(ctx, out);
}

/// `[name="value"]` with the value escaped for a double-quoted CSS string.
#[must_use]
pub fn attr_selector(name: &str, value: &str) -> String {
    format!("[{name}=\"{}\"]", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `#id` with identifier escaping.
#[must_use]
pub fn id_selector(id: &str) -> String {
    format!("#{}", css_escape(id))
}

/// `.class` with identifier escaping.
#[must_use]
pub fn class_selector(class: &str) -> String {
    format!(".{}", css_escape(class))
}
