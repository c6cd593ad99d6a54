//! Locator addresses and their rendered forms.
//!
//! An [`Address`] is the dialect-neutral description of how to find one
//! element: a selector kind, the selector itself, and optional text
//! constraints. Rendering an address for a [`Dialect`] is pure string
//! assembly, so switching dialects re-renders the same addresses without
//! touching the document again.

use apuntar_dom::NodeId;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Which query machinery a rendered locator goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
    /// Plain CSS selector.
    Css,
    /// XPath expression.
    XPath,
    /// Text match, optionally scoped and tag-restricted.
    Text,
    /// CSS that leans on structural position (`:nth-child` and friends).
    Positional,
}

/// Coarse generation tier, used for bucketing and run ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Attribute, id and class anchors.
    Core,
    /// Structural-position selectors.
    Positional,
    /// Text-anchored locators.
    Text,
    /// XPath mirrors and relative paths.
    XPath,
    /// Last-resort partial-attribute and neighborhood locators.
    Aggressive,
}

/// Text-match constraints attached to a [`AddressKind::Text`] address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextConstraints {
    /// Exact display text to match.
    pub text: String,
    /// CSS scope selector the match is confined to, if any.
    pub scope: Option<String>,
    /// Tag name the match is restricted to, if any.
    pub tag: Option<String>,
    /// Whether the scope should be filtered to visible elements.
    pub visible_scope: bool,
}

/// Provenance carried by every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Meta {
    /// Name of the strategy that produced the address.
    pub strategy: &'static str,
    /// Strategy-assigned base score before feature analysis.
    pub prior: i32,
    /// Generation tier.
    pub tier: Tier,
}

/// Dialect-neutral locator for one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    /// Query machinery.
    pub kind: AddressKind,
    /// Selector or expression, exactly as the engines consume it.
    pub selector: String,
    /// Text constraints, for [`AddressKind::Text`] only.
    pub constraints: Option<TextConstraints>,
    /// Strategy provenance.
    pub meta: Meta,
    /// The element this address verifiably resolves to.
    pub target: NodeId,
}

impl Address {
    /// CSS address.
    #[must_use]
    pub fn css(selector: impl Into<String>, meta: Meta, target: NodeId) -> Self {
        Self { kind: AddressKind::Css, selector: selector.into(), constraints: None, meta, target }
    }

    /// Positional CSS address.
    #[must_use]
    pub fn positional(selector: impl Into<String>, meta: Meta, target: NodeId) -> Self {
        Self {
            kind: AddressKind::Positional,
            selector: selector.into(),
            constraints: None,
            meta,
            target,
        }
    }

    /// XPath address.
    #[must_use]
    pub fn xpath(expr: impl Into<String>, meta: Meta, target: NodeId) -> Self {
        Self { kind: AddressKind::XPath, selector: expr.into(), constraints: None, meta, target }
    }

    /// Text address.
    #[must_use]
    pub fn text(constraints: TextConstraints, meta: Meta, target: NodeId) -> Self {
        Self {
            kind: AddressKind::Text,
            selector: String::new(),
            constraints: Some(constraints),
            meta,
            target,
        }
    }

    /// Render for a dialect.
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Cypress => self.render_cypress(),
            Dialect::Js => self.render_js(),
        }
    }

    fn render_cypress(&self) -> String {
        match self.kind {
            AddressKind::Css | AddressKind::Positional => {
                format!("cy.get('{}')", js_quote(&self.selector))
            }
            AddressKind::XPath => format!("cy.xpath('{}')", js_quote(&self.selector)),
            AddressKind::Text => {
                let Some(c) = &self.constraints else {
                    return String::new();
                };
                let text = js_quote(&c.text);
                match (&c.scope, &c.tag) {
                    (Some(scope), _) => {
                        let scope = js_quote(scope);
                        if c.visible_scope {
                            format!("cy.get('{scope}').filter(':visible').contains('{text}')")
                        } else {
                            format!("cy.get('{scope}').contains('{text}')")
                        }
                    }
                    (None, Some(tag)) => format!("cy.contains('{tag}', '{text}')"),
                    (None, None) => format!("cy.contains('{text}')"),
                }
            }
        }
    }

    fn render_js(&self) -> String {
        match self.kind {
            AddressKind::Css | AddressKind::Positional => {
                format!("document.querySelector('{}')", js_quote(&self.selector))
            }
            AddressKind::XPath => format!(
                "document.evaluate('{}', document, null, \
                 XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_quote(&self.selector)
            ),
            AddressKind::Text => {
                let Some(c) = &self.constraints else {
                    return String::new();
                };
                let text = js_quote(&c.text);
                let inner = c.tag.as_deref().unwrap_or("*");
                // Ancestors precede descendants in querySelectorAll order,
                // so .pop() picks the deepest matching element, mirroring
                // how cy.contains resolves nested matches.
                let visible = if c.visible_scope {
                    " && el.offsetParent !== null"
                } else {
                    ""
                };
                match &c.scope {
                    Some(scope) => format!(
                        "Array.from(document.querySelector('{}').querySelectorAll('{inner}'))\
                         .filter(el => el.textContent.trim() === '{text}'{visible}).pop()",
                        js_quote(scope)
                    ),
                    None => format!(
                        "Array.from(document.querySelectorAll('{inner}'))\
                         .filter(el => el.textContent.trim() === '{text}'{visible}).pop()"
                    ),
                }
            }
        }
    }
}

/// Output flavor for rendered locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `cy.get` / `cy.contains` chains.
    #[default]
    Cypress,
    /// Raw browser-console JavaScript.
    Js,
}

/// A rendered, verified, scored locator ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// The locator string in the session's dialect.
    pub rendered: String,
    /// Dialect `rendered` is expressed in.
    pub dialect: Dialect,
    /// Raw signed robustness score.
    pub score: i32,
    /// Normalized 0..=100 confidence for display.
    pub confidence: u8,
    /// Query machinery of the underlying address.
    pub kind: AddressKind,
    /// Producing strategy.
    pub strategy: &'static str,
    /// Interactions that make sense against the target.
    pub actions: Vec<crate::actionable::Action>,
    /// Resolved element.
    pub target: NodeId,
    /// The dialect-neutral address, kept for re-rendering.
    #[serde(skip)]
    pub address: Address,
}

/// Escape a string for embedding in a single-quoted JS literal.
#[must_use]
pub fn js_quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Best-effort conversion of an already-rendered locator between dialects.
///
/// Re-rendering from the [`Address`] is always preferred; this only exists
/// for locators pasted in from outside the engine. Only the plain
/// `cy.get(...)` / `document.querySelector(...)` forms convert.
#[must_use]
pub fn convert_rendered(input: &str, to: Dialect) -> Option<String> {
    static CY_GET: OnceLock<Regex> = OnceLock::new();
    static QS: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    let cy_get = CY_GET.get_or_init(|| Regex::new(r"^cy\.get\('(.+)'\)$").unwrap());
    #[allow(clippy::unwrap_used)]
    let qs = QS.get_or_init(|| Regex::new(r"^document\.querySelector\('(.+)'\)$").unwrap());

    match to {
        Dialect::Js => cy_get
            .captures(input)
            .map(|c| format!("document.querySelector('{}')", &c[1])),
        Dialect::Cypress => qs.captures(input).map(|c| format!("cy.get('{}')", &c[1])),
    }
}
