//! Uniqueness oracle: candidate selectors only ship if the live document
//! resolves them to exactly the target element.
//!
//! Every verdict is memoized for the duration of one generation run; the
//! cache is never carried across runs because any DOM mutation invalidates
//! it wholesale. Query errors (unsupported pseudo-class, malformed
//! expression) fail closed: the candidate is treated as not unique.

use apuntar_dom::{query_css, query_xpath, Document, NodeId};
use std::cell::RefCell;
use std::collections::HashMap;

/// Memoizing uniqueness checker over a single document snapshot.
pub struct UniquenessOracle<'d> {
    doc: &'d Document,
    cache: RefCell<HashMap<String, bool>>,
}

impl<'d> UniquenessOracle<'d> {
    /// Create an oracle bound to one snapshot.
    #[must_use]
    pub fn new(doc: &'d Document) -> Self {
        Self { doc, cache: RefCell::new(HashMap::new()) }
    }

    /// Whether `selector` matches exactly one element, and it is `target`.
    pub fn is_unique_css(&self, selector: &str, target: NodeId) -> bool {
        let key = format!("css:{selector}:{target:?}");
        if let Some(&hit) = self.cache.borrow().get(&key) {
            return hit;
        }
        let verdict = match query_css(self.doc, selector) {
            Ok(matches) => matches.len() == 1 && matches[0] == target,
            Err(err) => {
                tracing::debug!(selector, %err, "css query failed, treating as ambiguous");
                false
            }
        };
        self.cache.borrow_mut().insert(key, verdict);
        verdict
    }

    /// Whether `expr` matches exactly one node, and it is `target`.
    pub fn is_unique_xpath(&self, expr: &str, target: NodeId) -> bool {
        let key = format!("xp:{expr}:{target:?}");
        if let Some(&hit) = self.cache.borrow().get(&key) {
            return hit;
        }
        let verdict = match query_xpath(self.doc, expr) {
            Ok(matches) => matches.len() == 1 && matches[0] == target,
            Err(err) => {
                tracing::debug!(expr, %err, "xpath query failed, treating as ambiguous");
                false
            }
        };
        self.cache.borrow_mut().insert(key, verdict);
        verdict
    }

    /// Whether `selector` resolves to exactly one element (any element).
    /// Used to validate scope prefixes before anchoring inside them.
    pub fn resolves_to_one(&self, selector: &str) -> Option<NodeId> {
        match query_css(self.doc, selector) {
            Ok(matches) if matches.len() == 1 => Some(matches[0]),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!(selector, %err, "scope query failed");
                None
            }
        }
    }

    /// Number of elements matching `selector`, or `None` on query error.
    pub fn count_css(&self, selector: &str) -> Option<usize> {
        query_css(self.doc, selector).ok().map(|m| m.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuntar_dom::{el, DocumentBuilder};

    fn doc_with_two_items() -> Document {
        DocumentBuilder::new()
            .body_child(
                el("ul")
                    .id("menu")
                    .child(el("li").class("item").text("One"))
                    .child(el("li").class("item").text("Two")),
            )
            .build()
    }

    #[test]
    fn unique_id_passes_ambiguous_class_fails() {
        let doc = doc_with_two_items();
        let oracle = UniquenessOracle::new(&doc);
        let menu = oracle.resolves_to_one("#menu").unwrap();
        assert!(oracle.is_unique_css("#menu", menu));
        assert!(!oracle.is_unique_css(".item", menu));
    }

    #[test]
    fn unique_match_on_wrong_node_fails() {
        let doc = doc_with_two_items();
        let oracle = UniquenessOracle::new(&doc);
        let first_li = oracle.resolves_to_one("#menu li:first-child").unwrap();
        assert!(!oracle.is_unique_css("#menu", first_li));
    }

    #[test]
    fn unsupported_pseudo_fails_closed() {
        let doc = doc_with_two_items();
        let oracle = UniquenessOracle::new(&doc);
        let menu = oracle.resolves_to_one("#menu").unwrap();
        assert!(!oracle.is_unique_css("#menu:visible", menu));
    }

    #[test]
    fn xpath_uniqueness() {
        let doc = doc_with_two_items();
        let oracle = UniquenessOracle::new(&doc);
        let menu = oracle.resolves_to_one("#menu").unwrap();
        assert!(oracle.is_unique_xpath("//*[@id='menu']", menu));
        assert!(!oracle.is_unique_xpath("//li", menu));
    }
}
