//! CSS selector engine.
//!
//! Covers exactly the grammar the locator strategies emit: compound
//! selectors built from tag names, `#id`, `.class`, attribute operators
//! (`=`, `^=`, `$=`, `*=`, bare existence), the structural pseudo-classes,
//! and the four combinators. Selector lists (`,`) are supported because the
//! target-resolution "interesting element" set is written as one.
//!
//! Matching is a document-order scan: for every element, the rightmost
//! compound is tested first and combinators walk leftward. That is `O(n)`
//! per query, which is the cost model the budget guard assumes.

mod parse;

use crate::dom::{Document, NodeId};
use crate::error::QueryError;

/// Parsed selector list (`a, b, c`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub(crate) selectors: Vec<ComplexSelector>,
}

/// One complex selector: compounds joined by combinators, leftmost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ComplexSelector {
    /// `combinator` is the join to the *previous* compound;
    /// the first entry's combinator is ignored.
    pub(crate) parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) simples: Vec<Simple>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Simple {
    Id(String),
    Class(String),
    Attr {
        name: String,
        op: AttrOp,
        value: Option<String>,
    },
    Pseudo(Pseudo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pseudo {
    NthChild(Nth),
    NthOfType(usize),
    FirstChild,
    LastChild,
    OnlyChild,
    FirstOfType,
    LastOfType,
    OnlyOfType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nth {
    Index(usize),
    Even,
    Odd,
}

impl SelectorList {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        parse::parse_selector_list(input)
    }

    /// Whether `id` matches any selector in the list.
    #[must_use]
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, id))
    }
}

impl ComplexSelector {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.matches_at(doc, id, self.parts.len() - 1)
    }

    fn matches_at(&self, doc: &Document, id: NodeId, idx: usize) -> bool {
        let (_, compound) = &self.parts[idx];
        if !compound.matches(doc, id) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        let (combinator, _) = &self.parts[idx];
        match combinator {
            Combinator::Descendant => doc
                .ancestors(id)
                .any(|a| self.matches_at(doc, a, idx - 1)),
            Combinator::Child => doc
                .parent_element(id)
                .is_some_and(|p| self.matches_at(doc, p, idx - 1)),
            Combinator::NextSibling => doc
                .previous_element_sibling(id)
                .is_some_and(|s| self.matches_at(doc, s, idx - 1)),
            Combinator::SubsequentSibling => {
                let siblings = doc.element_siblings(id);
                let Some(pos) = siblings.iter().position(|s| *s == id) else {
                    return false;
                };
                siblings[..pos]
                    .iter()
                    .any(|s| self.matches_at(doc, *s, idx - 1))
            }
        }
    }
}

impl Compound {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(data) = doc.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if &data.tag != tag {
                return false;
            }
        }
        self.simples.iter().all(|s| s.matches(doc, id))
    }
}

impl Simple {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(data) = doc.element(id) else {
            return false;
        };
        match self {
            Self::Id(v) => data.id() == Some(v.as_str()),
            Self::Class(v) => data.has_class(v),
            Self::Attr { name, op, value } => {
                let Some(actual) = data.attr(name) else {
                    return false;
                };
                match (op, value.as_deref()) {
                    (AttrOp::Exists, _) => true,
                    (AttrOp::Equals, Some(v)) => actual == v,
                    (AttrOp::Prefix, Some(v)) => !v.is_empty() && actual.starts_with(v),
                    (AttrOp::Suffix, Some(v)) => !v.is_empty() && actual.ends_with(v),
                    (AttrOp::Substring, Some(v)) => !v.is_empty() && actual.contains(v),
                    _ => false,
                }
            }
            Self::Pseudo(p) => p.matches(doc, id),
        }
    }
}

impl Pseudo {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let child_idx = doc.nth_child_index(id);
        let type_idx = doc.nth_of_type_index(id);
        let siblings = doc.element_siblings(id);
        let same_type = || {
            let tag = doc.element(id).map(|e| e.tag.clone()).unwrap_or_default();
            siblings
                .iter()
                .filter(|s| doc.element(**s).is_some_and(|e| e.tag == tag))
                .count()
        };
        match self {
            Self::NthChild(Nth::Index(n)) => child_idx == Some(*n),
            Self::NthChild(Nth::Even) => child_idx.is_some_and(|i| i % 2 == 0),
            Self::NthChild(Nth::Odd) => child_idx.is_some_and(|i| i % 2 == 1),
            Self::NthOfType(n) => type_idx == Some(*n),
            Self::FirstChild => child_idx == Some(1),
            Self::LastChild => child_idx == Some(siblings.len()),
            Self::OnlyChild => siblings.len() == 1,
            Self::FirstOfType => type_idx == Some(1),
            Self::LastOfType => type_idx == Some(same_type()),
            Self::OnlyOfType => same_type() == 1,
        }
    }
}

/// Run a selector against the whole document, in document order.
pub fn query_all(doc: &Document, selector: &str) -> Result<Vec<NodeId>, QueryError> {
    let list = SelectorList::parse(selector)?;
    Ok(doc
        .all_elements()
        .into_iter()
        .filter(|id| list.matches(doc, *id))
        .collect())
}

/// Escape a string for use as a CSS identifier (the `CSS.escape` contract).
#[must_use]
pub fn css_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, ch) in input.chars().enumerate() {
        let literal = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii();
        if ch.is_ascii_digit() && i == 0 {
            out.push_str(&format!("\\{:x} ", ch as u32));
        } else if ch == '-' && i == 0 && input.len() == 1 {
            out.push_str("\\-");
        } else if literal {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}
