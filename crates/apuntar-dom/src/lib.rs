//! Apuntar DOM: the host-document seam for the locator engine.
//!
//! The locator core treats the page as an externally-owned, read-only graph
//! and only ever holds opaque [`NodeId`] handles into it. This crate provides
//! that graph as an arena-backed snapshot, a fluent [`DocumentBuilder`] for
//! constructing test documents, and the two query engines the uniqueness
//! oracle runs candidates through:
//!
//! - a CSS selector engine covering the grammar the candidate strategies
//!   emit (compound selectors, attribute operators, structural pseudo-classes
//!   and the four combinators), and
//! - an XPath-subset evaluator (absolute paths, `//` descents, positional
//!   and attribute predicates, `contains(@class, ...)` and `concat()`
//!   string literals).
//!
//! Both engines are strict parsers: malformed input is a [`QueryError`],
//! which callers are expected to translate to "matched nothing".

mod builder;
mod dom;
mod error;
pub mod css;
pub mod xpath;

pub use builder::{el, text, ChildSpec, DocumentBuilder, ElementBuilder};
pub use dom::{Document, ElementData, Layout, Node, NodeId};
pub use error::QueryError;

pub use css::{css_escape, query_all as query_css, SelectorList};
pub use xpath::{query_all as query_xpath, XPathExpr};
