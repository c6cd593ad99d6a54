//! Arena-backed DOM snapshot.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]. The snapshot
//! is immutable once built: every traversal the locator core performs is
//! read-only and short-lived, and a `NodeId` never dangles within the
//! document that issued it.

use serde::{Deserialize, Serialize};

/// Opaque handle to a node in a [`Document`].
///
/// Handles are plain indices: cheap to copy, meaningless across documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw index, for diagnostics only.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Box-model metadata attached to an element by the host.
///
/// Only the leaf-inline heuristic consumes this; documents built without
/// layout information simply never classify elements as small inline leaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Rendered width in CSS pixels.
    pub width: f32,
    /// Rendered height in CSS pixels.
    pub height: f32,
    /// Whether the element renders inline or inline-block.
    pub inline: bool,
}

/// Element payload: tag, attributes and optional layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementData {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes in document order. Names are lowercased.
    pub attrs: Vec<(String, String)>,
    /// Optional host-supplied box metadata.
    pub layout: Option<Layout>,
}

impl ElementData {
    /// Look up an attribute value by (case-insensitive) name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `id` attribute, if present and non-empty.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|v| !v.is_empty())
    }

    /// Whitespace-split class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Whether the class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// A node: either an element or a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// An element node.
    Element(ElementData),
    /// A text node.
    Text(String),
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable DOM snapshot.
///
/// Always rooted at an `<html>` element (index 0); see
/// [`DocumentBuilder`](crate::DocumentBuilder) for construction.
#[derive(Debug, Clone)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    pub(crate) fn with_root(root: ElementData) -> Self {
        Self {
            entries: vec![Entry {
                node: Node::Element(root),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub(crate) fn push_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.entries[parent.0].children.push(id);
        id
    }

    /// The `<html>` root element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Whether `id` refers to a node of this document.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.entries.len()
    }

    /// The node payload, if `id` is valid.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.entries.get(id.0).map(|e| &e.node)
    }

    /// The element payload, if `id` is a valid element node.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.node(id) {
            Some(Node::Element(data)) => Some(data),
            _ => None,
        }
    }

    /// Parent node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries.get(id.0).and_then(|e| e.parent)
    }

    /// Parent element, if any (never a text node by construction).
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.element(*p).is_some())
    }

    /// Child nodes in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entries
            .get(id.0)
            .map_or(&[][..], |e| e.children.as_slice())
    }

    /// Child elements in document order.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |c| self.element(*c).is_some())
    }

    /// Ancestor elements from the parent upward to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_element(id), move |p| self.parent_element(*p))
    }

    /// Element descendants of `id` in document order, excluding `id`.
    #[must_use]
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.element(next).is_some() {
                out.push(next);
            }
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Count of element descendants of `id`.
    #[must_use]
    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.descendant_elements(id).len()
    }

    /// All elements of the document in document order, root first.
    #[must_use]
    pub fn all_elements(&self) -> Vec<NodeId> {
        let mut out = vec![self.root()];
        out.extend(self.descendant_elements(self.root()));
        out
    }

    /// Total element count of the document.
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self.descendant_count(self.root())
    }

    /// 1-based position among the parent's element children.
    #[must_use]
    pub fn nth_child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent_element(id)?;
        self.element_children(parent)
            .position(|c| c == id)
            .map(|i| i + 1)
    }

    /// 1-based position among same-tag element siblings.
    #[must_use]
    pub fn nth_of_type_index(&self, id: NodeId) -> Option<usize> {
        let tag = &self.element(id)?.tag;
        let parent = self.parent_element(id)?;
        self.element_children(parent)
            .filter(|c| self.element(*c).is_some_and(|e| &e.tag == tag))
            .position(|c| c == id)
            .map(|i| i + 1)
    }

    /// Element siblings (including `id` itself) in document order.
    #[must_use]
    pub fn element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        self.parent_element(id)
            .map(|p| self.element_children(p).collect())
            .unwrap_or_default()
    }

    /// The element sibling immediately preceding `id`, if any.
    #[must_use]
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(id);
        let pos = siblings.iter().position(|s| *s == id)?;
        pos.checked_sub(1).map(|i| siblings[i])
    }

    /// The element sibling immediately following `id`, if any.
    #[must_use]
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.element_siblings(id);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Concatenation of the direct text-node children of `id`.
    #[must_use]
    pub fn direct_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            if let Some(Node::Text(t)) = self.node(*child) {
                out.push_str(t);
            }
        }
        out
    }

    /// Full descendant text of `id`, in document order.
    #[must_use]
    pub fn full_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            match self.node(next) {
                Some(Node::Text(t)) => out.push_str(t),
                Some(Node::Element(_)) => {
                    stack.extend(self.children(next).iter().rev().copied());
                }
                None => {}
            }
        }
        out
    }

    /// Whether `ancestor` contains `id` (strictly; an element does not
    /// contain itself).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }
}

#[cfg(test)]
mod tests {
    use crate::{el, DocumentBuilder};

    #[test]
    fn root_is_html() {
        let doc = DocumentBuilder::new().build();
        assert_eq!(doc.element(doc.root()).map(|e| e.tag.as_str()), Some("html"));
    }

    #[test]
    fn nth_indices_ignore_text_nodes() {
        let doc = DocumentBuilder::new()
            .body_child(
                el("ul")
                    .text("  ")
                    .child(el("li").text("a"))
                    .child(el("li").text("b")),
            )
            .build();
        let second_li = doc
            .all_elements()
            .into_iter()
            .filter(|id| doc.element(*id).is_some_and(|e| e.tag == "li"))
            .nth(1)
            .unwrap();
        assert_eq!(doc.nth_child_index(second_li), Some(2));
        assert_eq!(doc.nth_of_type_index(second_li), Some(2));
    }

    #[test]
    fn direct_text_excludes_descendants() {
        let doc = DocumentBuilder::new()
            .body_child(el("div").text("outer ").child(el("span").text("inner")))
            .build();
        let div = doc
            .all_elements()
            .into_iter()
            .find(|id| doc.element(*id).is_some_and(|e| e.tag == "div"))
            .unwrap();
        assert_eq!(doc.direct_text(div), "outer ");
        assert_eq!(doc.full_text(div), "outer inner");
    }
}
