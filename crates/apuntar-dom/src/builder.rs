//! Fluent construction of [`Document`] snapshots.
//!
//! Hosts embedding the engine translate their live tree into a snapshot;
//! tests write the tree inline:
//!
//! ```
//! use apuntar_dom::{el, DocumentBuilder};
//!
//! let doc = DocumentBuilder::new()
//!     .body_child(el("button").id("submit-btn").text("Submit"))
//!     .build();
//! assert_eq!(doc.element_count(), 4); // html, head, body, button
//! ```

use crate::dom::{Document, ElementData, Layout, Node, NodeId};

/// A pending child: element subtree or text run.
#[derive(Debug, Clone)]
pub enum ChildSpec {
    /// Nested element.
    Element(ElementBuilder),
    /// Text node.
    Text(String),
}

/// Builder for one element subtree.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    attrs: Vec<(String, String)>,
    layout: Option<Layout>,
    children: Vec<ChildSpec>,
}

/// Start an element subtree.
#[must_use]
pub fn el(tag: &str) -> ElementBuilder {
    ElementBuilder {
        tag: tag.to_ascii_lowercase(),
        attrs: Vec::new(),
        layout: None,
        children: Vec::new(),
    }
}

/// A standalone text child, for mixing text between elements.
#[must_use]
pub fn text(content: &str) -> ChildSpec {
    ChildSpec::Text(content.to_string())
}

impl ElementBuilder {
    /// Set an attribute. Repeated names keep the last value.
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if let Some(slot) = self.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name, value.to_string()));
        }
        self
    }

    /// Set the `id` attribute.
    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    /// Append whitespace-separated classes to the `class` attribute.
    #[must_use]
    pub fn class(mut self, classes: &str) -> Self {
        let merged = match self.attrs.iter().find(|(n, _)| n == "class") {
            Some((_, existing)) if !existing.is_empty() => format!("{existing} {classes}"),
            _ => classes.to_string(),
        };
        self.attrs.retain(|(n, _)| n != "class");
        self.attrs.push(("class".to_string(), merged));
        self
    }

    /// Append a text-node child.
    #[must_use]
    pub fn text(mut self, content: &str) -> Self {
        self.children.push(ChildSpec::Text(content.to_string()));
        self
    }

    /// Append an element child.
    #[must_use]
    pub fn child(mut self, child: ElementBuilder) -> Self {
        self.children.push(ChildSpec::Element(child));
        self
    }

    /// Append many children at once.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = ChildSpec>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attach box-model metadata for the leaf-inline heuristic.
    #[must_use]
    pub const fn layout(mut self, width: f32, height: f32, inline: bool) -> Self {
        self.layout = Some(Layout {
            width,
            height,
            inline,
        });
        self
    }

    fn into_data(self) -> (ElementData, Vec<ChildSpec>) {
        (
            ElementData {
                tag: self.tag,
                attrs: self.attrs,
                layout: self.layout,
            },
            self.children,
        )
    }
}

/// Builder for a whole document.
///
/// Always produces `<html><head/><body>…</body></html>` so absolute
/// structural paths look like the real thing.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    head_children: Vec<ChildSpec>,
    body: ElementBuilder,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Start an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head_children: Vec::new(),
            body: el("body"),
        }
    }

    /// Append a child to `<head>`.
    #[must_use]
    pub fn head_child(mut self, child: ElementBuilder) -> Self {
        self.head_children.push(ChildSpec::Element(child));
        self
    }

    /// Append a child to `<body>`.
    #[must_use]
    pub fn body_child(mut self, child: ElementBuilder) -> Self {
        self.body = self.body.child(child);
        self
    }

    /// Set an attribute on `<body>` itself.
    #[must_use]
    pub fn body_attr(mut self, name: &str, value: &str) -> Self {
        self.body = self.body.attr(name, value);
        self
    }

    /// Materialize the snapshot.
    #[must_use]
    pub fn build(self) -> Document {
        let mut doc = Document::with_root(ElementData {
            tag: "html".to_string(),
            attrs: Vec::new(),
            layout: None,
        });
        let root = doc.root();
        let head = doc.push_node(
            root,
            Node::Element(ElementData {
                tag: "head".to_string(),
                attrs: Vec::new(),
                layout: None,
            }),
        );
        for child in self.head_children {
            attach(&mut doc, head, child);
        }
        attach(&mut doc, root, ChildSpec::Element(self.body));
        doc
    }
}

fn attach(doc: &mut Document, parent: NodeId, spec: ChildSpec) {
    match spec {
        ChildSpec::Text(t) => {
            doc.push_node(parent, Node::Text(t));
        }
        ChildSpec::Element(builder) => {
            let (data, children) = builder.into_data();
            let id = doc.push_node(parent, Node::Element(data));
            for child in children {
                attach(doc, id, child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_appends() {
        let b = el("div").class("a").class("b c");
        let (data, _) = b.into_data();
        assert_eq!(data.attr("class"), Some("a b c"));
    }

    #[test]
    fn attr_overwrites() {
        let (data, _) = el("input").attr("type", "text").attr("type", "email").into_data();
        assert_eq!(data.attr("type"), Some("email"));
    }

    #[test]
    fn body_wrapped_under_html() {
        let doc = DocumentBuilder::new().body_child(el("p").text("x")).build();
        let p = doc
            .all_elements()
            .into_iter()
            .find(|id| doc.element(*id).is_some_and(|e| e.tag == "p"))
            .unwrap();
        let chain: Vec<String> = doc
            .ancestors(p)
            .filter_map(|a| doc.element(a).map(|e| e.tag.clone()))
            .collect();
        assert_eq!(chain, vec!["body".to_string(), "html".to_string()]);
    }
}
