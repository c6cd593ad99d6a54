//! XPath-subset evaluator.
//!
//! Evaluates the expressions the XPath strategies render: absolute location
//! paths (`/html/body/div[2]/ul/li[3]`), `//` descents, `*` and tag node
//! tests, positional predicates, attribute equality, `contains(@class, ...)`,
//! `and` conjunctions, and `concat()` string literals (the quoting escape
//! hatch for values containing a single quote).
//!
//! Positional predicates follow XPath semantics: `[n]` keeps the nodes
//! sitting at position `n` among the matches sharing a parent, so a
//! descendant step like `//li[2]` can keep one node per list.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::error::QueryError;

/// A parsed XPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPathExpr {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    descendant: bool,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Any,
    Tag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Index(usize),
    Attrs(Vec<AttrPredicate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrPredicate {
    Equals { name: String, value: String },
    Contains { name: String, value: String },
}

impl XPathExpr {
    /// Parse an expression.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        Parser::new(input).parse()
    }

    /// Evaluate against the document, returning matches in document order.
    #[must_use]
    pub fn evaluate(&self, doc: &Document) -> Vec<NodeId> {
        // `None` is the document node; the child axis from it yields the root.
        let mut context: Vec<Option<NodeId>> = vec![None];
        for step in &self.steps {
            let mut next: Vec<NodeId> = Vec::new();
            for ctx in &context {
                let candidates: Vec<NodeId> = match (step.descendant, ctx) {
                    (false, None) => vec![doc.root()],
                    (false, Some(id)) => doc.element_children(*id).collect(),
                    (true, None) => doc.all_elements(),
                    (true, Some(id)) => doc.descendant_elements(*id),
                };
                let mut selected: Vec<NodeId> = candidates
                    .into_iter()
                    .filter(|id| step.test.matches(doc, *id))
                    .collect();
                for predicate in &step.predicates {
                    selected = predicate.apply(doc, selected);
                }
                next.extend(selected);
            }
            // NodeId allocation is pre-order, so sorting restores document order.
            next.sort_unstable();
            next.dedup();
            context = next.into_iter().map(Some).collect();
        }
        context.into_iter().flatten().collect()
    }
}

impl NodeTest {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match self {
            Self::Any => doc.element(id).is_some(),
            Self::Tag(tag) => doc.element(id).is_some_and(|e| &e.tag == tag),
        }
    }
}

impl Predicate {
    fn apply(&self, doc: &Document, selected: Vec<NodeId>) -> Vec<NodeId> {
        match self {
            Self::Index(n) => {
                // Position is counted among matches under the same parent,
                // relying on `selected` being in document order.
                let mut seen: HashMap<Option<NodeId>, usize> = HashMap::new();
                let mut out = Vec::new();
                for id in selected {
                    let count = seen.entry(doc.parent_element(id)).or_insert(0);
                    *count += 1;
                    if *count == *n {
                        out.push(id);
                    }
                }
                out
            }
            Self::Attrs(preds) => selected
                .into_iter()
                .filter(|id| preds.iter().all(|p| p.matches(doc, *id)))
                .collect(),
        }
    }
}

impl AttrPredicate {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(data) = doc.element(id) else {
            return false;
        };
        match self {
            Self::Equals { name, value } => data.attr(name) == Some(value.as_str()),
            Self::Contains { name, value } => {
                data.attr(name).is_some_and(|v| v.contains(value.as_str()))
            }
        }
    }
}

/// Parse and evaluate in one call.
pub fn query_all(doc: &Document, expr: &str) -> Result<Vec<NodeId>, QueryError> {
    Ok(XPathExpr::parse(expr)?.evaluate(doc))
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let chars: Vec<char> = s.chars().collect();
        if self.chars[self.pos..].starts_with(&chars) {
            self.pos += chars.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::Parse {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn name(&mut self) -> Result<String, QueryError> {
        let mut out = String::new();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            out.push(self.chars[self.pos]);
            self.pos += 1;
        }
        if out.is_empty() {
            return Err(self.error("expected name"));
        }
        Ok(out)
    }

    fn parse(mut self) -> Result<XPathExpr, QueryError> {
        if self.chars.is_empty() {
            return Err(QueryError::Empty);
        }
        let mut steps = Vec::new();
        while !self.at_end() {
            if !self.eat('/') {
                return Err(self.error("expected '/'"));
            }
            let descendant = self.eat('/');
            steps.push(self.step(descendant)?);
        }
        if steps.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(XPathExpr { steps })
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn step(&mut self, descendant: bool) -> Result<Step, QueryError> {
        let test = if self.eat('*') {
            NodeTest::Any
        } else {
            NodeTest::Tag(self.name()?.to_ascii_lowercase())
        };
        let mut predicates = Vec::new();
        while self.eat('[') {
            predicates.push(self.predicate()?);
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
        }
        Ok(Step {
            descendant,
            test,
            predicates,
        })
    }

    fn predicate(&mut self) -> Result<Predicate, QueryError> {
        self.skip_ws();
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let mut digits = String::new();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                digits.push(self.chars[self.pos]);
                self.pos += 1;
            }
            self.skip_ws();
            let n: usize = digits.parse().map_err(|_| self.error("index overflow"))?;
            if n == 0 {
                return Err(self.error("positions are 1-based"));
            }
            return Ok(Predicate::Index(n));
        }
        let mut preds = vec![self.attr_predicate()?];
        loop {
            self.skip_ws();
            if self.eat_str("and ") || self.eat_str("and\t") {
                self.skip_ws();
                preds.push(self.attr_predicate()?);
            } else {
                break;
            }
        }
        Ok(Predicate::Attrs(preds))
    }

    fn attr_predicate(&mut self) -> Result<AttrPredicate, QueryError> {
        if self.eat('@') {
            let name = self.name()?.to_ascii_lowercase();
            self.skip_ws();
            if !self.eat('=') {
                return Err(self.error("expected '='"));
            }
            self.skip_ws();
            let value = self.literal()?;
            return Ok(AttrPredicate::Equals { name, value });
        }
        if self.eat_str("contains(") {
            self.skip_ws();
            if !self.eat('@') {
                return Err(self.error("expected '@' in contains()"));
            }
            let name = self.name()?.to_ascii_lowercase();
            self.skip_ws();
            if !self.eat(',') {
                return Err(self.error("expected ',' in contains()"));
            }
            self.skip_ws();
            let value = self.literal()?;
            self.skip_ws();
            if !self.eat(')') {
                return Err(self.error("expected ')' closing contains()"));
            }
            return Ok(AttrPredicate::Contains { name, value });
        }
        Err(self.error("expected '@attr' or 'contains('"))
    }

    /// A quoted string, or `concat(lit, lit, ...)`.
    fn literal(&mut self) -> Result<String, QueryError> {
        if self.eat_str("concat(") {
            let mut out = String::new();
            loop {
                self.skip_ws();
                out.push_str(&self.literal()?);
                self.skip_ws();
                if self.eat(',') {
                    continue;
                }
                if self.eat(')') {
                    return Ok(out);
                }
                return Err(self.error("expected ',' or ')' in concat()"));
            }
        }
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                q
            }
            _ => return Err(self.error("expected string literal")),
        };
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(ch) => {
                    out.push(ch);
                    self.pos += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{el, DocumentBuilder};

    fn doc() -> Document {
        DocumentBuilder::new()
            .body_child(el("div").id("panel").class("card primary").children(vec![
                crate::ChildSpec::Element(el("ul").child(el("li")).child(el("li"))),
                crate::ChildSpec::Element(el("button").attr("data-testid", "go").text("Go")),
            ]))
            .build()
    }

    #[test]
    fn absolute_path_with_positions() {
        let d = doc();
        let hits = query_all(&d, "/html/body/div/ul/li[2]").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(d.nth_of_type_index(hits[0]), Some(2));
    }

    #[test]
    fn descendant_attribute_lookup() {
        let d = doc();
        assert_eq!(query_all(&d, "//*[@id='panel']").unwrap().len(), 1);
        assert_eq!(query_all(&d, "//button[@data-testid='go']").unwrap().len(), 1);
        assert_eq!(query_all(&d, "//button[@data-testid='no']").unwrap().len(), 0);
    }

    #[test]
    fn contains_class_predicate() {
        let d = doc();
        assert_eq!(query_all(&d, "//div[contains(@class, 'card')]").unwrap().len(), 1);
        assert_eq!(query_all(&d, "//div[contains(@class, 'absent')]").unwrap().len(), 0);
    }

    #[test]
    fn conjunction_predicate() {
        let d = DocumentBuilder::new()
            .body_child(el("a").attr("role", "button").attr("aria-label", "Close"))
            .build();
        let hits = query_all(&d, "//a[@role='button' and @aria-label='Close']").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn scoped_relative_path() {
        let d = doc();
        let hits = query_all(&d, "//*[@id='panel']//li[1]").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(d.nth_of_type_index(hits[0]), Some(1));
    }

    #[test]
    fn position_counts_within_each_parent() {
        let d = DocumentBuilder::new()
            .body_child(el("ul").child(el("li").text("a")).child(el("li").text("b")))
            .body_child(el("ul").child(el("li").text("c")).child(el("li").text("d")))
            .build();
        let hits = query_all(&d, "//li[2]").unwrap();
        assert_eq!(hits.len(), 2);
        for hit in hits {
            assert_eq!(d.nth_of_type_index(hit), Some(2));
        }
    }

    #[test]
    fn concat_literal_carries_quotes() {
        let d = DocumentBuilder::new()
            .body_child(el("input").attr("placeholder", "it's here"))
            .build();
        let hits =
            query_all(&d, "//input[@placeholder=concat('it', \"'\", 's here')]").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn malformed_expression_is_error() {
        let d = doc();
        assert!(query_all(&d, "").is_err());
        assert!(query_all(&d, "button").is_err());
        assert!(query_all(&d, "//div[").is_err());
        assert!(query_all(&d, "//div[0]").is_err());
    }
}
