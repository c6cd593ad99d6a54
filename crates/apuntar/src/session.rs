//! Generation session: orchestrates snap, strategies, scoring and
//! bucketing, and remembers the last run so a dialect switch is a pure
//! re-render.

use crate::actionable::{available_actions, classify, Action};
use crate::address::{Address, Candidate, Dialect, Tier};
use crate::budget::{BudgetGuard, StrategyCost};
use crate::categorize::{categorize, CategorizedCandidates};
use crate::config::GeneratorConfig;
use crate::oracle::UniquenessOracle;
use crate::result::{ApuntarError, ApuntarResult};
use crate::score::{normalize, score_address};
use crate::snap::resolve_target;
use crate::strategies::{registry, Ctx};
use apuntar_dom::{Document, NodeId};
use std::collections::HashSet;

/// Everything needed to re-render the previous run in another dialect.
struct LastRun {
    target: NodeId,
    scored: Vec<(Address, i32)>,
    actions: Vec<Action>,
}

/// Stateful generation session.
///
/// One session per picker attachment: it owns the output dialect and the
/// configuration, and caches the last run's addresses so that switching
/// dialects does not re-query the document.
pub struct Session {
    dialect: Dialect,
    config: GeneratorConfig,
    last: Option<LastRun>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Session {
    /// New session with the default Cypress dialect.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self { dialect: Dialect::default(), config, last: None }
    }

    /// Current output dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Switch dialect; returns the last run re-rendered, when one exists.
    pub fn set_dialect(&mut self, dialect: Dialect) -> Option<CategorizedCandidates> {
        self.dialect = dialect;
        self.last.as_ref().map(|run| render_run(run, dialect))
    }

    /// Generate, verify, score and bucket locators for `raw`.
    ///
    /// # Errors
    ///
    /// [`ApuntarError::TargetDetached`] when `raw` is not an element of
    /// `doc`; [`ApuntarError::CannotLocate`] when no strategy produced a
    /// verified locator, which only happens for detached-in-spirit nodes
    /// like `html` itself.
    pub fn generate(
        &mut self,
        doc: &Document,
        raw: NodeId,
    ) -> ApuntarResult<CategorizedCandidates> {
        if !doc.contains(raw) || doc.element(raw).is_none() {
            return Err(ApuntarError::TargetDetached);
        }

        let resolved = resolve_target(doc, raw);
        let original_text = resolved.original_text(doc);
        let target = resolved.element;
        let tag = doc.element(target).map_or_else(String::new, |e| e.tag.clone());

        let actionable = classify(doc, target);
        let actions = available_actions(actionable);

        let oracle = UniquenessOracle::new(doc);
        let budget = BudgetGuard::start(&self.config);
        let ctx = Ctx {
            doc,
            el: target,
            original_text: original_text.as_deref(),
            oracle: &oracle,
            budget: &budget,
            config: &self.config,
        };

        let mut addresses: Vec<Address> = Vec::new();
        for strategy in registry() {
            if !budget.allows(strategy.cost()) {
                continue;
            }
            match strategy.tier() {
                Tier::Text => {
                    let basic = addresses.iter().filter(|a| a.meta.tier == Tier::Core).count();
                    if !budget.text_search_allowed(basic, doc.descendant_count(target)) {
                        continue;
                    }
                }
                Tier::Aggressive if strategy.cost() == StrategyCost::Expensive => {
                    if !budget.aggressive_allowed(addresses.len(), doc.element_count()) {
                        continue;
                    }
                }
                _ => {}
            }
            let before = addresses.len();
            strategy.generate(&ctx, &mut addresses);
            tracing::debug!(
                strategy = strategy.name(),
                emitted = addresses.len() - before,
                "strategy finished"
            );
        }

        dedup(&mut addresses);
        if addresses.is_empty() {
            // Budget may have expired before any family ran; the absolute
            // paths are cheap and always resolve.
            crate::strategies::absolute_fallback(&ctx, &mut addresses);
        }
        if addresses.is_empty() {
            return Err(ApuntarError::CannotLocate { tag });
        }

        let scored: Vec<(Address, i32)> = addresses
            .into_iter()
            .map(|addr| {
                let score = score_address(&addr, actionable);
                (addr, score)
            })
            .collect();

        let run = LastRun { target, scored, actions };
        let buckets = render_run(&run, self.dialect);
        self.last = Some(run);
        Ok(buckets)
    }
}

/// Drop addresses that render identically; the first (cheapest-tier)
/// spelling wins.
fn dedup(addresses: &mut Vec<Address>) {
    let mut seen: HashSet<(crate::address::AddressKind, String)> = HashSet::new();
    addresses.retain(|addr| seen.insert((addr.kind, addr.render(Dialect::Cypress))));
}

fn render_run(run: &LastRun, dialect: Dialect) -> CategorizedCandidates {
    let candidates: Vec<Candidate> = run
        .scored
        .iter()
        .map(|(addr, score)| Candidate {
            rendered: addr.render(dialect),
            dialect,
            score: *score,
            confidence: normalize(*score),
            kind: addr.kind,
            strategy: addr.meta.strategy,
            actions: run.actions.clone(),
            target: run.target,
            address: addr.clone(),
        })
        .collect();
    categorize(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuntar_dom::{el, DocumentBuilder};

    fn find(doc: &Document, tag: &str) -> NodeId {
        doc.all_elements()
            .into_iter()
            .find(|id| doc.element(*id).is_some_and(|e| e.tag == tag))
            .unwrap()
    }

    #[test]
    fn generate_produces_at_least_the_absolute_path() {
        let doc = DocumentBuilder::new().body_child(el("div").child(el("div"))).build();
        let inner = doc
            .all_elements()
            .into_iter()
            .filter(|id| doc.element(*id).is_some_and(|e| e.tag == "div"))
            .nth(1)
            .unwrap();
        let mut session = Session::default();
        let buckets = session.generate(&doc, inner).unwrap();
        assert!(!buckets.is_empty());
        assert!(buckets
            .iter()
            .any(|c| c.strategy == "absolute-path"));
    }

    #[test]
    fn detached_handle_is_rejected() {
        let doc = DocumentBuilder::new().body_child(el("div")).build();
        let other = DocumentBuilder::new()
            .body_child(el("div").child(el("div")).child(el("div")).child(el("div")))
            .build();
        let dangling = other.all_elements().into_iter().last().unwrap();
        let mut session = Session::default();
        assert!(matches!(
            session.generate(&doc, dangling),
            Err(ApuntarError::TargetDetached)
        ));
    }

    #[test]
    fn dialect_switch_rerenders_without_document() {
        let doc = DocumentBuilder::new()
            .body_child(el("button").id("save").text("Save"))
            .build();
        let mut session = Session::default();
        let first = session.generate(&doc, find(&doc, "button")).unwrap();
        assert!(first.best().unwrap().rendered.starts_with("cy."));

        let switched = session.set_dialect(Dialect::Js).expect("cached run");
        let best = switched.best().unwrap();
        assert!(best.rendered.starts_with("document."));
        assert_eq!(best.address.selector, first.best().unwrap().address.selector);
    }

    #[test]
    fn duplicate_spellings_are_collapsed() {
        let doc = DocumentBuilder::new()
            .body_child(el("input").attr("name", "q"))
            .build();
        let mut session = Session::default();
        let buckets = session.generate(&doc, find(&doc, "input")).unwrap();
        let mut rendered: Vec<&str> = buckets.iter().map(|c| c.rendered.as_str()).collect();
        let before = rendered.len();
        rendered.sort_unstable();
        rendered.dedup();
        assert_eq!(rendered.len(), before);
    }

    #[test]
    fn text_scan_is_skipped_once_enough_basics_exist() {
        let doc = DocumentBuilder::new()
            .body_child(
                el("button")
                    .id("export-csv")
                    .attr("data-testid", "export")
                    .text("Export records"),
            )
            .build();
        let mut session = Session::default();
        let buckets = session.generate(&doc, find(&doc, "button")).unwrap();
        assert!(buckets.basic.len() + buckets.more_basic.len() >= 3);
        assert!(
            buckets.text.is_empty(),
            "{:?}",
            buckets.text.iter().map(|c| &c.rendered).collect::<Vec<_>>()
        );
    }

    #[test]
    fn same_input_same_output() {
        let doc = DocumentBuilder::new()
            .body_child(el("ul").id("menu").child(el("li").text("Alpha")).child(el("li").text("Beta")))
            .build();
        let li = doc
            .all_elements()
            .into_iter()
            .filter(|id| doc.element(*id).is_some_and(|e| e.tag == "li"))
            .nth(1)
            .unwrap();
        let mut a = Session::default();
        let mut b = Session::default();
        let first: Vec<String> =
            a.generate(&doc, li).unwrap().iter().map(|c| c.rendered.clone()).collect();
        let second: Vec<String> =
            b.generate(&doc, li).unwrap().iter().map(|c| c.rendered.clone()).collect();
        assert_eq!(first, second);
    }
}
