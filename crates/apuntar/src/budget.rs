//! Generation budget: wall-clock deadline plus deterministic gates.
//!
//! Two kinds of limit coexist. The wall-clock deadline is a hard stop for
//! pathological documents; under it, expensive strategy families are also
//! gated on *deterministic* inputs (how many candidates exist already, how
//! large the document is) so that the same document and configuration
//! produce the same candidate set on every run that finishes in time.

use crate::config::GeneratorConfig;
use std::time::{Duration, Instant};

/// Relative cost class of a strategy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrategyCost {
    /// Attribute lookups, O(1) per candidate.
    Cheap,
    /// Bounded ancestor walks.
    Moderate,
    /// Document-wide text scans and combinatorial probing.
    Expensive,
}

/// Live budget for one generation run.
pub struct BudgetGuard {
    deadline: Instant,
    strategy_budget: Duration,
    target_enough_basic: usize,
    max_descendants_for_text_search: usize,
    dom_size_soft_cap: usize,
    text_search_enabled: bool,
    aggressive_enabled: bool,
}

impl BudgetGuard {
    /// Start the clock for one run.
    #[must_use]
    pub fn start(config: &GeneratorConfig) -> Self {
        Self {
            deadline: Instant::now() + Duration::from_millis(config.build_budget_ms),
            strategy_budget: Duration::from_millis(config.strategy_budget_ms),
            target_enough_basic: config.target_enough_basic,
            max_descendants_for_text_search: config.max_descendants_for_text_search,
            dom_size_soft_cap: config.dom_size_soft_cap,
            text_search_enabled: config.text_search_enabled,
            aggressive_enabled: config.aggressive_enabled,
        }
    }

    /// Whether the whole-run deadline has passed.
    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Whether a strategy of the given cost may still start.
    ///
    /// Expensive strategies need a full per-strategy slice left before the
    /// deadline; cheaper ones run until the deadline itself.
    #[must_use]
    pub fn allows(&self, cost: StrategyCost) -> bool {
        let now = Instant::now();
        let allowed = match cost {
            StrategyCost::Cheap | StrategyCost::Moderate => now < self.deadline,
            StrategyCost::Expensive => now + self.strategy_budget < self.deadline,
        };
        if !allowed {
            tracing::debug!(?cost, "budget exhausted, skipping strategy family");
        }
        allowed
    }

    /// Deterministic gate for the text-scan family. Either enough basic
    /// candidates or a large target subtree skips the scan on its own.
    #[must_use]
    pub fn text_search_allowed(&self, basic_count: usize, descendant_count: usize) -> bool {
        if !self.text_search_enabled {
            tracing::debug!("text search disabled by configuration");
            return false;
        }
        if basic_count >= self.target_enough_basic {
            tracing::debug!(basic_count, "enough basic candidates, skipping text scan");
            return false;
        }
        if descendant_count > self.max_descendants_for_text_search {
            tracing::debug!(
                descendant_count,
                cap = self.max_descendants_for_text_search,
                "target subtree too large for text scan"
            );
            return false;
        }
        true
    }

    /// Deterministic gate for the aggressive family.
    #[must_use]
    pub fn aggressive_allowed(&self, candidate_count: usize, dom_size: usize) -> bool {
        if !self.aggressive_enabled {
            tracing::debug!("aggressive strategies disabled by configuration");
            return false;
        }
        if candidate_count >= self.target_enough_basic {
            tracing::debug!(candidate_count, "candidate set already rich, skipping aggressive");
            return false;
        }
        if dom_size > self.dom_size_soft_cap {
            tracing::debug!(
                dom_size,
                cap = self.dom_size_soft_cap,
                "document over soft cap, skipping aggressive strategies"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_budget_allows_everything() {
        let guard = BudgetGuard::start(&GeneratorConfig::default());
        assert!(!guard.expired());
        assert!(guard.allows(StrategyCost::Cheap));
        assert!(guard.allows(StrategyCost::Expensive));
        assert!(guard.text_search_allowed(0, 100));
        assert!(guard.aggressive_allowed(0, 100));
    }

    #[test]
    fn zero_budget_expires_immediately() {
        let config = GeneratorConfig { build_budget_ms: 0, ..GeneratorConfig::default() };
        let guard = BudgetGuard::start(&config);
        assert!(guard.expired());
        assert!(!guard.allows(StrategyCost::Cheap));
        assert!(!guard.allows(StrategyCost::Expensive));
    }

    #[test]
    fn text_scan_skips_on_either_threshold_or_size() {
        let guard = BudgetGuard::start(&GeneratorConfig::default());
        // Enough basics alone is a skip, no matter how small the subtree.
        assert!(!guard.text_search_allowed(3, 50));
        // A huge subtree alone is a skip, no matter how starved we are.
        assert!(!guard.text_search_allowed(0, 10_000));
        // Neither condition: allowed.
        assert!(guard.text_search_allowed(2, 400));
    }

    #[test]
    fn aggressive_gates_on_richness_and_dom_size() {
        let guard = BudgetGuard::start(&GeneratorConfig::default());
        assert!(!guard.aggressive_allowed(0, 50_000));
        // Same "enough candidates" threshold as the text gate.
        assert!(!guard.aggressive_allowed(3, 100));
        assert!(guard.aggressive_allowed(2, 100));
    }

    #[test]
    fn disabled_families_never_run() {
        let config = GeneratorConfig {
            text_search_enabled: false,
            aggressive_enabled: false,
            ..GeneratorConfig::default()
        };
        let guard = BudgetGuard::start(&config);
        assert!(!guard.text_search_allowed(0, 0));
        assert!(!guard.aggressive_allowed(0, 0));
    }
}
