//! Generation run configuration.
//!
//! Every knob has a stated default and deserialization is forgiving:
//! absent fields fall back to defaults rather than erroring, per the
//! inbound-configuration contract.

use serde::{Deserialize, Serialize};

/// Soft wall-clock budget for one generation run, in milliseconds.
pub const DEFAULT_BUILD_BUDGET_MS: u64 = 5000;

/// Per-strategy reserve: a strategy is skipped when less than its cost
/// weight remains, in milliseconds.
pub const DEFAULT_STRATEGY_BUDGET_MS: u64 = 250;

/// Stop attempting expensive tiers once this many good basic candidates exist.
pub const DEFAULT_TARGET_ENOUGH_BASIC: usize = 3;

/// Skip global text scanning above this many element descendants.
pub const DEFAULT_MAX_DESCENDANTS_FOR_TEXT_SEARCH: usize = 400;

/// Skip aggressive fallbacks above this many elements in the document.
pub const DEFAULT_DOM_SIZE_SOFT_CAP: usize = 8000;

/// Tuning knobs for a generation run.
///
/// ```
/// use apuntar::GeneratorConfig;
///
/// let cfg: GeneratorConfig = serde_json::from_str("{\"buildBudgetMs\": 50}").unwrap();
/// assert_eq!(cfg.build_budget_ms, 50);
/// assert_eq!(cfg.target_enough_basic, 3); // absent fields keep defaults
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Soft wall-clock budget for the whole run.
    pub build_budget_ms: u64,
    /// Reserve required before starting an expensive strategy.
    pub strategy_budget_ms: u64,
    /// "Enough good basic candidates" gating threshold.
    pub target_enough_basic: usize,
    /// Descendant cap for global text scanning.
    pub max_descendants_for_text_search: usize,
    /// Document-size cap for aggressive fallbacks.
    pub dom_size_soft_cap: usize,
    /// Master switch for text-based strategies.
    pub text_search_enabled: bool,
    /// Master switch for aggressive fallback strategies.
    pub aggressive_enabled: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            build_budget_ms: DEFAULT_BUILD_BUDGET_MS,
            strategy_budget_ms: DEFAULT_STRATEGY_BUDGET_MS,
            target_enough_basic: DEFAULT_TARGET_ENOUGH_BASIC,
            max_descendants_for_text_search: DEFAULT_MAX_DESCENDANTS_FOR_TEXT_SEARCH,
            dom_size_soft_cap: DEFAULT_DOM_SIZE_SOFT_CAP,
            text_search_enabled: true,
            aggressive_enabled: true,
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from JSON, falling back to defaults for the
    /// whole object when the payload is not valid JSON at all.
    #[must_use]
    pub fn from_json_lenient(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stated_values() {
        let cfg = GeneratorConfig::default();
        assert_eq!(cfg.build_budget_ms, 5000);
        assert_eq!(cfg.target_enough_basic, 3);
        assert_eq!(cfg.max_descendants_for_text_search, 400);
        assert_eq!(cfg.dom_size_soft_cap, 8000);
        assert!(cfg.text_search_enabled);
        assert!(cfg.aggressive_enabled);
    }

    #[test]
    fn invalid_payload_falls_back_to_defaults() {
        assert_eq!(
            GeneratorConfig::from_json_lenient("not json"),
            GeneratorConfig::default()
        );
    }

    #[test]
    fn partial_payload_keeps_remaining_defaults() {
        let cfg = GeneratorConfig::from_json_lenient("{\"aggressiveEnabled\": false}");
        assert!(!cfg.aggressive_enabled);
        assert_eq!(cfg.build_budget_ms, DEFAULT_BUILD_BUDGET_MS);
    }
}
