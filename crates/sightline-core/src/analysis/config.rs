//! Size-adaptive analysis configuration.
//!
//! A single function maps the graph size to an [`AnalysisConfig`] that
//! enables or skips each expensive metric and picks the betweenness mode.
//! The tiers keep a cold start interactive: everything Phase 1 needs is
//! O(V+E), and each Phase-2 metric gets its own wall-clock budget.

use std::time::Duration;

use crate::metrics::betweenness::{BetweennessMode, mode_for_size};

/// Which expensive metrics run in Phase 2 and under what budgets.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Betweenness mode (exact or sampled with a pivot count).
    pub betweenness: BetweennessMode,
    /// Whether HITS runs.
    pub hits: bool,
    /// Whether eigenvector centrality runs.
    pub eigenvector: bool,
    /// Wall-clock budget for each iterative metric and for betweenness.
    pub metric_budget: Duration,
    /// Wall-clock budget for cycle enumeration.
    pub cycles_budget: Duration,
    /// Seed for pivot sampling; fixed seed → byte-identical output.
    pub seed: u64,
}

/// Edge-count ceiling above which the optional metrics of the L and XL
/// tiers are shed.
const DENSE_EDGE_CEILING: usize = 8 * 2000;

/// Map `(node_count, edge_count)` to a configuration tier.
///
/// | Tier | V | Betweenness | HITS | Eigenvector | Cycles budget |
/// |---|---|---|---|---|---|
/// | S | <100 | exact | on | on | 500 ms |
/// | M | 100–499 | sampled ≈V/5 | on | on | 1 s |
/// | L | 500–1999 | sampled k=100 | on | edge-bounded | 3 s |
/// | XL | ≥2000 | sampled k=200 | edge-bounded | off | 5 s |
#[must_use]
pub fn config_for_size(node_count: usize, edge_count: usize) -> AnalysisConfig {
    let betweenness = mode_for_size(node_count);
    match node_count {
        0..=99 => AnalysisConfig {
            betweenness,
            hits: true,
            eigenvector: true,
            metric_budget: Duration::from_secs(1),
            cycles_budget: Duration::from_millis(500),
            seed: 0,
        },
        100..=499 => AnalysisConfig {
            betweenness,
            hits: true,
            eigenvector: true,
            metric_budget: Duration::from_secs(2),
            cycles_budget: Duration::from_secs(1),
            seed: 0,
        },
        500..=1999 => AnalysisConfig {
            betweenness,
            hits: true,
            eigenvector: edge_count <= DENSE_EDGE_CEILING,
            metric_budget: Duration::from_secs(4),
            cycles_budget: Duration::from_secs(3),
            seed: 0,
        },
        _ => AnalysisConfig {
            betweenness,
            hits: edge_count <= DENSE_EDGE_CEILING,
            eigenvector: false,
            metric_budget: Duration::from_secs(8),
            cycles_budget: Duration::from_secs(5),
            seed: 0,
        },
    }
}

/// The `force_full_analysis` override: every metric at every size, exact
/// betweenness, still bounded by the per-metric budgets of the size tier.
#[must_use]
pub fn config_full(node_count: usize, edge_count: usize) -> AnalysisConfig {
    let mut config = config_for_size(node_count, edge_count);
    config.betweenness = BetweennessMode::Exact;
    config.hits = true;
    config.eigenvector = true;
    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
