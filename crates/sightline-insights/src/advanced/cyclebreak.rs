//! Cycle-break edge recommendations.
//!
//! # Overview
//!
//! Every detected cycle contributes each of its consecutive directed
//! edges (including the wrap-around edge from the last node back to the
//! first). Edges are ranked by how many cycles they appear in — cutting
//! a high-frequency edge breaks the most cycles at once — with a
//! lexicographic `(from, to)` tie-break. Collateral is the number of
//! dependents of the edge's target: how much legitimate structure the
//! cut would disturb.
//!
//! Sentinel entries left by a truncated enumeration are filtered out
//! before ranking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sightline_core::analysis::stats::AnalysisStats;
use sightline_core::graph::build::DepGraph;
use sightline_core::metrics::cycles::is_timeout_sentinel;

use crate::advanced::FeatureStatus;

/// One suggested edge cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleBreakSuggestion {
    /// Edge source (the dependent).
    pub from: String,
    /// Edge target (the blocker).
    pub to: String,
    /// Number of cycles this edge participates in.
    pub impact: usize,
    /// Number of dependents of the target.
    pub collateral: usize,
    /// Indices into the stats cycle list this edge belongs to.
    pub cycle_indices: Vec<usize>,
    /// Templated rationale.
    pub rationale: String,
}

/// Result of the cycle-break ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleBreakReport {
    /// Feature status (always available; count = suggestions).
    pub status: FeatureStatus,
    /// Suggestions, impact descending.
    pub suggestions: Vec<CycleBreakSuggestion>,
}

/// Rank cycle edges and report the top `k`.
#[must_use]
#[instrument(skip(graph, stats))]
pub fn cycle_break_suggestions(
    graph: &DepGraph,
    stats: &AnalysisStats,
    k: usize,
) -> CycleBreakReport {
    let mut edge_cycles: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();

    for (index, cycle) in stats
        .cycles
        .iter()
        .filter(|cycle| !is_timeout_sentinel(cycle))
        .enumerate()
    {
        for i in 0..cycle.len() {
            let from = cycle[i].clone();
            let to = cycle[(i + 1) % cycle.len()].clone();
            edge_cycles.entry((from, to)).or_default().push(index);
        }
    }

    let candidate_count = edge_cycles.len();
    let mut ranked: Vec<((String, String), Vec<usize>)> = edge_cycles.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.len()
            .cmp(&a.1.len())
            .then_with(|| a.0.cmp(&b.0))
    });

    let capped = ranked.len() > k;
    let suggestions: Vec<CycleBreakSuggestion> = ranked
        .into_iter()
        .take(k)
        .map(|((from, to), cycle_indices)| {
            let impact = cycle_indices.len();
            let collateral = graph.dependents_of(&to).len();
            let rationale = format!(
                "removing the dependency {from} -> {to} breaks {impact} cycle(s); {collateral} issue(s) depend on {to}"
            );
            CycleBreakSuggestion {
                from,
                to,
                impact,
                collateral,
                cycle_indices,
                rationale,
            }
        })
        .collect();

    CycleBreakReport {
        status: FeatureStatus::available(suggestions.len(), capped, candidate_count),
        suggestions,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
