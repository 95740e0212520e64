//! The stats object: the single mutable artifact of one analysis.
//!
//! Created empty by the scheduler, populated in place by Phase 1, then by
//! each Phase-2 task installing its finished map atomically. Never
//! mutated after Phase-2 completion is signalled.
//!
//! Per-node maps are keyed by issue ID (not handle) and held in
//! `BTreeMap`s so two runs on the same input serialize byte-identically.
//! A metric map is either empty (skipped or timed out) or has exactly one
//! entry per node — never partially populated.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::metrics::MetricMap;
use crate::metrics::basic::GraphSummary;

// ---------------------------------------------------------------------------
// Metric states
// ---------------------------------------------------------------------------

/// Completion state of one metric, advertised alongside the map itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricState {
    /// The metric ran to completion; its map is fully populated.
    Completed,
    /// The metric hit its deadline or was cancelled; its map is empty.
    TimedOut,
    /// The size policy disabled the metric; its map is empty.
    Skipped,
}

/// Metric names used as keys of the state map and in profiles.
pub mod metric {
    pub const BETWEENNESS: &str = "betweenness";
    pub const PAGERANK: &str = "pagerank";
    pub const HITS: &str = "hits";
    pub const EIGENVECTOR: &str = "eigenvector";
    pub const CYCLES: &str = "cycles";
}

// ---------------------------------------------------------------------------
// AnalysisStats
// ---------------------------------------------------------------------------

/// All metric output of one analysis, keyed for serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Number of issues.
    pub node_count: usize,
    /// Number of blocking edges.
    pub edge_count: usize,
    /// `E / (V·(V−1))`, zero below two nodes.
    pub density: f64,

    /// Dependent count per issue.
    pub in_degree: BTreeMap<String, usize>,
    /// Blocker count per issue.
    pub out_degree: BTreeMap<String, usize>,
    /// PageRank; non-negative, sums to 1 within 1e-6 when present.
    pub pagerank: MetricMap,
    /// Raw Brandes sums (unnormalized).
    pub betweenness: MetricMap,
    /// Eigenvector centrality on the largest weak component.
    pub eigenvector: MetricMap,
    /// HITS hub scores, L2-normalized.
    pub hubs: MetricMap,
    /// HITS authority scores, L2-normalized.
    pub authorities: MetricMap,
    /// Longest dependent chain per issue, in edges.
    pub critical_path_score: BTreeMap<String, usize>,
    /// Scheduling float; zero iff on a longest path.
    pub slack: BTreeMap<String, usize>,
    /// Degeneracy core number on the undirected view.
    pub core_number: BTreeMap<String, usize>,

    /// 1-indexed descending PageRank ranks, ties broken by ID.
    pub pagerank_rank: BTreeMap<String, usize>,
    /// 1-indexed descending betweenness ranks, ties broken by ID.
    pub betweenness_rank: BTreeMap<String, usize>,

    /// Issues whose removal disconnects the undirected graph.
    pub articulation_points: BTreeSet<String>,
    /// Simple cycles in canonical minimal-rotation form; empty iff the
    /// blocking subgraph is a DAG. May end with the timeout sentinel.
    pub cycles: Vec<Vec<String>>,
    /// Linear extension when acyclic; empty otherwise.
    pub topo_order: Vec<String>,
    /// Open or in-progress issues with no workable blocker.
    pub actionable: BTreeSet<String>,
    /// False when the graph is cyclic and the critical-path maps are
    /// placeholder zeros.
    pub critical_path_available: bool,

    /// Scalar shape summary computed in Phase 1.
    pub summary: GraphSummary,
    /// Per-metric completion states.
    pub metric_states: BTreeMap<String, MetricState>,
}

impl AnalysisStats {
    /// Names of metrics that did not complete (skipped or timed out),
    /// used by the profile reporter.
    #[must_use]
    pub fn skipped_metrics(&self) -> Vec<String> {
        self.metric_states
            .iter()
            .filter(|&(_, &state)| state != MetricState::Completed)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Compute 1-indexed descending ranks over a metric map, ties broken by
/// the stable ID order.
#[must_use]
pub fn ranks_desc(map: &MetricMap) -> BTreeMap<String, usize> {
    let mut entries: Vec<(&String, f64)> = map.iter().map(|(id, &v)| (id, v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (id, _))| (id.clone(), i + 1))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_one_indexed_descending_with_id_tiebreak() {
        let mut map = MetricMap::new();
        map.insert("a".into(), 0.5);
        map.insert("b".into(), 0.9);
        map.insert("c".into(), 0.5);

        let ranks = ranks_desc(&map);
        assert_eq!(ranks["b"], 1);
        assert_eq!(ranks["a"], 2, "tie broken toward smaller id");
        assert_eq!(ranks["c"], 3);
    }

    #[test]
    fn ranks_of_empty_map_are_empty() {
        assert!(ranks_desc(&MetricMap::new()).is_empty());
    }

    #[test]
    fn skipped_metrics_lists_non_completed() {
        let mut stats = AnalysisStats::default();
        stats
            .metric_states
            .insert(metric::PAGERANK.into(), MetricState::Completed);
        stats
            .metric_states
            .insert(metric::HITS.into(), MetricState::Skipped);
        stats
            .metric_states
            .insert(metric::BETWEENNESS.into(), MetricState::TimedOut);

        let skipped = stats.skipped_metrics();
        assert_eq!(skipped, vec!["betweenness", "hits"]);
    }

    #[test]
    fn serialization_is_stable() {
        let mut stats = AnalysisStats::default();
        stats.node_count = 2;
        stats.pagerank.insert("b".into(), 0.6);
        stats.pagerank.insert("a".into(), 0.4);

        let first = serde_json::to_string(&stats).expect("serialize");
        let second = serde_json::to_string(&stats).expect("serialize");
        assert_eq!(first, second);
        // BTreeMap keys come out sorted.
        let a_pos = first.find("\"a\"").expect("a");
        let b_pos = first.find("\"b\"").expect("b");
        assert!(a_pos < b_pos);
    }

    #[test]
    fn metric_state_serializes_snake_case() {
        let json = serde_json::to_string(&MetricState::TimedOut).expect("serialize");
        assert_eq!(json, "\"timed_out\"");
    }
}
