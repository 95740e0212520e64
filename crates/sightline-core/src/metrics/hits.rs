//! HITS hub and authority scores.
//!
//! # Overview
//!
//! Kleinberg's HITS computes two mutually-reinforcing scores. In the
//! dependency graph an *authority* is an issue that many important issues
//! depend on; a *hub* is an issue that depends on many important
//! authorities — a good summary of "integration" issues.
//!
//! # Algorithm
//!
//! Simultaneous update followed by L2 renormalization, iterated to the
//! shared tolerance/cap. Both vectors come out unit-length, an invariant
//! the tests pin down. A graph with no edges has nothing to reinforce —
//! the maps are emitted empty and the scheduler marks the metric skipped.

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::graph::build::DepGraph;
use crate::metrics::{CancelToken, Deadline, MetricMap};

/// Result of the HITS computation.
#[derive(Debug, Clone, Default)]
pub struct HitsOutcome {
    /// Hub scores per issue, L2-normalized.
    pub hubs: MetricMap,
    /// Authority scores per issue, L2-normalized.
    pub authorities: MetricMap,
}

/// Compute HITS hub and authority scores.
///
/// Returns `None` when interrupted by the deadline or cancellation;
/// `Some` with empty maps when the graph has no edges to iterate on.
#[must_use]
#[instrument(skip(graph, deadline, cancel), fields(nodes = graph.node_count()))]
pub fn hits(
    graph: &DepGraph,
    max_iter: usize,
    tolerance: f64,
    deadline: Deadline,
    cancel: &CancelToken,
) -> Option<HitsOutcome> {
    let n = graph.node_count();
    if n == 0 || graph.edge_count() == 0 {
        return Some(HitsOutcome::default());
    }

    let out_adj = graph.sorted_adjacency(Direction::Outgoing);
    let in_adj = graph.sorted_adjacency(Direction::Incoming);

    let mut hub = vec![1.0_f64; n];
    let mut auth = vec![1.0_f64; n];

    for iteration in 0..max_iter {
        // Suspension point: top of each power iteration.
        if cancel.should_stop(&deadline) {
            debug!(iteration, "hits interrupted");
            return None;
        }

        // auth(v) = Σ hub(u) over u → v.
        let mut new_auth = vec![0.0_f64; n];
        for (v, row) in in_adj.iter().enumerate() {
            for &u in row {
                new_auth[v] += hub[u as usize];
            }
        }

        // hub(v) = Σ auth(w) over v → w.
        let mut new_hub = vec![0.0_f64; n];
        for (v, row) in out_adj.iter().enumerate() {
            for &w in row {
                new_hub[v] += new_auth[w as usize];
            }
        }

        normalize_l2(&mut new_auth);
        normalize_l2(&mut new_hub);

        let diff: f64 = auth
            .iter()
            .zip(new_auth.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();

        auth = new_auth;
        hub = new_hub;

        if diff < tolerance {
            break;
        }
    }

    let mut hubs = MetricMap::new();
    let mut authorities = MetricMap::new();
    for v in 0..n {
        if let Some(id) = graph.issue_id(NodeIndex::new(v)) {
            hubs.insert(id.to_string(), hub[v]);
            authorities.insert(id.to_string(), auth[v]);
        }
    }
    Some(HitsOutcome { hubs, authorities })
}

/// Normalize a vector to unit L2 norm. A zero vector is left as-is.
fn normalize_l2(v: &mut [f64]) {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::issue::{Dependency, Issue, Status};

    fn build(specs: &[(&str, &[&str])]) -> DepGraph {
        let issues: Vec<Issue> = specs
            .iter()
            .map(|&(id, deps)| {
                let mut issue = Issue::new(id, Status::Open);
                issue.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
                issue
            })
            .collect();
        DepGraph::from_issues(&issues).expect("build")
    }

    fn run(graph: &DepGraph) -> HitsOutcome {
        hits(graph, 100, 1e-6, Deadline::none(), &CancelToken::new()).expect("hits")
    }

    fn l2(map: &MetricMap) -> f64 {
        map.values().map(|x| x * x).sum::<f64>().sqrt()
    }

    #[test]
    fn edgeless_graph_emits_empty_maps() {
        let out = run(&build(&[("a", &[]), ("b", &[])]));
        assert!(out.hubs.is_empty());
        assert!(out.authorities.is_empty());
    }

    #[test]
    fn vectors_are_unit_length() {
        let out = run(&build(&[
            ("a", &["c"]),
            ("b", &["c", "d"]),
            ("c", &[]),
            ("d", &[]),
        ]));
        assert!((l2(&out.hubs) - 1.0).abs() < 1e-6, "hub norm {}", l2(&out.hubs));
        assert!(
            (l2(&out.authorities) - 1.0).abs() < 1e-6,
            "authority norm {}",
            l2(&out.authorities)
        );
    }

    #[test]
    fn depended_upon_issue_is_the_authority() {
        // a and b both depend on c.
        let out = run(&build(&[("a", &["c"]), ("b", &["c"]), ("c", &[])]));
        assert!(out.authorities["c"] > out.authorities["a"]);
        assert!(out.authorities["c"] > out.authorities["b"]);
        assert!(out.hubs["a"] > out.hubs["c"], "dependents are the hubs");
    }

    #[test]
    fn broad_dependent_is_the_hub() {
        // b depends on three authorities.
        let out = run(&build(&[
            ("b", &["x", "y", "z"]),
            ("x", &[]),
            ("y", &[]),
            ("z", &[]),
            ("w", &["x"]),
        ]));
        assert!(out.hubs["b"] > out.hubs["w"], "b spans more authorities");
    }

    #[test]
    fn interrupted_run_returns_none() {
        let graph = build(&[("a", &["b"]), ("b", &[])]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(hits(&graph, 100, 1e-6, Deadline::none(), &cancel).is_none());
    }
}
