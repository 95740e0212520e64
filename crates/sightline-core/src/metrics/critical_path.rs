//! Critical-path score and slack over the dependency DAG.
//!
//! # Overview
//!
//! With edges stored `dependent → blocker`, the critical-path score of an
//! issue is the longest chain of transitive *dependents* hanging off it,
//! measured in edges — the amount of downstream work it gates. Issues at
//! the end of a chain (nothing depends on them) score zero.
//!
//! Slack is the classic forward/backward-pass float: an issue's latest
//! possible position on any longest chain minus its earliest one. Zero
//! slack means the issue lies on at least one longest path; delaying it
//! delays the whole chain.
//!
//! When the graph is cyclic both maps are emitted as all-zero and
//! `available` is false; the cycle enumerator takes over from there.

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::instrument;

use crate::graph::build::DepGraph;

/// Result of the critical-path pass.
#[derive(Debug, Clone, Default)]
pub struct CriticalPathOutcome {
    /// Longest dependent chain (in edges) per issue.
    pub score: BTreeMap<String, usize>,
    /// Scheduling float per issue; zero on every longest path.
    pub slack: BTreeMap<String, usize>,
    /// False when the graph is cyclic and the scores are placeholders.
    pub available: bool,
}

/// Compute critical-path scores and slack.
///
/// `topo` is the linear extension from Phase 1 (empty when cyclic); it is
/// reused rather than recomputed so both passes see the same order.
#[must_use]
#[instrument(skip(graph, topo), fields(nodes = graph.node_count()))]
pub fn critical_path(graph: &DepGraph, topo: &[String]) -> CriticalPathOutcome {
    let n = graph.node_count();
    if n == 0 {
        return CriticalPathOutcome {
            score: BTreeMap::new(),
            slack: BTreeMap::new(),
            available: true,
        };
    }

    if topo.is_empty() {
        // Cyclic graph: critical path is unavailable; emit zeros.
        let zeros: BTreeMap<String, usize> = graph
            .graph
            .node_indices()
            .filter_map(|idx| graph.issue_id(idx))
            .map(|id| (id.to_string(), 0))
            .collect();
        return CriticalPathOutcome {
            score: zeros.clone(),
            slack: zeros,
            available: false,
        };
    }

    let order: Vec<usize> = topo
        .iter()
        .filter_map(|id| graph.node_index(id))
        .map(NodeIndex::index)
        .collect();

    let out_adj = graph.sorted_adjacency(Direction::Outgoing);
    let in_adj = graph.sorted_adjacency(Direction::Incoming);

    // Dependent-chain length. The extension puts every dependent before
    // its blockers, so a forward walk sees all in-neighbors first.
    let mut cps = vec![0_usize; n];
    for &v in &order {
        cps[v] = in_adj[v]
            .iter()
            .map(|&u| cps[u as usize] + 1)
            .max()
            .unwrap_or(0);
    }

    // Blocker-chain length, walking the extension in reverse.
    let mut depth = vec![0_usize; n];
    for &v in order.iter().rev() {
        depth[v] = out_adj[v]
            .iter()
            .map(|&w| depth[w as usize] + 1)
            .max()
            .unwrap_or(0);
    }

    // An issue's longest through-path is depth + cps; slack is how far it
    // falls short of the global longest path.
    let longest = (0..n).map(|v| cps[v] + depth[v]).max().unwrap_or(0);

    let mut score = BTreeMap::new();
    let mut slack = BTreeMap::new();
    for v in 0..n {
        if let Some(id) = graph.issue_id(NodeIndex::new(v)) {
            score.insert(id.to_string(), cps[v]);
            slack.insert(id.to_string(), longest - (cps[v] + depth[v]));
        }
    }

    CriticalPathOutcome {
        score,
        slack,
        available: true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::basic::topo_order;
    use crate::model::issue::{Dependency, Issue, Status};

    fn build(specs: &[(&str, &[&str])]) -> (DepGraph, Vec<String>) {
        let issues: Vec<Issue> = specs
            .iter()
            .map(|&(id, deps)| {
                let mut issue = Issue::new(id, Status::Open);
                issue.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
                issue
            })
            .collect();
        let graph = DepGraph::from_issues(&issues).expect("build");
        let topo = topo_order(&graph);
        (graph, topo)
    }

    #[test]
    fn empty_graph_is_available_and_empty() {
        let (graph, topo) = build(&[]);
        let out = critical_path(&graph, &topo);
        assert!(out.available);
        assert!(out.score.is_empty());
        assert!(out.slack.is_empty());
    }

    #[test]
    fn linear_chain_scores_count_dependents() {
        // b depends on a, c on b, d on c: a gates three issues.
        let (graph, topo) = build(&[("a", &[]), ("b", &["a"]), ("c", &["b"]), ("d", &["c"])]);
        let out = critical_path(&graph, &topo);

        assert!(out.available);
        assert_eq!(out.score["a"], 3);
        assert_eq!(out.score["b"], 2);
        assert_eq!(out.score["c"], 1);
        assert_eq!(out.score["d"], 0);
        for id in ["a", "b", "c", "d"] {
            assert_eq!(out.slack[id], 0, "{id} lies on the only chain");
        }
    }

    #[test]
    fn short_branch_has_slack() {
        // Long chain a ← b ← c ← d plus a short branch a ← e ← d:
        // e can slide without delaying the longest chain.
        let (graph, topo) = build(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b"]),
            ("d", &["c", "e"]),
            ("e", &["a"]),
        ]);
        let out = critical_path(&graph, &topo);

        for id in ["a", "b", "c", "d"] {
            assert_eq!(out.slack[id], 0, "{id} on the longest path");
        }
        assert_eq!(out.slack["e"], 1, "short branch has one step of float");
        assert_eq!(out.score["e"], 1, "only d depends on e");
    }

    #[test]
    fn slack_zero_iff_on_longest_path() {
        let (graph, topo) = build(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b"]),
            ("x", &[]),
            ("y", &["x"]),
        ]);
        let out = critical_path(&graph, &topo);
        // Longest chain is a←b←c (2 edges); the x←y pair is shorter.
        assert_eq!(out.slack["a"], 0);
        assert_eq!(out.slack["c"], 0);
        assert_eq!(out.slack["x"], 1);
        assert_eq!(out.slack["y"], 1);
    }

    #[test]
    fn cyclic_graph_emits_zeros_unavailable() {
        let (graph, topo) = build(&[("a", &["b"]), ("b", &["a"])]);
        assert!(topo.is_empty());
        let out = critical_path(&graph, &topo);
        assert!(!out.available);
        assert_eq!(out.score.len(), 2);
        assert!(out.score.values().all(|&v| v == 0));
        assert!(out.slack.values().all(|&v| v == 0));
    }

    #[test]
    fn diamond_has_no_slack() {
        // d depends on b and c, which both depend on a.
        let (graph, topo) = build(&[("a", &[]), ("b", &["a"]), ("c", &["a"]), ("d", &["b", "c"])]);
        let out = critical_path(&graph, &topo);
        for id in ["a", "b", "c", "d"] {
            assert_eq!(out.slack[id], 0, "both diamond arms are longest paths");
        }
        assert_eq!(out.score["a"], 2);
        assert_eq!(out.score["d"], 0);
    }
}
