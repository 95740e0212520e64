//! Eigenvector centrality by power iteration.
//!
//! # Overview
//!
//! Eigenvector centrality weights an issue by the centrality of the
//! issues that depend on it. The power method only converges to the
//! principal eigenvector within one connected piece of the graph, so the
//! iteration is restricted to the largest weakly-connected component;
//! everything outside it gets a zero entry. Ties between equally-sized
//! components go to the one containing the smallest node handle, keeping
//! the output deterministic.
//!
//! On a fully acyclic component the spectrum is degenerate and the
//! iterate can collapse to the zero vector; the computation stops there
//! and reports whatever mass remains, which is the honest answer for a
//! DAG.

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::graph::build::DepGraph;
use crate::metrics::{CancelToken, Deadline, MetricMap};

/// Compute eigenvector centrality.
///
/// Returns `None` when interrupted; `Some` with empty maps when the graph
/// has no edges.
#[must_use]
#[instrument(skip(graph, deadline, cancel), fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn eigenvector(
    graph: &DepGraph,
    max_iter: usize,
    tolerance: f64,
    deadline: Deadline,
    cancel: &CancelToken,
) -> Option<MetricMap> {
    let n = graph.node_count();
    if n == 0 || graph.edge_count() == 0 {
        return Some(MetricMap::new());
    }

    let in_adj = graph.sorted_adjacency(Direction::Incoming);
    let component = largest_weak_component(graph);

    let member_count = component.iter().filter(|&&m| m).count().max(1);
    let init = 1.0 / (member_count as f64).sqrt();
    let mut x: Vec<f64> = (0..n)
        .map(|v| if component[v] { init } else { 0.0 })
        .collect();

    for iteration in 0..max_iter {
        // Suspension point: top of each power iteration.
        if cancel.should_stop(&deadline) {
            debug!(iteration, "eigenvector interrupted");
            return None;
        }

        let mut next = vec![0.0_f64; n];
        for (v, row) in in_adj.iter().enumerate() {
            if !component[v] {
                continue;
            }
            for &u in row {
                next[v] += x[u as usize];
            }
        }

        let norm: f64 = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm <= f64::EPSILON {
            // Degenerate (acyclic) component: the iterate died out.
            x = next;
            break;
        }
        for v in &mut next {
            *v /= norm;
        }

        let diff: f64 = x
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();

        x = next;

        if diff < tolerance {
            break;
        }
    }

    let mut out = MetricMap::new();
    for (v, score) in x.iter().enumerate() {
        if let Some(id) = graph.issue_id(NodeIndex::new(v)) {
            out.insert(id.to_string(), *score);
        }
    }
    Some(out)
}

/// Membership mask of the largest weakly-connected component. Ties break
/// toward the component containing the smallest handle (the first one
/// discovered by the ascending scan).
fn largest_weak_component(graph: &DepGraph) -> Vec<bool> {
    let adj = graph.undirected_adjacency();
    let n = adj.len();

    let mut component = vec![usize::MAX; n];
    let mut sizes: Vec<usize> = Vec::new();
    let mut queue = Vec::new();

    for start in 0..n {
        if component[start] != usize::MAX {
            continue;
        }
        let label = sizes.len();
        let mut size = 0;
        component[start] = label;
        queue.push(start);
        while let Some(v) = queue.pop() {
            size += 1;
            for &w in &adj[v] {
                if component[w] == usize::MAX {
                    component[w] = label;
                    queue.push(w);
                }
            }
        }
        sizes.push(size);
    }

    let best = sizes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(label, _)| label);

    (0..n).map(|v| component[v] == best).collect()
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

    fn run(graph: &DepGraph) -> MetricMap {
        eigenvector(graph, 100, 1e-6, Deadline::none(), &CancelToken::new()).expect("eigenvector")
    }

    #[test]
    fn edgeless_graph_emits_empty_map() {
        assert!(run(&build(&[("a", &[]), ("b", &[])])).is_empty());
    }

    #[test]
    fn cycle_members_share_centrality() {
        let ev = run(&build(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]));
        assert!((ev["a"] - ev["b"]).abs() < 1e-6);
        assert!((ev["b"] - ev["c"]).abs() < 1e-6);
        assert!(ev["a"] > 0.0);
    }

    #[test]
    fn nodes_outside_largest_component_are_zero() {
        // Triangle (3 nodes) plus a detached pair (2 nodes).
        let ev = run(&build(&[
            ("a", &["b"]),
            ("b", &["c"]),
            ("c", &["a"]),
            ("x", &["y"]),
            ("y", &[]),
        ]));
        assert!(ev["a"] > 0.0);
        assert!((ev["x"] - 0.0).abs() < f64::EPSILON);
        assert!((ev["y"] - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn map_covers_every_node() {
        let ev = run(&build(&[
            ("a", &["b"]),
            ("b", &["a"]),
            ("lone", &[]),
        ]));
        assert_eq!(ev.len(), 3, "one entry per node, zeros included");
        assert!((ev["lone"] - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn interrupted_run_returns_none() {
        let graph = build(&[("a", &["b"]), ("b", &[])]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(eigenvector(&graph, 100, 1e-6, Deadline::none(), &cancel).is_none());
    }
}
