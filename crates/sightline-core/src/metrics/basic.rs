//! Cheap O(V+E) metrics: degrees, density, topological order, the
//! actionable set, and the scalar graph summary.
//!
//! All of these run synchronously in Phase 1 of an analysis.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::instrument;

use crate::graph::build::DepGraph;
use crate::model::issue::{Issue, Status};

// ---------------------------------------------------------------------------
// Degrees and density
// ---------------------------------------------------------------------------

/// Compute per-issue in and out degrees.
///
/// With edges `dependent → blocker`, `in_degree` counts dependents and
/// `out_degree` counts blockers.
#[must_use]
pub fn degrees(graph: &DepGraph) -> (BTreeMap<String, usize>, BTreeMap<String, usize>) {
    let mut in_degree = BTreeMap::new();
    let mut out_degree = BTreeMap::new();

    for idx in graph.graph.node_indices() {
        let Some(id) = graph.issue_id(idx) else {
            continue;
        };
        in_degree.insert(
            id.to_string(),
            graph
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .count(),
        );
        out_degree.insert(
            id.to_string(),
            graph
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .count(),
        );
    }

    (in_degree, out_degree)
}

/// Graph density `E / (V·(V−1))`; zero for graphs with fewer than 2 nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
}

// ---------------------------------------------------------------------------
// Topological order
// ---------------------------------------------------------------------------

/// Kahn's algorithm over the stored edges.
///
/// Returns a linear extension (for every edge `u → v`, `u` appears before
/// `v`) or an empty vector when the graph is cyclic — the cycle signal
/// consumed by the cycle enumerator's decision to run. Ready nodes are
/// processed in handle order so the extension is deterministic.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn topo_order(graph: &DepGraph) -> Vec<String> {
    let n = graph.node_count();
    let adj = graph.sorted_adjacency(Direction::Outgoing);

    let mut in_deg = vec![0_usize; n];
    for row in &adj {
        for &w in row {
            in_deg[w as usize] += 1;
        }
    }

    // Min-heap on the handle keeps the extension deterministic.
    let mut ready: std::collections::BinaryHeap<std::cmp::Reverse<usize>> = (0..n)
        .filter(|&v| in_deg[v] == 0)
        .map(std::cmp::Reverse)
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(n);
    while let Some(std::cmp::Reverse(v)) = ready.pop() {
        if let Some(id) = graph.issue_id(NodeIndex::new(v)) {
            order.push(id.to_string());
        }
        for &w in &adj[v] {
            let w = w as usize;
            in_deg[w] -= 1;
            if in_deg[w] == 0 {
                ready.push(std::cmp::Reverse(w));
            }
        }
    }

    if order.len() == n {
        order
    } else {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Actionable set
// ---------------------------------------------------------------------------

/// Compute the actionable set.
///
/// An issue is actionable iff its status is open or in-progress and it has
/// no `blocks` dependency on an issue that is itself open or in-progress.
/// Closed (and manually blocked) blockers do not block.
#[must_use]
pub fn actionable_set(graph: &DepGraph, issues: &[Issue]) -> BTreeSet<String> {
    let statuses: HashMap<&str, Status> = issues
        .iter()
        .map(|issue| (issue.id.as_str(), issue.status))
        .collect();

    issues
        .iter()
        .filter(|issue| issue.status.is_workable())
        .filter(|issue| {
            graph.blockers_of(&issue.id).iter().all(|blocker| {
                statuses
                    .get(blocker)
                    .is_none_or(|status| !status.is_workable())
            })
        })
        .map(|issue| issue.id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Graph summary
// ---------------------------------------------------------------------------

/// Scalar summary of the graph shape, computed in Phase 1 and consumed by
/// the viewer dashboard and the drift engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GraphSummary {
    /// Nodes with neither dependents nor blockers.
    pub isolated_node_count: usize,
    /// Highest dependent count on one node.
    pub max_in_degree: usize,
    /// Highest blocker count on one node.
    pub max_out_degree: usize,
    /// Weakly connected components (disjoint subgraphs).
    pub weak_component_count: usize,
}

/// Compute the [`GraphSummary`].
#[must_use]
pub fn summary(graph: &DepGraph) -> GraphSummary {
    let adj = graph.undirected_adjacency();
    let n = adj.len();

    let isolated_node_count = adj.iter().filter(|row| row.is_empty()).count();

    let mut max_in_degree = 0;
    let mut max_out_degree = 0;
    for idx in graph.graph.node_indices() {
        max_in_degree = max_in_degree.max(
            graph
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .count(),
        );
        max_out_degree = max_out_degree.max(
            graph
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .count(),
        );
    }

    // Count weakly connected components by BFS over the undirected view.
    let mut seen = vec![false; n];
    let mut weak_component_count = 0;
    let mut queue = Vec::new();
    for start in 0..n {
        if seen[start] {
            continue;
        }
        weak_component_count += 1;
        seen[start] = true;
        queue.push(start);
        while let Some(v) = queue.pop() {
            for &w in &adj[v] {
                if !seen[w] {
                    seen[w] = true;
                    queue.push(w);
                }
            }
        }
    }

    GraphSummary {
        isolated_node_count,
        max_in_degree,
        max_out_degree,
        weak_component_count,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
