//! PageRank over the dependency graph.
//!
//! # Overview
//!
//! With edges `dependent → blocker`, rank flows toward blockers: a high
//! PageRank issue is one that much of the graph transitively waits on.
//!
//! # Algorithm
//!
//! Standard damped power iteration:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//! ```
//!
//! Dangling mass (nodes with no blockers) is redistributed uniformly, so
//! the vector keeps summing to 1 — an invariant the tests pin down.
//! The deadline and the cancel token are polled at the top of each
//! iteration.

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::graph::build::DepGraph;
use crate::metrics::{CancelToken, Deadline, MetricMap};

/// Configuration for PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (probability of following an edge vs teleporting).
    pub damping: f64,
    /// Convergence threshold on the L1 norm of successive vectors.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

/// Compute PageRank scores for every issue.
///
/// Returns `None` when the deadline expired or cancellation was observed
/// mid-iteration.
#[must_use]
#[instrument(skip(graph, config, deadline, cancel), fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn pagerank(
    graph: &DepGraph,
    config: &PageRankConfig,
    deadline: Deadline,
    cancel: &CancelToken,
) -> Option<MetricMap> {
    let n = graph.node_count();
    if n == 0 {
        return Some(MetricMap::new());
    }

    let adj = graph.sorted_adjacency(Direction::Outgoing);
    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    for iteration in 0..config.max_iter {
        // Suspension point: top of each power iteration.
        if cancel.should_stop(&deadline) {
            debug!(iteration, "pagerank interrupted");
            return None;
        }

        for r in &mut new_ranks {
            *r = base;
        }

        let mut dangling_mass = 0.0;
        for (v, row) in adj.iter().enumerate() {
            if row.is_empty() {
                dangling_mass += ranks[v];
            } else {
                let share = config.damping * ranks[v] / row.len() as f64;
                for &w in row {
                    new_ranks[w as usize] += share;
                }
            }
        }

        // Dangling mass is spread uniformly so the vector stays stochastic.
        let dangling_share = config.damping * dangling_mass / n_f64;
        for r in &mut new_ranks {
            *r += dangling_share;
        }

        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            break;
        }
    }

    let mut out = MetricMap::new();
    for (v, rank) in ranks.iter().enumerate() {
        if let Some(id) = graph.issue_id(NodeIndex::new(v)) {
            out.insert(id.to_string(), *rank);
        }
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
