//! Greedy vertex cover over blocking edges (2-approximation family).
//!
//! # Overview
//!
//! "Which K issues touch the most blocking relationships?" The edge set
//! is every `blocks` edge whose endpoints are both non-closed. Each
//! round recomputes node degrees over the *remaining* uncovered edges,
//! picks the highest-degree node (ties to the smallest ID), and removes
//! its incident edges. Selection is recorded 1-indexed.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sightline_core::graph::build::DepGraph;
use sightline_core::model::issue::Issue;

use crate::advanced::FeatureStatus;

/// One cover pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverPick {
    /// Selected issue ID.
    pub id: String,
    /// 1-indexed selection order.
    pub order: usize,
    /// Uncovered edges this pick newly covered.
    pub edges_added: usize,
    /// The pick's degree over the original edge set.
    pub total_degree: usize,
}

/// Result of the coverage selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverReport {
    /// Feature status (always available; count = picks).
    pub status: FeatureStatus,
    /// Picks in selection order.
    pub picks: Vec<CoverPick>,
    /// Edges covered by the selection.
    pub edges_covered: usize,
    /// Total edges in the non-closed blocking subgraph.
    pub total_edges: usize,
    /// `edges_covered / total_edges` (1.0 for an empty edge set).
    pub coverage_ratio: f64,
}

/// Run the greedy cover with cap `k`.
#[must_use]
#[instrument(skip(graph, issues))]
#[allow(clippy::cast_precision_loss)]
pub fn coverage_set(graph: &DepGraph, issues: &[Issue], k: usize) -> CoverReport {
    let closed: HashSet<&str> = issues
        .iter()
        .filter(|issue| issue.status.is_closed())
        .map(|issue| issue.id.as_str())
        .collect();

    // Every blocks edge with both endpoints non-closed.
    let mut remaining: Vec<(String, String)> = graph
        .graph
        .edge_indices()
        .filter_map(|e| graph.graph.edge_endpoints(e))
        .filter_map(|(from, to)| {
            let from = graph.issue_id(from)?;
            let to = graph.issue_id(to)?;
            (!closed.contains(from) && !closed.contains(to))
                .then(|| (from.to_string(), to.to_string()))
        })
        .collect();
    remaining.sort_unstable();

    let total_edges = remaining.len();
    let original_degree = degree_map(&remaining);

    let mut picks: Vec<CoverPick> = Vec::new();
    let mut edges_covered = 0;

    while picks.len() < k && !remaining.is_empty() {
        let degrees = degree_map(&remaining);
        let Some((id, degree)) = degrees
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(id, &d)| (id.clone(), d))
        else {
            break;
        };

        remaining.retain(|(from, to)| *from != id && *to != id);
        edges_covered += degree;
        picks.push(CoverPick {
            order: picks.len() + 1,
            edges_added: degree,
            total_degree: original_degree.get(&id).copied().unwrap_or(0),
            id,
        });
    }

    let capped = !remaining.is_empty();
    let coverage_ratio = if total_edges == 0 {
        1.0
    } else {
        edges_covered as f64 / total_edges as f64
    };

    CoverReport {
        status: FeatureStatus::available(picks.len(), capped, total_edges),
        picks,
        edges_covered,
        total_edges,
        coverage_ratio,
    }
}

/// Degree of each endpoint over an edge list.
fn degree_map(edges: &[(String, String)]) -> BTreeMap<String, usize> {
    let mut degrees: BTreeMap<String, usize> = BTreeMap::new();
    for (from, to) in edges {
        *degrees.entry(from.clone()).or_default() += 1;
        *degrees.entry(to.clone()).or_default() += 1;
    }
    degrees
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
