//! Graph construction from issue records.
//!
//! # Overview
//!
//! Materializes a directed [`petgraph`] graph and stable integer node
//! handles from a sequence of [`Issue`] records. Handles are assigned in
//! input iteration order, and the bidirectional `id ↔ handle` mapping is
//! preserved for the lifetime of one analysis. Hot loops work on handles;
//! serialization translates back to IDs.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **depends on** B" — B must be completed before
//! A can start. Every metric in this crate is defined against this
//! convention.
//!
//! ## Only Blocking Edges
//!
//! Only dependencies of kind `blocks` are included. Informational links
//! (`related`, `parent_of`, ...) are excluded. Edges whose target ID does
//! not exist as a node are silently dropped; repeated `blocks` entries for
//! the same pair are deduplicated.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use crate::error::CoreError;
use crate::model::issue::Issue;

// ---------------------------------------------------------------------------
// DepGraph
// ---------------------------------------------------------------------------

/// A directed dependency graph built from issue records.
///
/// Nodes are issue IDs (strings). An edge `A → B` means "A depends on B".
#[derive(Debug)]
pub struct DepGraph {
    /// Directed graph: nodes = issue IDs, edges = blocking dependencies.
    pub graph: DiGraph<String, ()>,
    /// Mapping from issue ID to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// BLAKE3 content hash of the edge set, for cache invalidation.
    pub content_hash: String,
}

impl DepGraph {
    /// Build a [`DepGraph`] from an ordered collection of issues.
    ///
    /// Handles are assigned in input order. Dangling `blocks` targets are
    /// dropped with a debug log; duplicate edges are added at most once.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InputMalformed`] when a record fails
    /// validation and [`CoreError::DuplicateIssueId`] when two records
    /// share an ID.
    #[instrument(skip(issues), fields(issues = issues.len()))]
    pub fn from_issues(issues: &[Issue]) -> Result<Self, CoreError> {
        let mut graph = DiGraph::<String, ()>::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(issues.len());

        for issue in issues {
            issue.validate()?;
            if node_map.contains_key(&issue.id) {
                return Err(CoreError::DuplicateIssueId {
                    issue_id: issue.id.clone(),
                });
            }
            let idx = graph.add_node(issue.id.clone());
            node_map.insert(issue.id.clone(), idx);
        }

        let mut edges: Vec<(String, String)> = Vec::new();
        let mut seen: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();

        for issue in issues {
            let from = node_map[&issue.id];
            for target in issue.blocks_targets() {
                let Some(&to) = node_map.get(target) else {
                    debug!(issue = %issue.id, target, "dropping dangling blocks dependency");
                    continue;
                };
                if seen.insert((from, to)) {
                    graph.add_edge(from, to, ());
                    edges.push((issue.id.clone(), target.to_string()));
                }
            }
        }

        edges.sort_unstable();
        let content_hash = compute_edge_hash(&edges);

        Ok(Self {
            graph,
            node_map,
            content_hash,
        })
    }

    /// Return the number of nodes (issues) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of blocking edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for an issue ID.
    #[must_use]
    pub fn node_index(&self, issue_id: &str) -> Option<NodeIndex> {
        self.node_map.get(issue_id).copied()
    }

    /// Return the issue ID for a node handle.
    #[must_use]
    pub fn issue_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// IDs of the issues that depend on `issue_id` (its dependents),
    /// sorted by handle for determinism.
    #[must_use]
    pub fn dependents_of(&self, issue_id: &str) -> Vec<&str> {
        self.neighbor_ids(issue_id, Direction::Incoming)
    }

    /// IDs of the issues `issue_id` depends on (its blockers), sorted by
    /// handle for determinism.
    #[must_use]
    pub fn blockers_of(&self, issue_id: &str) -> Vec<&str> {
        self.neighbor_ids(issue_id, Direction::Outgoing)
    }

    /// Out-neighbor handle lists for every node, each sorted ascending.
    ///
    /// This is the deterministic adjacency used by every BFS/DFS kernel:
    /// visiting neighbors in handle order keeps predecessor lists, and
    /// therefore accumulated scores, stable across runs.
    #[must_use]
    pub fn sorted_adjacency(&self, direction: Direction) -> Vec<Vec<u32>> {
        let n = self.node_count();
        let mut adj: Vec<Vec<u32>> = vec![Vec::new(); n];
        for (i, row) in adj.iter_mut().enumerate() {
            let idx = NodeIndex::new(i);
            row.extend(
                self.graph
                    .neighbors_directed(idx, direction)
                    .map(|w| u32::try_from(w.index()).unwrap_or(u32::MAX)),
            );
            row.sort_unstable();
        }
        adj
    }

    /// Undirected neighbor lists (union of in and out neighbors), each
    /// deduplicated and sorted ascending.
    #[must_use]
    pub fn undirected_adjacency(&self) -> Vec<Vec<usize>> {
        let n = self.node_count();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, row) in adj.iter_mut().enumerate() {
            let idx = NodeIndex::new(i);
            row.extend(
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .chain(self.graph.neighbors_directed(idx, Direction::Incoming))
                    .map(petgraph::graph::NodeIndex::index)
                    .filter(|&w| w != i),
            );
            row.sort_unstable();
            row.dedup();
        }
        adj
    }

    fn neighbor_ids(&self, issue_id: &str, direction: Direction) -> Vec<&str> {
        let Some(idx) = self.node_index(issue_id) else {
            return Vec::new();
        };
        let mut handles: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        handles.sort_unstable();
        handles
            .into_iter()
            .filter_map(|h| self.issue_id(h))
            .collect()
    }
}

/// Compute a BLAKE3 hash of the sorted edge list.
fn compute_edge_hash(edges: &[(String, String)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (from, to) in edges {
        hasher.update(from.as_bytes());
        hasher.update(b"\x00");
        hasher.update(to.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::issue::{Dependency, Status};

    fn issue_with_deps(id: &str, deps: &[&str]) -> Issue {
        let mut issue = Issue::new(id, Status::Open);
        issue.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
        issue
    }

    #[test]
    fn empty_input_produces_empty_graph() {
        let g = DepGraph::from_issues(&[]).expect("build graph");
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn handles_assigned_in_input_order() {
        let issues = vec![
            issue_with_deps("c", &[]),
            issue_with_deps("a", &[]),
            issue_with_deps("b", &[]),
        ];
        let g = DepGraph::from_issues(&issues).expect("build graph");
        assert_eq!(g.node_index("c"), Some(NodeIndex::new(0)));
        assert_eq!(g.node_index("a"), Some(NodeIndex::new(1)));
        assert_eq!(g.node_index("b"), Some(NodeIndex::new(2)));
    }

    #[test]
    fn edge_points_from_dependent_to_blocker() {
        // b depends on a → edge b → a.
        let issues = vec![issue_with_deps("a", &[]), issue_with_deps("b", &["a"])];
        let g = DepGraph::from_issues(&issues).expect("build graph");
        assert_eq!(g.edge_count(), 1);

        let a = g.node_index("a").expect("a");
        let b = g.node_index("b").expect("b");
        assert!(g.graph.contains_edge(b, a), "expected b → a");
        assert!(!g.graph.contains_edge(a, b), "no reverse edge");
        assert_eq!(g.blockers_of("b"), vec!["a"]);
        assert_eq!(g.dependents_of("a"), vec!["b"]);
    }

    #[test]
    fn dangling_targets_are_dropped() {
        let issues = vec![issue_with_deps("a", &["ghost"])];
        let g = DepGraph::from_issues(&issues).expect("build graph");
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_edges_deduplicated() {
        let mut issue = issue_with_deps("b", &["a", "a"]);
        issue.dependencies.push(Dependency::blocks("a"));
        let issues = vec![issue_with_deps("a", &[]), issue];
        let g = DepGraph::from_issues(&issues).expect("build graph");
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn informational_links_excluded() {
        let mut issue = Issue::new("b", Status::Open);
        issue.dependencies = vec![Dependency {
            depends_on: "a".into(),
            kind: crate::model::issue::DepKind::Related,
        }];
        let issues = vec![Issue::new("a", Status::Open), issue];
        let g = DepGraph::from_issues(&issues).expect("build graph");
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_issue_id_rejected() {
        let issues = vec![Issue::new("a", Status::Open), Issue::new("a", Status::Open)];
        let err = DepGraph::from_issues(&issues).expect_err("duplicate must fail");
        assert!(matches!(err, CoreError::DuplicateIssueId { .. }));
    }

    #[test]
    fn content_hash_changes_with_edges() {
        let no_edges = DepGraph::from_issues(&[issue_with_deps("a", &[]), issue_with_deps("b", &[])])
            .expect("build graph")
            .content_hash;
        let with_edge =
            DepGraph::from_issues(&[issue_with_deps("a", &[]), issue_with_deps("b", &["a"])])
                .expect("build graph")
                .content_hash;
        assert_ne!(no_edges, with_edge);
    }

    #[test]
    fn content_hash_independent_of_input_order() {
        let forward =
            DepGraph::from_issues(&[issue_with_deps("a", &[]), issue_with_deps("b", &["a"])])
                .expect("build graph")
                .content_hash;
        let reversed =
            DepGraph::from_issues(&[issue_with_deps("b", &["a"]), issue_with_deps("a", &[])])
                .expect("build graph")
                .content_hash;
        assert_eq!(forward, reversed, "hash covers the sorted edge list");
    }

    #[test]
    fn sorted_adjacency_is_sorted_by_handle() {
        let issues = vec![
            issue_with_deps("a", &[]),
            issue_with_deps("b", &[]),
            issue_with_deps("c", &["b", "a"]),
        ];
        let g = DepGraph::from_issues(&issues).expect("build graph");
        let adj = g.sorted_adjacency(Direction::Outgoing);
        assert_eq!(adj[2], vec![0, 1], "neighbors sorted ascending");
    }
}
