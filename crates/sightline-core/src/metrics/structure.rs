//! Undirected structural metrics: articulation points and core numbers.
//!
//! Both treat the dependency graph as undirected. Articulation points are
//! issues whose removal disconnects a component — choke points worth
//! surfacing in the viewer. Core numbers come from iterated degeneracy
//! peeling and give a cheap "how embedded is this issue" signal.
//!
//! Traversal order is by node handle throughout, so both outputs are
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::NodeIndex;
use tracing::instrument;

use crate::graph::build::DepGraph;

// ---------------------------------------------------------------------------
// Articulation points
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct DfsFrame {
    v: usize,
    parent: usize,
    next: usize,
    parent_edge_skipped: bool,
}

/// Find articulation points via Tarjan's low-link algorithm.
///
/// The DFS is iterative so deep chains cannot overflow the stack.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn articulation_points(graph: &DepGraph) -> BTreeSet<String> {
    let adj = graph.undirected_adjacency();
    let n = adj.len();

    const UNVISITED: usize = usize::MAX;
    let mut disc = vec![UNVISITED; n];
    let mut low = vec![0_usize; n];
    let mut is_cut = vec![false; n];
    let mut timer = 0_usize;

    for root in 0..n {
        if disc[root] != UNVISITED {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;

        let mut root_children = 0_usize;
        let mut stack = vec![DfsFrame {
            v: root,
            parent: UNVISITED,
            next: 0,
            parent_edge_skipped: false,
        }];

        while let Some(frame) = stack.last_mut() {
            let v = frame.v;
            if frame.next < adj[v].len() {
                let w = adj[v][frame.next];
                frame.next += 1;

                // Skip the single tree edge back to the parent once;
                // a second occurrence would be a genuine back edge, but
                // the undirected view is deduplicated so there is none.
                if w == frame.parent && !frame.parent_edge_skipped {
                    frame.parent_edge_skipped = true;
                    continue;
                }

                if disc[w] == UNVISITED {
                    disc[w] = timer;
                    low[w] = timer;
                    timer += 1;
                    stack.push(DfsFrame {
                        v: w,
                        parent: v,
                        next: 0,
                        parent_edge_skipped: false,
                    });
                } else {
                    low[v] = low[v].min(disc[w]);
                }
            } else {
                let child = stack.pop().map(|f| f.v).unwrap_or(v);
                if let Some(parent_frame) = stack.last_mut() {
                    let p = parent_frame.v;
                    low[p] = low[p].min(low[child]);
                    if p == root {
                        root_children += 1;
                    } else if low[child] >= disc[p] {
                        is_cut[p] = true;
                    }
                }
            }
        }

        if root_children > 1 {
            is_cut[root] = true;
        }
    }

    (0..n)
        .filter(|&v| is_cut[v])
        .filter_map(|v| graph.issue_id(NodeIndex::new(v)))
        .map(ToString::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Core numbers
// ---------------------------------------------------------------------------

/// Compute the core number of every issue by degeneracy peeling on the
/// undirected view: repeatedly remove a minimum-degree node; the core
/// number is the running maximum of removal degrees.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
pub fn core_numbers(graph: &DepGraph) -> BTreeMap<String, usize> {
    let adj = graph.undirected_adjacency();
    let n = adj.len();

    let mut deg: Vec<usize> = adj.iter().map(Vec::len).collect();
    let mut remaining: BTreeSet<(usize, usize)> = (0..n).map(|v| (deg[v], v)).collect();
    let mut core = vec![0_usize; n];
    let mut peeled = vec![false; n];
    let mut k = 0_usize;

    while let Some(&(d, v)) = remaining.iter().next() {
        remaining.remove(&(d, v));
        peeled[v] = true;
        k = k.max(d);
        core[v] = k;

        for &u in &adj[v] {
            if !peeled[u] && remaining.remove(&(deg[u], u)) {
                deg[u] -= 1;
                remaining.insert((deg[u], u));
            }
        }
    }

    (0..n)
        .filter_map(|v| graph.issue_id(NodeIndex::new(v)).map(|id| (id, v)))
        .map(|(id, v)| (id.to_string(), core[v]))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
