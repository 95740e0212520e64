//! Simple-cycle enumeration with a hard wall-clock budget.
//!
//! # Overview
//!
//! When toposort fails the dependency graph has at least one cycle, and
//! the viewer needs the concrete cycles, not just the fact. This module
//! enumerates simple cycles with Johnson's blocked-search procedure run
//! per strongly-connected component.
//!
//! # Canonical Form
//!
//! Every cycle is rotated so the lexicographically smallest issue ID
//! comes first. The rotation — not a sort — is the canonical key used by
//! the diff and drift engines to compare cycles across snapshots, so the
//! same cycle discovered from a different starting node still matches.
//!
//! # Truncation
//!
//! The wall clock is checked at an explicit checkpoint every
//! [`CHECKPOINT_INTERVAL`] expansions. On expiry (or cancellation) the
//! partial list is returned with a trailing sentinel entry whose first
//! element is [`CYCLE_TIMEOUT_SENTINEL`]. Truncation is not an error.

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::graph::build::DepGraph;
use crate::metrics::{CancelToken, Deadline};

/// First element of the sentinel entry appended on truncation.
pub const CYCLE_TIMEOUT_SENTINEL: &str = "CYCLE_DETECTION_TIMEOUT";

/// Expansions between wall-clock checkpoints.
const CHECKPOINT_INTERVAL: usize = 1024;

/// Return `true` when `cycle` is the truncation sentinel rather than a
/// real cycle.
#[must_use]
pub fn is_timeout_sentinel(cycle: &[String]) -> bool {
    cycle.first().is_some_and(|id| id == CYCLE_TIMEOUT_SENTINEL)
}

/// Rotate `cycle` so the lexicographically smallest ID comes first.
#[must_use]
pub fn canonical_rotation(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return Vec::new();
    }
    let pivot = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map_or(0, |(i, _)| i);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[pivot..]);
    rotated.extend_from_slice(&cycle[..pivot]);
    rotated
}

/// Canonical string key for a cycle: the minimal rotation joined with
/// `" -> "`. Rotations of the same cycle share a key.
#[must_use]
pub fn canonical_key(cycle: &[String]) -> String {
    canonical_rotation(cycle).join(" -> ")
}

/// Enumerate simple cycles in canonical form.
///
/// Returns an empty list for a DAG. On budget expiry or cancellation the
/// partial list gains a trailing sentinel entry. The output is sorted so
/// repeated runs serialize identically.
#[must_use]
#[instrument(skip(graph, deadline, cancel), fields(nodes = graph.node_count()))]
pub fn enumerate_cycles(
    graph: &DepGraph,
    deadline: Deadline,
    cancel: &CancelToken,
) -> Vec<Vec<String>> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let adj = graph.sorted_adjacency(Direction::Outgoing);

    // Cycles never span SCCs; search each nontrivial component alone.
    let mut sccs: Vec<Vec<usize>> = tarjan_scc(&graph.graph)
        .into_iter()
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(NodeIndex::index).collect();
            members.sort_unstable();
            members
        })
        .filter(|members| {
            members.len() > 1
                || members
                    .first()
                    .is_some_and(|&v| adj[v].binary_search(&u32::try_from(v).unwrap_or(u32::MAX)).is_ok())
        })
        .collect();
    sccs.sort_unstable();

    let mut finder = CycleFinder {
        adj: &adj,
        in_scope: vec![false; n],
        blocked: vec![false; n],
        blist: vec![Vec::new(); n],
        path: Vec::new(),
        cycles: Vec::new(),
        root: 0,
        ops: 0,
        truncated: false,
        deadline,
        cancel,
    };

    'outer: for scc in &sccs {
        for &v in scc {
            finder.in_scope[v] = true;
        }
        // Johnson: roots ascend; each search is confined to vertices >= root.
        for &root in scc {
            finder.root = root;
            for &v in scc {
                if v >= root {
                    finder.blocked[v] = false;
                    finder.blist[v].clear();
                }
            }
            finder.circuit(root);
            finder.in_scope[root] = false;
            if finder.truncated {
                break 'outer;
            }
        }
        for &v in scc {
            finder.in_scope[v] = false;
        }
    }

    let truncated = finder.truncated;
    let mut cycles: Vec<Vec<String>> = finder
        .cycles
        .iter()
        .map(|handles| {
            let ids: Vec<String> = handles
                .iter()
                .filter_map(|&v| graph.issue_id(NodeIndex::new(v)))
                .map(ToString::to_string)
                .collect();
            canonical_rotation(&ids)
        })
        .collect();
    cycles.sort_unstable();

    if truncated {
        debug!(found = cycles.len(), "cycle enumeration truncated");
        cycles.push(vec![
            CYCLE_TIMEOUT_SENTINEL.to_string(),
            "enumeration truncated".to_string(),
        ]);
    }
    cycles
}

// ---------------------------------------------------------------------------
// Blocked search
// ---------------------------------------------------------------------------

struct CycleFinder<'a> {
    adj: &'a [Vec<u32>],
    in_scope: Vec<bool>,
    blocked: Vec<bool>,
    blist: Vec<Vec<usize>>,
    path: Vec<usize>,
    cycles: Vec<Vec<usize>>,
    root: usize,
    ops: usize,
    truncated: bool,
    deadline: Deadline,
    cancel: &'a CancelToken,
}

impl CycleFinder<'_> {
    /// Johnson's `CIRCUIT` procedure rooted at `self.root`.
    fn circuit(&mut self, v: usize) -> bool {
        if self.checkpoint() {
            return false;
        }

        let mut found = false;
        self.blocked[v] = true;
        self.path.push(v);

        for i in 0..self.adj[v].len() {
            let w = self.adj[v][i] as usize;
            if w < self.root || !self.scope_or_root(w) {
                continue;
            }
            if w == self.root {
                self.cycles.push(self.path.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w) {
                found = true;
            }
            if self.truncated {
                break;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for i in 0..self.adj[v].len() {
                let w = self.adj[v][i] as usize;
                if w < self.root || !self.scope_or_root(w) {
                    continue;
                }
                if !self.blist[w].contains(&v) {
                    self.blist[w].push(v);
                }
            }
        }

        self.path.pop();
        found
    }

    fn scope_or_root(&self, v: usize) -> bool {
        self.in_scope[v] || v == self.root
    }

    fn unblock(&mut self, v: usize) {
        self.blocked[v] = false;
        let waiters = std::mem::take(&mut self.blist[v]);
        for w in waiters {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }

    /// Wall-clock / cancellation checkpoint. Returns `true` once the
    /// search should stop.
    fn checkpoint(&mut self) -> bool {
        if self.truncated {
            return true;
        }
        self.ops += 1;
        if self.ops % CHECKPOINT_INTERVAL == 0 && self.cancel.should_stop(&self.deadline) {
            self.truncated = true;
        }
        self.truncated
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::issue::{Dependency, Issue, Status};
    use proptest::prelude::*;

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

    fn run(graph: &DepGraph) -> Vec<Vec<String>> {
        enumerate_cycles(graph, Deadline::none(), &CancelToken::new())
    }

    #[test]
    fn dag_has_no_cycles() {
        let graph = build(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        assert!(run(&graph).is_empty());
    }

    #[test]
    fn triangle_yields_one_canonical_cycle() {
        let graph = build(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let cycles = run(&graph);
        assert_eq!(cycles, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn two_node_cycle() {
        let graph = build(&[("x", &["y"]), ("y", &["x"])]);
        let cycles = run(&graph);
        assert_eq!(cycles, vec![vec!["x", "y"]]);
    }

    #[test]
    fn self_loop_is_a_one_cycle() {
        let graph = build(&[("a", &["a"]), ("b", &[])]);
        let cycles = run(&graph);
        assert_eq!(cycles, vec![vec!["a"]]);
    }

    #[test]
    fn overlapping_cycles_both_found() {
        // a → b → a and a → c → a share the vertex a.
        let graph = build(&[("a", &["b", "c"]), ("b", &["a"]), ("c", &["a"])]);
        let cycles = run(&graph);
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec!["a".to_string(), "b".to_string()]));
        assert!(cycles.contains(&vec!["a".to_string(), "c".to_string()]));
    }

    #[test]
    fn figure_eight_finds_all_three() {
        // Two triangles sharing a: and the big hexagonal walk is not
        // simple, so exactly the two triangles appear.
        let graph = build(&[
            ("a", &["b", "d"]),
            ("b", &["c"]),
            ("c", &["a"]),
            ("d", &["e"]),
            ("e", &["a"]),
        ]);
        let cycles = run(&graph);
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec!["a".to_string(), "b".to_string(), "c".to_string()]));
        assert!(cycles.contains(&vec!["a".to_string(), "d".to_string(), "e".to_string()]));
    }

    #[test]
    fn zero_budget_emits_sentinel() {
        // A zero budget cannot finish a dense SCC that needs more than one
        // checkpoint interval of expansions.
        let mut specs: Vec<(String, Vec<String>)> = Vec::new();
        for i in 0..40 {
            let targets: Vec<String> = (0..40)
                .filter(|&j| j != i)
                .map(|j| format!("n{j:02}"))
                .collect();
            specs.push((format!("n{i:02}"), targets));
        }
        let issues: Vec<Issue> = specs
            .iter()
            .map(|(id, deps)| {
                let mut issue = Issue::new(id.clone(), Status::Open);
                issue.dependencies = deps
                    .iter()
                    .map(|d| Dependency::blocks(d.as_str()))
                    .collect();
                issue
            })
            .collect();
        let dense = DepGraph::from_issues(&issues).expect("build");

        let cycles = enumerate_cycles(
            &dense,
            Deadline::after(std::time::Duration::ZERO),
            &CancelToken::new(),
        );
        let last = cycles.last().expect("sentinel present");
        assert!(is_timeout_sentinel(last));
    }

    #[test]
    fn canonical_rotation_puts_smallest_first() {
        let cycle: Vec<String> = ["m", "b", "z"].iter().map(ToString::to_string).collect();
        assert_eq!(canonical_rotation(&cycle), vec!["b", "z", "m"]);
    }

    #[test]
    fn sentinel_detection() {
        let sentinel = vec![CYCLE_TIMEOUT_SENTINEL.to_string(), "enumeration truncated".into()];
        assert!(is_timeout_sentinel(&sentinel));
        assert!(!is_timeout_sentinel(&["a".to_string()]));
    }

    proptest! {
        #[test]
        fn canonical_key_is_rotation_invariant(len in 1_usize..8, rot in 0_usize..8) {
            let cycle: Vec<String> = (0..len).map(|i| format!("id{i:02}")).collect();
            let mut rotated = cycle.clone();
            rotated.rotate_left(rot % len);
            prop_assert_eq!(canonical_key(&cycle), canonical_key(&rotated));
        }
    }
}
