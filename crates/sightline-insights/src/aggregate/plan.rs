//! Execution-plan tracks over the actionable set.
//!
//! # Overview
//!
//! An execution plan partitions the actionable issues into independent
//! "tracks" that separate agents can work without stepping on each
//! other. Two actionable roots share a track when their downstream
//! dependents — open or in-progress issues reached along reverse
//! `blocks` edges — overlap, i.e. when they belong to the same weakly
//! connected component of that induced subgraph.
//!
//! Within a track, items are ordered priority ascending (0 first), then
//! critical-path score descending, then ID. Each item carries the IDs it
//! directly unlocks: dependents whose only workable blocker is the item.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sightline_core::analysis::stats::AnalysisStats;
use sightline_core::graph::build::DepGraph;
use sightline_core::model::issue::{Issue, Status};

/// One actionable issue inside a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    /// Issue ID.
    pub id: String,
    /// Declared priority (0 highest).
    pub priority: u8,
    /// Longest dependent chain gated by this issue.
    pub critical_path_score: usize,
    /// Dependents whose only workable blocker is this issue, sorted.
    pub unlocks: Vec<String>,
}

/// An independent work track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Items in execution order.
    pub items: Vec<PlanItem>,
}

/// The full execution plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Tracks sorted by their first item's ID.
    pub tracks: Vec<Track>,
}

/// Build the execution plan from a completed analysis.
#[must_use]
#[instrument(skip(graph, issues, stats))]
pub fn execution_plan(graph: &DepGraph, issues: &[Issue], stats: &AnalysisStats) -> ExecutionPlan {
    let statuses: HashMap<&str, Status> = issues
        .iter()
        .map(|issue| (issue.id.as_str(), issue.status))
        .collect();
    let priorities: HashMap<&str, u8> = issues
        .iter()
        .map(|issue| (issue.id.as_str(), issue.priority))
        .collect();

    // Downstream closure of each actionable root through workable issues.
    let mut root_reach: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for root in &stats.actionable {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: Vec<String> = vec![root.clone()];
        while let Some(id) = queue.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            for dependent in graph.dependents_of(&id) {
                let workable = statuses
                    .get(dependent)
                    .is_some_and(|status| status.is_workable());
                if workable && !seen.contains(dependent) {
                    queue.push(dependent.to_string());
                }
            }
        }
        root_reach.insert(root.as_str(), seen);
    }

    // Union roots whose reach sets overlap into tracks.
    let roots: Vec<&str> = root_reach.keys().copied().collect();
    let mut parent: Vec<usize> = (0..roots.len()).collect();

    let mut owner: HashMap<&str, usize> = HashMap::new();
    for (i, root) in roots.iter().enumerate() {
        for id in &root_reach[root] {
            if let Some(&j) = owner.get(id.as_str()) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[a] = b;
                }
            }
        }
        for id in &root_reach[root] {
            owner.entry(id.as_str()).or_insert(i);
        }
    }

    let mut grouped: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (i, root) in roots.iter().enumerate() {
        grouped.entry(find(&mut parent, i)).or_default().push(root);
    }

    let mut tracks: Vec<Track> = grouped
        .into_values()
        .map(|members| {
            let mut items: Vec<PlanItem> = members
                .into_iter()
                .map(|id| PlanItem {
                    id: id.to_string(),
                    priority: priorities.get(id).copied().unwrap_or(2),
                    critical_path_score: stats.critical_path_score.get(id).copied().unwrap_or(0),
                    unlocks: direct_unlocks(graph, &statuses, id),
                })
                .collect();
            items.sort_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then_with(|| b.critical_path_score.cmp(&a.critical_path_score))
                    .then_with(|| a.id.cmp(&b.id))
            });
            Track { items }
        })
        .collect();
    tracks.sort_by(|a, b| {
        let a_id = a.items.first().map(|i| i.id.as_str()).unwrap_or_default();
        let b_id = b.items.first().map(|i| i.id.as_str()).unwrap_or_default();
        a_id.cmp(b_id)
    });

    ExecutionPlan { tracks }
}

/// Union-find root with path compression.
fn find(parent: &mut [usize], v: usize) -> usize {
    if parent[v] != v {
        let r = find(parent, parent[v]);
        parent[v] = r;
    }
    parent[v]
}

/// Dependents of `id` whose only workable blocker is `id`, sorted.
fn direct_unlocks(graph: &DepGraph, statuses: &HashMap<&str, Status>, id: &str) -> Vec<String> {
    let mut unlocks: Vec<String> = graph
        .dependents_of(id)
        .into_iter()
        .filter(|dependent| {
            statuses
                .get(dependent)
                .is_some_and(|status| status.is_workable())
        })
        .filter(|dependent| {
            graph.blockers_of(dependent).iter().all(|blocker| {
                *blocker == id
                    || statuses
                        .get(blocker)
                        .is_none_or(|status| !status.is_workable())
            })
        })
        .map(ToString::to_string)
        .collect();
    unlocks.sort_unstable();
    unlocks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::analysis::scheduler::{AnalyzeOptions, analyze};
    use sightline_core::model::issue::Dependency;

    fn issue(id: &str, status: Status, priority: u8, deps: &[&str]) -> Issue {
        let mut rec = Issue::new(id, status);
        rec.priority = priority;
        rec.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
        rec
    }

    fn plan_for(input: &[Issue]) -> ExecutionPlan {
        let analysis = analyze(input, &AnalyzeOptions::default()).expect("analyze");
        analysis.wait_for_phase2();
        execution_plan(analysis.graph(), input, &analysis.stats())
    }

    #[test]
    fn empty_input_yields_empty_plan() {
        assert!(plan_for(&[]).tracks.is_empty());
    }

    #[test]
    fn disjoint_chains_form_separate_tracks() {
        let input = vec![
            issue("a", Status::Open, 2, &[]),
            issue("b", Status::Open, 2, &["a"]),
            issue("x", Status::Open, 2, &[]),
            issue("y", Status::Open, 2, &["x"]),
        ];
        let plan = plan_for(&input);
        assert_eq!(plan.tracks.len(), 2);
        assert_eq!(plan.tracks[0].items[0].id, "a");
        assert_eq!(plan.tracks[1].items[0].id, "x");
    }

    #[test]
    fn shared_dependent_merges_tracks() {
        // c depends on both a and b: one track.
        let input = vec![
            issue("a", Status::Open, 2, &[]),
            issue("b", Status::Open, 2, &[]),
            issue("c", Status::Open, 2, &["a", "b"]),
        ];
        let plan = plan_for(&input);
        assert_eq!(plan.tracks.len(), 1);
        let ids: Vec<&str> = plan.tracks[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"], "both roots in the merged track");
    }

    #[test]
    fn items_sorted_by_priority_then_chain_length() {
        let input = vec![
            issue("low", Status::Open, 3, &[]),
            issue("urgent", Status::Open, 0, &[]),
            issue("gate", Status::Open, 2, &[]),
            issue("w1", Status::Open, 2, &["gate", "urgent", "low"]),
            issue("w2", Status::Open, 2, &["gate"]),
            issue("w3", Status::Open, 2, &["w2"]),
        ];
        let plan = plan_for(&input);
        assert_eq!(plan.tracks.len(), 1);
        let ids: Vec<&str> = plan.tracks[0].items.iter().map(|i| i.id.as_str()).collect();
        // urgent (P0) first; then gate (P2, chain length 2) before low (P2, 1).
        assert_eq!(ids, vec!["urgent", "gate", "low"]);
    }

    #[test]
    fn unlocks_lists_only_sole_blocker_dependents() {
        let input = vec![
            issue("a", Status::Open, 2, &[]),
            issue("b", Status::Open, 2, &[]),
            issue("only_a", Status::Open, 2, &["a"]),
            issue("both", Status::Open, 2, &["a", "b"]),
        ];
        let plan = plan_for(&input);
        let track = &plan.tracks[0];
        let a_item = track.items.iter().find(|i| i.id == "a").expect("a");
        assert_eq!(a_item.unlocks, vec!["only_a"], "both still waits on b");
    }

    #[test]
    fn closed_dependents_are_not_planned() {
        let input = vec![
            issue("a", Status::Open, 2, &[]),
            issue("done", Status::Closed, 2, &["a"]),
        ];
        let plan = plan_for(&input);
        let a_item = &plan.tracks[0].items[0];
        assert!(a_item.unlocks.is_empty(), "closed dependents are not unlocks");
    }
}
