//! Greedy top-K unlock selection (submodular maximization).
//!
//! # Overview
//!
//! "If we could close K issues, which K free the most work?" Each round
//! evaluates, for every remaining non-closed candidate `c`, the marginal
//! set `U(c | S) = unlocked(S ∪ {c}) \ unlocked(S)`: the workable issues
//! whose every workable blocker would be covered once `S ∪ {c}` were
//! closed. The candidate with the largest marginal set wins, ties going
//! to the lexicographically smallest ID. The unlocked-set formulation
//! makes the marginal gains non-increasing — the classic submodular
//! greedy guarantee, pinned by a test.
//!
//! Selection stops early when the best marginal gain reaches zero;
//! padding the list with no-op picks helps nobody.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sightline_core::graph::build::DepGraph;
use sightline_core::model::issue::{Issue, Status};

use crate::advanced::FeatureStatus;

/// One greedy pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPick {
    /// Selected issue ID.
    pub id: String,
    /// Number of issues newly unlocked by this pick.
    pub marginal_gain: usize,
    /// The newly unlocked issue IDs, sorted.
    pub unlocks: Vec<String>,
}

/// Result of the top-K unlock selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockReport {
    /// Feature status (always available; count = picks).
    pub status: FeatureStatus,
    /// Picks in selection order.
    pub picks: Vec<UnlockPick>,
    /// Sum of marginal gains.
    pub total_gain: usize,
}

/// Run the greedy selection with cap `k`.
#[must_use]
#[instrument(skip(graph, issues))]
pub fn top_unlock_set(graph: &DepGraph, issues: &[Issue], k: usize) -> UnlockReport {
    let statuses: HashMap<&str, Status> = issues
        .iter()
        .map(|issue| (issue.id.as_str(), issue.status))
        .collect();

    let mut candidates: Vec<&str> = issues
        .iter()
        .filter(|issue| !issue.status.is_closed())
        .map(|issue| issue.id.as_str())
        .collect();
    candidates.sort_unstable();
    let candidate_count = candidates.len();

    let mut selected: BTreeSet<&str> = BTreeSet::new();
    let mut baseline = unlocked_by(graph, issues, &statuses, &selected);
    let mut picks: Vec<UnlockPick> = Vec::new();

    while picks.len() < k {
        let mut best: Option<(&str, Vec<String>)> = None;
        for &candidate in &candidates {
            if selected.contains(candidate) {
                continue;
            }
            let mut trial = selected.clone();
            trial.insert(candidate);
            let unlocked = unlocked_by(graph, issues, &statuses, &trial);
            let marginal: Vec<String> = unlocked.difference(&baseline).cloned().collect();
            let better = match &best {
                None => true,
                Some((_, current)) => marginal.len() > current.len(),
            };
            if better {
                best = Some((candidate, marginal));
            }
        }

        match best {
            Some((id, marginal)) if !marginal.is_empty() => {
                selected.insert(id);
                baseline = unlocked_by(graph, issues, &statuses, &selected);
                picks.push(UnlockPick {
                    id: id.to_string(),
                    marginal_gain: marginal.len(),
                    unlocks: marginal,
                });
            }
            _ => break,
        }
    }

    let capped = picks.len() == k && has_positive_gain(graph, issues, &statuses, &selected, &candidates, &baseline);
    let total_gain = picks.iter().map(|p| p.marginal_gain).sum();

    UnlockReport {
        status: FeatureStatus::available(picks.len(), capped, candidate_count),
        picks,
        total_gain,
    }
}

/// The set of workable issues whose every workable blocker lies in
/// `closed_set` — what would become actionable if those were closed.
/// Members of the set itself are treated as closed and excluded.
fn unlocked_by(
    graph: &DepGraph,
    issues: &[Issue],
    statuses: &HashMap<&str, Status>,
    closed_set: &BTreeSet<&str>,
) -> BTreeSet<String> {
    issues
        .iter()
        .filter(|issue| issue.status.is_workable())
        .filter(|issue| !closed_set.contains(issue.id.as_str()))
        .filter(|issue| {
            graph.blockers_of(&issue.id).iter().all(|blocker| {
                closed_set.contains(blocker)
                    || statuses
                        .get(blocker)
                        .is_none_or(|status| !status.is_workable())
            })
        })
        .map(|issue| issue.id.clone())
        .collect()
}

/// Whether any unselected candidate still has a positive marginal gain.
fn has_positive_gain(
    graph: &DepGraph,
    issues: &[Issue],
    statuses: &HashMap<&str, Status>,
    selected: &BTreeSet<&str>,
    candidates: &[&str],
    baseline: &BTreeSet<String>,
) -> bool {
    candidates.iter().any(|&candidate| {
        if selected.contains(candidate) {
            return false;
        }
        let mut trial = selected.clone();
        trial.insert(candidate);
        unlocked_by(graph, issues, statuses, &trial)
            .difference(baseline)
            .next()
            .is_some()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
