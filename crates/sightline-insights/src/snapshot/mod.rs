//! Snapshot diffing: pure functions over two issue sets.
//!
//! # Overview
//!
//! A snapshot is the raw issue collection at one revision. Diffing two
//! snapshots classifies issues (new / closed / reopened / removed /
//! modified with field-level changes), compares canonical cycle keys,
//! and produces scalar metric deltas plus a categorical health trend.
//!
//! Diff is pure: equal inputs produce empty deltas (idempotence is a
//! test), and only the new/removed partition is symmetric by design.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sightline_core::graph::build::DepGraph;
use sightline_core::metrics::cycles::{canonical_key, enumerate_cycles, is_timeout_sentinel};
use sightline_core::metrics::{CancelToken, Deadline};
use sightline_core::model::issue::{Dependency, Issue, Status};

/// Budget for the cycle scan a diff performs on each side.
const DIFF_CYCLE_BUDGET: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One captured issue set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The issues at capture time.
    pub issues: Vec<Issue>,
    /// Capture timestamp.
    pub taken_at: DateTime<Utc>,
    /// Optional revision label (commit SHA, tag, ...).
    #[serde(default)]
    pub revision: Option<String>,
}

impl Snapshot {
    /// Capture a snapshot of `issues` now.
    #[must_use]
    pub fn capture(issues: Vec<Issue>, revision: Option<String>) -> Self {
        Self {
            issues,
            taken_at: Utc::now(),
            revision,
        }
    }
}

// ---------------------------------------------------------------------------
// Diff result types
// ---------------------------------------------------------------------------

/// One field-level change on a modified issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldChange {
    Status {
        from: Status,
        to: Status,
    },
    Priority {
        from: u8,
        to: u8,
    },
    Title {
        from: String,
        to: String,
    },
    /// Label set difference.
    Labels {
        added: Vec<String>,
        removed: Vec<String>,
    },
    /// Dependency set difference.
    Dependencies {
        added: Vec<Dependency>,
        removed: Vec<Dependency>,
    },
}

/// An issue present in both snapshots with at least one change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedIssue {
    /// Issue ID.
    pub id: String,
    /// Field-level changes.
    pub changes: Vec<FieldChange>,
}

/// Scalar count deltas (`to` minus `from`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub total: i64,
    pub open: i64,
    pub blocked: i64,
    pub cycles: i64,
}

/// Direction of overall project health between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTrend {
    Improving,
    Degrading,
    Stable,
}

/// Counts plus the health trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub new_count: usize,
    pub closed_count: usize,
    pub reopened_count: usize,
    pub removed_count: usize,
    pub modified_count: usize,
    pub cycles_introduced: usize,
    pub cycles_resolved: usize,
    pub health_trend: HealthTrend,
}

/// Structured result of diffing two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// IDs present in `to` and absent in `from`, sorted.
    pub new_issues: Vec<String>,
    /// IDs not closed in `from` and closed in `to`, sorted.
    pub closed_issues: Vec<String>,
    /// IDs closed in `from` and not closed in `to`, sorted.
    pub reopened_issues: Vec<String>,
    /// IDs present in `from` and absent in `to`, sorted.
    pub removed_issues: Vec<String>,
    /// Issues in both with field-level changes, sorted by ID.
    pub modified_issues: Vec<ModifiedIssue>,
    /// Canonical keys of cycles present only in `to`, sorted.
    pub new_cycles: Vec<String>,
    /// Canonical keys of cycles present only in `from`, sorted.
    pub resolved_cycles: Vec<String>,
    /// Scalar deltas.
    pub metric_deltas: MetricDeltas,
    /// Counts and trend.
    pub summary: DiffSummary,
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Diff two snapshots.
#[must_use]
#[instrument(skip(from, to), fields(from = from.issues.len(), to = to.issues.len()))]
#[allow(clippy::too_many_lines)]
pub fn diff(from: &Snapshot, to: &Snapshot) -> SnapshotDiff {
    let from_map: BTreeMap<&str, &Issue> = from
        .issues
        .iter()
        .map(|issue| (issue.id.as_str(), issue))
        .collect();
    let to_map: BTreeMap<&str, &Issue> = to
        .issues
        .iter()
        .map(|issue| (issue.id.as_str(), issue))
        .collect();

    let new_issues: Vec<String> = to_map
        .keys()
        .filter(|id| !from_map.contains_key(*id))
        .map(ToString::to_string)
        .collect();
    let removed_issues: Vec<String> = from_map
        .keys()
        .filter(|id| !to_map.contains_key(*id))
        .map(ToString::to_string)
        .collect();

    let mut closed_issues = Vec::new();
    let mut reopened_issues = Vec::new();
    let mut modified_issues = Vec::new();

    for (id, before) in &from_map {
        let Some(after) = to_map.get(id) else {
            continue;
        };
        if !before.status.is_closed() && after.status.is_closed() {
            closed_issues.push((*id).to_string());
        }
        if before.status.is_closed() && !after.status.is_closed() {
            reopened_issues.push((*id).to_string());
        }
        let changes = field_changes(before, after);
        if !changes.is_empty() {
            modified_issues.push(ModifiedIssue {
                id: (*id).to_string(),
                changes,
            });
        }
    }

    let from_cycles = cycle_keys(&from.issues);
    let to_cycles = cycle_keys(&to.issues);
    let new_cycles: Vec<String> = to_cycles.difference(&from_cycles).cloned().collect();
    let resolved_cycles: Vec<String> = from_cycles.difference(&to_cycles).cloned().collect();

    let count =
        |issues: &[Issue], pred: fn(&Issue) -> bool| issues.iter().filter(|i| pred(i)).count();
    let open = |issue: &Issue| issue.status.is_workable();
    let blocked = |issue: &Issue| issue.status == Status::Blocked;

    #[allow(clippy::cast_possible_wrap)]
    let metric_deltas = MetricDeltas {
        total: to.issues.len() as i64 - from.issues.len() as i64,
        open: count(&to.issues, open) as i64 - count(&from.issues, open) as i64,
        blocked: count(&to.issues, blocked) as i64 - count(&from.issues, blocked) as i64,
        cycles: to_cycles.len() as i64 - from_cycles.len() as i64,
    };

    let summary = summarize(
        &new_issues,
        &closed_issues,
        &reopened_issues,
        &removed_issues,
        &modified_issues,
        &new_cycles,
        &resolved_cycles,
    );

    SnapshotDiff {
        new_issues,
        closed_issues,
        reopened_issues,
        removed_issues,
        modified_issues,
        new_cycles,
        resolved_cycles,
        metric_deltas,
        summary,
    }
}

/// Weight of a cycle change relative to an issue change in the health
/// score.
const CYCLE_WEIGHT: i64 = 2;

#[allow(clippy::cast_possible_wrap)]
fn summarize(
    new_issues: &[String],
    closed_issues: &[String],
    reopened_issues: &[String],
    removed_issues: &[String],
    modified_issues: &[ModifiedIssue],
    new_cycles: &[String],
    resolved_cycles: &[String],
) -> DiffSummary {
    let score = closed_issues.len() as i64 - new_issues.len() as i64
        + CYCLE_WEIGHT * (resolved_cycles.len() as i64 - new_cycles.len() as i64);
    let health_trend = if score >= 1 {
        HealthTrend::Improving
    } else if score <= -1 {
        HealthTrend::Degrading
    } else {
        HealthTrend::Stable
    };

    DiffSummary {
        new_count: new_issues.len(),
        closed_count: closed_issues.len(),
        reopened_count: reopened_issues.len(),
        removed_count: removed_issues.len(),
        modified_count: modified_issues.len(),
        cycles_introduced: new_cycles.len(),
        cycles_resolved: resolved_cycles.len(),
        health_trend,
    }
}

/// Field-level changes between two versions of one issue.
fn field_changes(before: &Issue, after: &Issue) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if before.status != after.status {
        changes.push(FieldChange::Status {
            from: before.status,
            to: after.status,
        });
    }
    if before.priority != after.priority {
        changes.push(FieldChange::Priority {
            from: before.priority,
            to: after.priority,
        });
    }
    if before.title != after.title {
        changes.push(FieldChange::Title {
            from: before.title.clone(),
            to: after.title.clone(),
        });
    }

    let labels_added: Vec<String> = after.labels.difference(&before.labels).cloned().collect();
    let labels_removed: Vec<String> = before.labels.difference(&after.labels).cloned().collect();
    if !labels_added.is_empty() || !labels_removed.is_empty() {
        changes.push(FieldChange::Labels {
            added: labels_added,
            removed: labels_removed,
        });
    }

    let before_deps: BTreeSet<&Dependency> = before.dependencies.iter().collect();
    let after_deps: BTreeSet<&Dependency> = after.dependencies.iter().collect();
    let deps_added: Vec<Dependency> = after_deps
        .difference(&before_deps)
        .map(|d| (*d).clone())
        .collect();
    let deps_removed: Vec<Dependency> = before_deps
        .difference(&after_deps)
        .map(|d| (*d).clone())
        .collect();
    if !deps_added.is_empty() || !deps_removed.is_empty() {
        changes.push(FieldChange::Dependencies {
            added: deps_added,
            removed: deps_removed,
        });
    }

    changes
}

/// Canonical cycle keys of an issue set. A malformed set (which cannot
/// happen for snapshots that already analyzed cleanly) contributes none.
fn cycle_keys(issues: &[Issue]) -> BTreeSet<String> {
    let Ok(graph) = DepGraph::from_issues(issues) else {
        return BTreeSet::new();
    };
    enumerate_cycles(
        &graph,
        Deadline::after(DIFF_CYCLE_BUDGET),
        &CancelToken::new(),
    )
    .iter()
    .filter(|cycle| !is_timeout_sentinel(cycle))
    .map(|cycle| canonical_key(cycle))
    .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
