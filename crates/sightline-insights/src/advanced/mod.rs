//! Advanced insights: deterministic, capped, greedy combinatorial
//! selections over the graph, each tagged with a [`FeatureStatus`].

pub mod cover;
pub mod cyclebreak;
pub mod pending;
pub mod unlock;

use serde::{Deserialize, Serialize};

use sightline_core::analysis::stats::AnalysisStats;
use sightline_core::graph::build::DepGraph;
use sightline_core::model::issue::Issue;

/// Default cap K for every greedy selection.
pub const DEFAULT_K: usize = 5;

/// Availability of one advanced feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Available,
    Pending,
    Skipped,
    Error,
}

/// Status tag attached to every advanced-insight artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureStatus {
    /// Availability of the feature output.
    pub state: FeatureState,
    /// Number of items produced.
    pub count: usize,
    /// True when the K cap cut the selection short.
    pub capped: bool,
    /// Uncapped candidate count considered.
    pub candidates: usize,
    /// Reason string for pending/skipped/error states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FeatureStatus {
    /// An available status for `count` items out of `candidates`.
    #[must_use]
    pub const fn available(count: usize, capped: bool, candidates: usize) -> Self {
        Self {
            state: FeatureState::Available,
            count,
            capped,
            candidates,
            reason: None,
        }
    }

    /// A pending status with a version-tagged reason.
    #[must_use]
    pub fn pending(reason: impl Into<String>) -> Self {
        Self {
            state: FeatureState::Pending,
            count: 0,
            capped: false,
            candidates: 0,
            reason: Some(reason.into()),
        }
    }
}

/// Everything the advanced layer produces for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedInsights {
    /// Greedy top-K unlock selection.
    pub unlock: unlock::UnlockReport,
    /// Greedy vertex cover over blocking edges.
    pub coverage: cover::CoverReport,
    /// Cycle-break edge recommendations.
    pub cycle_breaks: cyclebreak::CycleBreakReport,
    /// K-shortest critical paths (not yet implemented).
    pub k_paths: FeatureStatus,
    /// Parallel-cut analysis (not yet implemented).
    pub parallel_cut: FeatureStatus,
    /// Parallel-gain analysis (not yet implemented).
    pub parallel_gain: FeatureStatus,
}

/// Run every advanced insight with the default cap.
#[must_use]
pub fn advanced_insights(
    graph: &DepGraph,
    issues: &[Issue],
    stats: &AnalysisStats,
) -> AdvancedInsights {
    AdvancedInsights {
        unlock: unlock::top_unlock_set(graph, issues, DEFAULT_K),
        coverage: cover::coverage_set(graph, issues, DEFAULT_K),
        cycle_breaks: cyclebreak::cycle_break_suggestions(graph, stats, DEFAULT_K),
        k_paths: pending::k_paths_stub(),
        parallel_cut: pending::parallel_cut_stub(),
        parallel_gain: pending::parallel_gain_stub(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
