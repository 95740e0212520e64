//! Declared-but-unimplemented advanced features.
//!
//! The contracts for these live in the viewer already; the algorithms do
//! not. Each stub reports `pending` with a version-tagged reason so
//! robot consumers can distinguish "not yet" from "not applicable".

use crate::advanced::FeatureStatus;

/// K-shortest critical paths.
#[must_use]
pub fn k_paths_stub() -> FeatureStatus {
    FeatureStatus::pending("k-shortest critical paths planned for v0.5")
}

/// Minimum parallel-cut analysis.
#[must_use]
pub fn parallel_cut_stub() -> FeatureStatus {
    FeatureStatus::pending("parallel-cut analysis planned for v0.5")
}

/// Parallelism-gain estimate.
#[must_use]
pub fn parallel_gain_stub() -> FeatureStatus {
    FeatureStatus::pending("parallel-gain estimate planned for v0.6")
}
