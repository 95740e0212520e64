//! Persistent baseline snapshots.
//!
//! # Overview
//!
//! A baseline captures the scalar graph stats, the top-10 rank lists,
//! and the canonical cycles of one analysis, persisted as a single JSON
//! object. The conventional location is `<project>/.bv/baseline.json`;
//! the path is always supplied by the caller — no directory scanning
//! happens here.
//!
//! Writes are atomic: the JSON goes to a temp file in the destination
//! directory, then a rename swaps it in. A crash never leaves a
//! half-written baseline.

pub mod drift;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sightline_core::analysis::stats::AnalysisStats;
use sightline_core::metrics::cycles::is_timeout_sentinel;
use sightline_core::model::issue::{Issue, Status};

use crate::aggregate::toplists::top_n;
use crate::error::BaselineError;

/// Conventional baseline location relative to the project root.
pub const BASELINE_RELATIVE_PATH: &str = ".bv/baseline.json";

/// Entries per top-metric list.
pub const BASELINE_TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Scalar stats tuple stored in a baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub open_count: usize,
    pub closed_count: usize,
    pub blocked_count: usize,
    pub cycle_count: usize,
    pub actionable_count: usize,
}

/// One `(id, value)` entry of a stored top-metric list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub id: String,
    pub value: f64,
}

/// The five stored top-10 lists, each sorted value-descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopMetrics {
    pub pagerank: Vec<MetricEntry>,
    pub betweenness: Vec<MetricEntry>,
    pub critical_path: Vec<MetricEntry>,
    pub hubs: Vec<MetricEntry>,
    pub authorities: Vec<MetricEntry>,
}

/// A persisted structural snapshot used for drift detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Capture timestamp.
    pub created_at: DateTime<Utc>,
    /// Optional commit SHA the baseline was taken at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    /// Optional free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Scalar graph stats.
    pub stats: BaselineStats,
    /// Top-10 rank lists.
    pub top_metrics: TopMetrics,
    /// Canonical cycles (timeout sentinels excluded).
    pub cycles: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Capture / persist
// ---------------------------------------------------------------------------

impl Baseline {
    /// Capture a baseline from a completed analysis.
    #[must_use]
    pub fn capture(
        issues: &[Issue],
        stats: &AnalysisStats,
        commit_sha: Option<String>,
        description: Option<String>,
    ) -> Self {
        let by_status = |status: Status| issues.iter().filter(|i| i.status == status).count();
        let cycles: Vec<Vec<String>> = stats
            .cycles
            .iter()
            .filter(|cycle| !is_timeout_sentinel(cycle))
            .cloned()
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let critical_path: sightline_core::metrics::MetricMap = stats
            .critical_path_score
            .iter()
            .map(|(id, &score)| (id.clone(), score as f64))
            .collect();

        let as_entries = |entries: Vec<crate::aggregate::toplists::RankEntry>| {
            entries
                .into_iter()
                .map(|e| MetricEntry {
                    id: e.id,
                    value: e.value,
                })
                .collect()
        };

        Self {
            created_at: Utc::now(),
            commit_sha,
            description,
            stats: BaselineStats {
                node_count: stats.node_count,
                edge_count: stats.edge_count,
                density: stats.density,
                open_count: by_status(Status::Open) + by_status(Status::InProgress),
                closed_count: by_status(Status::Closed),
                blocked_count: by_status(Status::Blocked),
                cycle_count: cycles.len(),
                actionable_count: stats.actionable.len(),
            },
            top_metrics: TopMetrics {
                pagerank: as_entries(top_n(&stats.pagerank, BASELINE_TOP_N)),
                betweenness: as_entries(top_n(&stats.betweenness, BASELINE_TOP_N)),
                critical_path: as_entries(top_n(&critical_path, BASELINE_TOP_N)),
                hubs: as_entries(top_n(&stats.hubs, BASELINE_TOP_N)),
                authorities: as_entries(top_n(&stats.authorities, BASELINE_TOP_N)),
            },
            cycles,
        }
    }

    /// Load and schema-validate a baseline.
    ///
    /// # Errors
    ///
    /// [`BaselineError::Missing`] when no file exists at `path`;
    /// [`BaselineError::Corrupt`] when it does not parse.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BaselineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BaselineError::Missing {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|err| BaselineError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|err| BaselineError::Corrupt {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Save atomically: write a temp file in the destination directory,
    /// then rename over the target. Parent directories are created.
    ///
    /// # Errors
    ///
    /// [`BaselineError::Io`] on any filesystem failure.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BaselineError> {
        let path = path.as_ref();
        let io_err = |err: std::io::Error| BaselineError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(self).map_err(|err| BaselineError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        std::fs::write(tmp.path(), json).map_err(io_err)?;
        tmp.persist(path).map_err(|err| BaselineError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        debug!("baseline saved");
        Ok(())
    }

    /// Canonical cycle keys of this baseline.
    #[must_use]
    pub fn cycle_keys(&self) -> std::collections::BTreeSet<String> {
        self.cycles
            .iter()
            .map(|cycle| sightline_core::metrics::cycles::canonical_key(cycle))
            .collect()
    }

    /// PageRank top list as an `id → value` map.
    #[must_use]
    pub fn pagerank_by_id(&self) -> HashMap<&str, f64> {
        self.top_metrics
            .pagerank
            .iter()
            .map(|entry| (entry.id.as_str(), entry.value))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::analysis::scheduler::{AnalyzeOptions, analyze};
    use sightline_core::model::issue::Dependency;

    fn issue(id: &str, status: Status, deps: &[&str]) -> Issue {
        let mut rec = Issue::new(id, status);
        rec.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
        rec
    }

    fn capture(input: &[Issue]) -> Baseline {
        let analysis = analyze(input, &AnalyzeOptions::default()).expect("analyze");
        analysis.wait_for_phase2();
        Baseline::capture(input, &analysis.stats(), None, None)
    }

    #[test]
    fn capture_counts_statuses_and_tops() {
        let input = vec![
            issue("a", Status::Open, &[]),
            issue("b", Status::InProgress, &["a"]),
            issue("c", Status::Blocked, &[]),
            issue("d", Status::Closed, &[]),
        ];
        let baseline = capture(&input);

        assert_eq!(baseline.stats.node_count, 4);
        assert_eq!(baseline.stats.open_count, 2);
        assert_eq!(baseline.stats.blocked_count, 1);
        assert_eq!(baseline.stats.closed_count, 1);
        assert_eq!(baseline.stats.cycle_count, 0);
        assert!(!baseline.top_metrics.pagerank.is_empty());
        // Value-descending.
        for pair in baseline.top_metrics.pagerank.windows(2) {
            assert!(pair[0].value >= pair[1].value);
        }
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(BASELINE_RELATIVE_PATH);

        let input = vec![issue("a", Status::Open, &[]), issue("b", Status::Open, &["a"])];
        let baseline = capture(&input);
        baseline.save(&path).expect("save");

        let loaded = Baseline::load(&path).expect("load");
        assert_eq!(loaded, baseline);
    }

    #[test]
    fn load_missing_is_a_user_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Baseline::load(dir.path().join("nope.json")).expect_err("missing");
        assert!(matches!(err, BaselineError::Missing { .. }));
    }

    #[test]
    fn load_corrupt_reports_reason() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "{\"created_at\": 42}").expect("write");

        let err = Baseline::load(&path).expect_err("corrupt");
        assert!(matches!(err, BaselineError::Corrupt { .. }));
    }

    #[test]
    fn save_overwrites_atomically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("baseline.json");

        let first = capture(&[issue("a", Status::Open, &[])]);
        first.save(&path).expect("save first");
        let second = capture(&[issue("a", Status::Open, &[]), issue("b", Status::Open, &[])]);
        second.save(&path).expect("save second");

        let loaded = Baseline::load(&path).expect("load");
        assert_eq!(loaded.stats.node_count, 2, "rename replaced the file");
        // No temp litter left behind.
        let litter = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "baseline.json")
            .count();
        assert_eq!(litter, 0);
    }

    #[test]
    fn sentinel_cycles_excluded_from_capture() {
        let input = vec![issue("a", Status::Open, &["b"]), issue("b", Status::Open, &["a"])];
        let analysis = analyze(&input, &AnalyzeOptions::default()).expect("analyze");
        analysis.wait_for_phase2();
        let mut stats = analysis.stats();
        stats.cycles.push(vec![
            "CYCLE_DETECTION_TIMEOUT".to_string(),
            "enumeration truncated".into(),
        ]);

        let baseline = Baseline::capture(&input, &stats, None, None);
        assert_eq!(baseline.cycles.len(), 1);
        assert_eq!(baseline.stats.cycle_count, 1);
    }
}
