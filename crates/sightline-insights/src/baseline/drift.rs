//! Drift detection between a stored baseline and the current graph.
//!
//! # Overview
//!
//! The calculator compares two [`Baseline`]-shaped summaries and emits
//! an ordered alert stream. Checks run in a fixed order: new cycles
//! (critical), density growth, graph-size change, blocked increase,
//! actionable change, and PageRank top-N drift. Thresholds come from an
//! optional TOML config; an unreadable or invalid file logs a warning
//! and falls back to defaults.
//!
//! The report maps to a process exit code: 1 when any critical alert
//! fired, 2 when only warnings did, 0 otherwise.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::baseline::Baseline;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Drift thresholds, loadable from TOML. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Density growth (percent) that triggers a warning.
    #[serde(default = "default_density_warning_pct")]
    pub density_warning_pct: f64,
    /// Smaller density growth (percent) that triggers an info alert.
    #[serde(default = "default_density_info_pct")]
    pub density_info_pct: f64,
    /// Node-count change (percent, either direction) worth an info alert.
    #[serde(default = "default_node_growth_info_pct")]
    pub node_growth_info_pct: f64,
    /// Edge-count change (percent, either direction) worth an info alert.
    #[serde(default = "default_edge_growth_info_pct")]
    pub edge_growth_info_pct: f64,
    /// Absolute blocked-count increase that triggers a warning.
    #[serde(default = "default_blocked_increase_threshold")]
    pub blocked_increase_threshold: i64,
    /// Actionable decrease (percent) that triggers a warning.
    #[serde(default = "default_actionable_decrease_warning_pct")]
    pub actionable_decrease_warning_pct: f64,
    /// Actionable swing (percent, either direction) worth an info alert.
    #[serde(default = "default_actionable_increase_info_pct")]
    pub actionable_increase_info_pct: f64,
    /// Per-ID PageRank shift (percent) counted as top-N drift.
    #[serde(default = "default_pagerank_change_warning_pct")]
    pub pagerank_change_warning_pct: f64,
}

const fn default_density_warning_pct() -> f64 {
    50.0
}
const fn default_density_info_pct() -> f64 {
    20.0
}
const fn default_node_growth_info_pct() -> f64 {
    25.0
}
const fn default_edge_growth_info_pct() -> f64 {
    25.0
}
const fn default_blocked_increase_threshold() -> i64 {
    5
}
const fn default_actionable_decrease_warning_pct() -> f64 {
    30.0
}
const fn default_actionable_increase_info_pct() -> f64 {
    20.0
}
const fn default_pagerank_change_warning_pct() -> f64 {
    25.0
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            density_warning_pct: default_density_warning_pct(),
            density_info_pct: default_density_info_pct(),
            node_growth_info_pct: default_node_growth_info_pct(),
            edge_growth_info_pct: default_edge_growth_info_pct(),
            blocked_increase_threshold: default_blocked_increase_threshold(),
            actionable_decrease_warning_pct: default_actionable_decrease_warning_pct(),
            actionable_increase_info_pct: default_actionable_increase_info_pct(),
            pagerank_change_warning_pct: default_pagerank_change_warning_pct(),
        }
    }
}

impl DriftConfig {
    /// Load thresholds from a TOML file. A missing, unreadable, or
    /// invalid file is soft: log and fall back to defaults.
    #[must_use]
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "invalid drift config, using defaults");
                Self::default()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Category of one drift alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    NewCycle,
    DensityGrowth,
    GraphSize,
    BlockedIncrease,
    ActionableChange,
    PagerankDrift,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// One detected deviation between baseline and current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAlert {
    /// Alert category.
    pub kind: AlertKind,
    /// Severity class.
    pub severity: Severity,
    /// Human message.
    pub message: String,
    /// Metric value in the baseline.
    pub before: f64,
    /// Metric value now.
    pub after: f64,
    /// `after - before`.
    pub delta: f64,
    /// Optional enumerated details.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

/// The ordered alert stream plus severity tallies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Alerts in check order.
    pub alerts: Vec<DriftAlert>,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

impl DriftReport {
    /// Process exit code: 1 for any critical, 2 for any warning, else 0.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.critical_count > 0 {
            1
        } else if self.warning_count > 0 {
            2
        } else {
            0
        }
    }

    fn push(&mut self, alert: DriftAlert) {
        match alert.severity {
            Severity::Critical => self.critical_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Info => self.info_count += 1,
        }
        self.alerts.push(alert);
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Percent change from `before` to `after`; a change from zero counts
/// as a full 100% swing so thresholds still fire.
fn pct_change(before: f64, after: f64) -> f64 {
    if before.abs() <= f64::EPSILON {
        if after.abs() <= f64::EPSILON { 0.0 } else { 100.0 }
    } else {
        (after - before) / before * 100.0
    }
}

/// Compare `current` against `baseline` under `config`.
#[must_use]
#[instrument(skip(baseline, current, config))]
#[allow(clippy::cast_precision_loss, clippy::too_many_lines)]
pub fn compute_drift(
    baseline: &Baseline,
    current: &Baseline,
    config: &DriftConfig,
) -> DriftReport {
    let mut report = DriftReport::default();
    let base = &baseline.stats;
    let cur = &current.stats;

    // 1. New cycles: critical, one alert per cycle.
    let base_keys = baseline.cycle_keys();
    let cur_keys = current.cycle_keys();
    for key in cur_keys.difference(&base_keys) {
        report.push(DriftAlert {
            kind: AlertKind::NewCycle,
            severity: Severity::Critical,
            message: format!("new dependency cycle: {key}"),
            before: base.cycle_count as f64,
            after: cur.cycle_count as f64,
            delta: cur.cycle_count as f64 - base.cycle_count as f64,
            details: vec![key.clone()],
        });
    }

    // 2. Density growth.
    let density_pct = pct_change(base.density, cur.density);
    if density_pct >= config.density_warning_pct {
        report.push(density_alert(base.density, cur.density, density_pct, Severity::Warning));
    } else if density_pct >= config.density_info_pct {
        report.push(density_alert(base.density, cur.density, density_pct, Severity::Info));
    }

    // 3. Graph-size change, per dimension.
    let node_pct = pct_change(base.node_count as f64, cur.node_count as f64);
    if node_pct.abs() >= config.node_growth_info_pct {
        report.push(DriftAlert {
            kind: AlertKind::GraphSize,
            severity: Severity::Info,
            message: format!(
                "node count changed {node_pct:+.1}% ({} -> {})",
                base.node_count, cur.node_count
            ),
            before: base.node_count as f64,
            after: cur.node_count as f64,
            delta: cur.node_count as f64 - base.node_count as f64,
            details: Vec::new(),
        });
    }
    let edge_pct = pct_change(base.edge_count as f64, cur.edge_count as f64);
    if edge_pct.abs() >= config.edge_growth_info_pct {
        report.push(DriftAlert {
            kind: AlertKind::GraphSize,
            severity: Severity::Info,
            message: format!(
                "edge count changed {edge_pct:+.1}% ({} -> {})",
                base.edge_count, cur.edge_count
            ),
            before: base.edge_count as f64,
            after: cur.edge_count as f64,
            delta: cur.edge_count as f64 - base.edge_count as f64,
            details: Vec::new(),
        });
    }

    // 4. Blocked increase (absolute).
    let blocked_delta = cur.blocked_count as i64 - base.blocked_count as i64;
    if blocked_delta >= config.blocked_increase_threshold {
        report.push(DriftAlert {
            kind: AlertKind::BlockedIncrease,
            severity: Severity::Warning,
            message: format!(
                "blocked issues up by {blocked_delta} ({} -> {})",
                base.blocked_count, cur.blocked_count
            ),
            before: base.blocked_count as f64,
            after: cur.blocked_count as f64,
            delta: blocked_delta as f64,
            details: Vec::new(),
        });
    }

    // 5. Actionable change: large decrease warns, any material swing informs.
    let actionable_pct = pct_change(base.actionable_count as f64, cur.actionable_count as f64);
    if actionable_pct <= -config.actionable_decrease_warning_pct {
        report.push(actionable_alert(base, cur, actionable_pct, Severity::Warning));
    } else if actionable_pct.abs() >= config.actionable_increase_info_pct {
        report.push(actionable_alert(base, cur, actionable_pct, Severity::Info));
    }

    // 6. PageRank top-N drift: one warning enumerating every change.
    let mut changes: Vec<String> = Vec::new();
    let cur_ranks = current.pagerank_by_id();
    let base_ranks = baseline.pagerank_by_id();
    for entry in &baseline.top_metrics.pagerank {
        match cur_ranks.get(entry.id.as_str()) {
            None => changes.push(format!("{} dropped from the top {}", entry.id, super::BASELINE_TOP_N)),
            Some(&value) => {
                let shift = pct_change(entry.value, value);
                if shift.abs() >= config.pagerank_change_warning_pct {
                    changes.push(format!("{} shifted {shift:+.1}%", entry.id));
                }
            }
        }
    }
    for entry in &current.top_metrics.pagerank {
        if !base_ranks.contains_key(entry.id.as_str()) {
            changes.push(format!("{} entered the top {}", entry.id, super::BASELINE_TOP_N));
        }
    }
    if !changes.is_empty() {
        report.push(DriftAlert {
            kind: AlertKind::PagerankDrift,
            severity: Severity::Warning,
            message: format!("pagerank top-{} drifted ({} change(s))", super::BASELINE_TOP_N, changes.len()),
            before: base_ranks.len() as f64,
            after: cur_ranks.len() as f64,
            delta: changes.len() as f64,
            details: changes,
        });
    }

    report
}

fn density_alert(before: f64, after: f64, pct: f64, severity: Severity) -> DriftAlert {
    DriftAlert {
        kind: AlertKind::DensityGrowth,
        severity,
        message: format!("graph density grew {pct:+.1}% ({before:.4} -> {after:.4})"),
        before,
        after,
        delta: after - before,
        details: Vec::new(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn actionable_alert(
    base: &super::BaselineStats,
    cur: &super::BaselineStats,
    pct: f64,
    severity: Severity,
) -> DriftAlert {
    DriftAlert {
        kind: AlertKind::ActionableChange,
        severity,
        message: format!(
            "actionable issues changed {pct:+.1}% ({} -> {})",
            base.actionable_count, cur.actionable_count
        ),
        before: base.actionable_count as f64,
        after: cur.actionable_count as f64,
        delta: cur.actionable_count as f64 - base.actionable_count as f64,
        details: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
