//! Priority-vs-impact recommendations.
//!
//! # Overview
//!
//! For every workable issue, an impact score blends PageRank and
//! critical-path score (both min-max normalized within the workable set,
//! weighted 0.6/0.4). The declared priority maps onto the same [0, 1]
//! scale through a linear calibration curve; when the two disagree by
//! more than the threshold, a recommendation is emitted with a direction,
//! a confidence proportional to the disagreement, and a templated
//! reasoning string.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use sightline_core::analysis::stats::AnalysisStats;
use sightline_core::model::issue::{Issue, PRIORITY_LOWEST};

/// Weight of PageRank in the impact blend.
const PAGERANK_WEIGHT: f64 = 0.6;
/// Weight of critical-path score in the impact blend.
const CRITICAL_PATH_WEIGHT: f64 = 0.4;
/// Minimum |impact − expected| that produces a recommendation.
const DISAGREEMENT_THRESHOLD: f64 = 0.25;
/// Disagreement at which confidence saturates at 1.
const CONFIDENCE_SCALE: f64 = 0.5;

/// Which way the declared priority should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityDirection {
    /// The issue is more impactful than its priority suggests.
    Increase,
    /// The issue is less impactful than its priority suggests.
    Decrease,
}

/// One priority recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRecommendation {
    /// Issue ID.
    pub id: String,
    /// Current declared priority.
    pub current_priority: u8,
    /// Suggested direction of change.
    pub direction: PriorityDirection,
    /// Scaled absolute disagreement, clamped to `[0, 1]`.
    pub confidence: f64,
    /// Blended impact score in `[0, 1]`.
    pub impact: f64,
    /// Templated natural-language justification.
    pub reasoning: String,
}

/// Produce recommendations sorted by confidence descending, then impact
/// descending, then ID.
#[must_use]
#[instrument(skip(issues, stats))]
pub fn priority_recommendations(
    issues: &[Issue],
    stats: &AnalysisStats,
) -> Vec<PriorityRecommendation> {
    let workable: Vec<&Issue> = issues
        .iter()
        .filter(|issue| issue.status.is_workable())
        .collect();
    if workable.is_empty() {
        return Vec::new();
    }

    let pagerank_norm = min_max(&workable, |issue| {
        stats.pagerank.get(&issue.id).copied().unwrap_or(0.0)
    });
    #[allow(clippy::cast_precision_loss)]
    let cps_norm = min_max(&workable, |issue| {
        stats
            .critical_path_score
            .get(&issue.id)
            .copied()
            .unwrap_or(0) as f64
    });

    let mut recommendations: Vec<PriorityRecommendation> = workable
        .iter()
        .enumerate()
        .filter_map(|(i, issue)| {
            let impact = PAGERANK_WEIGHT * pagerank_norm[i] + CRITICAL_PATH_WEIGHT * cps_norm[i];
            let expected = expected_impact(issue.priority);
            let disagreement = impact - expected;
            if disagreement.abs() < DISAGREEMENT_THRESHOLD {
                return None;
            }

            let direction = if disagreement > 0.0 {
                PriorityDirection::Increase
            } else {
                PriorityDirection::Decrease
            };
            let confidence = (disagreement.abs() / CONFIDENCE_SCALE).min(1.0);
            let reasoning = reasoning_for(issue, stats, impact, direction);

            Some(PriorityRecommendation {
                id: issue.id.clone(),
                current_priority: issue.priority,
                direction,
                confidence,
                impact,
                reasoning,
            })
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.impact
                    .partial_cmp(&a.impact)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    recommendations
}

/// Calibration curve: priority 0 expects full impact, priority 4 none.
fn expected_impact(priority: u8) -> f64 {
    f64::from(PRIORITY_LOWEST.saturating_sub(priority)) / f64::from(PRIORITY_LOWEST)
}

/// Min-max normalize `value` over the workable set. A degenerate range
/// (all equal) normalizes to the neutral 0.5 so no disagreement is
/// invented where the metric carries no signal.
fn min_max(workable: &[&Issue], value: impl Fn(&Issue) -> f64) -> Vec<f64> {
    let raw: Vec<f64> = workable.iter().map(|issue| value(issue)).collect();
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min <= f64::EPSILON {
        return vec![0.5; raw.len()];
    }
    raw.iter().map(|v| (v - min) / (max - min)).collect()
}

fn reasoning_for(
    issue: &Issue,
    stats: &AnalysisStats,
    impact: f64,
    direction: PriorityDirection,
) -> String {
    let chain = stats
        .critical_path_score
        .get(&issue.id)
        .copied()
        .unwrap_or(0);
    let rank = stats.pagerank_rank.get(&issue.id).copied();
    let rank_clause = rank.map_or_else(String::new, |r| format!(" and ranks #{r} by pagerank"));
    match direction {
        PriorityDirection::Increase => format!(
            "{} gates a chain of {chain} downstream issue(s){rank_clause}, but is only priority P{}; impact score {impact:.2} suggests raising it",
            issue.id, issue.priority
        ),
        PriorityDirection::Decrease => format!(
            "{} gates {chain} downstream issue(s){rank_clause} yet holds priority P{}; impact score {impact:.2} suggests lowering it",
            issue.id, issue.priority
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::analysis::scheduler::{AnalyzeOptions, analyze};
    use sightline_core::model::issue::{Dependency, Status};

    fn issue(id: &str, priority: u8, deps: &[&str]) -> Issue {
        let mut rec = Issue::new(id, Status::Open);
        rec.priority = priority;
        rec.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
        rec
    }

    fn recommend(input: &[Issue]) -> Vec<PriorityRecommendation> {
        let analysis = analyze(input, &AnalyzeOptions::default()).expect("analyze");
        analysis.wait_for_phase2();
        priority_recommendations(input, &analysis.stats())
    }

    #[test]
    fn empty_input_no_recommendations() {
        assert!(recommend(&[]).is_empty());
    }

    #[test]
    fn high_impact_low_priority_suggests_increase() {
        // gate blocks a long chain but is declared P4.
        let input = vec![
            issue("gate", 4, &[]),
            issue("w1", 2, &["gate"]),
            issue("w2", 2, &["w1"]),
            issue("w3", 2, &["w2"]),
            issue("w4", 2, &["w3"]),
        ];
        let recs = recommend(&input);
        let gate = recs.iter().find(|r| r.id == "gate").expect("gate rec");
        assert_eq!(gate.direction, PriorityDirection::Increase);
        assert!(gate.confidence > 0.0 && gate.confidence <= 1.0);
        assert!(gate.reasoning.contains("gate"));
        assert!(gate.reasoning.contains("P4"));
    }

    #[test]
    fn low_impact_top_priority_suggests_decrease() {
        // leaf gates nothing but is declared P0.
        let input = vec![
            issue("gate", 2, &[]),
            issue("w1", 2, &["gate"]),
            issue("w2", 2, &["w1"]),
            issue("leaf", 0, &["w2"]),
        ];
        let recs = recommend(&input);
        let leaf = recs.iter().find(|r| r.id == "leaf").expect("leaf rec");
        assert_eq!(leaf.direction, PriorityDirection::Decrease);
    }

    #[test]
    fn aligned_priorities_stay_quiet() {
        // Uniform graph, uniform mid priorities: no disagreement.
        let input = vec![issue("a", 2, &[]), issue("b", 2, &[]), issue("c", 2, &[])];
        assert!(recommend(&input).is_empty());
    }

    #[test]
    fn sorted_by_confidence_then_id() {
        let input = vec![
            issue("gate", 4, &[]),
            issue("w1", 2, &["gate"]),
            issue("w2", 2, &["w1"]),
            issue("w3", 2, &["w2"]),
            issue("idle_a", 0, &["w3"]),
            issue("idle_b", 0, &["w3"]),
        ];
        let recs = recommend(&input);
        assert!(!recs.is_empty());
        for pair in recs.windows(2) {
            assert!(
                pair[0].confidence >= pair[1].confidence,
                "confidence must be non-increasing"
            );
            if (pair[0].confidence - pair[1].confidence).abs() < f64::EPSILON
                && (pair[0].impact - pair[1].impact).abs() < f64::EPSILON
            {
                assert!(pair[0].id < pair[1].id, "ties break by id");
            }
        }
    }

    #[test]
    fn closed_issues_are_ignored() {
        let mut done = issue("done", 4, &[]);
        done.status = Status::Closed;
        let input = vec![
            done,
            issue("gate", 4, &[]),
            issue("w1", 2, &["gate"]),
            issue("w2", 2, &["w1"]),
            issue("w3", 2, &["w2"]),
        ];
        let recs = recommend(&input);
        assert!(recs.iter().all(|r| r.id != "done"));
    }
}
