//! Top-N rank lists for the viewer's leaderboards.

use serde::{Deserialize, Serialize};

use sightline_core::analysis::stats::AnalysisStats;
use sightline_core::metrics::MetricMap;

/// Default list length for the viewer.
pub const TOP_LIST_LEN: usize = 50;

/// One `(id, value)` rank entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Issue ID.
    pub id: String,
    /// Metric value.
    pub value: f64,
}

/// The five leaderboards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopLists {
    pub pagerank: Vec<RankEntry>,
    pub betweenness: Vec<RankEntry>,
    pub critical_path: Vec<RankEntry>,
    pub hubs: Vec<RankEntry>,
    pub authorities: Vec<RankEntry>,
}

/// Extract the top `n` entries of a metric map, value descending with a
/// stable ID tie-break.
#[must_use]
pub fn top_n(map: &MetricMap, n: usize) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = map
        .iter()
        .map(|(id, &value)| RankEntry {
            id: id.clone(),
            value,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(n);
    entries
}

/// Build all five top-50 lists from a completed analysis.
#[must_use]
pub fn top_lists(stats: &AnalysisStats) -> TopLists {
    #[allow(clippy::cast_precision_loss)]
    let critical_path: MetricMap = stats
        .critical_path_score
        .iter()
        .map(|(id, &score)| (id.clone(), score as f64))
        .collect();

    TopLists {
        pagerank: top_n(&stats.pagerank, TOP_LIST_LEN),
        betweenness: top_n(&stats.betweenness, TOP_LIST_LEN),
        critical_path: top_n(&critical_path, TOP_LIST_LEN),
        hubs: top_n(&stats.hubs, TOP_LIST_LEN),
        authorities: top_n(&stats.authorities, TOP_LIST_LEN),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
