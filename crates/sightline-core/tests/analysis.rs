//! End-to-end analysis scenarios over literal inputs.

use sightline_core::analysis::scheduler::{AnalyzeOptions, analyze};
use sightline_core::analysis::stats::MetricState;
use sightline_core::metrics::betweenness::{BetweennessMode, betweenness};
use sightline_core::metrics::{CancelToken, Deadline};
use sightline_core::model::issue::{Dependency, Issue, Status};
use sightline_core::pool::BufferPool;

fn issue(id: &str, status: Status, deps: &[&str]) -> Issue {
    let mut issue = Issue::new(id, status);
    issue.dependencies = deps.iter().map(|&d| Dependency::blocks(d)).collect();
    issue
}

#[test]
fn empty_graph_scenario() {
    let analysis = analyze(&[], &AnalyzeOptions::default()).expect("analyze");
    analysis.wait_for_phase2();
    let stats = analysis.stats();

    assert_eq!(stats.node_count, 0);
    assert_eq!(stats.edge_count, 0);
    assert!((stats.density - 0.0).abs() < f64::EPSILON);
    assert!(stats.pagerank.is_empty());
    assert!(stats.betweenness.is_empty());
    assert!(stats.hubs.is_empty());
    assert!(stats.authorities.is_empty());
    assert!(stats.cycles.is_empty());
    assert!(stats.topo_order.is_empty());
    assert!(stats.actionable.is_empty());
}

#[test]
fn linear_chain_scenario() {
    // Each issue blocks the next in line: b depends on a, c on b, d on c.
    let input = vec![
        issue("a", Status::Open, &[]),
        issue("b", Status::Open, &["a"]),
        issue("c", Status::Open, &["b"]),
        issue("d", Status::Open, &["c"]),
    ];
    let analysis = analyze(&input, &AnalyzeOptions::default()).expect("analyze");
    analysis.wait_for_phase2();
    let stats = analysis.stats();

    assert_eq!(
        stats.actionable.iter().collect::<Vec<_>>(),
        vec!["a"],
        "only the head of the chain is actionable"
    );
    assert_eq!(stats.critical_path_score["a"], 3);
    assert_eq!(stats.critical_path_score["b"], 2);
    assert_eq!(stats.critical_path_score["c"], 1);
    assert_eq!(stats.critical_path_score["d"], 0);
    assert!(stats.slack.values().all(|&s| s == 0), "single chain: no float");
    assert!(stats.cycles.is_empty());
    assert_eq!(stats.topo_order.len(), 4);
}

#[test]
fn triangle_cycle_scenario() {
    let input = vec![
        issue("a", Status::Open, &["b"]),
        issue("b", Status::Open, &["c"]),
        issue("c", Status::Open, &["a"]),
    ];
    let analysis = analyze(&input, &AnalyzeOptions::default()).expect("analyze");
    analysis.wait_for_phase2();
    let stats = analysis.stats();

    assert_eq!(stats.cycles.len(), 1, "exactly one cycle");
    assert_eq!(stats.cycles[0], vec!["a", "b", "c"], "canonical rotation");
    assert!(stats.topo_order.is_empty());
    assert!(!stats.critical_path_available);
}

#[test]
fn star_scenario() {
    let n = 12;
    let mut input = vec![issue("hub", Status::Open, &[])];
    for i in 0..n {
        input.push(issue(&format!("leaf{i:02}"), Status::Open, &["hub"]));
    }
    let analysis = analyze(&input, &AnalyzeOptions::default()).expect("analyze");
    analysis.wait_for_phase2();
    let stats = analysis.stats();

    assert_eq!(stats.in_degree["hub"], n);
    assert_eq!(
        stats.actionable.iter().collect::<Vec<_>>(),
        vec!["hub"],
        "every leaf waits on the hub"
    );
    let hub_rank = stats.pagerank["hub"];
    for (id, rank) in &stats.pagerank {
        if id != "hub" {
            assert!(hub_rank > *rank, "hub must dominate {id}");
        }
    }
    assert_eq!(stats.pagerank_rank["hub"], 1);
}

#[test]
fn determinism_across_runs_with_same_seed() {
    let mut input = Vec::new();
    for i in 0..30 {
        let deps: Vec<String> = (0..i).filter(|j| (i + j) % 7 == 0).map(|j| format!("n{j:02}")).collect();
        let mut rec = Issue::new(format!("n{i:02}"), Status::Open);
        rec.dependencies = deps.iter().map(|d| Dependency::blocks(d.as_str())).collect();
        input.push(rec);
    }
    let options = AnalyzeOptions {
        force_full: false,
        seed: 77,
    };

    let run = || {
        let analysis = analyze(&input, &options).expect("analyze");
        analysis.wait_for_phase2();
        serde_json::to_string(&analysis.stats()).expect("serialize")
    };
    assert_eq!(run(), run(), "byte-identical serialized stats");
}

#[test]
fn approximate_with_full_pivot_set_matches_exact() {
    // Property: for V ≤ 100, sampled mode with k = V equals exact mode.
    let mut input = Vec::new();
    for i in 0..40_usize {
        let deps: Vec<String> = match i % 4 {
            0 if i > 0 => vec![format!("n{:02}", i - 1)],
            1 => vec![format!("n{:02}", (i + 7) % 40)],
            2 if i > 1 => vec![format!("n{:02}", i - 2), format!("n{:02}", i / 2)],
            _ => Vec::new(),
        };
        let mut rec = Issue::new(format!("n{i:02}"), Status::Open);
        rec.dependencies = deps.iter().map(|d| Dependency::blocks(d.as_str())).collect();
        input.push(rec);
    }
    let graph = sightline_core::graph::build::DepGraph::from_issues(&input).expect("build");
    let pool = BufferPool::new();

    let exact = betweenness(
        &graph,
        BetweennessMode::Exact,
        0,
        Deadline::none(),
        &CancelToken::new(),
        &pool,
    )
    .expect("exact");
    let sampled = betweenness(
        &graph,
        BetweennessMode::Sampled { pivots: 40 },
        913,
        Deadline::none(),
        &CancelToken::new(),
        &pool,
    )
    .expect("sampled");

    for (id, score) in &exact {
        assert!(
            (score - sampled[id]).abs() < 1e-9,
            "{id}: exact {score} vs sampled {}",
            sampled[id]
        );
    }
}

#[test]
fn topo_order_is_linear_extension_when_acyclic() {
    let input = vec![
        issue("a", Status::Open, &[]),
        issue("b", Status::Open, &["a"]),
        issue("c", Status::Open, &["a", "b"]),
        issue("d", Status::Open, &["b"]),
        issue("e", Status::Open, &["c", "d"]),
    ];
    let analysis = analyze(&input, &AnalyzeOptions::default()).expect("analyze");
    analysis.wait_for_phase2();
    let stats = analysis.stats();

    assert!(stats.cycles.is_empty());
    let pos: std::collections::HashMap<&str, usize> = stats
        .topo_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    // Stored edges run dependent → blocker; dependents must come first.
    for (dependent, blockers) in [
        ("b", vec!["a"]),
        ("c", vec!["a", "b"]),
        ("d", vec!["b"]),
        ("e", vec!["c", "d"]),
    ] {
        for blocker in blockers {
            assert!(
                pos[dependent] < pos[blocker],
                "{dependent} must precede its blocker {blocker}"
            );
        }
    }
}

#[test]
fn hits_norms_are_unit_or_maps_empty() {
    let input = vec![
        issue("a", Status::Open, &["c"]),
        issue("b", Status::Open, &["c", "d"]),
        issue("c", Status::Open, &[]),
        issue("d", Status::Open, &[]),
    ];
    let analysis = analyze(&input, &AnalyzeOptions::default()).expect("analyze");
    analysis.wait_for_phase2();
    let stats = analysis.stats();

    if stats.metric_states["hits"] == MetricState::Completed {
        let hub_norm: f64 = stats.hubs.values().map(|v| v * v).sum::<f64>().sqrt();
        let auth_norm: f64 = stats.authorities.values().map(|v| v * v).sum::<f64>().sqrt();
        assert!((hub_norm - 1.0).abs() < 1e-6);
        assert!((auth_norm - 1.0).abs() < 1e-6);
    } else {
        assert!(stats.hubs.is_empty());
        assert!(stats.authorities.is_empty());
    }
}
