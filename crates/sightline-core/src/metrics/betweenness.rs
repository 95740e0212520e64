//! Betweenness centrality via Brandes' algorithm, exact and sampled.
//!
//! # Overview
//!
//! Betweenness measures how often an issue lies on shortest dependency
//! paths between other pairs — the bridges and bottlenecks of the graph.
//!
//! # Algorithm
//!
//! Brandes (2001) for unweighted graphs: for each source, BFS records
//! shortest-path counts σ and predecessor lists, then dependencies δ are
//! accumulated in reverse BFS order. Scores are the raw Brandes sums,
//! unnormalized, consistent across the code base.
//!
//! For large graphs a sampled variant runs single-source passes from `k`
//! pivots drawn by seeded Fisher–Yates and extrapolates by `V/k`. With
//! `k = V` the sample is every source and the result equals exact mode.
//!
//! # Determinism
//!
//! Neighbor visitation is sorted by node handle before each expansion, so
//! predecessor order — and therefore accumulated δ — is identical across
//! runs. Pivot selection is a pure function of the seed.
//!
//! # Resources
//!
//! Scratch state comes from a [`BufferPool`] and is reset, not
//! reallocated, between BFS roots. In sampled mode pivots run in parallel
//! on the rayon pool; each pivot hands its partial over under a single
//! mutex, and the partials are reduced in seeded pivot order so the sum
//! does not depend on thread scheduling. The deadline and the cancel
//! token are polled at the top of each BFS root.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::graph::build::DepGraph;
use crate::metrics::{CancelToken, Deadline, MetricMap};
use crate::pool::{BufferPool, ScratchBuffers};

// ---------------------------------------------------------------------------
// Mode and sample-size policy
// ---------------------------------------------------------------------------

/// How betweenness is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetweennessMode {
    /// One Brandes pass per source.
    Exact,
    /// Seeded pivot sample, extrapolated by `V / pivots`.
    Sampled {
        /// Number of distinct pivot sources.
        pivots: usize,
    },
}

/// Size-adaptive sample policy.
///
/// Small graphs get exact Brandes; larger ones a pivot count that keeps
/// the pass bounded while preserving top-rank fidelity.
#[must_use]
pub fn mode_for_size(node_count: usize) -> BetweennessMode {
    match node_count {
        0..=99 => BetweennessMode::Exact,
        100..=499 => BetweennessMode::Sampled {
            pivots: (node_count / 5).max(50),
        },
        500..=1999 => BetweennessMode::Sampled { pivots: 100 },
        _ => BetweennessMode::Sampled { pivots: 200 },
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compute betweenness centrality for every issue.
///
/// Returns `None` when the deadline expired or cancellation was observed
/// before all sources completed; the scheduler records a timeout and an
/// empty map in that case.
#[must_use]
#[instrument(skip(graph, pool, deadline, cancel), fields(nodes = graph.node_count()))]
pub fn betweenness(
    graph: &DepGraph,
    mode: BetweennessMode,
    seed: u64,
    deadline: Deadline,
    cancel: &CancelToken,
    pool: &BufferPool,
) -> Option<MetricMap> {
    let n = graph.node_count();
    if n == 0 {
        return Some(MetricMap::new());
    }

    let adj = graph.sorted_adjacency(Direction::Outgoing);

    let scores = match mode {
        BetweennessMode::Exact => run_exact(&adj, deadline, cancel, pool)?,
        BetweennessMode::Sampled { pivots } => {
            let k = pivots.clamp(1, n);
            let sample = sample_pivots(n, k, seed);
            #[allow(clippy::cast_precision_loss)]
            let scale = n as f64 / k as f64;
            run_sampled(&adj, &sample, scale, deadline, cancel, pool)?
        }
    };

    let mut out = MetricMap::new();
    for (v, score) in scores.iter().enumerate() {
        if let Some(id) = graph.issue_id(NodeIndex::new(v)) {
            out.insert(id.to_string(), *score);
        }
    }
    Some(out)
}

/// Exact mode: one sequential Brandes pass per source, reusing a single
/// pooled buffer (reset, not reallocated, between roots).
fn run_exact(
    adj: &[Vec<u32>],
    deadline: Deadline,
    cancel: &CancelToken,
    pool: &BufferPool,
) -> Option<Vec<f64>> {
    let n = adj.len();
    let mut total = vec![0.0_f64; n];
    let mut buf = pool.get(n);

    for s in 0..n {
        // Suspension point: top of each BFS root.
        if cancel.should_stop(&deadline) {
            pool.put(buf);
            debug!(source = s, "betweenness interrupted");
            return None;
        }
        buf.reset(n);
        single_source(adj, s, &mut buf);
        for (v, d) in buf.delta.iter().enumerate() {
            if v != s {
                total[v] += d;
            }
        }
    }

    pool.put(buf);
    Some(total)
}

/// Sampled mode: pivots run in parallel, each pushing its scaled partial
/// under a single mutex at the end of the pivot. Partials are reduced in
/// seeded pivot order afterwards so the sum — and therefore the
/// serialized output — is identical across runs regardless of thread
/// scheduling.
fn run_sampled(
    adj: &[Vec<u32>],
    pivots: &[usize],
    scale: f64,
    deadline: Deadline,
    cancel: &CancelToken,
    pool: &BufferPool,
) -> Option<Vec<f64>> {
    let n = adj.len();
    let partials: Mutex<Vec<(usize, Vec<f64>)>> = Mutex::new(Vec::with_capacity(pivots.len()));
    let interrupted = AtomicBool::new(false);

    pivots.par_iter().enumerate().for_each(|(order, &s)| {
        // Suspension point: top of each BFS root.
        if interrupted.load(Ordering::Relaxed) {
            return;
        }
        if cancel.should_stop(&deadline) {
            interrupted.store(true, Ordering::Relaxed);
            return;
        }

        let mut buf = pool.get(n);
        single_source(adj, s, &mut buf);
        let mut delta = buf.delta.clone();
        delta[s] = 0.0;
        pool.put(buf);

        let mut acc = partials
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        acc.push((order, delta));
    });

    if interrupted.load(Ordering::Relaxed) {
        debug!("betweenness interrupted before all pivots completed");
        return None;
    }

    let mut collected = partials
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    collected.sort_unstable_by_key(|(order, _)| *order);

    let mut total = vec![0.0_f64; n];
    for (_, delta) in &collected {
        for (v, d) in delta.iter().enumerate() {
            total[v] += d * scale;
        }
    }
    Some(total)
}

/// One Brandes pass: BFS from `s` filling σ, dist, and predecessor lists,
/// then dependency accumulation in reverse discovery order. Leaves δ in
/// `buf.delta`.
fn single_source(adj: &[Vec<u32>], s: usize, buf: &mut ScratchBuffers) {
    buf.sigma[s] = 1.0;
    buf.dist[s] = 0;
    buf.queue.push_back(u32::try_from(s).unwrap_or(u32::MAX));

    while let Some(v) = buf.queue.pop_front() {
        let vi = v as usize;
        buf.stack.push(v);

        for &w in &adj[vi] {
            let wi = w as usize;
            if buf.dist[wi] < 0 {
                buf.dist[wi] = buf.dist[vi] + 1;
                buf.queue.push_back(w);
            }
            if buf.dist[wi] == buf.dist[vi] + 1 {
                buf.sigma[wi] += buf.sigma[vi];
                buf.preds[wi].push(v);
            }
        }
    }

    while let Some(w) = buf.stack.pop() {
        let wi = w as usize;
        for p in 0..buf.preds[wi].len() {
            let vi = buf.preds[wi][p] as usize;
            if buf.sigma[wi] > 0.0 {
                buf.delta[vi] += (buf.sigma[vi] / buf.sigma[wi]) * (1.0 + buf.delta[wi]);
            }
        }
    }
}

/// Draw `k` distinct pivots from `0..n` by seeded Fisher–Yates. The same
/// seed always yields the same sample — a testable property relied on by
/// the determinism guarantee.
#[must_use]
pub fn sample_pivots(n: usize, k: usize, seed: u64) -> Vec<usize> {
    use rand::Rng;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    let k = k.min(n);
    for i in 0..k {
        let j = rng.gen_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
