//! Two-phase analysis scheduler.
//!
//! # Lifecycle
//!
//! **Phase 1** (synchronous): build the graph, run every O(V+E) metric,
//! produce the actionable set. When [`analyze`] returns, all Phase-1
//! fields of the stats object are final.
//!
//! **Phase 2** (asynchronous): one thread per enabled expensive metric.
//! Each task computes its result locally, installs it atomically under
//! the stats mutex, and reports to a remaining-counter; the last report
//! fires the single completion signal. A task that hits its deadline
//! installs an empty map and a `TimedOut` state instead — timeouts are
//! not failures and are never retried.
//!
//! # Visibility
//!
//! [`Analysis::wait_for_phase2`] blocks on the completion condvar, which
//! gives readers a full happens-before on all Phase-2 writes. Readers
//! that skip the wait see final Phase-1 fields and empty maps for
//! in-flight metrics, never partially-populated ones. Map accessors
//! return copies.
//!
//! # Cancellation
//!
//! [`Analysis::cancel`] flips a token polled at BFS-root and iteration
//! boundaries; in-flight tasks finish with a timeout flag. Phase 1 is
//! not cancellable (bounded and cheap).

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use crate::analysis::config::{AnalysisConfig, config_for_size, config_full};
use crate::analysis::stats::{AnalysisStats, MetricState, metric, ranks_desc};
use crate::error::CoreError;
use crate::graph::build::DepGraph;
use crate::metrics::betweenness::betweenness;
use crate::metrics::cycles::enumerate_cycles;
use crate::metrics::eigenvector::eigenvector;
use crate::metrics::hits::{HitsOutcome, hits};
use crate::metrics::pagerank::{PageRankConfig, pagerank};
use crate::metrics::{CancelToken, Deadline, MetricMap, basic, critical_path, structure};
use crate::model::issue::Issue;
use crate::pool::BufferPool;

/// Shared tolerance for the iterative centralities.
const ITER_TOLERANCE: f64 = 1e-6;
/// Shared iteration cap for the iterative centralities.
const ITER_CAP: usize = 100;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Caller-facing knobs for one analysis.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Request all metrics at all sizes (still deadline-bounded).
    pub force_full: bool,
    /// Seed for pivot sampling. The same input and seed produce
    /// byte-identical serialized stats.
    pub seed: u64,
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Phase2Progress {
    remaining: usize,
    complete: bool,
}

#[derive(Debug)]
struct Shared {
    stats: Mutex<AnalysisStats>,
    progress: Mutex<Phase2Progress>,
    done: Condvar,
}

impl Shared {
    fn lock_stats(&self) -> MutexGuard<'_, AnalysisStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_progress(&self) -> MutexGuard<'_, Phase2Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one finished task; the last one fires the completion signal.
    fn report_task_done(&self) {
        let mut progress = self.lock_progress();
        progress.remaining = progress.remaining.saturating_sub(1);
        if progress.remaining == 0 && !progress.complete {
            progress.complete = true;
            drop(progress);
            self.done.notify_all();
        }
    }
}

// ---------------------------------------------------------------------------
// Phase-2 tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase2Task {
    Betweenness,
    PageRank,
    Hits,
    Eigenvector,
    Cycles,
}

impl Phase2Task {
    const fn name(self) -> &'static str {
        match self {
            Self::Betweenness => metric::BETWEENNESS,
            Self::PageRank => metric::PAGERANK,
            Self::Hits => metric::HITS,
            Self::Eigenvector => metric::EIGENVECTOR,
            Self::Cycles => metric::CYCLES,
        }
    }
}

enum TaskResult {
    Betweenness(Option<MetricMap>),
    PageRank(Option<MetricMap>),
    Hits(Option<HitsOutcome>),
    Eigenvector(Option<MetricMap>),
    Cycles(Vec<Vec<String>>),
}

fn execute_task(
    task: Phase2Task,
    graph: &DepGraph,
    config: &AnalysisConfig,
    pool: &BufferPool,
    cancel: &CancelToken,
) -> TaskResult {
    match task {
        Phase2Task::Betweenness => TaskResult::Betweenness(betweenness(
            graph,
            config.betweenness,
            config.seed,
            Deadline::after(config.metric_budget),
            cancel,
            pool,
        )),
        Phase2Task::PageRank => TaskResult::PageRank(pagerank(
            graph,
            &PageRankConfig::default(),
            Deadline::after(config.metric_budget),
            cancel,
        )),
        Phase2Task::Hits => TaskResult::Hits(hits(
            graph,
            ITER_CAP,
            ITER_TOLERANCE,
            Deadline::after(config.metric_budget),
            cancel,
        )),
        Phase2Task::Eigenvector => TaskResult::Eigenvector(eigenvector(
            graph,
            ITER_CAP,
            ITER_TOLERANCE,
            Deadline::after(config.metric_budget),
            cancel,
        )),
        Phase2Task::Cycles => TaskResult::Cycles(enumerate_cycles(
            graph,
            Deadline::after(config.cycles_budget),
            cancel,
        )),
    }
}

/// Install a finished task's result atomically, then report completion.
fn install_result(shared: &Shared, result: TaskResult) {
    {
        let mut stats = shared.lock_stats();
        match result {
            TaskResult::Betweenness(Some(map)) => {
                stats.betweenness_rank = ranks_desc(&map);
                stats.betweenness = map;
                stats
                    .metric_states
                    .insert(metric::BETWEENNESS.into(), MetricState::Completed);
            }
            TaskResult::Betweenness(None) => {
                stats
                    .metric_states
                    .insert(metric::BETWEENNESS.into(), MetricState::TimedOut);
            }
            TaskResult::PageRank(Some(map)) => {
                stats.pagerank_rank = ranks_desc(&map);
                stats.pagerank = map;
                stats
                    .metric_states
                    .insert(metric::PAGERANK.into(), MetricState::Completed);
            }
            TaskResult::PageRank(None) => {
                stats
                    .metric_states
                    .insert(metric::PAGERANK.into(), MetricState::TimedOut);
            }
            TaskResult::Hits(Some(outcome)) => {
                // An edgeless graph has nothing to reinforce; advertise
                // the empty maps as skipped, not completed.
                let state = if outcome.hubs.is_empty() && stats.node_count > 0 {
                    MetricState::Skipped
                } else {
                    MetricState::Completed
                };
                stats.hubs = outcome.hubs;
                stats.authorities = outcome.authorities;
                stats.metric_states.insert(metric::HITS.into(), state);
            }
            TaskResult::Hits(None) => {
                stats
                    .metric_states
                    .insert(metric::HITS.into(), MetricState::TimedOut);
            }
            TaskResult::Eigenvector(Some(map)) => {
                let state = if map.is_empty() && stats.node_count > 0 {
                    MetricState::Skipped
                } else {
                    MetricState::Completed
                };
                stats.eigenvector = map;
                stats.metric_states.insert(metric::EIGENVECTOR.into(), state);
            }
            TaskResult::Eigenvector(None) => {
                stats
                    .metric_states
                    .insert(metric::EIGENVECTOR.into(), MetricState::TimedOut);
            }
            TaskResult::Cycles(cycles) => {
                stats.cycles = cycles;
                stats
                    .metric_states
                    .insert(metric::CYCLES.into(), MetricState::Completed);
            }
        }
    }
    shared.report_task_done();
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run Phase 1 synchronously and fan Phase 2 out across threads.
///
/// # Errors
///
/// Returns [`CoreError`] when the input fails validation; metric
/// timeouts are states on the stats object, never errors.
#[instrument(skip(issues, options), fields(issues = issues.len()))]
pub fn analyze(issues: &[Issue], options: &AnalyzeOptions) -> Result<Analysis, CoreError> {
    let (analysis, tasks) = prepare(issues, options)?;

    for &task in &tasks {
        let shared = Arc::clone(&analysis.shared);
        let graph = Arc::clone(&analysis.graph);
        let pool = Arc::clone(&analysis.pool);
        let config = analysis.config.clone();
        let cancel = analysis.cancel.clone();
        std::thread::spawn(move || {
            let result = execute_task(task, &graph, &config, &pool, &cancel);
            install_result(&shared, result);
        });
    }

    Ok(analysis)
}

/// Profiling mode: run every Phase-2 task synchronously on the caller
/// thread and record a deterministic per-metric timing profile.
///
/// # Errors
///
/// Returns [`CoreError`] when the input fails validation.
#[instrument(skip(issues, options), fields(issues = issues.len()))]
pub fn analyze_profiled(
    issues: &[Issue],
    options: &AnalyzeOptions,
) -> Result<(Analysis, Vec<MetricTiming>), CoreError> {
    let (analysis, tasks) = prepare(issues, options)?;

    let mut profile = Vec::with_capacity(tasks.len());
    for &task in &tasks {
        let started = Instant::now();
        let result = execute_task(
            task,
            &analysis.graph,
            &analysis.config,
            &analysis.pool,
            &analysis.cancel,
        );
        install_result(&analysis.shared, result);
        let state = analysis
            .shared
            .lock_stats()
            .metric_states
            .get(task.name())
            .copied()
            .unwrap_or(MetricState::Skipped);
        profile.push(MetricTiming {
            metric: task.name().to_string(),
            elapsed: started.elapsed(),
            state,
        });
    }

    Ok((analysis, profile))
}

/// One entry of the profiling-mode report.
#[derive(Debug, Clone)]
pub struct MetricTiming {
    /// Metric name.
    pub metric: String,
    /// Wall time spent on the task.
    pub elapsed: Duration,
    /// Outcome recorded on the stats object.
    pub state: MetricState,
}

/// Phase 1 plus task planning, common to both entry points.
fn prepare(
    issues: &[Issue],
    options: &AnalyzeOptions,
) -> Result<(Analysis, Vec<Phase2Task>), CoreError> {
    let graph = Arc::new(DepGraph::from_issues(issues)?);
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();

    let mut config = if options.force_full {
        config_full(node_count, edge_count)
    } else {
        config_for_size(node_count, edge_count)
    };
    config.seed = options.seed;

    // --- Phase 1: cheap metrics, final on return. ---
    let mut stats = AnalysisStats {
        node_count,
        edge_count,
        density: basic::density(node_count, edge_count),
        ..AnalysisStats::default()
    };
    (stats.in_degree, stats.out_degree) = basic::degrees(&graph);
    stats.topo_order = basic::topo_order(&graph);
    stats.actionable = basic::actionable_set(&graph, issues);
    stats.articulation_points = structure::articulation_points(&graph);
    stats.core_number = structure::core_numbers(&graph);
    stats.summary = basic::summary(&graph);

    let cp = critical_path::critical_path(&graph, &stats.topo_order);
    stats.critical_path_score = cp.score;
    stats.slack = cp.slack;
    stats.critical_path_available = cp.available;

    // --- Plan Phase 2. ---
    let mut tasks = vec![Phase2Task::Betweenness, Phase2Task::PageRank];
    if config.hits {
        tasks.push(Phase2Task::Hits);
    } else {
        stats
            .metric_states
            .insert(metric::HITS.into(), MetricState::Skipped);
    }
    if config.eigenvector {
        tasks.push(Phase2Task::Eigenvector);
    } else {
        stats
            .metric_states
            .insert(metric::EIGENVECTOR.into(), MetricState::Skipped);
    }
    if stats.topo_order.is_empty() && node_count > 0 {
        tasks.push(Phase2Task::Cycles);
    } else {
        // Acyclic (or empty): the cycle list is already final.
        stats
            .metric_states
            .insert(metric::CYCLES.into(), MetricState::Completed);
    }

    debug!(node_count, edge_count, tasks = tasks.len(), "phase 1 complete");

    let shared = Arc::new(Shared {
        stats: Mutex::new(stats),
        progress: Mutex::new(Phase2Progress {
            remaining: tasks.len(),
            complete: tasks.is_empty(),
        }),
        done: Condvar::new(),
    });

    let analysis = Analysis {
        shared,
        graph,
        pool: Arc::new(BufferPool::new()),
        cancel: CancelToken::new(),
        config,
    };
    Ok((analysis, tasks))
}

// ---------------------------------------------------------------------------
// Analysis handle
// ---------------------------------------------------------------------------

/// Handle to one analysis: Phase-1 fields are final from construction;
/// Phase-2 fields are final after [`Analysis::wait_for_phase2`].
#[derive(Debug)]
pub struct Analysis {
    shared: Arc<Shared>,
    graph: Arc<DepGraph>,
    pool: Arc<BufferPool>,
    cancel: CancelToken,
    config: AnalysisConfig,
}

impl Analysis {
    /// Block until every Phase-2 task has reported (success or timeout).
    ///
    /// Establishes a happens-before on all Phase-2 writes: after this
    /// returns, the stats object is fully quiesced and never mutated
    /// again.
    pub fn wait_for_phase2(&self) {
        let mut progress = self.shared.lock_progress();
        while !progress.complete {
            progress = self
                .shared
                .done
                .wait(progress)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Non-blocking completion probe.
    #[must_use]
    pub fn phase2_complete(&self) -> bool {
        self.shared.lock_progress().complete
    }

    /// Request cancellation; in-flight tasks observe it at BFS-root and
    /// iteration boundaries and complete with a timeout flag.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Copy of the full stats object.
    #[must_use]
    pub fn stats(&self) -> AnalysisStats {
        self.shared.lock_stats().clone()
    }

    /// Copy of the PageRank map (empty while in flight).
    #[must_use]
    pub fn pagerank(&self) -> MetricMap {
        self.shared.lock_stats().pagerank.clone()
    }

    /// Copy of the betweenness map (empty while in flight).
    #[must_use]
    pub fn betweenness(&self) -> MetricMap {
        self.shared.lock_stats().betweenness.clone()
    }

    /// Copy of the actionable set (final from Phase 1).
    #[must_use]
    pub fn actionable(&self) -> std::collections::BTreeSet<String> {
        self.shared.lock_stats().actionable.clone()
    }

    /// Names of metrics that were skipped or timed out.
    #[must_use]
    pub fn skipped_metrics(&self) -> Vec<String> {
        self.shared.lock_stats().skipped_metrics()
    }

    /// The graph this analysis ran over.
    #[must_use]
    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    /// The resolved size-tier configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Scratch pool, exposed for reuse diagnostics in benches.
    #[must_use]
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
