#![forbid(unsafe_code)]
//! sightline-core library.
//!
//! Builds a directed dependency graph from issue records and computes the
//! structural metrics consumed by the interactive viewer and the robot
//! report generators: degrees, topological order, critical-path slack,
//! betweenness, PageRank, HITS, eigenvector centrality, and simple cycles.
//!
//! Expensive metrics run in a bounded asynchronous second phase so a cold
//! start stays interactive; see [`analysis`].
//!
//! # Conventions
//!
//! - **Errors**: [`error::CoreError`] for typed failures; metric
//!   timeouts are states on the stats object, never errors.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`).

pub mod analysis;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod pool;

pub use analysis::scheduler::{Analysis, AnalyzeOptions, analyze};
pub use analysis::stats::AnalysisStats;
pub use error::CoreError;
pub use metrics::CancelToken;
pub use model::issue::{DepKind, Dependency, Issue, Status};
