#![forbid(unsafe_code)]
//! sightline-insights library.
//!
//! Higher-level analytics over a completed analysis: agent-oriented
//! execution plans and priority recommendations, deterministic greedy
//! selections (top-K unlock, vertex cover, cycle breaks), pure snapshot
//! diffing, and the persistent baseline with its drift alert stream.
//!
//! # Conventions
//!
//! - **Errors**: [`error::BaselineError`] for typed baseline failures;
//!   an invalid drift config is soft (warn and use defaults).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`).

pub mod advanced;
pub mod aggregate;
pub mod baseline;
pub mod error;
pub mod snapshot;

pub use baseline::drift::{DriftConfig, DriftReport, compute_drift};
pub use baseline::Baseline;
pub use error::BaselineError;
pub use snapshot::{Snapshot, SnapshotDiff, diff};
