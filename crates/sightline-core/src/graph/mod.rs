//! Dependency-graph construction.

pub mod build;

pub use build::DepGraph;
