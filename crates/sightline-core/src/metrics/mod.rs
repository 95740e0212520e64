//! Structural metrics over the dependency graph.
//!
//! Cheap O(V+E) metrics ([`basic`], [`critical_path`], [`structure`]) run
//! synchronously in Phase 1. Expensive metrics ([`betweenness`],
//! [`pagerank`], [`hits`], [`eigenvector`], [`cycles`]) run under a
//! [`Deadline`] and poll a [`CancelToken`] at BFS-root and iteration
//! boundaries; on expiry they return `None` and the scheduler records a
//! timeout instead of an error.

pub mod basic;
pub mod betweenness;
pub mod critical_path;
pub mod cycles;
pub mod eigenvector;
pub mod hits;
pub mod pagerank;
pub mod structure;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Per-node metric values keyed by issue ID.
///
/// `BTreeMap` keeps serialization byte-stable across runs.
pub type MetricMap = std::collections::BTreeMap<String, f64>;

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// A wall-clock budget for one metric computation.
///
/// Checked at well-defined suspension points: the top of each BFS root in
/// Brandes, the top of each power iteration, and an explicit checkpoint in
/// the cycle enumerator. There is no preemption.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires.
    #[must_use]
    pub const fn none() -> Self {
        Self { expires_at: None }
    }

    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    /// Return `true` once the budget is exhausted.
    #[must_use]
    pub fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// External cancellation signal shared between the caller and Phase-2
/// tasks. Polled at the same suspension points as [`Deadline`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. In-flight tasks observe it at their next
    /// suspension point and complete with a timeout flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Return `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Combined stop check used by metric kernels.
    #[must_use]
    pub fn should_stop(&self, deadline: &Deadline) -> bool {
        self.is_cancelled() || deadline.expired()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_none_never_expires() {
        assert!(!Deadline::none().expired());
    }

    #[test]
    fn deadline_zero_budget_expires_immediately() {
        assert!(Deadline::after(Duration::ZERO).expired());
    }

    #[test]
    fn cancel_token_observed_after_cancel() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.should_stop(&Deadline::none()));
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.should_stop(&Deadline::none()));
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        token.cancel();
        assert!(other.is_cancelled());
    }
}
