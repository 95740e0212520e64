//! Scratch-buffer pool for the Brandes engine.
//!
//! # Overview
//!
//! A single-source Brandes pass needs several O(V) scratch structures
//! (shortest-path counts, distances, dependency accumulators, predecessor
//! lists, a BFS queue and a traversal stack). Allocating them per source
//! dominates runtime on large graphs, so they are pooled: workers `get` a
//! reset buffer, run one or more sources, and `put` it back.
//!
//! # Reset Semantics
//!
//! `get` always returns a buffer sized for the requested node count with
//! all values reset. A buffer whose capacity has grown past twice the
//! requested size is hard-cleared (dropped and reallocated); otherwise
//! values are reset in place and predecessor lists are truncated to zero
//! length while retaining capacity.
//!
//! `put` never blocks. Pool entries may be dropped by the allocator
//! between analyses; every `get` guarantees a usable buffer regardless.

use std::collections::VecDeque;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// ScratchBuffers
// ---------------------------------------------------------------------------

/// Per-source scratch state for one Brandes BFS + accumulation pass.
#[derive(Debug, Default)]
pub struct ScratchBuffers {
    /// σ — number of shortest paths from the current source.
    pub sigma: Vec<f64>,
    /// BFS distance from the current source (-1 = unvisited).
    pub dist: Vec<i64>,
    /// δ — dependency accumulator.
    pub delta: Vec<f64>,
    /// Predecessor lists on shortest paths.
    pub preds: Vec<Vec<u32>>,
    /// BFS queue.
    pub queue: VecDeque<u32>,
    /// Nodes in discovery order; popped in reverse for accumulation.
    pub stack: Vec<u32>,
}

impl ScratchBuffers {
    /// Reset every structure for a graph of `n` nodes.
    ///
    /// Values are reset in place when capacity is reasonable; a buffer
    /// that has grown past `2 * n` is hard-cleared first so one oversized
    /// analysis does not pin memory for every later one.
    pub fn reset(&mut self, n: usize) {
        if self.sigma.capacity() > n.saturating_mul(2) {
            *self = Self::default();
        }

        self.sigma.clear();
        self.sigma.resize(n, 0.0);
        self.dist.clear();
        self.dist.resize(n, -1);
        self.delta.clear();
        self.delta.resize(n, 0.0);

        // Length-truncate predecessor slices to zero, retaining capacity.
        if self.preds.len() > n {
            self.preds.truncate(n);
        }
        for p in &mut self.preds {
            p.clear();
        }
        if self.preds.len() < n {
            self.preds.resize_with(n, Vec::new);
        }

        self.queue.clear();
        self.stack.clear();
    }
}

// ---------------------------------------------------------------------------
// BufferPool
// ---------------------------------------------------------------------------

/// Free-list of [`ScratchBuffers`] safe for concurrent `get`/`put`.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Mutex<Vec<ScratchBuffers>>,
}

impl BufferPool {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a buffer from the pool (or allocate one) and reset it for a
    /// graph of `n` nodes.
    #[must_use]
    pub fn get(&self, n: usize) -> ScratchBuffers {
        let mut buffers = self
            .free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut buf = buffers.pop().unwrap_or_default();
        drop(buffers);
        buf.reset(n);
        buf
    }

    /// Return a buffer to the free list. Never blocks beyond the free-list
    /// mutex.
    pub fn put(&self, buf: ScratchBuffers) {
        let mut buffers = self
            .free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        buffers.push(buf);
    }

    /// Number of buffers currently pooled.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
