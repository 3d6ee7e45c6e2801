//! Lightweight dispatch counters. No locks, just atomics.

use core::sync::atomic::{AtomicU64, Ordering};

/// Per-actor dispatch counters, bumped from the enqueue path and the
/// worker run loop.
pub struct ActorMetrics {
    enqueued: AtomicU64,
    executed: AtomicU64,
    panics_contained: AtomicU64,
}

impl ActorMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            panics_contained: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_contained_panic(&self) {
        self.panics_contained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            panics_contained: self.panics_contained.load(Ordering::Relaxed),
        }
    }
}

impl Default for ActorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of an actor's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Invocations accepted into the queue.
    pub enqueued: u64,
    /// Invocations the worker has finished executing.
    pub executed: u64,
    /// Invocations that panicked and were contained.
    pub panics_contained: u64,
}
