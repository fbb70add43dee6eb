//! Counters for the admission queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lifetime counters for monitoring admission behaviour.
///
/// Live values (`in_flight`, `queued`) come from
/// [`AdmissionQueue::snapshot`](super::AdmissionQueue::snapshot); these are
/// monotonic totals.
#[derive(Debug, Default)]
pub struct AdmissionMetrics {
    /// Submissions evaluated by `admit`
    pub submitted: AtomicU64,

    /// Submissions that started without waiting
    pub admitted_immediately: AtomicU64,

    /// Submissions that had to wait for a slot
    pub queued: AtomicU64,

    /// Submissions turned away because both limits were reached
    pub rejected: AtomicU64,

    /// Work units that returned `Ok`
    pub completed: AtomicU64,

    /// Work units that returned `Err`
    pub failed: AtomicU64,

    /// Waiters that gave up before receiving a slot
    pub abandoned: AtomicU64,

    /// Queued submissions that received a slot
    pub waited: AtomicU64,

    /// Total time spent waiting for a slot, in milliseconds
    pub total_queue_wait_ms: AtomicU64,

    /// Largest wait-queue length observed
    pub max_queue_depth: AtomicU64,
}

impl AdmissionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admitted(&self) {
        self.admitted_immediately.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission entering the wait queue at the given depth
    pub fn record_queued(&self, depth: usize) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        self.max_queue_depth
            .fetch_max(depth as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long a queued submission waited before its slot arrived
    pub fn record_wait(&self, wait: Duration) {
        self.waited.fetch_add(1, Ordering::Relaxed);
        self.total_queue_wait_ms
            .fetch_add(wait.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record the outcome of a finished work unit
    pub fn record_settled(&self, success: bool) {
        if success {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Average wait of the queued submissions that got a slot, in milliseconds
    pub fn avg_queue_wait_ms(&self) -> f64 {
        let waited = self.waited.load(Ordering::Relaxed);
        if waited == 0 {
            return 0.0;
        }
        self.total_queue_wait_ms.load(Ordering::Relaxed) as f64 / waited as f64
    }

    /// Take a point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            admitted_immediately: self.admitted_immediately.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            waited: self.waited.load(Ordering::Relaxed),
            max_queue_depth: self.max_queue_depth.load(Ordering::Relaxed),
            avg_queue_wait_ms: self.avg_queue_wait_ms(),
        }
    }
}

/// Plain copy of [`AdmissionMetrics`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub admitted_immediately: u64,
    pub queued: u64,
    pub rejected: u64,
    pub completed: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub waited: u64,
    pub max_queue_depth: u64,
    pub avg_queue_wait_ms: f64,
}
