//! Metrics registry for the snapshot controller.
//!
//! Counters only (no gauges, no histograms), monotonic, reset only on
//! process start. Uses `Relaxed` ordering throughout: eventual consistency
//! between counters is fine for operational metrics, and nothing here ever
//! needs to be the synchronization point for other state.

use std::sync::atomic::{AtomicU64, Ordering};

/// All operational counters for snapshot, replication, and recovery
/// activity on one partition.
#[derive(Debug, Default)]
pub struct Metrics {
    snapshots_taken: AtomicU64,
    snapshots_committed: AtomicU64,
    snapshots_commit_collisions: AtomicU64,
    snapshots_pruned: AtomicU64,
    chunks_sent: AtomicU64,
    chunks_received_accepted: AtomicU64,
    chunks_received_duplicate: AtomicU64,
    chunks_received_corrupt: AtomicU64,
    replication_attempts_aborted: AtomicU64,
    recovery_runs: AtomicU64,
    recovery_candidates_rejected: AtomicU64,
    operation_elapsed_nanos_total: AtomicU64,
    operation_count: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_snapshots_taken(&self) {
        self.snapshots_taken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshots_committed(&self) {
        self.snapshots_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshots_commit_collisions(&self) {
        self.snapshots_commit_collisions
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_snapshots_pruned(&self, count: u64) {
        self.snapshots_pruned.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_chunks_sent(&self) {
        self.chunks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chunks_received_accepted(&self) {
        self.chunks_received_accepted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chunks_received_duplicate(&self) {
        self.chunks_received_duplicate
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_chunks_received_corrupt(&self) {
        self.chunks_received_corrupt
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_replication_attempts_aborted(&self) {
        self.replication_attempts_aborted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_recovery_runs(&self) {
        self.recovery_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_recovery_candidates_rejected(&self) {
        self.recovery_candidates_rejected
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Feeds one elapsed-time observation (nanoseconds) into the running
    /// total so callers can derive an average without a histogram
    /// dependency.
    pub fn observe_snapshot_operation(&self, elapsed: std::time::Duration) {
        self.operation_elapsed_nanos_total
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        self.operation_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            snapshots_taken: self.snapshots_taken.load(Ordering::Relaxed),
            snapshots_committed: self.snapshots_committed.load(Ordering::Relaxed),
            snapshots_commit_collisions: self.snapshots_commit_collisions.load(Ordering::Relaxed),
            snapshots_pruned: self.snapshots_pruned.load(Ordering::Relaxed),
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
            chunks_received_accepted: self.chunks_received_accepted.load(Ordering::Relaxed),
            chunks_received_duplicate: self.chunks_received_duplicate.load(Ordering::Relaxed),
            chunks_received_corrupt: self.chunks_received_corrupt.load(Ordering::Relaxed),
            replication_attempts_aborted: self
                .replication_attempts_aborted
                .load(Ordering::Relaxed),
            recovery_runs: self.recovery_runs.load(Ordering::Relaxed),
            recovery_candidates_rejected: self
                .recovery_candidates_rejected
                .load(Ordering::Relaxed),
            operation_elapsed_nanos_total: self
                .operation_elapsed_nanos_total
                .load(Ordering::Relaxed),
            operation_count: self.operation_count.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub snapshots_taken: u64,
    pub snapshots_committed: u64,
    pub snapshots_commit_collisions: u64,
    pub snapshots_pruned: u64,
    pub chunks_sent: u64,
    pub chunks_received_accepted: u64,
    pub chunks_received_duplicate: u64,
    pub chunks_received_corrupt: u64,
    pub replication_attempts_aborted: u64,
    pub recovery_runs: u64,
    pub recovery_candidates_rejected: u64,
    pub operation_elapsed_nanos_total: u64,
    pub operation_count: u64,
}

impl MetricsSnapshot {
    /// Average elapsed time per observed operation, or `None` if none were
    /// observed yet.
    pub fn average_operation_nanos(&self) -> Option<u64> {
        if self.operation_count == 0 {
            None
        } else {
            Some(self.operation_elapsed_nanos_total / self.operation_count)
        }
    }
}
