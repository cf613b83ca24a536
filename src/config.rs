//! Configuration consumed when wiring up a [`crate::SnapshotController`].
//!
//! No environment-variable or CLI parsing lives in this crate — a host
//! process is expected to build a `SnapshotConfig` value however it builds
//! the rest of its own configuration and hand it to the controller.

use std::path::PathBuf;

/// Which default executor [`crate::SnapshotController::replicate_latest_snapshot`]
/// uses when a caller does not pass one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// Run every chunk send on the calling thread, in submission order.
    /// This is the default and the only mode exercised by tests.
    Inline,
}

/// Configuration for one partition's snapshot controller.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Root directory under which `runtime/`, `pending/`, and `snapshots/`
    /// live.
    pub partition_root: PathBuf,
    /// Number of newest committed snapshots `pruneRetained` keeps when a
    /// caller invokes it. `None` means unbounded retention: nothing is ever
    /// pruned unless a caller explicitly asks.
    pub retention_keep: Option<usize>,
    /// Default executor for outbound replication.
    pub executor: ExecutorKind,
}

impl SnapshotConfig {
    /// Unbounded retention, inline executor — matches the distilled
    /// default contract used throughout the test suite.
    pub fn new(partition_root: impl Into<PathBuf>) -> Self {
        Self {
            partition_root: partition_root.into(),
            retention_keep: None,
            executor: ExecutorKind::Inline,
        }
    }

    pub fn with_retention_keep(mut self, keep: usize) -> Self {
        self.retention_keep = Some(keep);
        self
    }
}
