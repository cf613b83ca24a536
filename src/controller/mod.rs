//! Lifecycle orchestration: take, commit, replicate, and recover a
//! partition's snapshots, and manage the open/close state of its database
//! handle.

pub mod errors;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub use errors::{ControllerError, ControllerResult};

use crate::db::Database;
use crate::fsutil;
use crate::metrics::Metrics;
use crate::observability::Logger;
use crate::replication::{self, ChunkExecutor, ChunkReceiver, ChunkSink};
use crate::storage::{Snapshot, SnapshotStorage};

/// Owns the open database handle for one partition and drives every
/// snapshot lifecycle operation through [`SnapshotStorage`] and the
/// replication module.
///
/// State machine for the handle: `closed` → (`open_db`) → `open` →
/// (`close`) → `closed`. `open_db` is idempotent while already open.
pub struct SnapshotController<D: Database> {
    storage: Arc<SnapshotStorage>,
    metrics: Arc<Metrics>,
    receiver: Arc<ChunkReceiver>,
    handle: Mutex<Option<D::Handle>>,
}

impl<D: Database> SnapshotController<D> {
    pub fn new(storage: Arc<SnapshotStorage>, metrics: Arc<Metrics>) -> Self {
        let receiver = Arc::new(ChunkReceiver::new(Arc::clone(&storage), Arc::clone(&metrics)));
        Self {
            storage,
            metrics,
            receiver,
            handle: Mutex::new(None),
        }
    }

    /// Opens the database over the runtime directory. Idempotent: if
    /// already open, returns immediately without re-opening.
    pub fn open_db(&self) -> ControllerResult<(), D::Error> {
        let mut guard = self.handle.lock().unwrap();
        if guard.is_some() {
            return Ok(());
        }
        let runtime_dir = self.storage.get_runtime_directory();
        std::fs::create_dir_all(&runtime_dir).map_err(|e| {
            ControllerError::Storage(crate::storage::StorageError::io(
                "create runtime directory",
                e,
            ))
        })?;
        let handle = D::open(&runtime_dir).map_err(ControllerError::Db)?;
        *guard = Some(handle);
        Ok(())
    }

    /// Closes the database handle if open. A no-op if already closed.
    pub fn close(&self) -> ControllerResult<(), D::Error> {
        let mut guard = self.handle.lock().unwrap();
        if let Some(handle) = guard.take() {
            D::close(handle).map_err(ControllerError::Db)?;
        }
        Ok(())
    }

    /// Dumps the open database into a freshly reserved pending directory
    /// for `position`. Fails softly — returning `Ok(None)` — if the
    /// database is not open, if no pending directory is needed for this
    /// position, or if the dump itself fails; in the dump-failure case the
    /// pending directory is left on disk for inspection or retry.
    pub fn take_temp_snapshot(&self, position: u64) -> ControllerResult<Option<Snapshot>, D::Error> {
        let guard = self.handle.lock().unwrap();
        let Some(handle) = guard.as_ref() else {
            Logger::error("SNAPSHOT_TAKE_NO_OPEN_DB", &[("position", &position.to_string())]);
            return Ok(None);
        };

        let Some(snapshot) = self.storage.get_pending_snapshot_for(position)? else {
            return Ok(None);
        };

        let started = Instant::now();
        if let Err(e) = D::create_snapshot(handle, &snapshot.path) {
            Logger::warn(
                "SNAPSHOT_DUMP_FAILED",
                &[
                    ("snapshot_id", snapshot.id.as_str()),
                    ("error", &e.to_string()),
                ],
            );
            return Ok(None);
        }
        self.metrics.increment_snapshots_taken();
        self.metrics.observe_snapshot_operation(started.elapsed());

        Ok(Some(snapshot))
    }

    /// `take_temp_snapshot` followed by `commit_snapshot`. If the first
    /// step produces nothing, the second is skipped.
    pub fn take_snapshot(&self, position: u64) -> ControllerResult<Option<Snapshot>, D::Error> {
        let Some(temp) = self.take_temp_snapshot(position)? else {
            return Ok(None);
        };
        self.commit_snapshot(&temp)
    }

    pub fn commit_snapshot(&self, snapshot: &Snapshot) -> ControllerResult<Option<Snapshot>, D::Error> {
        Ok(self.storage.commit_snapshot(snapshot)?)
    }

    /// Splits the latest committed snapshot into chunks and submits them to
    /// `executor` for delivery to `sink`.
    pub fn replicate_latest_snapshot<E: ChunkExecutor>(
        &self,
        sink: Arc<dyn ChunkSink>,
        executor: &E,
    ) -> ControllerResult<bool, D::Error> {
        Ok(replication::replicate_latest_snapshot(
            &self.storage,
            sink,
            executor,
        )?)
    }

    /// Returns the receiver that should be armed against the inbound
    /// transport. Idempotent: always the same instance for this
    /// controller's lifetime.
    pub fn consume_replicated_snapshots(&self) -> Arc<ChunkReceiver> {
        Arc::clone(&self.receiver)
    }

    /// Rebuilds the runtime directory from the newest committed snapshot
    /// that can actually be opened, discarding any newer snapshot that
    /// fails to open along the way.
    ///
    /// Precondition: the database must be closed.
    pub fn recover(&self) -> ControllerResult<(), D::Error> {
        {
            let guard = self.handle.lock().unwrap();
            if guard.is_some() {
                return Err(ControllerError::Precondition(
                    "recover called while database is open".to_string(),
                ));
            }
        }

        let runtime_dir = self.storage.get_runtime_directory();
        fsutil::remove_if_exists(&runtime_dir).map_err(|e| {
            ControllerError::Storage(crate::storage::StorageError::io(
                "remove stale runtime directory",
                e,
            ))
        })?;

        self.metrics.increment_recovery_runs();
        let candidates = self.storage.get_snapshots_newest_first()?;

        if candidates.is_empty() {
            Logger::info("RECOVERY_NO_SNAPSHOTS", &[]);
            return Ok(());
        }

        for candidate in &candidates {
            fsutil::copy_dir_recursive(&candidate.path, &runtime_dir).map_err(|e| {
                ControllerError::Storage(crate::storage::StorageError::io(
                    format!("copy snapshot {} into runtime directory", candidate.id),
                    e,
                ))
            })?;

            match D::open(&runtime_dir) {
                Ok(handle) => {
                    *self.handle.lock().unwrap() = Some(handle);
                    Logger::info(
                        "RECOVERY_SUCCEEDED",
                        &[("snapshot_id", candidate.id.as_str())],
                    );
                    return Ok(());
                }
                Err(e) => {
                    self.metrics.increment_recovery_candidates_rejected();
                    Logger::warn(
                        "RECOVERY_CANDIDATE_REJECTED",
                        &[
                            ("snapshot_id", candidate.id.as_str()),
                            ("error", &e.to_string()),
                        ],
                    );
                    fsutil::remove_if_exists(&runtime_dir).map_err(|e| {
                        ControllerError::Storage(crate::storage::StorageError::io(
                            "remove runtime directory after failed open",
                            e,
                        ))
                    })?;
                    self.storage.remove_snapshot(&candidate.id)?;
                }
            }
        }

        let message = format!(
            "{} committed snapshot(s) existed but none could be opened",
            candidates.len()
        );
        Logger::fatal("RECOVERY_EXHAUSTED", &[("reason", message.as_str())]);
        Err(ControllerError::RecoveryExhausted(message))
    }

    pub fn get_valid_snapshots_count(&self) -> ControllerResult<usize, D::Error> {
        Ok(self.storage.get_snapshots()?.len())
    }

    pub fn get_last_valid_snapshot_directory(&self) -> ControllerResult<Option<PathBuf>, D::Error> {
        Ok(self.storage.get_latest_snapshot()?.map(|s| s.path))
    }

    pub fn storage(&self) -> &Arc<SnapshotStorage> {
        &self.storage
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
