//! Inbound chunk assembly: validates each arriving chunk, accumulates it
//! into a pending directory, and promotes to committed once the whole
//! snapshot has arrived and its checksum verifies.

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use crate::checksum::checksum_files_in_order;
use crate::chunk::SnapshotChunk;
use crate::fsutil;
use crate::metrics::Metrics;
use crate::observability::Logger;
use crate::storage::{Snapshot, SnapshotId, SnapshotStorage};

use super::errors::ReplicationResult;

/// What happened to one inbound chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Written into the pending directory; assembly is not yet complete.
    Accepted,
    /// A file with this chunk's name already exists in the pending
    /// directory; the chunk was ignored.
    Duplicate,
    /// The snapshot was complete and its checksum verified; it has been
    /// promoted to committed.
    Committed,
    /// A checksum mismatch (per-chunk or whole-snapshot) caused the pending
    /// assembly to be discarded.
    Aborted,
}

/// Receiver-side half of replication: the entry point the transport calls
/// once per inbound chunk.
///
/// Per-`snapshotId` assembly is serialized by a single mutex guarding the
/// bookkeeping of in-progress attempts. Different snapshot ids may in
/// principle be assembled concurrently; in practice only one is ever
/// active, so a single coarse lock is sufficient rather than a lock per id.
pub struct ChunkReceiver {
    storage: Arc<SnapshotStorage>,
    metrics: Arc<Metrics>,
    in_progress: Mutex<HashMap<SnapshotId, u64>>,
}

impl ChunkReceiver {
    pub fn new(storage: Arc<SnapshotStorage>, metrics: Arc<Metrics>) -> Self {
        Self {
            storage,
            metrics,
            in_progress: Mutex::new(HashMap::new()),
        }
    }

    /// Ingests one inbound chunk.
    pub fn ingest_chunk(&self, chunk: SnapshotChunk) -> ReplicationResult<IngestOutcome> {
        if !chunk.checksum_matches_content() {
            self.metrics.increment_chunks_received_corrupt();
            self.abort(&chunk.snapshot_id)?;
            Logger::warn(
                "SNAPSHOT_CHUNK_CORRUPT",
                &[
                    ("snapshot_id", chunk.snapshot_id.as_str()),
                    ("chunk_name", chunk.chunk_name.as_str()),
                ],
            );
            return Ok(IngestOutcome::Aborted);
        }

        {
            let mut in_progress = self.in_progress.lock().unwrap();
            if let Some(&prior_checksum) = in_progress.get(&chunk.snapshot_id) {
                if prior_checksum != chunk.snapshot_checksum {
                    in_progress.remove(&chunk.snapshot_id);
                    drop(in_progress);
                    self.abort(&chunk.snapshot_id)?;
                    Logger::warn(
                        "SNAPSHOT_ASSEMBLY_RESTARTED",
                        &[("snapshot_id", chunk.snapshot_id.as_str())],
                    );
                }
            }
        }

        let pending_path = self.storage.pending_directory_for(&chunk.snapshot_id)?;
        fs::create_dir_all(&pending_path)
            .map_err(super::errors::ReplicationError::Io)?;

        let chunk_path = pending_path.join(&chunk.chunk_name);
        if chunk_path.exists() {
            self.metrics.increment_chunks_received_duplicate();
            return Ok(IngestOutcome::Duplicate);
        }

        fsutil::write_durable(&chunk_path, &chunk.content)
            .map_err(super::errors::ReplicationError::Io)?;
        self.metrics.increment_chunks_received_accepted();

        self.in_progress
            .lock()
            .unwrap()
            .insert(chunk.snapshot_id.clone(), chunk.snapshot_checksum);

        let written = fs::read_dir(&pending_path)
            .map_err(super::errors::ReplicationError::Io)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .count() as u32;

        if written < chunk.total_count {
            return Ok(IngestOutcome::Accepted);
        }

        let mut names: Vec<String> = fs::read_dir(&pending_path)
            .map_err(super::errors::ReplicationError::Io)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        let paths: Vec<_> = names.iter().map(|n| pending_path.join(n)).collect();
        let recomputed = checksum_files_in_order(&paths).map_err(super::errors::ReplicationError::Io)?;

        if recomputed != chunk.snapshot_checksum {
            self.metrics.increment_replication_attempts_aborted();
            self.abort(&chunk.snapshot_id)?;
            Logger::warn(
                "SNAPSHOT_ASSEMBLY_CHECKSUM_MISMATCH",
                &[("snapshot_id", chunk.snapshot_id.as_str())],
            );
            return Ok(IngestOutcome::Aborted);
        }

        self.in_progress.lock().unwrap().remove(&chunk.snapshot_id);
        let promoted = self.storage.commit_snapshot(&Snapshot {
            id: chunk.snapshot_id.clone(),
            path: pending_path,
        })?;

        match promoted {
            Some(_) => Ok(IngestOutcome::Committed),
            None => Ok(IngestOutcome::Aborted),
        }
    }

    fn abort(&self, snapshot_id: &str) -> ReplicationResult<()> {
        let pending_path = self.storage.pending_directory_for(snapshot_id)?;
        fsutil::remove_if_exists(&pending_path).map_err(super::errors::ReplicationError::Io)?;
        Ok(())
    }
}
