//! Outbound chunk emission: splits the latest committed snapshot into
//! chunks and hands each to an executor for delivery to a [`ChunkSink`].

use std::fs;
use std::sync::Arc;

use crate::checksum::checksum_files_in_order;
use crate::chunk::SnapshotChunk;
use crate::storage::SnapshotStorage;

use super::errors::ReplicationResult;

/// Runs submitted send tasks. Tasks must be safe to run in parallel — they
/// share only already-computed, immutable data.
pub trait ChunkExecutor {
    fn execute(&self, task: Box<dyn FnOnce() + Send>);
}

/// Runs every task on the calling thread, in submission order. This is the
/// only executor exercised by this crate's own tests and the default a host
/// should reach for unless it has a specific reason to parallelize chunk
/// delivery.
pub struct InlineExecutor;

impl ChunkExecutor for InlineExecutor {
    fn execute(&self, task: Box<dyn FnOnce() + Send>) {
        task();
    }
}

/// Where outbound chunks are pushed. A real implementation wraps a network
/// connection; tests wrap an in-memory channel or a fault-injecting double.
pub trait ChunkSink: Send + Sync {
    fn send(&self, chunk: SnapshotChunk);
}

/// Splits the latest committed snapshot into chunks and submits one send
/// task per chunk to `executor`. Returns `false` without doing anything if
/// no committed snapshot exists yet.
pub fn replicate_latest_snapshot<E: ChunkExecutor>(
    storage: &SnapshotStorage,
    sink: Arc<dyn ChunkSink>,
    executor: &E,
) -> ReplicationResult<bool> {
    let Some(snapshot) = storage.get_latest_snapshot()? else {
        return Ok(false);
    };

    let mut file_names: Vec<String> = fs::read_dir(&snapshot.path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    file_names.sort();

    let paths: Vec<_> = file_names.iter().map(|name| snapshot.path.join(name)).collect();
    let snapshot_checksum = checksum_files_in_order(&paths)?;
    let total_count = file_names.len() as u32;

    for name in file_names {
        let content = fs::read(snapshot.path.join(&name))?;
        let chunk = SnapshotChunk::new(
            snapshot.id.clone(),
            total_count,
            name,
            content,
            snapshot_checksum,
        );
        let sink = Arc::clone(&sink);
        storage.metrics().increment_chunks_sent();
        executor.execute(Box::new(move || sink.send(chunk)));
    }

    Ok(true)
}
