//! On-disk layout and lifecycle for a partition's snapshots: pending and
//! committed directories, atomic promotion between them, enumeration, and
//! retention pruning.
//!
//! All state here is derived from directory contents and name sort order —
//! there is deliberately no separate manifest file. A committed snapshot's
//! existence and membership are exactly whatever is on disk under
//! `<root>/snapshots/<id>/`.

pub mod errors;

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use errors::{StorageError, StorageResult};

use crate::fsutil;
use crate::metrics::Metrics;
use crate::observability::Logger;

/// A snapshot identifier. In practice the decimal string of the log
/// position the snapshot was captured at.
pub type SnapshotId = String;

/// A committed or pending snapshot: an id plus the directory holding its
/// files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub path: PathBuf,
}

/// Compares two snapshot ids by natural-number value rather than raw
/// lexicographic order, so `"10"` sorts after `"9"`. Ids that fail to parse
/// as an integer (never expected in practice) fall back to lexicographic
/// comparison rather than panicking.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(an), Ok(bn)) => an.cmp(&bn),
        _ => a.cmp(b),
    }
}

fn validate_id(id: &str) -> StorageResult<()> {
    if id.is_empty() || id.contains('/') || id.contains('\\') || id == "." || id == ".." {
        return Err(StorageError::malformed_id(id));
    }
    Ok(())
}

/// Owns every on-disk directory under a partition's root:
/// `runtime/`, `pending/<id>/`, and `snapshots/<id>/`.
pub struct SnapshotStorage {
    root: PathBuf,
    metrics: Arc<Metrics>,
}

impl SnapshotStorage {
    pub fn new(root: impl Into<PathBuf>, metrics: Arc<Metrics>) -> Self {
        Self {
            root: root.into(),
            metrics,
        }
    }

    fn pending_root(&self) -> PathBuf {
        self.root.join("pending")
    }

    fn snapshots_root(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    /// Returns `<root>/pending/<id>`, creating `<root>/pending` if needed.
    /// Idempotent. Returns an error only if `id` is malformed.
    pub fn pending_directory_for(&self, id: &str) -> StorageResult<PathBuf> {
        validate_id(id)?;
        let pending_root = self.pending_root();
        fs::create_dir_all(&pending_root).map_err(|e| {
            StorageError::io(format!("create pending root {}", pending_root.display()), e)
        })?;
        Ok(pending_root.join(id))
    }

    /// Reserves a pending snapshot directory for `position`. Returns `None`
    /// without doing anything if the latest committed snapshot already
    /// covers this position (natural-number comparison), avoiding redundant
    /// work.
    pub fn get_pending_snapshot_for(&self, position: u64) -> StorageResult<Option<Snapshot>> {
        let id = position.to_string();

        if let Some(latest) = self.get_latest_snapshot()? {
            if compare_ids(&latest.id, &id) != Ordering::Less {
                return Ok(None);
            }
        }

        let path = self.pending_directory_for(&id)?;
        fs::create_dir_all(&path)
            .map_err(|e| StorageError::io(format!("create pending dir {}", path.display()), e))?;

        Logger::info(
            "SNAPSHOT_PENDING_RESERVED",
            &[("snapshot_id", id.as_str()), ("path", &path.display().to_string())],
        );

        Ok(Some(Snapshot { id, path }))
    }

    /// Atomically promotes a pending directory to committed. Returns `None`
    /// if the pending directory is missing, or if a committed snapshot with
    /// the same id already exists — in the latter case the pending
    /// directory is removed and a collision is recorded.
    pub fn commit_snapshot(&self, snapshot: &Snapshot) -> StorageResult<Option<Snapshot>> {
        let pending_path = self.pending_directory_for(&snapshot.id)?;
        if !pending_path.exists() {
            return Ok(None);
        }

        let committed_root = self.snapshots_root();
        fs::create_dir_all(&committed_root).map_err(|e| {
            StorageError::io(format!("create snapshots root {}", committed_root.display()), e)
        })?;
        let committed_path = committed_root.join(&snapshot.id);

        if committed_path.exists() {
            fsutil::remove_if_exists(&pending_path)
                .map_err(|e| StorageError::io("remove superseded pending directory", e))?;
            self.metrics.increment_snapshots_commit_collisions();
            Logger::warn(
                "SNAPSHOT_COMMIT_COLLISION",
                &[("snapshot_id", snapshot.id.as_str())],
            );
            return Ok(None);
        }

        fs::rename(&pending_path, &committed_path).map_err(|e| {
            StorageError::io(
                format!(
                    "rename {} to {}",
                    pending_path.display(),
                    committed_path.display()
                ),
                e,
            )
        })?;
        fsutil::fsync_dir(&committed_root)
            .map_err(|e| StorageError::io("fsync snapshots root", e))?;

        self.metrics.increment_snapshots_committed();
        Logger::info(
            "SNAPSHOT_COMMITTED",
            &[("snapshot_id", snapshot.id.as_str())],
        );

        Ok(Some(Snapshot {
            id: snapshot.id.clone(),
            path: committed_path,
        }))
    }

    /// Enumerates committed snapshots. Order is unspecified.
    pub fn get_snapshots(&self) -> StorageResult<Vec<Snapshot>> {
        let root = self.snapshots_root();
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in fs::read_dir(&root)
            .map_err(|e| StorageError::io(format!("read dir {}", root.display()), e))?
        {
            let entry = entry.map_err(|e| StorageError::io("read dir entry", e))?;
            if entry
                .file_type()
                .map_err(|e| StorageError::io("stat dir entry", e))?
                .is_dir()
            {
                let id = entry.file_name().to_string_lossy().into_owned();
                out.push(Snapshot {
                    id,
                    path: entry.path(),
                });
            }
        }
        Ok(out)
    }

    /// Committed snapshots in descending (newest-first) order.
    pub fn get_snapshots_newest_first(&self) -> StorageResult<Vec<Snapshot>> {
        let mut snapshots = self.get_snapshots()?;
        snapshots.sort_by(|a, b| compare_ids(&b.id, &a.id));
        Ok(snapshots)
    }

    /// The committed snapshot with the greatest id, if any.
    pub fn get_latest_snapshot(&self) -> StorageResult<Option<Snapshot>> {
        let snapshots = self.get_snapshots()?;
        Ok(snapshots
            .into_iter()
            .max_by(|a, b| compare_ids(&a.id, &b.id)))
    }

    /// True iff a committed snapshot with this id exists.
    pub fn exists(&self, id: &str) -> bool {
        self.snapshots_root().join(id).is_dir()
    }

    /// Deletes a committed snapshot. Used by recovery to discard a
    /// candidate that failed to open.
    pub fn remove_snapshot(&self, id: &str) -> StorageResult<()> {
        let path = self.snapshots_root().join(id);
        fsutil::remove_if_exists(&path)
            .map_err(|e| StorageError::io(format!("remove snapshot {}", path.display()), e))
    }

    /// The fixed directory the live database occupies while open.
    pub fn get_runtime_directory(&self) -> PathBuf {
        self.root.join("runtime")
    }

    /// Deletes committed snapshots older than the `keep` newest. Returns the
    /// number of directories removed. A no-op if fewer than `keep`
    /// snapshots exist.
    pub fn prune_retained(&self, keep: usize) -> StorageResult<usize> {
        let newest_first = self.get_snapshots_newest_first()?;
        if newest_first.len() <= keep {
            return Ok(0);
        }

        let mut removed = 0;
        for snapshot in &newest_first[keep..] {
            self.remove_snapshot(&snapshot.id)?;
            removed += 1;
        }

        if removed > 0 {
            self.metrics.add_snapshots_pruned(removed as u64);
            Logger::info("SNAPSHOT_PRUNED", &[("count", &removed.to_string())]);
        }

        Ok(removed)
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
