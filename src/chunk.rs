//! Wire representation of one file of a snapshot.

use serde::{Deserialize, Serialize};

/// One file of a snapshot, carrying enough metadata for a receiver to
/// validate it on arrival and detect when an entire snapshot has been
/// assembled without ever consulting a separate manifest.
///
/// Every chunk belonging to the same snapshot carries identical
/// `snapshot_id`, `total_count`, and `snapshot_checksum`; only `chunk_name`,
/// `content`, and `checksum` vary per chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotChunk {
    pub snapshot_id: String,
    pub total_count: u32,
    pub chunk_name: String,
    pub content: Vec<u8>,
    pub checksum: u64,
    pub snapshot_checksum: u64,
}

impl SnapshotChunk {
    /// Builds a chunk, computing its per-chunk checksum from `content`.
    /// `snapshot_checksum` must already be known by the caller (it is
    /// computed once per snapshot, not per chunk).
    pub fn new(
        snapshot_id: impl Into<String>,
        total_count: u32,
        chunk_name: impl Into<String>,
        content: Vec<u8>,
        snapshot_checksum: u64,
    ) -> Self {
        let checksum = crate::checksum::checksum_bytes(&content);
        Self {
            snapshot_id: snapshot_id.into(),
            total_count,
            chunk_name: chunk_name.into(),
            content,
            checksum,
            snapshot_checksum,
        }
    }

    /// True iff the carried checksum matches a fresh computation over
    /// `content`. This is the first validation a receiver performs on every
    /// inbound chunk.
    pub fn checksum_matches_content(&self) -> bool {
        crate::checksum::checksum_bytes(&self.content) == self.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_matching_checksum() {
        let chunk = SnapshotChunk::new("1", 3, "storage.dat", b"abc".to_vec(), 42);
        assert!(chunk.checksum_matches_content());
    }

    #[test]
    fn tampered_content_fails_checksum_check() {
        let mut chunk = SnapshotChunk::new("1", 3, "storage.dat", b"abc".to_vec(), 42);
        chunk.content = b"xyz".to_vec();
        assert!(!chunk.checksum_matches_content());
    }

    #[test]
    fn tampered_checksum_fails_check() {
        let mut chunk = SnapshotChunk::new("1", 3, "storage.dat", b"abc".to_vec(), 42);
        chunk.checksum = 0;
        assert!(!chunk.checksum_matches_content());
    }
}
