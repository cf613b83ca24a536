//! Fault-injecting test doubles for the `Database` and `ChunkSink` traits.
//!
//! These are not behind `#[cfg(test)]` because integration tests living
//! outside this crate (under `tests/`) need them too, exactly the way the
//! rest of this lineage keeps its deterministic-failure doubles reachable
//! from its own crash/invariant test suites.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::chunk::SnapshotChunk;
use crate::db::Database;
use crate::replication::{ChunkReceiver, ChunkSink};

/// A trivial database that persists one marker file per directory. Opening
/// creates the marker if absent; snapshotting copies it.
pub struct InMemoryDatabase;

impl Database for InMemoryDatabase {
    type Handle = PathBuf;
    type Error = io::Error;

    fn open(directory: &Path) -> Result<PathBuf, io::Error> {
        fs::create_dir_all(directory)?;
        let marker = directory.join("marker");
        if !marker.exists() {
            fs::write(&marker, b"open")?;
        }
        Ok(directory.to_path_buf())
    }

    fn create_snapshot(handle: &PathBuf, target_directory: &Path) -> Result<(), io::Error> {
        fs::create_dir_all(target_directory)?;
        fs::copy(handle.join("marker"), target_directory.join("marker"))?;
        Ok(())
    }

    fn close(_handle: PathBuf) -> Result<(), io::Error> {
        Ok(())
    }
}

/// Behaves like [`InMemoryDatabase`] except `open` fails whenever the
/// target directory's marker file is missing or unreadable — used to
/// simulate a corrupt snapshot during recovery.
pub struct FlakyOpenDatabase;

impl Database for FlakyOpenDatabase {
    type Handle = PathBuf;
    type Error = io::Error;

    fn open(directory: &Path) -> Result<PathBuf, io::Error> {
        let marker = directory.join("marker");
        if !marker.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "snapshot is missing its marker file",
            ));
        }
        Ok(directory.to_path_buf())
    }

    fn create_snapshot(handle: &PathBuf, target_directory: &Path) -> Result<(), io::Error> {
        InMemoryDatabase::create_snapshot(handle, target_directory)
    }

    fn close(_handle: PathBuf) -> Result<(), io::Error> {
        Ok(())
    }
}

/// Never opens successfully. Used to exercise the case where every
/// committed snapshot is corrupt.
pub struct FailingDatabase;

impl Database for FailingDatabase {
    type Handle = ();
    type Error = io::Error;

    fn open(_directory: &Path) -> Result<(), io::Error> {
        Err(io::Error::new(io::ErrorKind::Other, "database refuses to open"))
    }

    fn create_snapshot(_handle: &(), _target_directory: &Path) -> Result<(), io::Error> {
        Ok(())
    }

    fn close(_handle: ()) -> Result<(), io::Error> {
        Ok(())
    }
}

/// Delivers every chunk to the wrapped receiver unmodified.
pub struct DirectSink {
    pub receiver: Arc<ChunkReceiver>,
}

impl DirectSink {
    pub fn new(receiver: Arc<ChunkReceiver>) -> Self {
        Self { receiver }
    }
}

impl ChunkSink for DirectSink {
    fn send(&self, chunk: SnapshotChunk) {
        let _ = self.receiver.ingest_chunk(chunk);
    }
}

/// Delivers the first chunk untouched, then zeroes the per-chunk checksum
/// of every subsequent chunk before delivering it — simulating a transport
/// that corrupts data in flight.
pub struct EvilSink {
    receiver: Arc<ChunkReceiver>,
    delivered: Mutex<u32>,
}

impl EvilSink {
    pub fn new(receiver: Arc<ChunkReceiver>) -> Self {
        Self {
            receiver,
            delivered: Mutex::new(0),
        }
    }
}

impl ChunkSink for EvilSink {
    fn send(&self, mut chunk: SnapshotChunk) {
        let mut delivered = self.delivered.lock().unwrap();
        *delivered += 1;
        if *delivered >= 2 {
            chunk.checksum = 0;
        }
        drop(delivered);
        let _ = self.receiver.ingest_chunk(chunk);
    }
}

/// Delivers only the first `max_delivered` chunks it is given and silently
/// drops the rest — simulating a connection that dies partway through.
pub struct FlakySink {
    receiver: Arc<ChunkReceiver>,
    max_delivered: u32,
    delivered: Mutex<u32>,
}

impl FlakySink {
    pub fn new(receiver: Arc<ChunkReceiver>, max_delivered: u32) -> Self {
        Self {
            receiver,
            max_delivered,
            delivered: Mutex::new(0),
        }
    }
}

impl ChunkSink for FlakySink {
    fn send(&self, chunk: SnapshotChunk) {
        let mut delivered = self.delivered.lock().unwrap();
        if *delivered >= self.max_delivered {
            return;
        }
        *delivered += 1;
        drop(delivered);
        let _ = self.receiver.ingest_chunk(chunk);
    }
}
