//! Snapshot lifecycle, chunked replication, and crash recovery for a single
//! partition's embedded key-value store.
//!
//! This crate owns the on-disk pending/committed directory lifecycle
//! ([`storage`]), the checksum and wire-chunk representation used to move a
//! snapshot between nodes ([`checksum`], [`chunk`]), the sender/receiver pair
//! that performs that move with end-to-end integrity checking
//! ([`replication`]), and the controller that orchestrates the whole thing
//! against an externally supplied key-value store ([`controller`], [`db`]).
//!
//! # What this crate does not do
//!
//! It never inspects the bytes of a snapshot beyond checksumming them, never
//! performs incremental/delta snapshots, never compacts beyond the retention
//! bound a caller configures, never encrypts snapshot contents, and never
//! decides whether a replication peer is authorized to receive one. Those
//! are the concern of the embedded store, the operator, and the transport,
//! respectively.

pub mod checksum;
pub mod chunk;
pub mod config;
pub mod controller;
pub mod db;
pub mod fsutil;
pub mod metrics;
pub mod observability;
pub mod replication;
pub mod storage;
pub mod testing;

pub use chunk::SnapshotChunk;
pub use config::SnapshotConfig;
pub use controller::{ControllerError, SnapshotController};
pub use db::Database;
pub use metrics::Metrics;
pub use replication::{ChunkExecutor, ChunkReceiver, ChunkSink, IngestOutcome, InlineExecutor};
pub use storage::{Snapshot, SnapshotId, SnapshotStorage};

