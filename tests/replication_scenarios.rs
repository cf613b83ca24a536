//! End-to-end replication scenarios wiring a sender `SnapshotController`
//! against a receiver `ChunkReceiver` over the in-process transport doubles
//! in `partition_snapshot::testing`. These are the seed scenarios from the
//! snapshot core's test plan: happy-path replication, a corrupting
//! transport, a transport that dies partway through, and a resumed
//! assembly whose prefix was tampered with out-of-band.

use std::fs;
use std::sync::Arc;

use partition_snapshot::replication::{ChunkReceiver, InlineExecutor};
use partition_snapshot::testing::{DirectSink, EvilSink, FlakySink, InMemoryDatabase};
use partition_snapshot::{Metrics, SnapshotChunk, SnapshotController, SnapshotStorage};
use tempfile::TempDir;

fn sender_with_snapshot(
    dir: &TempDir,
    files: &[(&str, &[u8])],
) -> (SnapshotController<InMemoryDatabase>, Arc<SnapshotStorage>) {
    let metrics = Arc::new(Metrics::new());
    let storage = Arc::new(SnapshotStorage::new(dir.path(), Arc::clone(&metrics)));
    let controller: SnapshotController<InMemoryDatabase> =
        SnapshotController::new(Arc::clone(&storage), metrics);
    controller.open_db().unwrap();

    // InMemoryDatabase's create_snapshot only writes a marker file, so the
    // extra fixture files are placed directly into the reserved pending
    // directory before commit to exercise multi-chunk replication.
    let pending = storage.get_pending_snapshot_for(1).unwrap().unwrap();
    fs::create_dir_all(&pending.path).unwrap();
    for (name, content) in files {
        fs::write(pending.path.join(name), content).unwrap();
    }
    storage.commit_snapshot(&pending).unwrap().unwrap();

    (controller, storage)
}

fn receiver_storage(dir: &TempDir) -> (Arc<ChunkReceiver>, Arc<SnapshotStorage>) {
    let metrics = Arc::new(Metrics::new());
    let storage = Arc::new(SnapshotStorage::new(dir.path(), Arc::clone(&metrics)));
    let receiver = Arc::new(ChunkReceiver::new(Arc::clone(&storage), metrics));
    (receiver, storage)
}

#[test]
fn happy_replication_produces_matching_committed_snapshot() {
    let sender_dir = TempDir::new().unwrap();
    let receiver_dir = TempDir::new().unwrap();

    let (sender, sender_storage) = sender_with_snapshot(
        &sender_dir,
        &[("a.dat", b"aaa"), ("b.dat", b"bbb"), ("c.dat", b"ccc")],
    );
    let (receiver, receiver_storage) = receiver_storage(&receiver_dir);
    let sink = Arc::new(DirectSink::new(Arc::clone(&receiver)));

    let replicated = sender
        .replicate_latest_snapshot(sink, &InlineExecutor)
        .unwrap();
    assert!(replicated);

    assert!(receiver_storage.exists("1"));
    let sender_snapshot = sender_storage.get_latest_snapshot().unwrap().unwrap();
    let receiver_snapshot = receiver_storage.get_latest_snapshot().unwrap().unwrap();

    let mut sender_names: Vec<_> = fs::read_dir(&sender_snapshot.path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    let mut receiver_names: Vec<_> = fs::read_dir(&receiver_snapshot.path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    sender_names.sort();
    receiver_names.sort();
    assert_eq!(sender_names, receiver_names);

    for name in &sender_names {
        assert_eq!(
            fs::read(sender_snapshot.path.join(name)).unwrap(),
            fs::read(receiver_snapshot.path.join(name)).unwrap(),
        );
    }
}

#[test]
fn corrupted_chunk_never_yields_a_committed_snapshot() {
    let sender_dir = TempDir::new().unwrap();
    let receiver_dir = TempDir::new().unwrap();

    let (sender, _sender_storage) = sender_with_snapshot(
        &sender_dir,
        &[("a.dat", b"aaa"), ("b.dat", b"bbb"), ("c.dat", b"ccc")],
    );
    let (receiver, receiver_storage) = receiver_storage(&receiver_dir);
    let sink = Arc::new(EvilSink::new(Arc::clone(&receiver)));

    let replicated = sender
        .replicate_latest_snapshot(sink, &InlineExecutor)
        .unwrap();
    assert!(replicated);

    assert!(!receiver_storage.exists("1"));
    let pending = receiver_storage.pending_directory_for("1").unwrap();
    assert!(!pending.exists());
}

#[test]
fn flaky_transport_leaves_a_partial_pending_directory() {
    let sender_dir = TempDir::new().unwrap();
    let receiver_dir = TempDir::new().unwrap();

    let (sender, _sender_storage) = sender_with_snapshot(
        &sender_dir,
        &[("a.dat", b"aaa"), ("b.dat", b"bbb"), ("c.dat", b"ccc")],
    );
    let (receiver, receiver_storage) = receiver_storage(&receiver_dir);
    let sink = Arc::new(FlakySink::new(Arc::clone(&receiver), 2));

    let replicated = sender
        .replicate_latest_snapshot(sink, &InlineExecutor)
        .unwrap();
    assert!(replicated);

    assert!(!receiver_storage.exists("1"));
    let pending = receiver_storage.pending_directory_for("1").unwrap();
    assert!(pending.exists());

    let mut written: Vec<_> = fs::read_dir(&pending)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["a.dat".to_string(), "b.dat".to_string()]);
}

#[test]
fn resumed_assembly_with_tampered_prefix_aborts_on_checksum_mismatch() {
    let receiver_dir = TempDir::new().unwrap();
    let (receiver, receiver_storage) = receiver_storage(&receiver_dir);

    let checksum = partition_snapshot::checksum::checksum_bytes(b"aaabbbccc");
    let chunks = vec![
        SnapshotChunk::new("1", 3, "a.dat", b"aaa".to_vec(), checksum),
        SnapshotChunk::new("1", 3, "b.dat", b"bbb".to_vec(), checksum),
        SnapshotChunk::new("1", 3, "c.dat", b"ccc".to_vec(), checksum),
    ];

    // Deliver all but the last chunk, then delete one of the already-written
    // files out-of-band before the remaining chunk arrives — simulating an
    // interrupted transfer whose prefix was disturbed between attempts.
    for chunk in &chunks[..2] {
        receiver.ingest_chunk(chunk.clone()).unwrap();
    }

    let pending = receiver_storage.pending_directory_for("1").unwrap();
    fs::remove_file(pending.join("a.dat")).unwrap();
    fs::write(pending.join("a.dat"), b"AAA").unwrap();

    let outcome = receiver.ingest_chunk(chunks[2].clone()).unwrap();
    assert_eq!(
        outcome,
        partition_snapshot::replication::IngestOutcome::Aborted
    );
    assert!(!receiver_storage.exists("1"));
    assert!(!pending.exists());
}
