//! # State Sync Flow Tests (qc-04)
//!
//! Wires the store, the service and the task together the way a node does:
//!
//! ```text
//! TrackedStateStore ──→ SharedAccumulator ──→ StateAccumulatorService
//!                                                   │
//!                         peer ←── SnapshotChecksumPayload
//! ```

use qc_04_state_accumulator::{
    encode_record, spawn, AccumulatorConfig, AccumulatorError, ChecksumAuthority,
    ChecksumEnvelope, MutationBatch, PeerAttestation, SharedAccumulator, SnapshotChecksumPayload,
    StateAccumulatorApi, StateAccumulatorService, TrackedStateStore, VerifyError,
};
use std::sync::Arc;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn config() -> AccumulatorConfig {
    AccumulatorConfig::default().with_domain_tag(b"QC-04-SYNC-TEST".to_vec())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A node: store feeding the accumulator behind the service.
fn node() -> (TrackedStateStore<SharedAccumulator>, StateAccumulatorService) {
    let shared = SharedAccumulator::new(config()).unwrap();
    shared.initialize().unwrap();
    let shared = Arc::new(shared);

    let store = TrackedStateStore::new(Arc::clone(&shared));
    let service = StateAccumulatorService::with_accumulator(shared);
    (store, service)
}

// =============================================================================
// DIVERGENCE DETECTION
// =============================================================================

#[test]
fn test_nodes_converge_regardless_of_write_order() {
    init_tracing();
    let (store_a, service_a) = node();
    let (store_b, service_b) = node();

    store_a.put(b"alice", b"100").unwrap();
    store_a.put(b"bob", b"20").unwrap();
    store_a.put(b"alice", b"80").unwrap();

    store_b.put(b"bob", b"20").unwrap();
    store_b.put(b"alice", b"80").unwrap();

    assert_eq!(
        service_a.current_envelope().unwrap(),
        service_b.current_envelope().unwrap()
    );
}

#[test]
fn test_divergent_value_detected() {
    let (store_a, service_a) = node();
    let (store_b, service_b) = node();

    store_a.put(b"alice", b"100").unwrap();
    store_b.put(b"alice", b"101").unwrap();

    assert_ne!(
        service_a.current_checksum().unwrap(),
        service_b.current_checksum().unwrap()
    );
}

// =============================================================================
// SNAPSHOT SYNC
// =============================================================================

#[test]
fn test_snapshot_transfer_with_header_commitment() {
    init_tracing();
    let (source_store, source) = node();
    for i in 0..200u32 {
        source_store
            .put(&i.to_be_bytes(), format!("value-{}", i).as_bytes())
            .unwrap();
    }

    let claim = source.export_snapshot([7; 32], 10).unwrap();
    let wire = claim.to_bytes().unwrap();
    let received = SnapshotChecksumPayload::from_bytes(&wire).unwrap();

    // The header commitment comes from the canonical chain, not the peer.
    let header_commitment = source.current_checksum().unwrap().commitment();
    let records = source_store.records().unwrap();

    let (_, target) = node();
    let verified = target
        .verify_snapshot(
            &records,
            &received.envelope,
            &ChecksumAuthority::HeaderCommitment(header_commitment),
        )
        .unwrap();
    assert_eq!(verified.record_count, 200);

    // Resume the target from the verified envelope and continue in lockstep.
    target.accumulator().resume(&received.envelope).unwrap();
    source_store.put(b"new", b"entry").unwrap();
    target
        .accumulator()
        .add(&encode_record(b"new", b"entry"))
        .unwrap();
    assert_eq!(
        target.current_envelope().unwrap(),
        source.current_envelope().unwrap()
    );
}

#[test]
fn test_forged_snapshot_rejected_by_commitment() {
    let (honest_store, honest) = node();
    honest_store.put(b"alice", b"100").unwrap();
    let header_commitment = honest.current_checksum().unwrap().commitment();

    // A malicious peer serves self-consistent but different state.
    let (forged_store, forged) = node();
    forged_store.put(b"alice", b"1000000").unwrap();
    let forged_claim = forged.current_envelope().unwrap();

    let (_, target) = node();
    let result = target.verify_snapshot(
        &forged_store.records().unwrap(),
        &forged_claim,
        &ChecksumAuthority::HeaderCommitment(header_commitment),
    );
    assert_eq!(result, Err(VerifyError::UntrustedChecksum));
}

#[test]
fn test_peer_quorum_sync() {
    let (store, source) = node();
    store.put(b"k", b"v").unwrap();
    let envelope = source.current_envelope().unwrap();

    let attestations = (1..=3u8)
        .map(|peer| PeerAttestation {
            peer: [peer; 32],
            checksum: envelope.checksum,
        })
        .collect();
    let authority = ChecksumAuthority::PeerQuorum {
        attestations,
        threshold: 3,
    };

    let (_, target) = node();
    assert!(target
        .verify_snapshot(&store.records().unwrap(), &envelope, &authority)
        .is_ok());
}

#[test]
fn test_envelope_wire_format_is_stable() {
    let (store, service) = node();
    store.put(b"k", b"v").unwrap();

    let envelope = service.current_envelope().unwrap();
    let bytes = envelope.to_bytes().unwrap();
    assert_eq!(bytes.len(), 41);
    assert_eq!(ChecksumEnvelope::from_bytes(&bytes).unwrap(), envelope);
}

// =============================================================================
// REORG
// =============================================================================

#[test]
fn test_reorg_reverts_to_parent_checksum() {
    let (_, service) = node();

    let mut block_1 = MutationBatch::new();
    block_1.add(encode_record(b"a", b"1"));
    let parent = service.apply_block([1; 32], 1, &block_1).unwrap();

    let mut block_2 = MutationBatch::new();
    block_2
        .remove(encode_record(b"a", b"1"))
        .add(encode_record(b"a", b"2"))
        .add(encode_record(b"b", b"1"));
    service.apply_block([2; 32], 2, &block_2).unwrap();

    let reverted = service.revert_block([2; 32], 2, &block_2).unwrap();
    assert_eq!(reverted.checksum, parent.checksum);
    assert_eq!(reverted.record_count, 1);
}

// =============================================================================
// TASK OWNERSHIP
// =============================================================================

#[tokio::test]
async fn test_task_agrees_with_shared_accumulator() {
    let (handle, task) = spawn(config()).unwrap();
    let shared = SharedAccumulator::new(config()).unwrap();
    shared.initialize().unwrap();

    let mut batch = MutationBatch::new();
    for i in 0..150u32 {
        batch.add(i.to_le_bytes().to_vec());
    }

    handle.apply_batch(batch.clone()).await.unwrap();
    handle.remove(3u32.to_le_bytes().to_vec()).await.unwrap();
    shared.apply_batch(&batch).unwrap();
    shared.remove(&3u32.to_le_bytes()).unwrap();

    assert_eq!(handle.envelope().await.unwrap(), shared.envelope().unwrap());

    handle.discard().await.unwrap();
    task.await.unwrap();
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_task_preserves_submission_order() {
    let (handle, _task) = spawn(config()).unwrap();

    let mut joins = Vec::new();
    for i in 0..32u8 {
        let handle = handle.clone();
        joins.push(tokio::spawn(async move {
            handle.add(vec![i]).await.unwrap();
            handle.remove(vec![i]).await.unwrap();
        }));
    }
    for join in joins {
        join.await.unwrap();
    }

    let envelope = handle.envelope().await.unwrap();
    assert!(envelope.checksum.is_identity());
    assert_eq!(envelope.record_count, 0);
}

#[tokio::test]
async fn test_discarded_task_rejects_commands() {
    let (handle, task) = spawn(config()).unwrap();
    handle.discard().await.unwrap();
    task.await.unwrap();

    assert!(matches!(
        handle.envelope().await,
        Err(AccumulatorError::Discarded)
    ));
}
