//! State Accumulator Service
//!
//! Implements `StateAccumulatorApi` on top of a `SharedAccumulator`, keeping
//! a per-height checksum history so reorgs and sync requests can be served.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::shared::SharedAccumulator;
use crate::domain::{
    AccumulatorConfig, AccumulatorError, Checksum, ChecksumAuthority, ChecksumEnvelope, Hash,
    MutationBatch, SnapshotVerifier, VerifiedSnapshot, VerifyError,
};
use crate::events::{BlockStateChangesPayload, SnapshotChecksumPayload, StateChecksumComputedPayload};
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::StateAccumulatorApi;

pub struct StateAccumulatorService {
    accumulator: Arc<SharedAccumulator>,
    verifier: SnapshotVerifier,
    /// Checksum after each applied block, by height
    checksums: RwLock<BTreeMap<u64, Checksum>>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl StateAccumulatorService {
    /// Create a service over a fresh accumulator at the identity.
    pub fn new(config: AccumulatorConfig) -> Result<Self, AccumulatorError> {
        let accumulator = SharedAccumulator::new(config)?;
        accumulator.initialize()?;
        Ok(Self::with_accumulator(Arc::new(accumulator)))
    }

    /// Wrap an existing (already initialized or resumed) accumulator.
    pub fn with_accumulator(accumulator: Arc<SharedAccumulator>) -> Self {
        let verifier = SnapshotVerifier::from_config(accumulator.config());
        Self {
            accumulator,
            verifier,
            checksums: RwLock::new(BTreeMap::new()),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn accumulator(&self) -> &Arc<SharedAccumulator> {
        &self.accumulator
    }

    /// Handle a `BlockStateChanges` event from the bus.
    pub fn handle_block_changes(
        &self,
        payload: &BlockStateChangesPayload,
    ) -> Result<StateChecksumComputedPayload, AccumulatorError> {
        self.apply_block(payload.block_hash, payload.block_height, &payload.mutations)
    }

    /// Checksum claim to send with a snapshot of the current state.
    pub fn export_snapshot(
        &self,
        block_hash: Hash,
        block_height: u64,
    ) -> Result<SnapshotChecksumPayload, AccumulatorError> {
        Ok(SnapshotChecksumPayload {
            block_hash,
            block_height,
            envelope: self.accumulator.envelope()?,
        })
    }

    /// Apply or revert a block. The history lock is held across the
    /// accumulator update so heights are recorded in application order.
    fn transition(
        &self,
        block_hash: Hash,
        block_height: u64,
        batch: &MutationBatch,
        revert: bool,
    ) -> Result<StateChecksumComputedPayload, AccumulatorError> {
        let start_time = Instant::now();

        let mut checksums = self
            .checksums
            .write()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;

        let outcome = if revert {
            self.accumulator.revert_batch_tracked(batch)?
        } else {
            self.accumulator.apply_batch_tracked(batch)?
        };

        if revert {
            checksums.retain(|height, _| *height < block_height);
        } else {
            checksums.insert(block_height, outcome.checksum);
        }
        drop(checksums);

        let (records_added, records_removed) = if revert {
            (batch.removals(), batch.additions())
        } else {
            (batch.additions(), batch.removals())
        };

        info!(
            "[qc-04] {} block #{}: checksum {} ({} records)",
            if revert { "Reverted" } else { "Applied" },
            block_height,
            outcome.checksum,
            outcome.record_count
        );

        Ok(StateChecksumComputedPayload {
            block_hash,
            block_height,
            checksum: outcome.checksum,
            previous_checksum: outcome.previous,
            commitment: outcome.checksum.commitment(),
            record_count: outcome.record_count,
            records_added: records_added as u64,
            records_removed: records_removed as u64,
            computation_time_ms: elapsed_ms(start_time.elapsed()),
        })
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl StateAccumulatorApi for StateAccumulatorService {
    fn apply_block(
        &self,
        block_hash: Hash,
        block_height: u64,
        batch: &MutationBatch,
    ) -> Result<StateChecksumComputedPayload, AccumulatorError> {
        self.transition(block_hash, block_height, batch, false)
    }

    fn revert_block(
        &self,
        block_hash: Hash,
        block_height: u64,
        batch: &MutationBatch,
    ) -> Result<StateChecksumComputedPayload, AccumulatorError> {
        self.transition(block_hash, block_height, batch, true)
    }

    fn current_checksum(&self) -> Result<Checksum, AccumulatorError> {
        self.accumulator.checksum()
    }

    fn current_envelope(&self) -> Result<ChecksumEnvelope, AccumulatorError> {
        self.accumulator.envelope()
    }

    fn checksum_at(&self, block_height: u64) -> Result<Option<Checksum>, AccumulatorError> {
        let checksums = self
            .checksums
            .read()
            .map_err(|_| AccumulatorError::ConcurrencyViolation)?;
        Ok(checksums.get(&block_height).copied())
    }

    fn verify_snapshot(
        &self,
        records: &[Vec<u8>],
        envelope: &ChecksumEnvelope,
        authority: &ChecksumAuthority,
    ) -> Result<VerifiedSnapshot, VerifyError> {
        let result = self.verifier.verify(records, envelope, authority);
        self.metrics.record_verification(result.is_ok());

        match &result {
            Ok(verified) => info!(
                "[qc-04] Snapshot verified: {} ({} records)",
                verified.checksum, verified.record_count
            ),
            Err(e) => warn!("[qc-04] Snapshot rejected: {}", e),
        }
        result
    }
}
