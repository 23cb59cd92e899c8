use crate::domain::{
    AccumulatorError, Checksum, ChecksumAuthority, ChecksumEnvelope, Hash, MutationBatch,
    VerifiedSnapshot, VerifyError,
};
use crate::events::StateChecksumComputedPayload;

/// Primary API for the state accumulator
pub trait StateAccumulatorApi: Send + Sync {
    // === Block Application ===

    /// Apply a validated block's mutations and publish the new checksum.
    fn apply_block(
        &self,
        block_hash: Hash,
        block_height: u64,
        batch: &MutationBatch,
    ) -> Result<StateChecksumComputedPayload, AccumulatorError>;

    /// Undo a block previously passed to `apply_block` (reorg).
    fn revert_block(
        &self,
        block_hash: Hash,
        block_height: u64,
        batch: &MutationBatch,
    ) -> Result<StateChecksumComputedPayload, AccumulatorError>;

    // === Checksum ===

    fn current_checksum(&self) -> Result<Checksum, AccumulatorError>;

    fn current_envelope(&self) -> Result<ChecksumEnvelope, AccumulatorError>;

    fn checksum_at(&self, block_height: u64) -> Result<Option<Checksum>, AccumulatorError>;

    // === Snapshot Sync ===

    fn verify_snapshot(
        &self,
        records: &[Vec<u8>],
        envelope: &ChecksumEnvelope,
        authority: &ChecksumAuthority,
    ) -> Result<VerifiedSnapshot, VerifyError>;
}
