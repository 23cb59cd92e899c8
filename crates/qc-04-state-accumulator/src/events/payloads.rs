use crate::domain::{Checksum, ChecksumEnvelope, Hash, MutationBatch};
use serde::{Deserialize, Serialize};

/// Subscribed from Event Bus: record mutations produced by a validated block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStateChangesPayload {
    pub block_hash: Hash,
    pub block_height: u64,
    pub mutations: MutationBatch,
}

/// Published to Event Bus after a block is applied or reverted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChecksumComputedPayload {
    pub block_hash: Hash,
    pub block_height: u64,
    pub checksum: Checksum,
    pub previous_checksum: Checksum,
    /// Keccak256 of `checksum`, for the block header
    pub commitment: Hash,
    pub record_count: u64,
    pub records_added: u64,
    pub records_removed: u64,
    pub computation_time_ms: u64,
}

/// Checksum claim sent alongside a state snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotChecksumPayload {
    pub block_hash: Hash,
    pub block_height: u64,
    pub envelope: ChecksumEnvelope,
}

impl SnapshotChecksumPayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_changes_payload_serde() {
        let mut mutations = MutationBatch::new();
        mutations.add(b"k=v".to_vec()).remove(b"k=old".to_vec());

        let payload = BlockStateChangesPayload {
            block_hash: [0xAB; 32],
            block_height: 42,
            mutations,
        };

        let bytes = bincode::serialize(&payload).unwrap();
        let decoded: BlockStateChangesPayload = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_snapshot_payload_bytes() {
        let payload = SnapshotChecksumPayload {
            block_hash: [1; 32],
            block_height: 9,
            envelope: ChecksumEnvelope::new(Checksum::IDENTITY, 0),
        };
        let decoded = SnapshotChecksumPayload::from_bytes(&payload.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_checksum_payload_json() {
        let payload = StateChecksumComputedPayload {
            block_hash: [2; 32],
            block_height: 1,
            checksum: Checksum::IDENTITY,
            previous_checksum: Checksum::IDENTITY,
            commitment: Checksum::IDENTITY.commitment(),
            record_count: 0,
            records_added: 0,
            records_removed: 0,
            computation_time_ms: 0,
        };
        let json = serde_json::to_string(&payload).unwrap();
        let decoded: StateChecksumComputedPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, payload);
    }
}
