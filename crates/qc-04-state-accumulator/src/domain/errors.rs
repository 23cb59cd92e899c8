use super::Checksum;
use shared_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccumulatorError {
    #[error("Checksum decode failed: {0}")]
    Decode(#[from] CryptoError),

    /// Lock poisoned by a panic mid-mutation; the state can no longer be trusted.
    #[error("Concurrency violation: accumulator lock poisoned")]
    ConcurrencyViolation,

    #[error("Accumulator used before initialize")]
    Uninitialized,

    #[error("Accumulator already discarded")]
    Discarded,

    #[error("Domain tag mismatch: cannot combine accumulators over different tags")]
    DomainTagMismatch,

    #[error("Unsupported checksum format version: {0}")]
    UnsupportedFormatVersion(u8),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Accumulator task channel closed")]
    ChannelClosed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons a transferred snapshot is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("Claimed checksum does not decode: {0}")]
    Decode(#[from] CryptoError),

    #[error("Unsupported checksum format version: {0}")]
    UnsupportedFormatVersion(u8),

    #[error("Claimed checksum does not match the authenticated commitment")]
    UntrustedChecksum,

    #[error("Insufficient peer quorum: {agreeing} agreeing, {required} required")]
    InsufficientQuorum { agreeing: usize, required: usize },

    #[error("Record count mismatch: claimed {claimed}, received {actual}")]
    RecordCountMismatch { claimed: u64, actual: u64 },

    #[error("Checksum mismatch: claimed {claimed}, recomputed {recomputed}")]
    ChecksumMismatch {
        claimed: Checksum,
        recomputed: Checksum,
    },
}
