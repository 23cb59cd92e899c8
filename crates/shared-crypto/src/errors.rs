//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Encoded group element has the wrong size
    #[error("Invalid encoding length: expected {expected}, got {actual}")]
    InvalidEncodingLength {
        /// Expected encoding length in bytes
        expected: usize,
        /// Actual encoding length in bytes
        actual: usize,
    },

    /// Bytes are not the canonical encoding of a field element, or encode a
    /// negative field element where a non-negative one is required
    #[error("Non-canonical group element encoding")]
    NonCanonicalEncoding,

    /// Bytes decode to a field element that is not the image of any point in
    /// the prime-order group
    #[error("Encoded point is not in the prime-order group")]
    PointNotInGroup,
}
