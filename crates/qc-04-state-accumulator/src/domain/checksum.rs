//! # State Checksum & Envelope
//!
//! `Checksum` is the canonical 32-byte encoding of an accumulator value.
//! It must be bit-identical across every node sharing a ledger.
//!
//! `ChecksumEnvelope` is what gets persisted or sent to peers:
//!
//! ```text
//! | format_version: u8 | record_count: u64 LE | checksum: [u8; 32] |   (41 bytes, bincode)
//! ```
//!
//! `commitment()` is the value a header embeds: Keccak256 of the checksum.

use super::config::CHECKSUM_FORMAT_VERSION;
use super::errors::AccumulatorError;
use super::Hash;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use subtle::{Choice, ConstantTimeEq};

/// Size of a checksum: one compressed ristretto255 element.
pub const CHECKSUM_LEN: usize = 32;

/// Size of a bincode-encoded `ChecksumEnvelope`.
pub const ENVELOPE_LEN: usize = 1 + 8 + CHECKSUM_LEN;

/// Canonical accumulator encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
    /// Checksum of the empty state.
    pub const IDENTITY: Checksum = Checksum([0u8; CHECKSUM_LEN]);

    pub fn from_bytes(bytes: [u8; CHECKSUM_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, AccumulatorError> {
        let bytes =
            hex::decode(s).map_err(|e| AccumulatorError::SerializationError(e.to_string()))?;
        let bytes: [u8; CHECKSUM_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            AccumulatorError::SerializationError(format!(
                "checksum must be {} bytes, got {}",
                CHECKSUM_LEN,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Keccak256(checksum), for embedding in an authenticated header.
    pub fn commitment(&self) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(self.0);
        hasher.finalize().into()
    }

    pub fn is_identity(&self) -> bool {
        bool::from(self.ct_eq(&Self::IDENTITY))
    }
}

impl ConstantTimeEq for Checksum {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Checksum {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Checksum plus the metadata carried alongside it on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumEnvelope {
    pub format_version: u8,
    pub record_count: u64,
    pub checksum: Checksum,
}

impl ChecksumEnvelope {
    pub fn new(checksum: Checksum, record_count: u64) -> Self {
        Self {
            format_version: CHECKSUM_FORMAT_VERSION,
            record_count,
            checksum,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AccumulatorError> {
        bincode::serialize(self).map_err(|e| AccumulatorError::SerializationError(e.to_string()))
    }

    /// Decode and check the format version. The checksum itself is not
    /// validated as a group element here; that happens on use.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AccumulatorError> {
        if bytes.len() != ENVELOPE_LEN {
            return Err(AccumulatorError::SerializationError(format!(
                "envelope must be {} bytes, got {}",
                ENVELOPE_LEN,
                bytes.len()
            )));
        }

        let envelope: Self = bincode::deserialize(bytes)
            .map_err(|e| AccumulatorError::SerializationError(e.to_string()))?;

        if envelope.format_version != CHECKSUM_FORMAT_VERSION {
            return Err(AccumulatorError::UnsupportedFormatVersion(
                envelope.format_version,
            ));
        }

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_checksum() {
        assert!(Checksum::IDENTITY.is_identity());
        assert!(!Checksum::from_bytes([1u8; 32]).is_identity());
    }

    #[test]
    fn test_hex_roundtrip() {
        let checksum = Checksum::from_bytes([0xAB; 32]);
        let parsed = Checksum::from_hex(&checksum.to_hex()).unwrap();
        assert_eq!(parsed, checksum);
        assert_eq!(format!("{}", checksum), "ab".repeat(32));
    }

    #[test]
    fn test_from_hex_rejects_short_input() {
        assert!(Checksum::from_hex("abcd").is_err());
        assert!(Checksum::from_hex("zz").is_err());
    }

    #[test]
    fn test_commitment_is_keccak() {
        let checksum = Checksum::from_bytes([0x11; 32]);
        let expected: Hash = Keccak256::digest([0x11u8; 32]).into();
        assert_eq!(checksum.commitment(), expected);
        assert_ne!(
            checksum.commitment(),
            Checksum::from_bytes([0x12; 32]).commitment()
        );
    }

    #[test]
    fn test_envelope_layout() {
        let envelope = ChecksumEnvelope::new(Checksum::from_bytes([0x22; 32]), 7);
        let bytes = envelope.to_bytes().unwrap();

        assert_eq!(bytes.len(), ENVELOPE_LEN);
        assert_eq!(bytes[0], CHECKSUM_FORMAT_VERSION);
        assert_eq!(&bytes[1..9], &7u64.to_le_bytes());
        assert_eq!(&bytes[9..], &[0x22; 32]);

        assert_eq!(ChecksumEnvelope::from_bytes(&bytes).unwrap(), envelope);
    }

    #[test]
    fn test_envelope_rejects_unknown_version() {
        let mut bytes = ChecksumEnvelope::new(Checksum::IDENTITY, 0)
            .to_bytes()
            .unwrap();
        bytes[0] = 2;
        assert!(matches!(
            ChecksumEnvelope::from_bytes(&bytes),
            Err(AccumulatorError::UnsupportedFormatVersion(2))
        ));
    }

    #[test]
    fn test_envelope_rejects_truncated_input() {
        let bytes = ChecksumEnvelope::new(Checksum::IDENTITY, 0)
            .to_bytes()
            .unwrap();
        assert!(ChecksumEnvelope::from_bytes(&bytes[..40]).is_err());
    }
}
