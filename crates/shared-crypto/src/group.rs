//! # Prime-Order Group Abstraction
//!
//! The accumulator only needs a handful of capabilities from its group:
//! identity, addition, negation, a canonical fixed-width encoding and a
//! hash-to-group map. [`PrimeOrderGroup`] names exactly those, so the
//! accumulator logic does not depend on which construction backs it.
//!
//! [`Ristretto255`] is the production group: `curve25519-dalek` provides
//! the constant-time group law and decoding, [`crate::hash_to_group`]
//! provides the map.

use crate::errors::CryptoError;
use crate::field::FieldElement;
use crate::hash_to_group::RistrettoMapper;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::Identity;
use std::fmt::Debug;

/// Size of a canonical ristretto255 encoding.
pub const RISTRETTO_ENCODED_LEN: usize = 32;

/// Capability interface of a prime-order group.
pub trait PrimeOrderGroup: Send + Sync + 'static {
    /// Group element.
    type Element: Copy + Debug + Send + Sync;

    /// Canonical fixed-width encoding.
    type Encoding: AsRef<[u8]> + Copy + Debug + Eq + Send + Sync;

    /// Neutral element; encodes the empty state.
    fn identity() -> Self::Element;

    /// Group law.
    fn add(a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Additive inverse.
    fn negate(a: &Self::Element) -> Self::Element;

    /// Canonical encoding. Equal elements always produce equal bytes.
    fn encode(a: &Self::Element) -> Self::Encoding;

    /// Strict decoding: only canonical encodings of group elements pass.
    fn decode(bytes: &[u8]) -> Result<Self::Element, CryptoError>;

    /// Deterministic hash-to-group under a domain separation tag.
    fn map_to_group(record: &[u8], domain_tag: &[u8]) -> Self::Element;
}

/// ristretto255, backed by `curve25519-dalek`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ristretto255;

impl PrimeOrderGroup for Ristretto255 {
    type Element = RistrettoPoint;
    type Encoding = [u8; RISTRETTO_ENCODED_LEN];

    fn identity() -> RistrettoPoint {
        RistrettoPoint::identity()
    }

    fn add(a: &RistrettoPoint, b: &RistrettoPoint) -> RistrettoPoint {
        a + b
    }

    fn negate(a: &RistrettoPoint) -> RistrettoPoint {
        -a
    }

    fn encode(a: &RistrettoPoint) -> [u8; RISTRETTO_ENCODED_LEN] {
        a.compress().to_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<RistrettoPoint, CryptoError> {
        let encoding: [u8; RISTRETTO_ENCODED_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidEncodingLength {
                    expected: RISTRETTO_ENCODED_LEN,
                    actual: bytes.len(),
                })?;

        // s must be a canonical, non-negative field element
        let s = FieldElement::from_bytes(&encoding);
        if s.to_bytes() != encoding || bool::from(s.is_negative()) {
            return Err(CryptoError::NonCanonicalEncoding);
        }

        CompressedRistretto(encoding)
            .decompress()
            .ok_or(CryptoError::PointNotInGroup)
    }

    fn map_to_group(record: &[u8], domain_tag: &[u8]) -> RistrettoPoint {
        RistrettoMapper::shared().map(record, domain_tag)
    }
}
