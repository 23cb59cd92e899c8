//! # Hash-to-Group
//!
//! `map(record, domain_tag)` turns an arbitrary byte string into a
//! ristretto255 element:
//!
//! 1. `expand_message_xof` (SHAKE-256) stretches the record under the domain
//!    tag into 64 uniform bytes.
//! 2. Each 32-byte half becomes a field element and goes through the
//!    Elligator map.
//! 3. The two points are added and canonicalised through the ristretto
//!    encoding.
//!
//! The map is total (empty records included), deterministic, and its output
//! is statistically close to uniform over the group. A single Elligator
//! evaluation only reaches about half of the group, hence two.

use crate::constants::CurveConstants;
use crate::field::FieldElement;
use crate::ristretto::elligator_ristretto_flavor;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::Shake256;

/// Bytes of XOF output consumed per mapped record.
pub const UNIFORM_BYTES_LEN: usize = 64;

/// Longest domain tag used verbatim.
const MAX_DST_LEN: usize = 255;

/// Oversize tags are hashed down to this many bytes (k = 128).
const REDUCED_DST_LEN: usize = 32;

const OVERSIZE_DST_PREFIX: &[u8] = b"H2C-OVERSIZE-DST-";

/// `expand_message_xof` with SHAKE-256, fixed 64-byte output.
///
/// `msg || I2OSP(64, 2) || DST || I2OSP(len(DST), 1)`
pub fn expand_message_xof(msg: &[u8], domain_tag: &[u8]) -> [u8; UNIFORM_BYTES_LEN] {
    let mut reduced = [0u8; REDUCED_DST_LEN];
    let dst: &[u8] = if domain_tag.len() > MAX_DST_LEN {
        let mut hasher = Shake256::default();
        hasher.update(OVERSIZE_DST_PREFIX);
        hasher.update(domain_tag);
        hasher.finalize_xof().read(&mut reduced);
        &reduced
    } else {
        domain_tag
    };

    let mut hasher = Shake256::default();
    hasher.update(msg);
    hasher.update(&(UNIFORM_BYTES_LEN as u16).to_be_bytes());
    hasher.update(dst);
    hasher.update(&[dst.len() as u8]);

    let mut out = [0u8; UNIFORM_BYTES_LEN];
    hasher.finalize_xof().read(&mut out);
    out
}

/// Stateless record-to-point mapper bound to a constant table.
///
/// Cheap to copy; share one across threads for the parallel map phase.
#[derive(Clone, Copy, Debug)]
pub struct RistrettoMapper<'c> {
    constants: &'c CurveConstants,
}

impl<'c> RistrettoMapper<'c> {
    /// Create a mapper over an explicit constant table.
    pub fn new(constants: &'c CurveConstants) -> Self {
        Self { constants }
    }

    /// Map a record under a domain separation tag.
    pub fn map(&self, record: &[u8], domain_tag: &[u8]) -> RistrettoPoint {
        self.map_uniform_bytes(&expand_message_xof(record, domain_tag))
    }

    /// One-way map from 64 uniform bytes, each half through Elligator.
    pub fn map_uniform_bytes(&self, bytes: &[u8; UNIFORM_BYTES_LEN]) -> RistrettoPoint {
        let mut lo = [0u8; 32];
        let mut hi = [0u8; 32];
        lo.copy_from_slice(&bytes[..32]);
        hi.copy_from_slice(&bytes[32..]);

        let p1 = elligator_ristretto_flavor(&FieldElement::from_bytes(&lo), self.constants);
        let p2 = elligator_ristretto_flavor(&FieldElement::from_bytes(&hi), self.constants);
        let encoded = p1.add(&p2, self.constants).compress(self.constants);

        CompressedRistretto(encoded)
            .decompress()
            .expect("ristretto encoding of a mapped point always decodes")
    }
}

impl RistrettoMapper<'static> {
    /// Mapper over the process-wide constant table.
    pub fn shared() -> Self {
        Self::new(CurveConstants::shared())
    }
}

/// Map a record with the shared constant table.
pub fn hash_to_ristretto(record: &[u8], domain_tag: &[u8]) -> RistrettoPoint {
    RistrettoMapper::shared().map(record, domain_tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::traits::Identity;
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    const TAG: &[u8] = b"QC-TEST-V1_XOF:SHAKE256_R255MAP_RO_";

    #[test]
    fn test_matches_reference_one_way_map() {
        let mapper = RistrettoMapper::shared();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        let mut inputs = vec![[0u8; 64], [0xffu8; 64]];
        for _ in 0..64 {
            let mut bytes = [0u8; 64];
            rng.fill_bytes(&mut bytes);
            inputs.push(bytes);
        }

        for bytes in &inputs {
            assert_eq!(
                mapper.map_uniform_bytes(bytes),
                RistrettoPoint::from_uniform_bytes(bytes),
                "mismatch for input {}",
                hex::encode(bytes)
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let a = hash_to_ristretto(b"record", TAG);
        let b = hash_to_ristretto(b"record", TAG);
        assert_eq!(a.compress(), b.compress());
    }

    #[test]
    fn test_empty_record_is_mapped() {
        let p = hash_to_ristretto(b"", TAG);
        assert_ne!(p, RistrettoPoint::identity());
    }

    #[test]
    fn test_domain_separation() {
        let a = hash_to_ristretto(b"record", b"TAG-A");
        let b = hash_to_ristretto(b"record", b"TAG-B");
        assert_ne!(a, b);
    }

    #[test]
    fn test_expand_depends_on_every_input() {
        let base = expand_message_xof(b"abc", TAG);
        assert_ne!(base, expand_message_xof(b"abd", TAG));
        assert_ne!(base, expand_message_xof(b"abc", b"OTHER"));
        // Moving a byte between message and tag must not collide.
        assert_ne!(
            expand_message_xof(b"ab", b"cTAG"),
            expand_message_xof(b"abc", b"TAG")
        );
    }

    #[test]
    fn test_oversize_tag() {
        let long_tag = vec![0x42u8; 300];
        let a = hash_to_ristretto(b"record", &long_tag);
        let b = hash_to_ristretto(b"record", &long_tag);
        assert_eq!(a, b);
        assert_ne!(a, hash_to_ristretto(b"record", &long_tag[..255]));
    }

    #[test]
    fn test_explicit_table_matches_shared() {
        let table = CurveConstants::new();
        let local = RistrettoMapper::new(&table);
        assert_eq!(local.map(b"x", TAG), RistrettoMapper::shared().map(b"x", TAG));
    }
}
