//! # Ristretto255 Internals
//!
//! Minimal edwards25519 point arithmetic over [`FieldElement`], enough to run
//! the Elligator map, add its two outputs and canonicalise the result
//! through the ristretto encoding. Group operations on the canonical
//! points are delegated to `curve25519-dalek` (see [`crate::group`]).

pub mod elligator;

use crate::constants::CurveConstants;
use crate::field::FieldElement;
use subtle::{ConditionallyNegatable, ConditionallySelectable};

pub use elligator::elligator_ristretto_flavor;

/// Point in extended twisted Edwards coordinates `(X : Y : Z : T)`,
/// with `x = X/Z`, `y = Y/Z`, `xy = T/Z`.
#[derive(Clone, Copy, Debug)]
pub struct ExtendedPoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t: FieldElement,
}

/// Point in completed coordinates `((X : Z), (Y : T))`, the natural output
/// of the Elligator map and of the addition law.
#[derive(Clone, Copy, Debug)]
pub struct CompletedPoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t: FieldElement,
}

impl CompletedPoint {
    pub fn to_extended(&self) -> ExtendedPoint {
        ExtendedPoint {
            x: self.x * self.t,
            y: self.y * self.z,
            z: self.z * self.t,
            t: self.x * self.y,
        }
    }
}

impl ExtendedPoint {
    pub fn identity() -> Self {
        Self {
            x: FieldElement::ZERO,
            y: FieldElement::ONE,
            z: FieldElement::ONE,
            t: FieldElement::ZERO,
        }
    }

    /// Unified addition (add-2008-hwcd-3, a = -1). Complete on the prime
    /// order subgroup, no exceptional cases.
    pub fn add(&self, other: &Self, constants: &CurveConstants) -> Self {
        let a = (self.y - self.x) * (other.y - other.x);
        let b = (self.y + self.x) * (other.y + other.x);
        let c = self.t * constants.edwards_d2 * other.t;
        let zz = self.z * other.z;
        let d = zz + zz;

        CompletedPoint {
            x: b - a,
            y: b + a,
            z: d + c,
            t: d - c,
        }
        .to_extended()
    }

    /// Canonical ristretto255 encoding. Every representative of the same
    /// ristretto class encodes to the same 32 bytes.
    pub fn compress(&self, constants: &CurveConstants) -> [u8; 32] {
        let mut x = self.x;
        let mut y = self.y;
        let z = self.z;
        let t = self.t;

        let u1 = (z + y) * (z - y);
        let u2 = x * y;
        // u1·u2^2 is always square for valid points; the flag is ignored.
        let (_, invsqrt) =
            FieldElement::sqrt_ratio_i(&FieldElement::ONE, &(u1 * u2.square()), &constants.sqrt_m1);
        let i1 = invsqrt * u1;
        let i2 = invsqrt * u2;
        let z_inv = i1 * (i2 * t);
        let mut den_inv = i2;

        let ix = x * constants.sqrt_m1;
        let iy = y * constants.sqrt_m1;
        let enchanted_denominator = i1 * constants.invsqrt_a_minus_d;

        let rotate = (t * z_inv).is_negative();
        x.conditional_assign(&iy, rotate);
        y.conditional_assign(&ix, rotate);
        den_inv.conditional_assign(&enchanted_denominator, rotate);

        y.conditional_negate((x * z_inv).is_negative());

        (den_inv * (z - y)).abs().to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_compresses_to_zero() {
        let c = CurveConstants::shared();
        assert_eq!(ExtendedPoint::identity().compress(c), [0u8; 32]);
    }

    #[test]
    fn test_identity_is_neutral() {
        let c = CurveConstants::shared();
        let p = elligator_ristretto_flavor(&FieldElement::from_u64(7), c);
        let q = p.add(&ExtendedPoint::identity(), c);
        assert_eq!(p.compress(c), q.compress(c));
    }

    #[test]
    fn test_addition_commutes() {
        let c = CurveConstants::shared();
        let p = elligator_ristretto_flavor(&FieldElement::from_u64(11), c);
        let q = elligator_ristretto_flavor(&FieldElement::from_u64(12), c);
        assert_eq!(p.add(&q, c).compress(c), q.add(&p, c).compress(c));
    }
}
