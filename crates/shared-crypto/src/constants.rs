//! # Curve Constants
//!
//! Immutable constant table for edwards25519 / ristretto255, derived once
//! from the curve definition `-x^2 + y^2 = 1 + d x^2 y^2`, `d = -121665/121666`.
//!
//! The table is handed to the mapper and the point arithmetic by shared
//! reference. `CurveConstants::shared()` returns the process-wide instance;
//! tests and alternative backends can build their own with `new()`.

use crate::field::FieldElement;

lazy_static::lazy_static! {
    static ref SHARED_CONSTANTS: CurveConstants = CurveConstants::new();
}

/// Field constants used by the Elligator map and ristretto encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveConstants {
    /// Edwards `d`.
    pub edwards_d: FieldElement,
    /// `2d`, used by the extended addition law.
    pub edwards_d2: FieldElement,
    /// `sqrt(-1) = 2^((p-1)/4)`.
    pub sqrt_m1: FieldElement,
    /// `1 - d^2`.
    pub one_minus_d_sq: FieldElement,
    /// `(d - 1)^2`.
    pub d_minus_one_sq: FieldElement,
    /// `sqrt(a*d - 1)` with `a = -1`; the negative (odd) root.
    pub sqrt_ad_minus_one: FieldElement,
    /// `1 / sqrt(a - d)`; the non-negative root.
    pub invsqrt_a_minus_d: FieldElement,
}

impl CurveConstants {
    /// Derive the table from first principles.
    pub fn new() -> Self {
        let one = FieldElement::ONE;
        let edwards_d =
            -(FieldElement::from_u64(121_665) * FieldElement::from_u64(121_666).invert());

        // (p-1)/4 = 2·(p-5)/8 + 1
        let two = FieldElement::from_u64(2);
        let sqrt_m1 = two.pow_p58().square() * two;

        // With a = -1 both a·d - 1 and a - d equal -1 - d.
        let minus_one_minus_d = -one - edwards_d;
        let (_, ad_minus_one_root) =
            FieldElement::sqrt_ratio_i(&minus_one_minus_d, &one, &sqrt_m1);
        let (_, invsqrt_a_minus_d) =
            FieldElement::sqrt_ratio_i(&one, &minus_one_minus_d, &sqrt_m1);

        let d_minus_one = edwards_d - one;

        Self {
            edwards_d,
            edwards_d2: edwards_d + edwards_d,
            sqrt_m1,
            one_minus_d_sq: one - edwards_d.square(),
            d_minus_one_sq: d_minus_one.square(),
            sqrt_ad_minus_one: -ad_minus_one_root,
            invsqrt_a_minus_d,
        }
    }

    /// Process-wide table, built on first use.
    pub fn shared() -> &'static CurveConstants {
        &SHARED_CONSTANTS
    }
}

impl Default for CurveConstants {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edwards_d_definition() {
        let c = CurveConstants::new();
        let lhs = c.edwards_d * FieldElement::from_u64(121_666);
        assert_eq!(lhs, -FieldElement::from_u64(121_665));
        assert_eq!(c.edwards_d2, c.edwards_d * FieldElement::from_u64(2));
    }

    #[test]
    fn test_sqrt_m1_squares_to_minus_one() {
        let c = CurveConstants::new();
        assert_eq!(c.sqrt_m1.square(), -FieldElement::ONE);
        assert!(!bool::from(c.sqrt_m1.is_negative()));
    }

    #[test]
    fn test_derived_squares() {
        let c = CurveConstants::new();
        let one = FieldElement::ONE;
        let minus_one_minus_d = -one - c.edwards_d;

        assert_eq!(c.sqrt_ad_minus_one.square(), minus_one_minus_d);
        assert!(bool::from(c.sqrt_ad_minus_one.is_negative()));

        assert_eq!(c.invsqrt_a_minus_d.square() * minus_one_minus_d, one);
        assert!(!bool::from(c.invsqrt_a_minus_d.is_negative()));

        assert_eq!(c.one_minus_d_sq, one - c.edwards_d * c.edwards_d);
        assert_eq!(c.d_minus_one_sq, (c.edwards_d - one) * (c.edwards_d - one));
    }

    #[test]
    fn test_shared_is_stable() {
        let a = CurveConstants::shared();
        let b = CurveConstants::shared();
        assert!(std::ptr::eq(a, b));
        assert_eq!(*a, CurveConstants::new());
    }
}
