//! # Elligator (ristretto flavour)
//!
//! Maps one field element `r0` to a curve point.
//!
//! ```text
//! r   = i·r0²
//! N_s = (r + 1)(1 - d²)
//! D   = (-1 - d·r)(r + d)
//! (square?, s) = sqrt_ratio_i(N_s, D)
//!     non-square: s = -|s·r0|, c = r        (correction)
//!     square:     s unchanged, c = -1
//! N_t = c(r - 1)(d - 1)² - D
//! W   = (2sD, N_t·sqrt(ad - 1), 1 - s², 1 + s²)   (Jacobi quartic)
//! ```
//!
//! `sqrt_ratio_i` splits the candidate into four cases (zero numerator,
//! square, `i`-times-square, non-square). The split is consumed only through
//! `conditional_assign` / `conditional_negate`, so the instruction stream and
//! memory access pattern are the same for every input.

use super::{CompletedPoint, ExtendedPoint};
use crate::constants::CurveConstants;
use crate::field::FieldElement;
use subtle::{ConditionallyNegatable, ConditionallySelectable};

/// Map a field element to a point using the constant table `constants`.
pub fn elligator_ristretto_flavor(r_0: &FieldElement, constants: &CurveConstants) -> ExtendedPoint {
    let one = FieldElement::ONE;
    let d = constants.edwards_d;
    let mut c = -one;

    let r = constants.sqrt_m1 * r_0.square();
    let n_s = (r + one) * constants.one_minus_d_sq;
    let den = (c - d * r) * (r + d);

    let (ns_d_is_sq, mut s) = FieldElement::sqrt_ratio_i(&n_s, &den, &constants.sqrt_m1);

    let mut s_prime = s * *r_0;
    let s_prime_is_pos = !s_prime.is_negative();
    s_prime.conditional_negate(s_prime_is_pos);

    s.conditional_assign(&s_prime, !ns_d_is_sq);
    c.conditional_assign(&r, !ns_d_is_sq);

    let n_t = c * (r - one) * constants.d_minus_one_sq - den;
    let s_sq = s.square();

    CompletedPoint {
        x: (s + s) * den,
        z: n_t * constants.sqrt_ad_minus_one,
        y: one - s_sq,
        t: one + s_sq,
    }
    .to_extended()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_of_input_is_irrelevant() {
        // r0 enters through r0² and |s·r0|, so ±r0 land on the same class.
        let c = CurveConstants::shared();
        let r0 = FieldElement::from_u64(0xdead_beef);
        let a = elligator_ristretto_flavor(&r0, c).compress(c);
        let b = elligator_ristretto_flavor(&(-r0), c).compress(c);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_inputs_spread() {
        let c = CurveConstants::shared();
        let outputs: std::collections::HashSet<[u8; 32]> = (1..64u64)
            .map(|k| elligator_ristretto_flavor(&FieldElement::from_u64(k), c).compress(c))
            .collect();
        assert_eq!(outputs.len(), 63);
    }
}
