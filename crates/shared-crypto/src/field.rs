//! # Field Arithmetic over GF(2^255 - 19)
//!
//! Radix-2^51 representation with five `u64` limbs. Products are taken in
//! `u128` and carried back down, so every operation runs in a fixed number
//! of steps regardless of the values involved.
//!
//! ## Invariants
//!
//! - Every public operation returns a weakly reduced element (limbs < 2^52).
//! - `to_bytes` always yields the canonical encoding (value < p).
//! - Conditional logic is expressed with `subtle::Choice`, never `if`.

use core::ops::{Add, Mul, Neg, Sub};
use subtle::{Choice, ConditionallyNegatable, ConditionallySelectable, ConstantTimeEq};

const LOW_51_BIT_MASK: u64 = (1u64 << 51) - 1;

/// 16·p, limb-wise. Added before subtraction so limbs never underflow.
const SIXTEEN_P: [u64; 5] = [
    36_028_797_018_963_664,
    36_028_797_018_963_952,
    36_028_797_018_963_952,
    36_028_797_018_963_952,
    36_028_797_018_963_952,
];

/// Element of GF(2^255 - 19).
#[derive(Clone, Copy, Debug)]
pub struct FieldElement(pub(crate) [u64; 5]);

impl FieldElement {
    /// Additive identity.
    pub const ZERO: Self = Self([0, 0, 0, 0, 0]);
    /// Multiplicative identity.
    pub const ONE: Self = Self([1, 0, 0, 0, 0]);

    /// Lift a small integer into the field.
    pub fn from_u64(x: u64) -> Self {
        Self([x & LOW_51_BIT_MASK, x >> 51, 0, 0, 0])
    }

    /// Decode 32 little-endian bytes. Bit 255 is ignored, and values in
    /// `[p, 2^255)` are accepted and reduced.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self([
            load8(&bytes[0..]) & LOW_51_BIT_MASK,
            (load8(&bytes[6..]) >> 3) & LOW_51_BIT_MASK,
            (load8(&bytes[12..]) >> 6) & LOW_51_BIT_MASK,
            (load8(&bytes[19..]) >> 1) & LOW_51_BIT_MASK,
            (load8(&bytes[24..]) >> 12) & LOW_51_BIT_MASK,
        ])
    }

    /// Canonical 32-byte little-endian encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut limbs = Self::reduce(self.0).0;

        // q = 1 iff the value is >= p
        let mut q = (limbs[0] + 19) >> 51;
        q = (limbs[1] + q) >> 51;
        q = (limbs[2] + q) >> 51;
        q = (limbs[3] + q) >> 51;
        q = (limbs[4] + q) >> 51;

        limbs[0] += 19 * q;
        limbs[1] += limbs[0] >> 51;
        limbs[0] &= LOW_51_BIT_MASK;
        limbs[2] += limbs[1] >> 51;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[3] += limbs[2] >> 51;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[4] += limbs[3] >> 51;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        let mut out = [0u8; 32];
        let mut acc: u128 = 0;
        let mut acc_bits = 0u32;
        let mut idx = 0usize;
        for limb in limbs {
            acc |= u128::from(limb) << acc_bits;
            acc_bits += 51;
            while acc_bits >= 8 {
                out[idx] = acc as u8;
                acc >>= 8;
                acc_bits -= 8;
                idx += 1;
            }
        }
        // 255 bits: the final 7 bits land in the last byte.
        out[idx] = acc as u8;
        out
    }

    /// "Negative" means the canonical encoding is odd.
    pub fn is_negative(&self) -> Choice {
        Choice::from(self.to_bytes()[0] & 1)
    }

    /// Constant-time zero test.
    pub fn is_zero(&self) -> Choice {
        self.ct_eq(&Self::ZERO)
    }

    /// Absolute value: the non-negative of `self` and `-self`.
    pub fn abs(&self) -> Self {
        let mut out = *self;
        out.conditional_negate(self.is_negative());
        out
    }

    /// `self^2`.
    pub fn square(&self) -> Self {
        *self * *self
    }

    /// `self^(2^k)`, k >= 1.
    fn pow2k(&self, k: u32) -> Self {
        let mut out = self.square();
        for _ in 1..k {
            out = out.square();
        }
        out
    }

    /// Returns `(self^(2^250 - 1), self^11)`, the shared prefix of the
    /// inversion and square-root addition chains.
    fn pow22501(&self) -> (Self, Self) {
        let t0 = self.square(); // 2
        let t1 = t0.square().square(); // 8
        let t2 = *self * t1; // 9
        let t3 = t0 * t2; // 11
        let t4 = t3.square(); // 22
        let t5 = t2 * t4; // 2^5 - 1
        let t6 = t5.pow2k(5);
        let t7 = t6 * t5; // 2^10 - 1
        let t8 = t7.pow2k(10);
        let t9 = t8 * t7; // 2^20 - 1
        let t10 = t9.pow2k(20);
        let t11 = t10 * t9; // 2^40 - 1
        let t12 = t11.pow2k(10);
        let t13 = t12 * t7; // 2^50 - 1
        let t14 = t13.pow2k(50);
        let t15 = t14 * t13; // 2^100 - 1
        let t16 = t15.pow2k(100);
        let t17 = t16 * t15; // 2^200 - 1
        let t18 = t17.pow2k(50);
        let t19 = t18 * t13; // 2^250 - 1
        (t19, t3)
    }

    /// Multiplicative inverse via Fermat, `self^(p - 2)`. Zero maps to zero.
    pub fn invert(&self) -> Self {
        let (t19, t3) = self.pow22501();
        t19.pow2k(5) * t3
    }

    /// `self^((p - 5) / 8)`.
    pub(crate) fn pow_p58(&self) -> Self {
        let (t19, _) = self.pow22501();
        *self * t19.pow2k(2)
    }

    /// Conditional square root of a ratio.
    ///
    /// | input                     | result                      |
    /// |---------------------------|-----------------------------|
    /// | `u = 0`                   | `(1, 0)`                    |
    /// | `v = 0`, `u != 0`         | `(0, 0)`                    |
    /// | `u/v` square              | `(1, +sqrt(u/v))`           |
    /// | `u/v` non-square          | `(0, +sqrt(i*u/v))`         |
    ///
    /// The returned root is always non-negative. `sqrt_m1` must be the
    /// table's `sqrt(-1)`.
    pub fn sqrt_ratio_i(u: &Self, v: &Self, sqrt_m1: &Self) -> (Choice, Self) {
        let v3 = v.square() * *v;
        let v7 = v3.square() * *v;
        let mut r = (*u * v3) * (*u * v7).pow_p58();
        let check = *v * r.square();

        let neg_u = -*u;
        let correct_sign_sqrt = check.ct_eq(u);
        let flipped_sign_sqrt = check.ct_eq(&neg_u);
        let flipped_sign_sqrt_i = check.ct_eq(&(neg_u * *sqrt_m1));

        let r_prime = *sqrt_m1 * r;
        r.conditional_assign(&r_prime, flipped_sign_sqrt | flipped_sign_sqrt_i);
        let r_is_negative = r.is_negative();
        r.conditional_negate(r_is_negative);

        (correct_sign_sqrt | flipped_sign_sqrt, r)
    }

    /// Carry every limb down to 51 bits, folding the top carry back with
    /// the factor 19 (2^255 = 19 mod p).
    fn reduce(mut limbs: [u64; 5]) -> Self {
        let c0 = limbs[0] >> 51;
        let c1 = limbs[1] >> 51;
        let c2 = limbs[2] >> 51;
        let c3 = limbs[3] >> 51;
        let c4 = limbs[4] >> 51;

        limbs[0] &= LOW_51_BIT_MASK;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        limbs[0] += c4 * 19;
        limbs[1] += c0;
        limbs[2] += c1;
        limbs[3] += c2;
        limbs[4] += c3;

        Self(limbs)
    }
}

fn load8(input: &[u8]) -> u64 {
    input
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, byte)| acc | (u64::from(*byte) << (8 * i)))
}

#[inline(always)]
fn m(x: u64, y: u64) -> u128 {
    u128::from(x) * u128::from(y)
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: FieldElement) -> FieldElement {
        let mut out = self.0;
        for (limb, r) in out.iter_mut().zip(rhs.0.iter()) {
            *limb += r;
        }
        FieldElement::reduce(out)
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: FieldElement) -> FieldElement {
        let mut out = [0u64; 5];
        for i in 0..5 {
            out[i] = (self.0[i] + SIXTEEN_P[i]) - rhs.0[i];
        }
        FieldElement::reduce(out)
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: FieldElement) -> FieldElement {
        let a = &self.0;
        let b = &rhs.0;

        let b1_19 = b[1] * 19;
        let b2_19 = b[2] * 19;
        let b3_19 = b[3] * 19;
        let b4_19 = b[4] * 19;

        let c0 = m(a[0], b[0]) + m(a[4], b1_19) + m(a[3], b2_19) + m(a[2], b3_19) + m(a[1], b4_19);
        let mut c1 =
            m(a[1], b[0]) + m(a[0], b[1]) + m(a[4], b2_19) + m(a[3], b3_19) + m(a[2], b4_19);
        let mut c2 =
            m(a[2], b[0]) + m(a[1], b[1]) + m(a[0], b[2]) + m(a[4], b3_19) + m(a[3], b4_19);
        let mut c3 =
            m(a[3], b[0]) + m(a[2], b[1]) + m(a[1], b[2]) + m(a[0], b[3]) + m(a[4], b4_19);
        let mut c4 =
            m(a[4], b[0]) + m(a[3], b[1]) + m(a[2], b[2]) + m(a[1], b[3]) + m(a[0], b[4]);

        let mut out = [0u64; 5];
        c1 += c0 >> 51;
        out[0] = (c0 as u64) & LOW_51_BIT_MASK;
        c2 += c1 >> 51;
        out[1] = (c1 as u64) & LOW_51_BIT_MASK;
        c3 += c2 >> 51;
        out[2] = (c2 as u64) & LOW_51_BIT_MASK;
        c4 += c3 >> 51;
        out[3] = (c3 as u64) & LOW_51_BIT_MASK;
        let carry = (c4 >> 51) as u64;
        out[4] = (c4 as u64) & LOW_51_BIT_MASK;

        out[0] += carry * 19;
        out[1] += out[0] >> 51;
        out[0] &= LOW_51_BIT_MASK;

        FieldElement(out)
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        FieldElement::ZERO - self
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        FieldElement::ZERO - *self
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.to_bytes()[..].ct_eq(&other.to_bytes()[..])
    }
}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self([
            u64::conditional_select(&a.0[0], &b.0[0], choice),
            u64::conditional_select(&a.0[1], &b.0[1], choice),
            u64::conditional_select(&a.0[2], &b.0[2], choice),
            u64::conditional_select(&a.0[3], &b.0[3], choice),
            u64::conditional_select(&a.0[4], &b.0[4], choice),
        ])
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}
