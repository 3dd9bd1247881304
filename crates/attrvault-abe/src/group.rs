//! Helpers over the pairing group.
//!
//! Everything that touches `rabe_bn` directly and is not part of the scheme
//! itself: scalar construction, hashing attributes into G1, Lagrange
//! coefficients and key derivation from target-group elements.

use rabe_bn::arith::{U256, U512};
use rabe_bn::{Fr, Gt, G1};
use serde::Serialize;

use attrvault_core::{Attribute, EncryptionKey};

use crate::error::{AbeError, Result};

pub(crate) const ATTRIBUTE_HASH_CONTEXT: &str = "attrvault abe v1 attribute-to-G1";
const GT_KEY_CONTEXT: &str = "attrvault abe v1 Gt-to-wrap-key";

// BN254 base field constants. Values are little-endian limbs; everything
// except the modulus and the exponent is in Montgomery form.
const FQ_MODULUS: U256 = U256([
    0x3c208c16d87cfd47,
    0x97816a916871ca8d,
    0xb85045b68181585d,
    0x30644e72e131a029,
]);
const FQ_R2: U256 = U256([
    0xf32cfc5b538afa89,
    0xb5e71911d44501fb,
    0x47ab1eff0a417ff6,
    0x06d89f71cab8351f,
]);
const FQ_ONE: U256 = U256([
    0xd35d438dc58f0d9d,
    0x0a78eb28f5c70b3d,
    0x666ea36f7879462c,
    0x0e0a77c19a07df2f,
]);
/// Curve coefficient `b = 3`.
const FQ_B: U256 = U256([
    0x7a17caa950ad28d7,
    0x1f6ac17ae15521b9,
    0x334bea4e696bd284,
    0x2a1f6744ce179d8e,
]);
/// `(q + 1) / 4`. With `q = 3 mod 4` this power is a square root.
const FQ_SQRT_EXP: U256 = U256([
    0x4f082305b61f3f52,
    0x65e05aa45a1c72a3,
    0x6e14116da0605617,
    0x0c19139cb84c680a,
]);
const FQ_INV: u64 = 0x87d20782e4866389;

/// Serialize a value to CBOR.
pub(crate) fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| AbeError::Serialization(e.to_string()))?;
    Ok(buf)
}

/// Interpret big-endian bytes as a scalar, reduced modulo the group order.
pub(crate) fn fr_from_bytes(bytes: &[u8]) -> Fr {
    let one = Fr::one();
    let mut acc = Fr::zero();
    for byte in bytes {
        for bit in (0..8).rev() {
            acc = acc + acc;
            if (byte >> bit) & 1 == 1 {
                acc = acc + one;
            }
        }
    }
    acc
}

/// A small integer as a scalar. Used for share indices.
pub(crate) fn fr_from_u64(n: u64) -> Fr {
    fr_from_bytes(&n.to_be_bytes())
}

/// Hash an attribute onto G1.
///
/// Try-and-increment: hash to an x coordinate, keep the first one for which
/// `x^3 + 3` is a square. The cofactor of G1 is one, so every curve point is
/// in the group, and nobody learns the point's discrete logarithm.
pub(crate) fn hash_to_g1(attr: &Attribute) -> Result<G1> {
    let mut counter = 0u32;
    loop {
        let mut wide = [0u8; 64];
        let mut hasher = blake3::Hasher::new_derive_key(ATTRIBUTE_HASH_CONTEXT);
        hasher.update(&counter.to_be_bytes());
        hasher.update(attr.as_str().as_bytes());
        hasher.finalize_xof().fill(&mut wide);

        let (_, x) = U512::interpret(&wide).divrem(&FQ_MODULUS);
        let x = fq_mul(x, &FQ_R2);
        let mut rhs = fq_mul(fq_mul(x, &x), &x);
        rhs.add(&FQ_B, &FQ_MODULUS);

        let y = fq_pow(rhs, &FQ_SQRT_EXP);
        if fq_mul(y, &y) == rhs {
            return g1_from_affine(x, y);
        }
        counter = counter.wrapping_add(1);
    }
}

/// Montgomery product `a * b / R mod q`.
fn fq_mul(mut a: U256, b: &U256) -> U256 {
    a.mul(b, &FQ_MODULUS, FQ_INV);
    a
}

fn fq_pow(base: U256, exp: &U256) -> U256 {
    let mut acc = FQ_ONE;
    for bit in (0..256).rev() {
        acc = fq_mul(acc, &acc);
        if exp.get_bit(bit) == Some(true) {
            acc = fq_mul(acc, &base);
        }
    }
    acc
}

/// Jacobian coordinates as `rabe_bn` lays them out on the wire.
#[derive(Serialize)]
struct JacobianRepr {
    x: U256,
    y: U256,
    z: U256,
}

/// Build a G1 element from Montgomery-form affine coordinates already known
/// to be on the curve.
fn g1_from_affine(x: U256, y: U256) -> Result<G1> {
    let bytes = to_cbor(&JacobianRepr { x, y, z: FQ_ONE })?;
    ciborium::from_reader(bytes.as_slice()).map_err(|e| AbeError::Serialization(e.to_string()))
}

/// Lagrange coefficient at zero for index `x` over the index set `xs`.
///
/// Returns `None` only for a degenerate index set (duplicate indices).
pub(crate) fn lagrange_at_zero(x: u64, xs: &[u64]) -> Option<Fr> {
    let xi = fr_from_u64(x);
    let mut num = Fr::one();
    let mut den = Fr::one();
    for &other in xs.iter().filter(|&&other| other != x) {
        let xj = fr_from_u64(other);
        num = num * xj;
        den = den * (xj - xi);
    }
    den.inverse().map(|inv| num * inv)
}

/// Derive the symmetric wrap key from a target-group element.
pub(crate) fn gt_wrap_key(gt: &Gt) -> Result<EncryptionKey> {
    let bytes = to_cbor(gt)?;
    Ok(EncryptionKey::derive(GT_KEY_CONTEXT, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rabe_bn::{Group, G2};

    #[test]
    fn test_fr_from_u64_matches_addition() {
        let mut acc = Fr::zero();
        for _ in 0..5 {
            acc = acc + Fr::one();
        }
        assert_eq!(fr_from_u64(5), acc);
        assert_eq!(fr_from_u64(0), Fr::zero());
    }

    #[test]
    fn test_lagrange_reconstructs_line() {
        // q(x) = 7 + 3x, shares at x = 1 and x = 2.
        let q = |x: u64| fr_from_u64(7) + fr_from_u64(3) * fr_from_u64(x);
        let xs = [1u64, 2];
        let secret = xs
            .iter()
            .map(|&x| q(x) * lagrange_at_zero(x, &xs).unwrap())
            .fold(Fr::zero(), |a, b| a + b);
        assert_eq!(secret, fr_from_u64(7));
    }

    #[test]
    fn test_lagrange_single_index_is_one() {
        assert_eq!(lagrange_at_zero(3, &[3]).unwrap(), Fr::one());
    }

    #[test]
    fn test_affine_encoding_matches_generator() {
        // The G1 generator is (1, 2).
        let two = fq_mul(U256([2, 0, 0, 0]), &FQ_R2);
        assert_eq!(g1_from_affine(FQ_ONE, two).unwrap(), G1::one());
    }

    #[test]
    fn test_fq_sqrt_of_square() {
        let a = fq_mul(U256([12345, 0, 0, 0]), &FQ_R2);
        let square = fq_mul(a, &a);
        let root = fq_pow(square, &FQ_SQRT_EXP);
        assert_eq!(fq_mul(root, &root), square);
    }

    #[test]
    fn test_hash_to_g1_separates_attributes() {
        let a = Attribute::new("doctor").unwrap();
        let b = Attribute::new("nurse").unwrap();
        assert_eq!(hash_to_g1(&a).unwrap(), hash_to_g1(&a).unwrap());
        assert_ne!(hash_to_g1(&a).unwrap(), hash_to_g1(&b).unwrap());
        assert!(!hash_to_g1(&a).unwrap().is_zero());
    }

    #[test]
    fn test_hashed_points_are_in_the_group() {
        let p = hash_to_g1(&Attribute::new("pharmacist").unwrap()).unwrap();
        let a = fr_from_u64(977);
        let b = fr_from_u64(31);
        assert_eq!(
            rabe_bn::pairing(p * a, G2::one() * b),
            rabe_bn::pairing(p, G2::one()).pow(a * b)
        );
        assert_eq!(p * a + p * b, p * (a + b));
    }

    #[test]
    fn test_hash_is_not_a_known_multiple_of_the_generator() {
        let attr = Attribute::new("doctor").unwrap();
        let mut wide = [0u8; 64];
        let mut hasher = blake3::Hasher::new_derive_key(ATTRIBUTE_HASH_CONTEXT);
        hasher.update(attr.as_str().as_bytes());
        hasher.finalize_xof().fill(&mut wide);
        let guess = fr_from_bytes(&wide);

        assert_ne!(hash_to_g1(&attr).unwrap(), G1::one() * guess);
    }
}
