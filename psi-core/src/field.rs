//! Arithmetic over `F_p`, `p = 2^255 - 19`, and Lagrange interpolation of
//! polynomials over that field.
//!
//! All wire-visible field elements are little-endian 32-byte strings, the
//! same convention the rest of the protocol uses for set elements and
//! salts, so a [`FieldElement`] can be built directly from (or flattened
//! back into) the 32-byte buffers that cross the channel.

use std::ops::{Add, Mul, Sub};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;

use crate::error::Error;

/// `2^255 - 19`.
static MODULUS: Lazy<BigUint> = Lazy::new(|| (BigUint::one() << 255) - 19u32);

/// A generator of the multiplicative group `F_p^*`.
const GENERATOR: u64 = 3;

/// A canonical element of `F_p`, always reduced into `[0, p)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The additive identity.
    pub fn zero() -> Self {
        FieldElement(BigUint::zero())
    }

    /// The multiplicative identity.
    pub fn one() -> Self {
        FieldElement(BigUint::one())
    }

    /// Builds a field element from a little-endian 32-byte buffer,
    /// reducing it modulo `p` if it exceeds the modulus.
    pub fn from_bytes_le(bytes: &[u8; 32]) -> Self {
        let value = BigUint::from_bytes_le(bytes);
        FieldElement(value % &*MODULUS)
    }

    /// Serializes the element back to a little-endian, zero-padded 32-byte
    /// buffer.
    pub fn to_bytes_le(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = self.0.to_bytes_le();
        out[..bytes.len()].copy_from_slice(&bytes);
        out
    }

    fn from_u64(v: u64) -> Self {
        FieldElement(BigUint::from(v) % &*MODULUS)
    }

    /// `self + rhs mod p`.
    pub fn add(&self, rhs: &Self) -> Self {
        FieldElement((&self.0 + &rhs.0) % &*MODULUS)
    }

    /// `self - rhs mod p`.
    pub fn sub(&self, rhs: &Self) -> Self {
        if self.0 >= rhs.0 {
            FieldElement((&self.0 - &rhs.0) % &*MODULUS)
        } else {
            FieldElement((&*MODULUS - &rhs.0 + &self.0) % &*MODULUS)
        }
    }

    /// `-self mod p`.
    pub fn neg(&self) -> Self {
        Self::zero().sub(self)
    }

    /// `self * rhs mod p`.
    pub fn mul(&self, rhs: &Self) -> Self {
        FieldElement((&self.0 * &rhs.0) % &*MODULUS)
    }

    /// `self^exp mod p`.
    pub fn pow(&self, exp: &BigUint) -> Self {
        FieldElement(self.0.modpow(exp, &MODULUS))
    }

    /// The multiplicative inverse of `self`, via Fermat's little theorem.
    ///
    /// Returns [`Error::PrimitiveFailure`] if `self` is zero.
    pub fn inv(&self) -> Result<Self, Error> {
        if self.0.is_zero() {
            return Err(Error::PrimitiveFailure);
        }
        let exp = &*MODULUS - BigUint::from(2u32);
        Ok(self.pow(&exp))
    }

    /// `self / rhs mod p`.
    pub fn div(&self, rhs: &Self) -> Result<Self, Error> {
        Ok(self.mul(&rhs.inv()?))
    }

    /// Whether `self` is a nonzero quadratic residue mod `p`, via Euler's
    /// criterion.
    pub fn is_square(&self) -> bool {
        if self.0.is_zero() {
            return true;
        }
        let exp = (&*MODULUS - BigUint::one()) / 2u32;
        self.pow(&exp) == Self::one()
    }

    /// A square root of `self`, if one exists.
    ///
    /// `p ≡ 5 (mod 8)`, so this uses the standard Curve25519-style square
    /// root: a candidate `a^((p+3)/8)` is right whenever it squares back to
    /// `a`; otherwise multiplying it by a fixed primitive 4th root of unity
    /// fixes the sign flip, and if neither works `self` was not a square.
    pub fn sqrt(&self) -> Option<Self> {
        if self.0.is_zero() {
            return Some(Self::zero());
        }
        let exp = (&*MODULUS + BigUint::from(3u32)) / 8u32;
        let candidate = self.pow(&exp);
        if candidate.mul(&candidate) == *self {
            return Some(candidate);
        }
        let sqrt_neg_one = {
            let exp = (&*MODULUS - BigUint::one()) / 4u32;
            FieldElement::from_u64(2).pow(&exp)
        };
        let candidate = candidate.mul(&sqrt_neg_one);
        if candidate.mul(&candidate) == *self {
            Some(candidate)
        } else {
            None
        }
    }
}

impl From<u64> for FieldElement {
    fn from(v: u64) -> Self {
        Self::from_u64(v)
    }
}

impl Add for &FieldElement {
    type Output = FieldElement;
    fn add(self, rhs: Self) -> FieldElement {
        FieldElement::add(self, rhs)
    }
}

impl Sub for &FieldElement {
    type Output = FieldElement;
    fn sub(self, rhs: Self) -> FieldElement {
        FieldElement::sub(self, rhs)
    }
}

impl Mul for &FieldElement {
    type Output = FieldElement;
    fn mul(self, rhs: Self) -> FieldElement {
        FieldElement::mul(self, rhs)
    }
}

/// A polynomial as a little-endian coefficient list, `coeffs[i]` being the
/// coefficient of `x^i`. The degree is `coeffs.len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial(pub Vec<FieldElement>);

impl Polynomial {
    /// Number of coefficients (`degree + 1`).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this polynomial carries no coefficients at all. Only a
    /// degenerate, never-constructed polynomial would be empty; every
    /// value this module returns has at least one coefficient.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates the polynomial at `x` via Horner's method.
    pub fn evaluate(&self, x: &FieldElement) -> FieldElement {
        let mut acc = FieldElement::zero();
        for coeff in self.0.iter().rev() {
            acc = acc.mul(x).add(coeff);
        }
        acc
    }

    /// Interpolates the unique lowest-degree polynomial through
    /// `(xs[i], ys[i])` for all `i`.
    ///
    /// Requires at least two points and pairwise-distinct `xs`. Mirrors the
    /// reference implementation's fallback: when the interpolated
    /// polynomial collapses to a constant (every `y` value identical), the
    /// result is the two-coefficient polynomial `[y0, 0]` rather than a
    /// single-coefficient one, so callers can always rely on `degree >= 1`.
    pub fn interpolate(xs: &[FieldElement], ys: &[FieldElement]) -> Result<Self, Error> {
        if xs.is_empty() || xs.len() != ys.len() {
            return Err(Error::InvalidInput);
        }
        if xs.len() < 2 {
            return Err(Error::InvalidInput);
        }
        for i in 0..xs.len() {
            for j in (i + 1)..xs.len() {
                if xs[i] == xs[j] {
                    return Err(Error::InvalidInput);
                }
            }
        }

        let n = xs.len();
        // Lagrange basis, accumulated directly into coefficient form:
        // result = sum_i y_i * prod_{j != i} (x - x_j) / (x_i - x_j)
        let mut result = vec![FieldElement::zero(); n];
        for i in 0..n {
            let mut basis = vec![FieldElement::zero(); n];
            basis[0] = FieldElement::one();
            let mut degree = 0usize;
            let mut denom = FieldElement::one();
            for j in 0..n {
                if i == j {
                    continue;
                }
                denom = denom.mul(&xs[i].sub(&xs[j]));
                // Multiply `basis` (degree `degree`) by `(x - xs[j])`.
                for k in (0..=degree + 1).rev() {
                    let hi = if k == 0 {
                        FieldElement::zero()
                    } else {
                        basis[k - 1].clone()
                    };
                    let shifted = hi;
                    let scaled = basis[k].mul(&xs[j].neg());
                    basis[k] = shifted.add(&scaled);
                }
                degree += 1;
            }
            let scale = ys[i].div(&denom)?;
            for k in 0..n {
                result[k] = result[k].add(&basis[k].mul(&scale));
            }
        }

        let degree = result
            .iter()
            .rposition(|c| *c != FieldElement::zero())
            .map(|idx| idx as isize)
            .unwrap_or(-1);

        if degree < 1 {
            return Ok(Polynomial(vec![ys[0].clone(), FieldElement::zero()]));
        }
        result.truncate(degree as usize + 1);
        Ok(Polynomial(result))
    }
}

/// Returns the `n` consecutive powers of a primitive `n`-th root of unity
/// in `F_p`, starting at `1`: `roots[i] = g^((p-1)/n * i)`.
///
/// `n` must divide `p - 1`; every power of two up to `2^252` does, which
/// covers every bin-table size this protocol ever constructs.
pub fn roots_of_unity(n: usize) -> Result<Vec<FieldElement>, Error> {
    if n == 0 {
        return Err(Error::InvalidInput);
    }
    let modulus_minus_one = &*MODULUS - BigUint::one();
    let n_big = BigUint::from(n as u64);
    if &modulus_minus_one % &n_big != BigUint::zero() {
        return Err(Error::InvalidInput);
    }
    let exp = &modulus_minus_one / &n_big;
    let generator = FieldElement::from_u64(GENERATOR);
    let root = generator.pow(&exp);

    let mut roots = Vec::with_capacity(n);
    roots.push(FieldElement::one());
    for i in 1..n {
        let next = roots[i - 1].mul(&root);
        roots.push(next);
    }
    Ok(roots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_roundtrip() {
        let a = FieldElement::from_u64(123456789);
        let b = FieldElement::from_u64(987654321);
        assert_eq!(a.add(&b).sub(&b), a);
    }

    #[test]
    fn mul_inv_is_identity() {
        let a = FieldElement::from_u64(42);
        let inv = a.inv().unwrap();
        assert_eq!(a.mul(&inv), FieldElement::one());
    }

    #[test]
    fn inv_of_zero_fails() {
        assert_eq!(FieldElement::zero().inv(), Err(Error::PrimitiveFailure));
    }

    #[test]
    fn sqrt_roundtrips_on_squares() {
        let a = FieldElement::from_u64(16);
        let root = a.sqrt().expect("16 is a square");
        assert_eq!(root.mul(&root), a);
    }

    #[test]
    fn bytes_roundtrip() {
        let mut bytes = [0u8; 32];
        bytes[0] = 7;
        bytes[17] = 200;
        let fe = FieldElement::from_bytes_le(&bytes);
        assert_eq!(fe.to_bytes_le(), bytes);
    }

    #[test]
    fn interpolate_passes_through_points() {
        let xs: Vec<_> = (1..=4u64).map(FieldElement::from).collect();
        let ys: Vec<_> = [10u64, 20, 17, 4].iter().map(|&v| FieldElement::from(v)).collect();
        let poly = Polynomial::interpolate(&xs, &ys).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_eq!(poly.evaluate(x), *y);
        }
    }

    #[test]
    fn interpolate_constant_uses_fallback_shape() {
        let xs: Vec<_> = (1..=3u64).map(FieldElement::from).collect();
        let ys: Vec<_> = (0..3).map(|_| FieldElement::from_u64(9)).collect();
        let poly = Polynomial::interpolate(&xs, &ys).unwrap();
        assert_eq!(poly.len(), 2);
        assert_eq!(poly.0[1], FieldElement::zero());
        for x in &xs {
            assert_eq!(poly.evaluate(x), FieldElement::from_u64(9));
        }
    }

    #[test]
    fn interpolate_rejects_duplicate_points() {
        let xs = vec![FieldElement::from_u64(1), FieldElement::from_u64(1)];
        let ys = vec![FieldElement::from_u64(1), FieldElement::from_u64(2)];
        assert_eq!(Polynomial::interpolate(&xs, &ys), Err(Error::InvalidInput));
    }

    #[test]
    fn roots_of_unity_are_consistent() {
        let roots = roots_of_unity(8).unwrap();
        assert_eq!(roots.len(), 8);
        assert_eq!(roots[0], FieldElement::one());
        let r = roots[1].clone();
        let mut acc = FieldElement::one();
        for root in &roots {
            assert_eq!(*root, acc);
            acc = acc.mul(&r);
        }
        assert_eq!(acc, FieldElement::one());
    }
}
