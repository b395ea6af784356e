//! Elligator2 for Curve25519: the bijection-on-a-subset between curve
//! u-coordinates and uniform 32-byte representatives that lets a
//! Diffie-Hellman public key be sent as a string indistinguishable from
//! random bytes.
//!
//! Implemented directly over this crate's own prime field rather than
//! through a separate elliptic-curve dependency, since both the curve and
//! the polynomial field share the same modulus `2^255 - 19`.

use crate::error::Error;
use crate::field::FieldElement;

/// The Montgomery `A` coefficient of Curve25519.
fn montgomery_a() -> FieldElement {
    FieldElement::from(486662)
}

/// `Z`, a fixed non-square element of `F_p` used to parametrize the map.
fn non_square_z() -> FieldElement {
    FieldElement::from(2)
}

/// Maps a uniform representative `r` to the curve u-coordinate it encodes.
///
/// Total except for the single degenerate representative with
/// `1 + Z*r^2 == 0`, which [`crate::ka`] treats as a reason to resample.
pub fn decode(r_bytes: &[u8; 32]) -> Result<[u8; 32], Error> {
    let a = montgomery_a();
    let z = non_square_z();
    let r = FieldElement::from_bytes_le(r_bytes);

    let t1 = z.mul(&r.mul(&r));
    let denom = FieldElement::one().add(&t1);
    if denom == FieldElement::zero() {
        return Err(Error::PrimitiveFailure);
    }
    let v = a.neg().div(&denom)?;

    let v_squared = v.mul(&v);
    let inner = v_squared.mul(&v).add(&a.mul(&v_squared)).add(&v);
    let x = if inner.is_square() {
        v
    } else {
        v.neg().sub(&a)
    };
    Ok(x.to_bytes_le())
}

/// Maps a curve u-coordinate back to a representative, when one exists.
///
/// Every point reachable by multiplying the base point by a scalar lands
/// in the branch this function covers; roughly half of all scalars
/// succeed; callers resample the scalar on `None` (see [`crate::ka`]).
pub fn encode(u_bytes: &[u8; 32]) -> Option<[u8; 32]> {
    let a = montgomery_a();
    let z = non_square_z();
    let u = FieldElement::from_bytes_le(u_bytes);

    if u == a.neg() || u == FieldElement::zero() {
        return None;
    }

    let numerator = a.neg().sub(&u);
    let denom = z.mul(&u);
    let r_squared = numerator.div(&denom).ok()?;
    let r = r_squared.sqrt()?;
    Some(r.to_bytes_le())
}
