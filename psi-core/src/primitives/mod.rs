//! Curve25519 building blocks: raw X25519 scalar multiplication and the
//! Elligator2 map between curve points and uniform-looking
//! representatives.

pub mod elligator;

use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};

/// `g^scalar`, i.e. scalar multiplication of the Curve25519 base point.
pub fn base_point_mul(scalar: &[u8; 32]) -> [u8; 32] {
    x25519(*scalar, X25519_BASEPOINT_BYTES)
}

/// Diffie-Hellman: `point^scalar`.
pub fn diffie_hellman(scalar: &[u8; 32], point: &[u8; 32]) -> [u8; 32] {
    x25519(*scalar, *point)
}
