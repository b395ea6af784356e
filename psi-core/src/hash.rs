//! Hash primitives shared by every layer of the protocol: `H1`, `H2`, the
//! bin-assignment hash `H_bin`, and the 32-byte salted-leaf hash used by
//! both Merkle commitments.
//!
//! All of these reduce to keyless BLAKE2b with a 32-byte digest, exactly
//! the instantiation the bin-assignment and commitment steps were built
//! and measured against; swapping the hash function would silently
//! desynchronize the two parties' bin tables even though nothing here is
//! cryptographically special about BLAKE2b over another 256-bit hash.

use blake2::{Blake2bVar, digest::{Update, VariableOutput}};

/// Keyless BLAKE2b-256 of an arbitrary byte string.
fn blake2b_256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2bVar::new(32).expect("32 is a valid Blake2b output length");
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher
        .finalize_variable(&mut out)
        .expect("output buffer is exactly the configured length");
    out
}

/// `H1(x) = blake2b(x)`.
pub fn h1(x: &[u8; 32]) -> [u8; 32] {
    blake2b_256(x)
}

/// `H2(a, b) = blake2b(a || b)`, used both as the Merkle node combiner and
/// to bind a set element to its derived key before interpolation.
pub fn h2(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(a);
    input[32..].copy_from_slice(b);
    blake2b_256(&input)
}

/// Reduces a 32-byte hash to a bin index in `[0, bin_count)` by taking its
/// first 8 bytes as a little-endian `u64` and reducing modulo the bin
/// count.
pub fn h_bin(hash: &[u8; 32], bin_count: usize) -> usize {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&hash[..8]);
    (u64::from_le_bytes(buf) % bin_count as u64) as usize
}

/// Assigns a set element to a bin.
///
/// Applies `H1` and then a *second*, independent BLAKE2b pass over the
/// resulting digest before reducing mod the bin count. The second pass
/// contributes nothing cryptographically beyond a single `H1` call, but
/// both parties must derive identical bin indices, so this mirrors the
/// reference bin-assignment routine exactly rather than simplifying it
/// away.
pub fn bin_of(element: &[u8; 32], bin_count: usize) -> usize {
    let h1_value = h1(element);
    let rehashed = blake2b_256(&h1_value);
    h_bin(&rehashed, bin_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h1_is_deterministic() {
        let x = [7u8; 32];
        assert_eq!(h1(&x), h1(&x));
    }

    #[test]
    fn h2_is_order_sensitive() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(h2(&a, &b), h2(&b, &a));
    }

    #[test]
    fn bin_of_is_within_range() {
        for seed in 0u8..50 {
            let element = [seed; 32];
            let bin = bin_of(&element, 7);
            assert!(bin < 7);
        }
    }

    #[test]
    fn bin_of_differs_from_single_hash_bin() {
        // Sanity check that the deliberate double hash actually changes the
        // bin index at least once across a small sample (otherwise a typo
        // could silently collapse it back to a single `H1` pass).
        let mut saw_difference = false;
        for seed in 0u8..20 {
            let element = [seed; 32];
            let single = h_bin(&h1(&element), 11);
            let double = bin_of(&element, 11);
            if single != double {
                saw_difference = true;
                break;
            }
        }
        assert!(saw_difference);
    }
}
