//! The two Merkle-tree variants each party commits to: the Sender's tree
//! over salted leaf hashes, and the Receiver's tree over its polynomials'
//! evaluations at consecutive roots of unity.

use crate::error::Error;
use crate::field::{roots_of_unity, Polynomial};
use crate::hash::h2;

/// Builds a binary Merkle root over `leaves`, duplicating the last node of
/// an odd-sized level rather than padding with a zero leaf. An empty leaf
/// set has the all-zero root.
pub fn root_of_leaves(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level: Vec<[u8; 32]> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        let mut i = 0;
        while i < level.len() {
            if i + 1 < level.len() {
                next.push(h2(&level[i], &level[i + 1]));
            } else {
                next.push(h2(&level[i], &level[i]));
            }
            i += 2;
        }
        level = next;
    }
    level[0]
}

/// Domain-separation sentinel for padding leaves, so a short final
/// polynomial's missing evaluations never collide with a genuine one.
const PAD_SENTINEL: [u8; 32] = {
    let mut s = [0u8; 32];
    s[0] = 0xff;
    s
};

/// Computes the Receiver's Merkle root: each polynomial in `polys` is
/// evaluated at as many consecutive roots of unity as it has
/// coefficients, each evaluation is hashed to a leaf, and the leaves are
/// combined left to right across all polynomials.
///
/// `element_count` is the total number of set elements the bin table was
/// built over; the root-of-unity domain size is padded up to the next
/// power of two at least that large, and any evaluation slots beyond the
/// polynomials' combined coefficient count are filled with a
/// sentinel-derived padding leaf rather than left unused.
pub fn receiver_root(polys: &[Polynomial], element_count: usize) -> Result<[u8; 32], Error> {
    if polys.is_empty() || element_count == 0 {
        return Ok([0u8; 32]);
    }

    let domain = element_count.next_power_of_two();
    let roots = roots_of_unity(domain)?;

    let mut leaves = Vec::with_capacity(domain);
    let mut root_idx = 0usize;
    for poly in polys {
        for _ in 0..poly.len() {
            if root_idx >= domain {
                break;
            }
            let x = &roots[root_idx];
            let evaluation = poly.evaluate(x).to_bytes_le();
            leaves.push(crate::hash::h1(&evaluation));
            root_idx += 1;
        }
    }
    while leaves.len() < domain {
        let idx = leaves.len() as u64;
        leaves.push(h2(&PAD_SENTINEL, &idx.to_le_bytes_padded()));
    }

    Ok(root_of_leaves(&leaves))
}

trait ToPaddedBytes {
    fn to_le_bytes_padded(self) -> [u8; 32];
}

impl ToPaddedBytes for u64 {
    fn to_le_bytes_padded(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..8].copy_from_slice(&self.to_le_bytes());
        out
    }
}

/// Computes the Sender's Merkle root directly over its salted leaf hashes.
pub fn sender_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    root_of_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;

    #[test]
    fn empty_tree_has_zero_root() {
        assert_eq!(root_of_leaves(&[]), [0u8; 32]);
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let leaf = [9u8; 32];
        assert_eq!(root_of_leaves(&[leaf]), leaf);
    }

    #[test]
    fn odd_level_duplicates_last_node() {
        let leaves = [[1u8; 32], [2u8; 32], [3u8; 32]];
        let expected_top = h2(
            &h2(&leaves[0], &leaves[1]),
            &h2(&leaves[2], &leaves[2]),
        );
        assert_eq!(root_of_leaves(&leaves), expected_top);
    }

    #[test]
    fn receiver_root_is_deterministic() {
        let xs: Vec<_> = (1..=3u64).map(FieldElement::from).collect();
        let ys: Vec<_> = (1..=3u64).map(FieldElement::from).collect();
        let poly = Polynomial::interpolate(&xs, &ys).unwrap();
        let a = receiver_root(&[poly.clone()], 3).unwrap();
        let b = receiver_root(&[poly], 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn receiver_root_changes_with_coefficients() {
        let xs: Vec<_> = (1..=3u64).map(FieldElement::from).collect();
        let ys1: Vec<_> = (1..=3u64).map(FieldElement::from).collect();
        let ys2: Vec<_> = [9u64, 2, 3].iter().map(|&v| FieldElement::from(v)).collect();
        let poly1 = Polynomial::interpolate(&xs, &ys1).unwrap();
        let poly2 = Polynomial::interpolate(&xs, &ys2).unwrap();
        assert_ne!(
            receiver_root(&[poly1], 3).unwrap(),
            receiver_root(&[poly2], 3).unwrap()
        );
    }
}
