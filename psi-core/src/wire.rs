//! Length-prefixed framing for the values that cross the channel: batches
//! of polynomials, and flat lists of 32-byte leaves or points.
//!
//! Every count is a 4-byte little-endian `u32` prefix. This is a portable
//! alternative to committing to the degree schedule as part of the Merkle
//! structure; it changes nothing about what either side hashes into a
//! Merkle root, only how the raw coefficient stream is parsed back into
//! polynomials.

use crate::error::Error;
use crate::field::{FieldElement, Polynomial};

fn read_u32(bytes: &[u8], pos: &mut usize) -> Result<u32, Error> {
    if *pos + 4 > bytes.len() {
        return Err(Error::TruncatedMessage);
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*pos..*pos + 4]);
    *pos += 4;
    Ok(u32::from_le_bytes(buf))
}

fn read_element(bytes: &[u8], pos: &mut usize) -> Result<FieldElement, Error> {
    if *pos + 32 > bytes.len() {
        return Err(Error::TruncatedMessage);
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes[*pos..*pos + 32]);
    *pos += 32;
    Ok(FieldElement::from_bytes_le(&buf))
}

fn read_leaf(bytes: &[u8], pos: &mut usize) -> Result<[u8; 32], Error> {
    if *pos + 32 > bytes.len() {
        return Err(Error::TruncatedMessage);
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes[*pos..*pos + 32]);
    *pos += 32;
    Ok(buf)
}

/// Frames a batch of polynomials as `count | (coeff_count | coeffs...)*`.
pub fn encode_polys(polys: &[Polynomial]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(polys.len() as u32).to_le_bytes());
    for poly in polys {
        out.extend_from_slice(&(poly.len() as u32).to_le_bytes());
        for coeff in &poly.0 {
            out.extend_from_slice(&coeff.to_bytes_le());
        }
    }
    out
}

/// Inverse of [`encode_polys`].
pub fn decode_polys(bytes: &[u8]) -> Result<Vec<Polynomial>, Error> {
    let mut pos = 0;
    let count = read_u32(bytes, &mut pos)? as usize;
    let mut polys = Vec::with_capacity(count);
    for _ in 0..count {
        let coeff_count = read_u32(bytes, &mut pos)? as usize;
        let mut coeffs = Vec::with_capacity(coeff_count);
        for _ in 0..coeff_count {
            coeffs.push(read_element(bytes, &mut pos)?);
        }
        polys.push(Polynomial(coeffs));
    }
    Ok(polys)
}

/// Frames a flat list of 32-byte values as `count | values...`.
pub fn encode_leaves(leaves: &[[u8; 32]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(leaves.len() as u32).to_le_bytes());
    for leaf in leaves {
        out.extend_from_slice(leaf);
    }
    out
}

/// Inverse of [`encode_leaves`].
pub fn decode_leaves(bytes: &[u8]) -> Result<Vec<[u8; 32]>, Error> {
    let mut pos = 0;
    let count = read_u32(bytes, &mut pos)? as usize;
    let mut leaves = Vec::with_capacity(count);
    for _ in 0..count {
        leaves.push(read_leaf(bytes, &mut pos)?);
    }
    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polys_round_trip() {
        let polys = vec![
            Polynomial(vec![FieldElement::from(1), FieldElement::from(2)]),
            Polynomial(vec![FieldElement::from(3), FieldElement::from(4), FieldElement::from(5)]),
        ];
        let bytes = encode_polys(&polys);
        let decoded = decode_polys(&bytes).unwrap();
        assert_eq!(decoded, polys);
    }

    #[test]
    fn leaves_round_trip() {
        let leaves = vec![[1u8; 32], [2u8; 32]];
        let bytes = encode_leaves(&leaves);
        let decoded = decode_leaves(&bytes).unwrap();
        assert_eq!(decoded, leaves);
    }

    #[test]
    fn truncated_message_is_reported() {
        let bytes = [1u8, 0, 0, 0, 5, 0, 0];
        assert_eq!(decode_polys(&bytes), Err(Error::TruncatedMessage));
    }
}
