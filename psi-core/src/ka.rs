//! Generation of Elligator-wrapped Diffie-Hellman key-agreement messages.

use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::Error;
use crate::primitives::{base_point_mul, elligator};

/// The most resamples attempted before giving up on a single element.
/// Each attempt succeeds with probability roughly 1/2, so this bounds the
/// failure probability at about `2^-256`.
const MAX_ATTEMPTS: usize = 256;

/// A single key-agreement message: the Elligator representative disclosed
/// to the other party, and the secret scalar that produced it.
pub struct KaMessage {
    /// `Elligator(g^b)`, safe to send.
    pub representative: [u8; 32],
    /// `b`, kept secret and scrubbed on drop.
    pub secret: Zeroizing<[u8; 32]>,
}

/// Generates `count` independent key-agreement messages.
///
/// For each message, a fresh scalar `b` is drawn until `g^b` happens to
/// fall in the branch Elligator2 can encode (roughly half of all
/// scalars), then the representative is returned alongside `b`.
pub fn gen_ka_messages<R: RngCore>(rng: &mut R, count: usize) -> Result<Vec<KaMessage>, Error> {
    let mut messages = Vec::with_capacity(count);
    for _ in 0..count {
        messages.push(gen_one(rng)?);
    }
    Ok(messages)
}

fn gen_one<R: RngCore>(rng: &mut R) -> Result<KaMessage, Error> {
    for _ in 0..MAX_ATTEMPTS {
        let mut b = [0u8; 32];
        rng.fill_bytes(&mut b);
        let public = base_point_mul(&b);
        if let Some(representative) = elligator::encode(&public) {
            return Ok(KaMessage {
                representative,
                secret: Zeroizing::new(b),
            });
        }
    }
    Err(Error::PrimitiveFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn generates_requested_count() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let messages = gen_ka_messages(&mut rng, 16).unwrap();
        assert_eq!(messages.len(), 16);
    }

    #[test]
    fn representative_decodes_back_to_the_public_key() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let messages = gen_ka_messages(&mut rng, 4).unwrap();
        for msg in &messages {
            let public = crate::primitives::base_point_mul(&msg.secret);
            let decoded = crate::primitives::elligator::decode(&msg.representative).unwrap();
            assert_eq!(decoded, public);
        }
    }
}
