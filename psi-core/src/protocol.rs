//! The Receiver and Sender role objects and the six-step `intersect`
//! exchange that runs between them (spec.md §4.5-§4.7).
//!
//! Both roles follow the same shape: build with [`Receiver::new`] /
//! [`Sender::new`], call `commit` once, then call `intersect` once,
//! consuming `self` so a session can never be replayed. Merkle roots are
//! the commitments each party "publishes" ahead of the exchange (spec.md
//! §1); this crate treats that publication as out of band — the caller
//! passes the counterparty's root into `intersect` directly, the way an
//! authenticated side channel or bulletin board would deliver it, since
//! authenticated channels are assumed external to this crate (spec.md §1
//! Non-goals).

use std::collections::HashSet;

use rand::RngCore;
use zeroize::Zeroizing;

use crate::bins;
use crate::channel::ChannelHalf;
use crate::error::Error;
use crate::field::{FieldElement, Polynomial};
use crate::hash::{bin_of, h1, h2};
use crate::ka::{self, KaMessage};
use crate::merkle;
use crate::primitives::{base_point_mul, diffie_hellman, elligator};
use crate::wire;

/// Where a role object sits in its half of the exchange. Tracked purely
/// for diagnostics and to reject out-of-order calls; ownership already
/// prevents replay of a finished session, since `intersect` consumes
/// `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Created,
    Committed,
    Aborted,
    Done,
}

/// Pads a single-point interpolation request up to two points so it can
/// be passed to [`Polynomial::interpolate`], which requires at least
/// two. Only ever needed for a bin that holds exactly one element after
/// rebalancing (spec.md §9 notes this is possible in the degenerate case
/// where rebalancing has nowhere left to donate to). The synthetic point
/// is domain-separated from any real `H1`/`H2` digest by hashing a fixed
/// tag together with the bin's position, and its value is fresh
/// randomness, so it carries no information about the real point.
fn interpolate_or_pad<R: RngCore>(
    xs: &[FieldElement],
    ys: &[FieldElement],
    tag: &[u8],
    rng: &mut R,
) -> Result<Polynomial, Error> {
    if xs.len() >= 2 {
        return Polynomial::interpolate(xs, ys);
    }
    let pad_x = FieldElement::from_bytes_le(&h1(&h2(
        &{
            let mut sentinel = [0u8; 32];
            let n = tag.len().min(32);
            sentinel[..n].copy_from_slice(&tag[..n]);
            sentinel
        },
        &[0u8; 32],
    )));
    let mut pad_y_bytes = [0u8; 32];
    rng.fill_bytes(&mut pad_y_bytes);
    let mut xs = xs.to_vec();
    let mut ys = ys.to_vec();
    xs.push(pad_x);
    ys.push(FieldElement::from_bytes_le(&pad_y_bytes));
    Polynomial::interpolate(&xs, &ys)
}

/// The Receiver role, holding set `Y` and the key-agreement state built
/// over it. Construct with [`Receiver::new`], call [`Receiver::commit`]
/// once, then [`Receiver::intersect`] once.
pub struct Receiver {
    elements: Vec<[u8; 32]>,
    bin_count: usize,
    ka: Vec<KaMessage>,
    polys: Vec<Polynomial>,
    merkle_root: [u8; 32],
    state: SessionState,
}

impl Receiver {
    /// Builds a Receiver over `elements` (`Y`). Fails with
    /// [`Error::InvalidInput`] if `elements` is too small to bin (fewer
    /// than 2).
    pub fn new(elements: Vec<[u8; 32]>) -> Result<Self, Error> {
        let bin_count = bins::bin_count(elements.len())?;
        Ok(Receiver {
            elements,
            bin_count,
            ka: Vec::new(),
            polys: Vec::new(),
            merkle_root: [0u8; 32],
            state: SessionState::Created,
        })
    }

    /// The size of `Y`, public by protocol design (the Sender is
    /// constructed with this value; spec.md §1 allows the Sender to
    /// learn `|Y|`).
    pub fn input_len(&self) -> usize {
        self.elements.len()
    }

    /// The Merkle root committed to by the last successful `commit()`
    /// call; all-zero before `commit()` runs.
    pub fn merkle_root(&self) -> [u8; 32] {
        self.merkle_root
    }

    /// Generates KA messages, bins `Y`, interpolates one polynomial per
    /// non-empty bin, and commits to their root-of-unity evaluations
    /// (spec.md §4.5).
    pub fn commit<R: RngCore>(&mut self, rng: &mut R) -> Result<(), Error> {
        if self.state != SessionState::Created {
            return Err(Error::InvalidInput);
        }
        let ka = ka::gen_ka_messages(rng, self.elements.len())?;
        let table = bins::build_table(&self.elements, self.bin_count);

        let mut polys = Vec::new();
        for (bin_idx, bin) in table.iter().enumerate() {
            if bin.is_empty() {
                continue;
            }
            let xs: Vec<FieldElement> = bin
                .iter()
                .map(|&idx| FieldElement::from_bytes_le(&h1(&self.elements[idx])))
                .collect();
            let ys: Vec<FieldElement> = bin
                .iter()
                .map(|&idx| FieldElement::from_bytes_le(&ka[idx].representative))
                .collect();
            let tag = [b"psi-receiver-pad".as_slice(), &bin_idx.to_le_bytes()].concat();
            polys.push(interpolate_or_pad(&xs, &ys, &tag, rng)?);
        }

        self.merkle_root = merkle::receiver_root(&polys, self.elements.len())?;
        self.ka = ka;
        self.polys = polys;
        self.state = SessionState::Committed;
        tracing::debug!(n = self.elements.len(), bins = self.bin_count, "receiver committed");
        Ok(())
    }

    /// Drives the Receiver's half of the six-step exchange: sends the
    /// committed polynomials, receives the Sender's polynomials/public
    /// share/leaves, verifies `sender_root`, and returns the `Y`
    /// elements found to be in the intersection.
    ///
    /// Consumes `self`; every exit path (success or [`Error`]) drops the
    /// role object and scrubs its KA secrets.
    pub fn intersect(
        mut self,
        channel: &ChannelHalf,
        sender_root: [u8; 32],
    ) -> Result<Vec<[u8; 32]>, Error> {
        if self.state != SessionState::Committed {
            return Err(Error::InvalidInput);
        }
        let result = self.run_intersect(channel, sender_root);
        self.state = if result.is_ok() {
            SessionState::Done
        } else {
            SessionState::Aborted
        };
        result
    }

    fn run_intersect(
        &mut self,
        channel: &ChannelHalf,
        sender_root: [u8; 32],
    ) -> Result<Vec<[u8; 32]>, Error> {
        channel.send_framed(&wire::encode_polys(&self.polys))?;
        tracing::debug!(polys = self.polys.len(), "receiver sent leg 1");

        let q_bytes = channel.recv_framed()?;
        let q_polys = wire::decode_polys(&q_bytes)?;
        let g_a = {
            let bytes = channel.recv(32)?;
            let mut buf = [0u8; 32];
            buf.copy_from_slice(&bytes);
            buf
        };
        let leaves_bytes = channel.recv_framed()?;
        let leaves = wire::decode_leaves(&leaves_bytes)?;

        if merkle::sender_root(&leaves) != sender_root {
            tracing::warn!("receiver aborts: sender merkle root mismatch");
            return Err(Error::ProtocolAbort);
        }

        let leaf_set: HashSet<[u8; 32]> = leaves.into_iter().collect();
        let mut matched = Vec::new();
        for (i, y) in self.elements.iter().enumerate() {
            let bin = bin_of(y, self.bin_count);
            if bin >= q_polys.len() {
                // Only reachable if the Sender sent a short vector; an
                // honestly-sized reply always covers every bin index.
                continue;
            }
            let shared_point = diffie_hellman(&self.ka[i].secret, &g_a);
            let k_i = h1(&shared_point);
            let eval_point = FieldElement::from_bytes_le(&h2(y, &k_i));
            let r_i = q_polys[bin].evaluate(&eval_point).to_bytes_le();
            let f_i = h2(y, &r_i);
            if leaf_set.contains(&f_i) {
                matched.push(*y);
            }
        }
        tracing::debug!(matched = matched.len(), "receiver finalized");
        Ok(matched)
    }
}

/// The Sender role, holding set `X`. Construct with [`Sender::new`]
/// (which also takes the Receiver's public input size, `|Y|`), call
/// [`Sender::commit`] once, then [`Sender::intersect`] once.
pub struct Sender {
    elements: Vec<[u8; 32]>,
    receiver_size: usize,
    receiver_bin_count: usize,
    salts: Zeroizing<Vec<[u8; 32]>>,
    leaves: Vec<[u8; 32]>,
    merkle_root: [u8; 32],
    state: SessionState,
}

impl Sender {
    /// Builds a Sender over `elements` (`X`), given the Receiver's
    /// public input size `receiver_size` (`|Y|`; spec.md §1 allows the
    /// Sender to know this). Fails with [`Error::InvalidInput`] if
    /// `elements` is empty or `receiver_size` is too small to bin.
    pub fn new(elements: Vec<[u8; 32]>, receiver_size: usize) -> Result<Self, Error> {
        if elements.is_empty() {
            return Err(Error::InvalidInput);
        }
        let receiver_bin_count = bins::bin_count(receiver_size)?;
        Ok(Sender {
            elements,
            receiver_size,
            receiver_bin_count,
            salts: Zeroizing::new(Vec::new()),
            leaves: Vec::new(),
            merkle_root: [0u8; 32],
            state: SessionState::Created,
        })
    }

    /// The Merkle root committed to by the last successful `commit()`
    /// call; all-zero before `commit()` runs.
    pub fn merkle_root(&self) -> [u8; 32] {
        self.merkle_root
    }

    /// Draws one salt per element, builds the salted leaf hashes, and
    /// commits to their root (spec.md §4.6).
    pub fn commit<R: RngCore>(&mut self, rng: &mut R) -> Result<(), Error> {
        if self.state != SessionState::Created {
            return Err(Error::InvalidInput);
        }
        let mut salts = Vec::with_capacity(self.elements.len());
        let mut leaves = Vec::with_capacity(self.elements.len());
        for x in &self.elements {
            let mut r = [0u8; 32];
            rng.fill_bytes(&mut r);
            leaves.push(h2(x, &r));
            salts.push(r);
        }
        self.merkle_root = merkle::sender_root(&leaves);
        self.salts = Zeroizing::new(salts);
        self.leaves = leaves;
        self.state = SessionState::Committed;
        tracing::debug!(n = self.elements.len(), "sender committed");
        Ok(())
    }

    /// Drives the Sender's half of the six-step exchange: receives and
    /// verifies the Receiver's polynomials against `receiver_root`,
    /// evaluates a shared key per element, rebalances singleton bins,
    /// builds the reply polynomials, and sends them back along with its
    /// public share and salted leaves.
    ///
    /// Consumes `self`; every exit path (success or [`Error`]) drops the
    /// role object and scrubs its KA scalar and salts.
    pub fn intersect<R: RngCore>(
        mut self,
        channel: &ChannelHalf,
        rng: &mut R,
        receiver_root: [u8; 32],
    ) -> Result<(), Error> {
        if self.state != SessionState::Committed {
            return Err(Error::InvalidInput);
        }
        let result = self.run_intersect(channel, rng, receiver_root);
        self.state = if result.is_ok() {
            SessionState::Done
        } else {
            SessionState::Aborted
        };
        result
    }

    fn run_intersect<R: RngCore>(
        &mut self,
        channel: &ChannelHalf,
        rng: &mut R,
        receiver_root: [u8; 32],
    ) -> Result<(), Error> {
        let poly_bytes = channel.recv_framed()?;
        let polys = wire::decode_polys(&poly_bytes)?;

        if polys.iter().any(|p| p.len() < 2) {
            tracing::warn!("sender aborts: receiver polynomial degree < 1");
            return Err(Error::ProtocolAbort);
        }
        let total_coeffs: usize = polys.iter().map(Polynomial::len).sum();
        if total_coeffs != self.elements_expected_from_receiver() {
            tracing::warn!("sender aborts: receiver element count mismatch");
            return Err(Error::ProtocolAbort);
        }
        let computed_root = merkle::receiver_root(&polys, self.elements_expected_from_receiver())?;
        if computed_root != receiver_root {
            tracing::warn!("sender aborts: receiver merkle root mismatch");
            return Err(Error::ProtocolAbort);
        }
        tracing::debug!("sender validated receiver's leg 1");

        let a = Zeroizing::new({
            let mut a = [0u8; 32];
            rng.fill_bytes(&mut a);
            a
        });
        let g_a = base_point_mul(&a);

        let mut k_values = vec![[0u8; 32]; self.elements.len()];
        let mut table: Vec<Vec<usize>> = vec![Vec::new(); self.receiver_bin_count];
        for (idx, x) in self.elements.iter().enumerate() {
            let h1_x = h1(x);
            let bin = bin_of(x, self.receiver_bin_count);
            if bin >= polys.len() {
                tracing::warn!(bin, "sender aborts: bin index out of range");
                return Err(Error::ProtocolAbort);
            }
            let eval_point = FieldElement::from_bytes_le(&h1_x);
            let m = polys[bin].evaluate(&eval_point).to_bytes_le();
            let u = elligator::decode(&m)?;
            let shared_point = diffie_hellman(&a, &u);
            k_values[idx] = h1(&shared_point);
            table[bin].push(idx);
        }

        bins::rebalance_singletons(&mut table);

        // Sized to `receiver_bin_count` and indexed by raw bin, not
        // compacted to the non-empty bins: the Receiver looks up a match by
        // `q_polys[bin_of(y)]` directly (see `Receiver::run_intersect`), the
        // same full-vector indexing the original's `P_Sender` table used.
        // An empty bin contributes an empty placeholder polynomial, which
        // evaluates to zero and so never matches a real leaf.
        let mut q_polys = Vec::with_capacity(self.receiver_bin_count);
        for (bin_idx, bin) in table.iter().enumerate() {
            if bin.is_empty() {
                q_polys.push(Polynomial(Vec::new()));
                continue;
            }
            let xs: Vec<FieldElement> = bin
                .iter()
                .map(|&idx| FieldElement::from_bytes_le(&h2(&self.elements[idx], &k_values[idx])))
                .collect();
            let ys: Vec<FieldElement> = bin
                .iter()
                .map(|&idx| FieldElement::from_bytes_le(&self.salts[idx]))
                .collect();
            let tag = [b"psi-sender-pad".as_slice(), &bin_idx.to_le_bytes()].concat();
            q_polys.push(interpolate_or_pad(&xs, &ys, &tag, rng)?);
        }

        channel.send_framed(&wire::encode_polys(&q_polys))?;
        channel.send(&g_a)?;
        channel.send_framed(&wire::encode_leaves(&self.leaves))?;
        tracing::debug!(polys = q_polys.len(), "sender sent leg 2");
        Ok(())
    }

    fn elements_expected_from_receiver(&self) -> usize {
        self.receiver_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn elements(seeds: impl IntoIterator<Item = u8>) -> Vec<[u8; 32]> {
        seeds
            .into_iter()
            .map(|s| {
                let mut e = [0u8; 32];
                e[0] = s;
                e[1] = s.wrapping_mul(7);
                e
            })
            .collect()
    }

    #[test]
    fn full_overlap_recovers_everything() {
        let y = elements(0..16);
        let x = elements(0..16);
        let mut receiver = Receiver::new(y.clone()).unwrap();
        receiver.commit(&mut ChaCha20Rng::seed_from_u64(1)).unwrap();
        let mut sender = Sender::new(x, receiver.input_len()).unwrap();
        sender.commit(&mut ChaCha20Rng::seed_from_u64(2)).unwrap();

        let receiver_root = receiver.merkle_root();
        let sender_root = sender.merkle_root();
        let channel = Channel::new(0.0, 0.0, 0.0);
        let (receiver_half, sender_half) = channel.split();

        let mut sender_rng = ChaCha20Rng::seed_from_u64(3);
        let sender_thread =
            std::thread::spawn(move || sender.intersect(&sender_half, &mut sender_rng, receiver_root));
        let matched = receiver.intersect(&receiver_half, sender_root).unwrap();
        sender_thread.join().unwrap().unwrap();

        assert_eq!(matched.len(), y.len());
    }

    #[test]
    fn disjoint_sets_yield_empty_intersection() {
        let y = elements(0..10);
        let x = elements(100..110);
        let mut receiver = Receiver::new(y).unwrap();
        receiver.commit(&mut ChaCha20Rng::seed_from_u64(4)).unwrap();
        let mut sender = Sender::new(x, receiver.input_len()).unwrap();
        sender.commit(&mut ChaCha20Rng::seed_from_u64(5)).unwrap();

        let receiver_root = receiver.merkle_root();
        let sender_root = sender.merkle_root();
        let channel = Channel::new(0.0, 0.0, 0.0);
        let (receiver_half, sender_half) = channel.split();

        let mut sender_rng = ChaCha20Rng::seed_from_u64(6);
        let sender_thread =
            std::thread::spawn(move || sender.intersect(&sender_half, &mut sender_rng, receiver_root));
        let matched = receiver.intersect(&receiver_half, sender_root).unwrap();
        sender_thread.join().unwrap().unwrap();

        assert!(matched.is_empty());
    }

    #[test]
    fn partial_overlap_recovers_only_shared_elements() {
        let y = elements(0..10);
        let mut x = elements(0..5);
        x.extend(elements(50..55));
        let mut receiver = Receiver::new(y.clone()).unwrap();
        receiver.commit(&mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        let mut sender = Sender::new(x, receiver.input_len()).unwrap();
        sender.commit(&mut ChaCha20Rng::seed_from_u64(8)).unwrap();

        let receiver_root = receiver.merkle_root();
        let sender_root = sender.merkle_root();
        let channel = Channel::new(0.0, 0.0, 0.0);
        let (receiver_half, sender_half) = channel.split();

        let mut sender_rng = ChaCha20Rng::seed_from_u64(9);
        let sender_thread =
            std::thread::spawn(move || sender.intersect(&sender_half, &mut sender_rng, receiver_root));
        let matched = receiver.intersect(&receiver_half, sender_root).unwrap();
        sender_thread.join().unwrap().unwrap();

        assert_eq!(matched.len(), 5);
        for expected in &y[0..5] {
            assert!(matched.contains(expected));
        }
    }

    #[test]
    fn tampered_sender_leaf_aborts_receiver() {
        let y = elements(0..10);
        let x = elements(0..10);
        let mut receiver = Receiver::new(y).unwrap();
        receiver.commit(&mut ChaCha20Rng::seed_from_u64(10)).unwrap();
        let mut sender = Sender::new(x, receiver.input_len()).unwrap();
        sender.commit(&mut ChaCha20Rng::seed_from_u64(11)).unwrap();

        let receiver_root = receiver.merkle_root();
        // A root computed over leaves that do not match what the Sender
        // will actually transmit simulates tampering between commit and
        // send.
        let bogus_sender_root = [0xAAu8; 32];
        let channel = Channel::new(0.0, 0.0, 0.0);
        let (receiver_half, sender_half) = channel.split();

        let mut sender_rng = ChaCha20Rng::seed_from_u64(12);
        let sender_thread = std::thread::spawn(move || {
            sender.intersect(&sender_half, &mut sender_rng, receiver_root)
        });
        let result = receiver.intersect(&receiver_half, bogus_sender_root);
        sender_thread.join().unwrap().unwrap();

        assert_eq!(result, Err(Error::ProtocolAbort));
    }

    #[test]
    fn tampered_receiver_polynomial_aborts_sender() {
        let y = elements(0..10);
        let x = elements(0..10);
        let mut receiver = Receiver::new(y).unwrap();
        receiver.commit(&mut ChaCha20Rng::seed_from_u64(13)).unwrap();
        let mut sender = Sender::new(x, receiver.input_len()).unwrap();
        sender.commit(&mut ChaCha20Rng::seed_from_u64(14)).unwrap();

        let sender_root = sender.merkle_root();
        let bogus_receiver_root = [0x55u8; 32];
        let channel = Channel::new(0.0, 0.0, 0.0);
        let (receiver_half, sender_half) = channel.split();

        let mut sender_rng = ChaCha20Rng::seed_from_u64(15);
        let sender_thread = std::thread::spawn(move || {
            sender.intersect(&sender_half, &mut sender_rng, bogus_receiver_root)
        });
        let _ = receiver.intersect(&receiver_half, sender_root);
        let result = sender_thread.join().unwrap();

        assert_eq!(result, Err(Error::ProtocolAbort));
    }

    #[test]
    fn seeded_run_is_byte_reproducible() {
        let run = || {
            let y = elements(0..4);
            let x = elements(0..4);
            let mut receiver = Receiver::new(y).unwrap();
            receiver.commit(&mut ChaCha20Rng::seed_from_u64(42)).unwrap();
            let mut sender = Sender::new(x, receiver.input_len()).unwrap();
            sender.commit(&mut ChaCha20Rng::seed_from_u64(43)).unwrap();
            (receiver.merkle_root(), sender.merkle_root())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn repeated_intersect_is_rejected() {
        let mut receiver = Receiver::new(elements(0..4)).unwrap();
        assert_eq!(receiver.state, SessionState::Created);
        let channel = Channel::new(0.0, 0.0, 0.0);
        let (receiver_half, _sender_half) = channel.split();
        let result = receiver.intersect(&receiver_half, [0u8; 32]);
        assert_eq!(result, Err(Error::InvalidInput));
    }
}
