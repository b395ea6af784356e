//! Two-party private set intersection over Curve25519.
//!
//! A malicious-resistant PSI engine built from commit-then-open Merkle
//! commitments wrapped around an Elligator-disguised Diffie-Hellman key
//! agreement, with key-agreement shares encoded as Lagrange-interpolated
//! polynomials over `F_p`, `p = 2^255 - 19`. The Receiver learns which of
//! its own elements are also held by the Sender; the Sender learns
//! nothing about the Receiver's set beyond its size.
//!
//! Communication is abstracted behind [`channel::Channel`], a duplex,
//! byte-accounting, latency-simulating pipe; this crate performs no
//! network I/O of its own, and Merkle-root commitments are assumed to
//! have already reached the counterparty over an authenticated side
//! channel before `intersect` runs (see [`protocol`]).
//!
//! ```
//! use psi_core::{
//!     channel::Channel,
//!     protocol::{Receiver, Sender},
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//! use std::thread;
//!
//! # fn main() -> Result<(), psi_core::Error> {
//! let y: Vec<[u8; 32]> = (0u8..8).map(|i| [i; 32]).collect();
//! let x: Vec<[u8; 32]> = (0u8..8).map(|i| [i; 32]).collect();
//!
//! let mut receiver = Receiver::new(y)?;
//! receiver.commit(&mut ChaCha20Rng::seed_from_u64(1))?;
//! let mut sender = Sender::new(x, receiver.input_len())?;
//! sender.commit(&mut ChaCha20Rng::seed_from_u64(2))?;
//!
//! let receiver_root = receiver.merkle_root();
//! let sender_root = sender.merkle_root();
//!
//! let channel = Channel::lan();
//! let (receiver_half, sender_half) = channel.split();
//!
//! let sender_thread = thread::spawn(move || {
//!     sender.intersect(&sender_half, &mut ChaCha20Rng::seed_from_u64(3), receiver_root)
//! });
//! let matched = receiver.intersect(&receiver_half, sender_root)?;
//! sender_thread.join().unwrap()?;
//!
//! assert_eq!(matched.len(), 8);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bins;
pub mod channel;
mod error;
pub mod field;
pub mod hash;
mod ka;
pub mod merkle;
pub mod primitives;
pub mod protocol;
pub mod wire;

pub use error::Error;
