//! Demo harness that runs one Receiver/Sender private-set-intersection
//! session over a simulated network, to exercise `psi-core` end to end.
//!
//! Input sets are generated locally: the Receiver's set is drawn at
//! random, and the Sender's set is built so that a configurable leading
//! fraction of it is copied from the Receiver's set and the rest is
//! independent random data, generalizing the reference demo's fixed
//! "first half overlaps" construction to an adjustable overlap fraction.

use std::thread;

use anyhow::Context;
use clap::Parser;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use psi_core::channel::Channel;
use psi_core::protocol::{Receiver, Sender};

/// Demo: intersects two randomly generated, partially overlapping sets
/// over a simulated network link.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Number of elements in the Receiver's set.
    receiver_size: usize,

    /// Number of elements in the Sender's set.
    sender_size: usize,

    /// Simulated network profile.
    #[arg(long, value_enum, default_value_t = NetworkMode::Lan)]
    mode: NetworkMode,

    /// Fraction of the Sender's set drawn from the Receiver's set, in `[0, 1]`.
    #[arg(long, default_value_t = 0.5)]
    overlap: f64,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum NetworkMode {
    Lan,
    Wan,
}

fn generate_inputs(
    receiver_size: usize,
    sender_size: usize,
    overlap: f64,
    rng: &mut impl RngCore,
) -> (Vec<[u8; 32]>, Vec<[u8; 32]>) {
    let receiver_input: Vec<[u8; 32]> = (0..receiver_size)
        .map(|_| {
            let mut e = [0u8; 32];
            rng.fill_bytes(&mut e);
            e
        })
        .collect();

    let overlap_count = ((sender_size as f64) * overlap.clamp(0.0, 1.0)).round() as usize;
    let sender_input: Vec<[u8; 32]> = (0..sender_size)
        .map(|i| {
            if i < overlap_count && i < receiver_input.len() {
                receiver_input[i]
            } else {
                let mut e = [0u8; 32];
                rng.fill_bytes(&mut e);
                e
            }
        })
        .collect();

    (receiver_input, sender_input)
}

fn run(cli: Cli) -> Result<(), psi_core::Error> {
    tracing::info!(
        receiver_size = cli.receiver_size,
        sender_size = cli.sender_size,
        mode = ?cli.mode,
        overlap = cli.overlap,
        "starting private set intersection demo"
    );

    let mut rng = ChaCha20Rng::from_entropy();
    let (receiver_input, sender_input) =
        generate_inputs(cli.receiver_size, cli.sender_size, cli.overlap, &mut rng);

    let mut receiver = Receiver::new(receiver_input)?;
    receiver.commit(&mut rng)?;
    let mut sender = Sender::new(sender_input, receiver.input_len())?;
    sender.commit(&mut rng)?;

    let receiver_root = receiver.merkle_root();
    let sender_root = sender.merkle_root();

    let channel = match cli.mode {
        NetworkMode::Lan => Channel::lan(),
        NetworkMode::Wan => Channel::wan(),
    };
    let (receiver_half, sender_half) = channel.split();

    let mut sender_rng = ChaCha20Rng::from_rng(&mut rng).expect("rng reseed cannot fail");
    let sender_thread = thread::spawn(move || {
        sender.intersect(&sender_half, &mut sender_rng, receiver_root)
    });

    let matched = receiver.intersect(&receiver_half, sender_root)?;
    sender_thread
        .join()
        .expect("sender thread panicked")?;

    println!("intersection size: {}", matched.len());
    println!(
        "receiver -> sender bytes: {}",
        channel.bytes_receiver_to_sender()
    );
    println!(
        "sender -> receiver bytes: {}",
        channel.bytes_sender_to_receiver()
    );
    println!("total bytes: {}", channel.bytes_total());

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    run(cli).context("private set intersection session failed")?;
    Ok(())
}
