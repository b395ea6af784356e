//! A duplex, byte-accounting channel with simulated latency and
//! bandwidth, generalizing a network simulator: the same shape (per-
//! direction latency, a shared bandwidth figure, atomic byte counters,
//! blocking sends) expressed as an owned Rust value with two independent
//! handles instead of a single struct both parties mutate directly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::Error;

/// Network timing for the demo LAN profile: 0.1ms latency, 10Gbps.
pub const LAN_LATENCY_MS: f64 = 0.1;
/// Network timing for the demo LAN profile: 0.1ms latency, 10Gbps.
pub const LAN_BANDWIDTH_KBPS: f64 = 10_000_000.0;
/// Network timing for the demo WAN profile: 40ms latency, 1Mbps.
pub const WAN_LATENCY_MS: f64 = 40.0;
/// Network timing for the demo WAN profile: 40ms latency, 1Mbps.
pub const WAN_BANDWIDTH_KBPS: f64 = 1_000.0;

struct Inner {
    latency_r2s_ms: f64,
    latency_s2r_ms: f64,
    bandwidth_kbps: f64,
    bytes_r2s: AtomicU64,
    bytes_s2r: AtomicU64,
    r2s: Mutex<VecDeque<u8>>,
    s2r: Mutex<VecDeque<u8>>,
    r2s_ready: Condvar,
    s2r_ready: Condvar,
}

impl Inner {
    fn transmit_ms(&self, bytes: usize) -> f64 {
        if self.bandwidth_kbps <= 0.0 {
            return 0.0;
        }
        (bytes as f64) * 8.0 / self.bandwidth_kbps
    }
}

/// Owns the shared simulated-network state between a Receiver and a
/// Sender half. Construct with [`Channel::new`] and split into
/// [`ChannelHalf`] handles with [`Channel::split`].
pub struct Channel {
    inner: Arc<Inner>,
}

impl Channel {
    /// Builds a channel with the given per-direction latency (ms) and a
    /// shared bandwidth figure (kbps).
    pub fn new(latency_r2s_ms: f64, latency_s2r_ms: f64, bandwidth_kbps: f64) -> Self {
        Channel {
            inner: Arc::new(Inner {
                latency_r2s_ms,
                latency_s2r_ms,
                bandwidth_kbps,
                bytes_r2s: AtomicU64::new(0),
                bytes_s2r: AtomicU64::new(0),
                r2s: Mutex::new(VecDeque::new()),
                s2r: Mutex::new(VecDeque::new()),
                r2s_ready: Condvar::new(),
                s2r_ready: Condvar::new(),
            }),
        }
    }

    /// Builds a channel using the demo LAN profile.
    pub fn lan() -> Self {
        Self::new(LAN_LATENCY_MS, LAN_LATENCY_MS, LAN_BANDWIDTH_KBPS)
    }

    /// Builds a channel using the demo WAN profile.
    pub fn wan() -> Self {
        Self::new(WAN_LATENCY_MS, WAN_LATENCY_MS, WAN_BANDWIDTH_KBPS)
    }

    /// Splits the channel into a Receiver-side and a Sender-side handle.
    pub fn split(&self) -> (ChannelHalf, ChannelHalf) {
        (
            ChannelHalf {
                inner: self.inner.clone(),
                role: Role::Receiver,
            },
            ChannelHalf {
                inner: self.inner.clone(),
                role: Role::Sender,
            },
        )
    }

    /// Total bytes sent from the Receiver to the Sender.
    pub fn bytes_receiver_to_sender(&self) -> u64 {
        self.inner.bytes_r2s.load(Ordering::Relaxed)
    }

    /// Total bytes sent from the Sender to the Receiver.
    pub fn bytes_sender_to_receiver(&self) -> u64 {
        self.inner.bytes_s2r.load(Ordering::Relaxed)
    }

    /// Total bytes sent in either direction.
    pub fn bytes_total(&self) -> u64 {
        self.bytes_receiver_to_sender() + self.bytes_sender_to_receiver()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Receiver,
    Sender,
}

/// One side's handle onto a shared [`Channel`].
pub struct ChannelHalf {
    inner: Arc<Inner>,
    role: Role,
}

impl ChannelHalf {
    /// Sends `msg`, blocking for the simulated latency and transmission
    /// time, and accounting the bytes in the direction this handle writes.
    pub fn send(&self, msg: &[u8]) -> Result<(), Error> {
        let (latency_ms, counter, queue, ready) = match self.role {
            Role::Receiver => (
                self.inner.latency_r2s_ms,
                &self.inner.bytes_r2s,
                &self.inner.r2s,
                &self.inner.r2s_ready,
            ),
            Role::Sender => (
                self.inner.latency_s2r_ms,
                &self.inner.bytes_s2r,
                &self.inner.s2r,
                &self.inner.s2r_ready,
            ),
        };
        counter.fetch_add(msg.len() as u64, Ordering::Relaxed);
        let total_ms = latency_ms + self.inner.transmit_ms(msg.len());
        if total_ms > 0.0 {
            std::thread::sleep(Duration::from_millis(total_ms.ceil() as u64));
        }
        let mut guard = queue.lock().map_err(|_| Error::ChannelFailure)?;
        guard.extend(msg.iter().copied());
        ready.notify_all();
        Ok(())
    }

    /// Receives exactly `len` bytes, blocking until they are available.
    pub fn recv(&self, len: usize) -> Result<Vec<u8>, Error> {
        let (queue, ready) = match self.role {
            // A Receiver handle reads what the Sender wrote, and vice versa.
            Role::Receiver => (&self.inner.s2r, &self.inner.s2r_ready),
            Role::Sender => (&self.inner.r2s, &self.inner.r2s_ready),
        };
        let mut guard = queue.lock().map_err(|_| Error::ChannelFailure)?;
        while guard.len() < len {
            guard = ready.wait(guard).map_err(|_| Error::ChannelFailure)?;
        }
        Ok(guard.drain(..len).collect())
    }

    /// Receives a 4-byte little-endian length prefix followed by that many
    /// bytes.
    pub fn recv_framed(&self) -> Result<Vec<u8>, Error> {
        let len_bytes = self.recv(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&len_bytes);
        let len = u32::from_le_bytes(buf) as usize;
        self.recv(len)
    }

    /// Sends `msg` preceded by its own 4-byte little-endian length.
    pub fn send_framed(&self, msg: &[u8]) -> Result<(), Error> {
        self.send(&(msg.len() as u32).to_le_bytes())?;
        self.send(msg)
    }
}
