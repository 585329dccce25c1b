//! Lock-Free Ring Buffer Implementation

use crate::error::RingBufferError;
use crate::is_power_of_two;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use tracing::warn;

/// Snapshot of buffer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingBufferStats {
    /// Storage size (0 for an invalid buffer)
    pub capacity: usize,
    /// Bytes currently queued
    pub len: usize,
    /// Total bytes ever written
    pub total_written: usize,
    /// Bytes discarded to make room for newer ones
    pub overwritten: usize,
}

/// Fixed-size SPSC byte ring buffer with evict-oldest semantics.
///
/// `N` must be a non-zero power of two. A buffer built with any other size is
/// kept usable but empty: writes return `false`, reads return `None` and the
/// length is always zero.
///
/// Slots and indices are atomics, so one producer context (an interrupt or a
/// reader thread) and one consumer context may share the buffer by reference.
pub struct RingBuffer<const N: usize> {
    /// Pre-allocated storage
    storage: [AtomicU8; N],
    /// `N - 1` for a valid buffer, 0 otherwise
    mask: usize,
    /// Whether the storage size passed validation
    valid: bool,
    /// Next slot to read (tail)
    read_index: AtomicUsize,
    /// Next slot to write (head)
    write_index: AtomicUsize,
    /// Total bytes written (for statistics)
    total_written: AtomicUsize,
    /// Bytes evicted by writes into a full buffer
    overwritten: AtomicUsize,
}

impl<const N: usize> RingBuffer<N> {
    /// Create a new ring buffer.
    ///
    /// An invalid size is logged and yields a zero-capacity buffer.
    pub fn new() -> Self {
        let valid = is_power_of_two(N);
        if !valid {
            warn!("Ring buffer size {} is not a power of two, buffer disabled", N);
        }
        Self {
            storage: std::array::from_fn(|_| AtomicU8::new(0)),
            mask: if valid { N - 1 } else { 0 },
            valid,
            read_index: AtomicUsize::new(0),
            write_index: AtomicUsize::new(0),
            total_written: AtomicUsize::new(0),
            overwritten: AtomicUsize::new(0),
        }
    }

    /// Create a new ring buffer, failing unless `N` is a non-zero power of two
    pub fn try_new() -> Result<Self, RingBufferError> {
        if !is_power_of_two(N) {
            return Err(RingBufferError::InvalidSize(N));
        }
        Ok(Self::new())
    }

    /// Whether the buffer passed size validation
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of bytes currently stored
    pub fn len(&self) -> usize {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        write.wrapping_sub(read) & self.mask
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.valid && self.len() == self.mask
    }

    /// Storage size of the buffer (0 when invalid)
    pub fn capacity(&self) -> usize {
        if self.valid {
            N
        } else {
            0
        }
    }

    /// Maximum number of bytes that can be queued at once
    pub fn max_len(&self) -> usize {
        self.mask
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        if self.mask == 0 {
            return 0.0;
        }
        self.len() as f64 / self.mask as f64
    }

    /// Write a byte, evicting the oldest byte if the buffer is full.
    ///
    /// Returns `false` only for an invalid buffer.
    pub fn write(&self, byte: u8) -> bool {
        if !self.valid {
            return false;
        }

        let write = self.write_index.load(Ordering::Relaxed);
        let read = self.read_index.load(Ordering::Acquire);

        if write.wrapping_sub(read) & self.mask >= self.mask {
            // A failed exchange means the consumer already made room
            if self
                .read_index
                .compare_exchange(
                    read,
                    (read + 1) & self.mask,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                self.overwritten.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.storage[write].store(byte, Ordering::Relaxed);
        self.write_index
            .store((write + 1) & self.mask, Ordering::Release);
        self.total_written.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Read the oldest byte, or `None` when empty or invalid
    pub fn read(&self) -> Option<u8> {
        loop {
            let read = self.read_index.load(Ordering::Acquire);
            let write = self.write_index.load(Ordering::Acquire);
            if write.wrapping_sub(read) & self.mask == 0 {
                return None;
            }

            let byte = self.storage[read].load(Ordering::Relaxed);

            // Retry if the producer evicted this slot underneath us
            if self
                .read_index
                .compare_exchange(
                    read,
                    (read + 1) & self.mask,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Some(byte);
            }
        }
    }

    /// Write every byte of `bytes`, returns the number written
    pub fn write_slice(&self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|&&b| self.write(b)).count()
    }

    /// Read up to `out.len()` bytes, returns the number read
    pub fn read_into(&self, out: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in out.iter_mut() {
            match self.read() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Get total bytes written (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written.load(Ordering::Relaxed)
    }

    /// Counter snapshot
    pub fn stats(&self) -> RingBufferStats {
        RingBufferStats {
            capacity: self.capacity(),
            len: self.len(),
            total_written: self.total_written(),
            overwritten: self.overwritten.load(Ordering::Relaxed),
        }
    }

    /// Discard all queued bytes
    pub fn clear(&self) {
        self.read_index
            .store(self.write_index.load(Ordering::Acquire), Ordering::Release);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for RingBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
