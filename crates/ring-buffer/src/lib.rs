//! Lock-Free Ring Buffer
//!
//! Fixed-capacity circular queue used for UART receive and transmit paths.
//! Capacity must be a power of two; one slot is always left unused so that
//! full and empty can be told apart.

mod buffer;
mod error;

pub use buffer::{RingBuffer, RingBufferStats};
pub use error::RingBufferError;

/// Returns true when `value` is a non-zero power of two
pub const fn is_power_of_two(value: usize) -> bool {
    value != 0 && (value & (value - 1)) == 0
}
