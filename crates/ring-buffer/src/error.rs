//! Ring Buffer Error Types

use thiserror::Error;

/// Errors raised while constructing a ring buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingBufferError {
    /// Storage size is zero or not a power of two
    #[error("Ring buffer size {0} is not a non-zero power of two")]
    InvalidSize(usize),
}
