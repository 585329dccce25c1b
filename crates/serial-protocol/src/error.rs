//! Serial Protocol Error Types

use thiserror::Error;

/// Errors raised by serial channel setup and frame encoding.
///
/// Malformed traffic is never an error here; it is dropped or answered with a
/// response code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialError {
    /// Channel index out of range
    #[error("Serial channel {0} does not exist")]
    InvalidChannel(usize),

    /// Channel count outside `1..=max`
    #[error("Invalid serial channel count {count} (max {max})")]
    InvalidChannelCount { count: usize, max: usize },

    /// Output buffer cannot hold the encoded frame
    #[error("Frame of {needed} bytes does not fit a {available} byte buffer")]
    BufferTooSmall { needed: usize, available: usize },

    /// Received frame is not a well-formed response
    #[error("Invalid response frame: {0}")]
    InvalidFrame(&'static str),

    /// Response checksum mismatch
    #[error("Checksum mismatch: expected {expected:04X}, got {actual:04X}")]
    ChecksumMismatch { expected: u16, actual: u16 },
}
