//! Timer Error Types

use thiserror::Error;

/// Errors raised when starting a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// Requested duration exceeds the supported maximum
    #[error("Timer duration {requested_ms}ms exceeds maximum of {max_ms}ms")]
    DurationTooLong { requested_ms: u32, max_ms: u32 },
}
