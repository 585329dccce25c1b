//! Error Manager Error Types

use crate::manager::ErrorId;
use thiserror::Error;

/// Errors raised by error manager setup and mask changes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorManagerError {
    /// More error kinds than flag bits
    #[error("Error count {count} exceeds maximum {max}")]
    TooManyErrors { count: usize, max: usize },

    /// Error id outside the configured range
    #[error("Unknown error id {0}")]
    UnknownError(ErrorId),

    /// Critical errors cannot be ignored
    #[error("Critical error {0} cannot be disabled")]
    CriticalNotMaskable(ErrorId),
}
