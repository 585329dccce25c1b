//! Router Error Types

use crate::message::{CommandId, ModuleId};
use thiserror::Error;

/// Errors raised while building routing tables or messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Two modules share an id
    #[error("Module id {0} registered more than once")]
    DuplicateModule(ModuleId),

    /// Two commands in one module share an id
    #[error("Command id {command} registered more than once in module {module}")]
    DuplicateCommand { module: ModuleId, command: CommandId },

    /// Payload does not fit a message buffer
    #[error("Payload of {len} bytes exceeds buffer capacity of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
}
