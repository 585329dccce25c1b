//! Controller Error Types

use error_manager::ErrorManagerError;
use message_router::RouterError;
use scheduler::SchedulerError;
use serial_protocol::SerialError;
use thiserror::Error;

/// Errors raised while bringing the controller up
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Routing tables rejected
    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    /// Serial channels could not be created
    #[error("Serial error: {0}")]
    Serial(#[from] SerialError),

    /// Error manager configuration rejected
    #[error("Error manager error: {0}")]
    ErrorManager(#[from] ErrorManagerError),

    /// Task table rejected
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Serial device could not be opened
    #[error("UART error: {0}")]
    Uart(#[from] tokio_serial::Error),
}
