//! Power Controller
//!
//! Board-level wiring of the power converter firmware: module ids and error
//! kinds, the Sys module, the routing and task tables, and the adapters that
//! host the cooperative main loop on a workstation.

mod app;
mod board;
mod config;
mod error;
pub mod sys;
pub mod uart;

pub use app::{serial_update, status, App};
pub use board::{modules, Board, BoardError};
pub use config::{
    ApplicationVersion, ControllerConfig, ProductConfig, TaskIntervals, UartConfig,
    DEFAULT_CONFIG_NAME, ENV_PREFIX,
};
pub use error::ControllerError;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global fmt subscriber at `level` (INFO if unrecognised)
pub fn init_logging(level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}
