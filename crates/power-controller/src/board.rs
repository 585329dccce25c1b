//! Board Definition
//!
//! Module ids, error kinds and the context every handler and task runs on.

use crate::config::{ControllerConfig, ProductConfig};
use crate::error::ControllerError;
use error_manager::{ErrorId, ErrorManager, ErrorManagerConfig};
use message_router::ModuleId;
use serial_protocol::SerialPorts;
use soft_timer::Timebase;
use tracing::info;

/// Router module ids
pub mod modules {
    /// The router itself; also the caller id of router-driven error changes
    pub const ROUTER: u16 = 0x00;
    pub const SYS: u16 = 0x01;
    pub const ERROR_MANAGER: u16 = 0x02;
    pub const SERIAL: u16 = 0x03;
}

/// Error kinds raised on this board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BoardError {
    Standard = 0,
    Critical = 1,
    OverCurrent = 2,
    OverVoltage = 3,
    OverTemp = 4,
    GateDriver = 5,
}

impl BoardError {
    pub const COUNT: usize = 6;

    pub const ALL: [BoardError; Self::COUNT] = [
        BoardError::Standard,
        BoardError::Critical,
        BoardError::OverCurrent,
        BoardError::OverVoltage,
        BoardError::OverTemp,
        BoardError::GateDriver,
    ];

    /// Everything but `Standard` forces a shutdown
    pub fn is_critical(self) -> bool {
        self != BoardError::Standard
    }

    pub fn id(self) -> ErrorId {
        ErrorId(self as u8)
    }

    /// Error manager table for this board
    pub fn manager_config() -> ErrorManagerConfig {
        ErrorManagerConfig {
            error_count: Self::COUNT,
            critical_errors: Self::ALL
                .iter()
                .filter(|e| e.is_critical())
                .map(|e| e.id())
                .collect(),
        }
    }
}

impl From<BoardError> for ErrorId {
    fn from(error: BoardError) -> Self {
        error.id()
    }
}

/// Shared firmware context: every subsystem a handler or task can reach
#[derive(Debug)]
pub struct Board {
    pub timebase: Timebase,
    pub product: ProductConfig,
    pub errors: ErrorManager,
    pub serial: SerialPorts,
}

impl Board {
    /// Initialise the board subsystems in dependency order
    pub fn init(config: &ControllerConfig, timebase: Timebase) -> Result<Self, ControllerError> {
        let errors = ErrorManager::init(
            ModuleId(modules::ERROR_MANAGER),
            config.errors.clone(),
            timebase.clone(),
        )?;
        let serial = SerialPorts::init(config.serial.clone(), timebase.clone())?;

        info!(
            "Board {} (0x{:04X}) initialised",
            config.product.product_name, config.product.product_id
        );

        Ok(Self {
            timebase,
            product: config.product.clone(),
            errors,
            serial,
        })
    }

    /// Raise or clear a board error on behalf of `caller`
    pub fn set_error(&mut self, caller: ModuleId, error: BoardError, active: bool) {
        self.errors.set_error_state(caller, error.into(), active);
    }
}

impl AsMut<ErrorManager> for Board {
    fn as_mut(&mut self) -> &mut ErrorManager {
        &mut self.errors
    }
}

impl AsMut<SerialPorts> for Board {
    fn as_mut(&mut self) -> &mut SerialPorts {
        &mut self.serial
    }
}
