//! Controller Configuration
//!
//! Compiled-in board values, optionally overridden by a TOML file and
//! `POWER_CTRL__*` environment variables.

use crate::board::BoardError;
use crate::error::ControllerError;
use error_manager::ErrorManagerConfig;
use scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use serial_protocol::SerialConfig;
use std::path::Path;
use tracing::info;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "power-controller";

/// Prefix of environment overrides, e.g. `POWER_CTRL__UART__DEVICE`
pub const ENV_PREFIX: &str = "POWER_CTRL";

/// Idle sleep of the host main loop, well under one tick
pub const HOST_IDLE_SLEEP_US: u64 = 200;

/// Firmware version reported by the Sys module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
}

impl Default for ApplicationVersion {
    fn default() -> Self {
        Self {
            major: 0,
            minor: 0,
            build: 1,
        }
    }
}

/// Product identity reported by the Sys module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    pub product_id: u16,
    pub product_name: String,
    pub version: ApplicationVersion,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            product_id: 28388,
            product_name: "PowerCore".to_string(),
            version: ApplicationVersion::default(),
        }
    }
}

/// Port behind serial channel 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UartConfig {
    /// Serial device path; stdin/stdout when unset
    pub device: Option<String>,
    pub baud_rate: u32,
    /// How often pending transmit bytes are flushed to the port
    pub flush_interval_ms: u64,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            device: None,
            baud_rate: 115_200,
            flush_interval_ms: 5,
        }
    }
}

/// Periods of the board task table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskIntervals {
    pub serial_update_ms: u32,
    pub status_ms: u32,
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            serial_update_ms: 100,
            status_ms: 1000,
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub log_level: String,
    /// Stop the scheduler when a critical error is raised
    pub shutdown_on_critical: bool,
    pub product: ProductConfig,
    pub uart: UartConfig,
    pub serial: SerialConfig,
    pub scheduler: SchedulerConfig,
    pub errors: ErrorManagerConfig,
    pub tasks: TaskIntervals,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            shutdown_on_critical: false,
            product: ProductConfig::default(),
            uart: UartConfig::default(),
            serial: SerialConfig::default(),
            scheduler: SchedulerConfig {
                idle_sleep_us: HOST_IDLE_SLEEP_US,
                ..SchedulerConfig::default()
            },
            errors: BoardError::manager_config(),
            tasks: TaskIntervals::default(),
        }
    }
}

impl ControllerConfig {
    /// Layer a config file and the environment over the defaults.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ControllerError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        info!(
            "Configuration loaded: {} channel(s), {} error kinds",
            loaded.serial.channel_count, loaded.errors.error_count
        );
        Ok(loaded)
    }
}
