//! Error Manager
//!
//! Keeps one flag per device error kind together with who set or cleared it
//! and when. Errors can be marked critical (setting one fires a shutdown
//! hook) or ignored (it can never be set). The manager is also a router
//! module so a host can inspect and clear errors over the serial link.

mod error;
mod handlers;
mod manager;

pub use error::ErrorManagerError;
pub use handlers::{command_table, commands, ErrorDetailsResponse, ErrorStateResponse};
pub use manager::{
    CriticalErrorHook, ErrorDetailItem, ErrorDetails, ErrorId, ErrorManager, ErrorManagerConfig,
    MAX_ERROR_KINDS,
};
