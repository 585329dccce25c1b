//! Error Manager Implementation

use crate::error::ErrorManagerError;
use message_router::ModuleId;
use serde::{Deserialize, Serialize};
use soft_timer::{elapsed_ticks, Tick, Timebase};
use std::fmt;
use tracing::{debug, error, info, warn};

/// Flag bits available, one per error kind
pub const MAX_ERROR_KINDS: usize = 32;

/// Index of an error kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ErrorId(pub u8);

impl ErrorId {
    fn mask(self) -> u32 {
        1u32.checked_shl(self.0 as u32).unwrap_or(0)
    }
}

impl From<u8> for ErrorId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Called with the error id whenever a critical error is set
pub type CriticalErrorHook = Box<dyn FnMut(ErrorId) + Send>;

/// Error manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorManagerConfig {
    /// Number of error kinds in use
    pub error_count: usize,
    /// Errors that trigger the critical hook and cannot be ignored
    pub critical_errors: Vec<ErrorId>,
}

impl Default for ErrorManagerConfig {
    fn default() -> Self {
        Self {
            error_count: MAX_ERROR_KINDS,
            critical_errors: Vec::new(),
        }
    }
}

/// Who last moved an error into one state, and when
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Transition {
    timestamp: Tick,
    module_id: ModuleId,
    state: bool,
}

/// Last set and last clear of one error kind
#[derive(Debug, Clone, Copy, Default)]
struct ErrorRecord {
    set: Transition,
    cleared: Transition,
}

/// A recorded transition with its age at query time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetailItem {
    /// Tick of the transition
    pub timestamp: Tick,
    /// Ticks since the transition
    pub age: Tick,
    /// Module that caused the transition
    pub module_id: ModuleId,
    /// State entered
    pub state: bool,
}

/// Full history of one error kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// The transition into the present state
    pub current: ErrorDetailItem,
    /// The transition into the other state
    pub previous: ErrorDetailItem,
    /// Not in the ignore mask
    pub is_enabled: bool,
    /// In the critical mask
    pub is_critical: bool,
}

/// Device error flags with per-kind set/clear history
pub struct ErrorManager {
    /// Id used as the caller for router-initiated changes
    module_id: ModuleId,
    error_count: usize,
    flags: u32,
    critical_mask: u32,
    ignore_mask: u32,
    records: Vec<ErrorRecord>,
    timebase: Timebase,
    on_critical: Option<CriticalErrorHook>,
}

impl ErrorManager {
    /// Create a manager with every error cleared and enabled.
    ///
    /// Critical ids outside `error_count` are rejected.
    pub fn init(
        module_id: ModuleId,
        config: ErrorManagerConfig,
        timebase: Timebase,
    ) -> Result<Self, ErrorManagerError> {
        if config.error_count > MAX_ERROR_KINDS {
            return Err(ErrorManagerError::TooManyErrors {
                count: config.error_count,
                max: MAX_ERROR_KINDS,
            });
        }

        let mut critical_mask = 0;
        for &id in &config.critical_errors {
            if id.0 as usize >= config.error_count {
                return Err(ErrorManagerError::UnknownError(id));
            }
            critical_mask |= id.mask();
        }

        info!(
            "Error manager created with {} errors, critical mask {:08X}",
            config.error_count, critical_mask
        );

        Ok(Self {
            module_id,
            error_count: config.error_count,
            flags: 0,
            critical_mask,
            ignore_mask: 0,
            records: vec![ErrorRecord::default(); config.error_count],
            timebase,
            on_critical: None,
        })
    }

    /// Install the critical-shutdown hook
    pub fn set_critical_hook(&mut self, hook: CriticalErrorHook) {
        self.on_critical = Some(hook);
    }

    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    fn is_known(&self, error: ErrorId) -> bool {
        (error.0 as usize) < self.error_count
    }

    /// Whether `error` is set (false for an unknown id)
    pub fn get_error_state(&self, error: ErrorId) -> bool {
        self.is_known(error) && self.flags & error.mask() != 0
    }

    /// Whether `error` may be set
    pub fn is_error_enabled(&self, error: ErrorId) -> bool {
        self.ignore_mask & error.mask() == 0
    }

    pub fn is_error_critical(&self, error: ErrorId) -> bool {
        self.critical_mask & error.mask() != 0
    }

    /// Move `error` to `new_state` on behalf of `caller`.
    ///
    /// Nothing is recorded unless the state actually changes. An ignored
    /// error is never set; clearing is always allowed.
    pub fn set_error_state(&mut self, caller: ModuleId, error: ErrorId, new_state: bool) {
        if !self.is_known(error) {
            debug!("Ignoring state change for unknown error {}", error);
            return;
        }
        if self.get_error_state(error) == new_state {
            return;
        }

        let transition = Transition {
            timestamp: self.timebase.now(),
            module_id: caller,
            state: new_state,
        };
        let index = error.0 as usize;

        if !new_state {
            self.flags &= !error.mask();
            self.records[index].cleared = transition;
            info!("Error {} cleared by module {}", error, caller);
            return;
        }

        if !self.is_error_enabled(error) {
            debug!("Error {} is ignored, not set", error);
            return;
        }

        self.flags |= error.mask();
        self.records[index].set = transition;

        if self.is_error_critical(error) {
            error!("Critical error {} set by module {}", error, caller);
            if let Some(hook) = self.on_critical.as_mut() {
                hook(error);
            }
        } else {
            warn!("Error {} set by module {}", error, caller);
        }
    }

    /// History of `error` with ages computed now, `None` for an unknown id
    pub fn get_error_details(&self, error: ErrorId) -> Option<ErrorDetails> {
        let record = self.records.get(error.0 as usize)?;
        let now = self.timebase.now();
        let item = |t: &Transition| ErrorDetailItem {
            timestamp: t.timestamp,
            age: elapsed_ticks(t.timestamp, now),
            module_id: t.module_id,
            state: t.state,
        };

        let (current, previous) = if self.get_error_state(error) {
            (item(&record.set), item(&record.cleared))
        } else {
            (item(&record.cleared), item(&record.set))
        };

        Some(ErrorDetails {
            current,
            previous,
            is_enabled: self.is_error_enabled(error),
            is_critical: self.is_error_critical(error),
        })
    }

    /// Bit per set error
    pub fn error_flags(&self) -> u32 {
        self.flags
    }

    pub fn do_any_errors_exist(&self) -> bool {
        self.flags != 0
    }

    pub fn do_any_critical_errors_exist(&self) -> bool {
        self.flags & self.critical_mask != 0
    }

    /// Clear every set error; untouched errors keep their clear timestamps
    pub fn clear_all_errors(&mut self, caller: ModuleId) {
        for index in 0..self.error_count {
            self.set_error_state(caller, ErrorId(index as u8), false);
        }
    }

    /// Add `error` to or remove it from the ignore mask.
    ///
    /// Disabling does not clear an error that is already set.
    pub fn set_error_enabled(&mut self, error: ErrorId, enabled: bool) -> Result<(), ErrorManagerError> {
        if !self.is_known(error) {
            return Err(ErrorManagerError::UnknownError(error));
        }
        if enabled {
            self.ignore_mask &= !error.mask();
        } else {
            if self.is_error_critical(error) {
                return Err(ErrorManagerError::CriticalNotMaskable(error));
            }
            self.ignore_mask |= error.mask();
        }
        debug!("Error {} enabled: {}", error, enabled);
        Ok(())
    }

    /// Empty the ignore mask
    pub fn enable_all_errors(&mut self) {
        self.ignore_mask = 0;
    }

    pub fn ignore_mask(&self) -> u32 {
        self.ignore_mask
    }

    pub fn critical_mask(&self) -> u32 {
        self.critical_mask
    }
}

impl fmt::Debug for ErrorManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorManager")
            .field("module_id", &self.module_id)
            .field("flags", &format_args!("{:08X}", self.flags))
            .field("critical_mask", &format_args!("{:08X}", self.critical_mask))
            .field("ignore_mask", &format_args!("{:08X}", self.ignore_mask))
            .finish()
    }
}
