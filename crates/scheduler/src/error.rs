//! Scheduler Error Types

use thiserror::Error;

/// Errors raised while building a schedule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// More tasks than timer slots
    #[error("Schedule has {count} tasks, maximum is {max}")]
    TooManyTasks { count: usize, max: usize },

    /// Interval of zero or beyond the soft timer range
    #[error("Task '{name}' has invalid interval {interval_ms}ms")]
    InvalidInterval { name: &'static str, interval_ms: u32 },
}
