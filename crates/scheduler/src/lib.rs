//! Cooperative Task Scheduler
//!
//! Runs a fixed table of periodic tasks on a single execution context. Each
//! task has its own interval and runs to completion before the next one is
//! checked; there is no preemption and no catch-up for missed periods.

mod error;
mod scheduler;

pub use error::SchedulerError;
pub use scheduler::{
    ScheduledTask, Scheduler, SchedulerConfig, SchedulerState, StopHandle, TaskFn,
    MAX_SCHEDULED_TASKS,
};
