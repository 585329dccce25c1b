//! Scheduler Implementation

use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};
use soft_timer::limits::MAX_DURATION_MS;
use soft_timer::{SoftTimer, Timebase};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Number of timer slots available to the schedule
pub const MAX_SCHEDULED_TASKS: usize = 16;

/// A scheduled function. Receives the shared firmware context.
pub type TaskFn<C> = fn(&mut C);

/// One row of the schedule table
pub struct ScheduledTask<C> {
    /// Name used in logs
    pub name: &'static str,
    /// Period measured from one call start to the next
    pub interval_ms: u32,
    /// Function to run; must return promptly
    pub run: TaskFn<C>,
}

impl<C> ScheduledTask<C> {
    /// Create a schedule entry
    pub const fn new(name: &'static str, interval_ms: u32, run: TaskFn<C>) -> Self {
        Self {
            name,
            interval_ms,
            run,
        }
    }
}

impl<C> Clone for ScheduledTask<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ScheduledTask<C> {}

impl<C> std::fmt::Debug for ScheduledTask<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .field("interval_ms", &self.interval_ms)
            .finish()
    }
}

/// Configuration for the scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Timer slots available (capped at [`MAX_SCHEDULED_TASKS`])
    pub max_tasks: usize,
    /// Yield the OS thread after a pass in which nothing ran
    pub yield_when_idle: bool,
    /// Sleep this long after an idle pass instead of yielding (0 = never)
    pub idle_sleep_us: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_tasks: MAX_SCHEDULED_TASKS,
            yield_when_idle: true,
            idle_sleep_us: 0,
        }
    }
}

/// Scheduler run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// Initialized, timers not running
    Stopped,
    /// Timers started, main loop active
    Running,
}

/// Thread-safe handle that ends [`Scheduler::execute`].
///
/// The request is checked between passes; a running task is never
/// interrupted. A request made before `execute` starts is kept, and that
/// `execute` returns without looping.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request the scheduler loop to exit
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested and not yet served
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Whether the loop is still active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.is_stop_requested()
    }
}

/// Cooperative round-robin scheduler over a context `C`
pub struct Scheduler<C> {
    /// Schedule table
    tasks: Vec<ScheduledTask<C>>,
    /// One timer per table entry
    timers: Vec<SoftTimer>,
    /// Times each task has run
    run_counts: Vec<u64>,
    /// Tick source shared with the tick interrupt
    timebase: Timebase,
    /// Set by `start`, cleared when the loop exits
    running: Arc<AtomicBool>,
    /// Set by a stop request, cleared once the loop has exited
    stop_requested: Arc<AtomicBool>,
    /// Configuration
    config: SchedulerConfig,
}

impl<C> Scheduler<C> {
    /// Build a scheduler for `tasks`.
    ///
    /// Fails if the table is larger than the timer slots or an interval is
    /// zero or longer than a soft timer can count.
    pub fn init(
        config: SchedulerConfig,
        tasks: Vec<ScheduledTask<C>>,
        timebase: Timebase,
    ) -> Result<Self, SchedulerError> {
        let max = config.max_tasks.min(MAX_SCHEDULED_TASKS);
        if tasks.len() > max {
            return Err(SchedulerError::TooManyTasks {
                count: tasks.len(),
                max,
            });
        }

        if let Some(task) = tasks
            .iter()
            .find(|t| t.interval_ms == 0 || t.interval_ms > MAX_DURATION_MS)
        {
            return Err(SchedulerError::InvalidInterval {
                name: task.name,
                interval_ms: task.interval_ms,
            });
        }

        info!("Scheduler created with {} tasks", tasks.len());

        Ok(Self {
            timers: vec![SoftTimer::new(); tasks.len()],
            run_counts: vec![0; tasks.len()],
            tasks,
            timebase,
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            config,
        })
    }

    /// Start every task timer and mark the scheduler running
    pub fn start(&mut self) {
        for (task, timer) in self.tasks.iter().zip(self.timers.iter_mut()) {
            if let Err(e) = timer.start(&self.timebase, task.interval_ms) {
                warn!("Could not start timer for task {}: {}", task.name, e);
            }
        }
        self.running.store(true, Ordering::Release);
        info!("Scheduler started");
    }

    /// Run one pass over the table, invoking every task whose timer expired.
    ///
    /// The timer is restarted before the task runs so the period is measured
    /// call-start to call-start. Returns the number of tasks that ran.
    pub fn poll(&mut self, ctx: &mut C) -> usize {
        let mut ran = 0;
        for index in 0..self.tasks.len() {
            if !self.timers[index].is_expired(&self.timebase) {
                continue;
            }

            let task = self.tasks[index];
            if let Err(e) = self.timers[index].start(&self.timebase, task.interval_ms) {
                warn!("Could not restart timer for task {}: {}", task.name, e);
            }

            (task.run)(ctx);
            self.run_counts[index] += 1;
            ran += 1;
        }
        ran
    }

    /// Start the timers and loop until stopped.
    ///
    /// This is the firmware main loop; it only returns once [`Scheduler::stop`]
    /// or a [`StopHandle`] requests a stop, including one requested before
    /// the call.
    pub fn execute(&mut self, ctx: &mut C) {
        self.start();

        while !self.stop_requested.load(Ordering::Acquire) {
            if self.poll(ctx) == 0 {
                self.idle();
            }
        }

        self.running.store(false, Ordering::Release);
        self.stop_requested.store(false, Ordering::Release);
        info!("Scheduler stopped");
    }

    fn idle(&self) {
        if self.config.idle_sleep_us > 0 {
            std::thread::sleep(Duration::from_micros(self.config.idle_sleep_us));
        } else if self.config.yield_when_idle {
            std::thread::yield_now();
        }
    }

    /// Ask the loop to exit after the current pass
    pub fn stop(&self) {
        debug!("Scheduler stop requested");
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Handle that can stop the loop from a task or another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
            stop_requested: Arc::clone(&self.stop_requested),
        }
    }

    /// Current run state
    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) && !self.stop_requested.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Number of scheduled tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Times the task at `index` has run
    pub fn run_count(&self, index: usize) -> Option<u64> {
        self.run_counts.get(index).copied()
    }
}
