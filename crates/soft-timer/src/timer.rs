//! Software Countdown / Count-Up Timer

use crate::error::TimerError;
use crate::limits::MAX_DURATION_MS;
use crate::timebase::{elapsed_ticks, ms_to_ticks, ticks_to_ms, Tick, TickSource};

/// Duration value reserved for a stopped timer
const STOPPED: Tick = Tick::MAX;

/// A timer measured against a [`TickSource`].
///
/// Timers hold no reference to the clock; every query takes one. A stopped
/// timer is never expired and has no elapsed or remaining time. An expired
/// timer keeps reporting expiry until it is restarted or stopped.
///
/// The counter may wrap once while a timer runs, so a timer must be checked
/// more often than the full tick range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftTimer {
    start_timestamp: Tick,
    duration_ticks: Tick,
}

impl SoftTimer {
    /// Create a stopped timer
    pub const fn new() -> Self {
        Self {
            start_timestamp: 0,
            duration_ticks: STOPPED,
        }
    }

    /// Start a countdown of `duration_ms` from the current tick
    pub fn start<S: TickSource + ?Sized>(
        &mut self,
        clock: &S,
        duration_ms: u32,
    ) -> Result<(), TimerError> {
        if duration_ms > MAX_DURATION_MS {
            return Err(TimerError::DurationTooLong {
                requested_ms: duration_ms,
                max_ms: MAX_DURATION_MS,
            });
        }
        self.start_timestamp = clock.now();
        self.duration_ticks = ms_to_ticks(duration_ms);
        Ok(())
    }

    /// Start a count-up timer; read it back with [`SoftTimer::elapsed_ms`]
    pub fn start_measurement<S: TickSource + ?Sized>(&mut self, clock: &S) {
        self.start_timestamp = clock.now();
        self.duration_ticks = ms_to_ticks(MAX_DURATION_MS);
    }

    /// Stop the timer
    pub fn stop(&mut self) {
        self.duration_ticks = STOPPED;
    }

    /// Whether the timer has been started and not stopped
    pub fn is_running(&self) -> bool {
        self.duration_ticks != STOPPED
    }

    /// Configured duration, `None` when stopped
    pub fn duration_ticks(&self) -> Option<Tick> {
        self.is_running().then_some(self.duration_ticks)
    }

    /// Whether a running timer has reached its duration (inclusive)
    pub fn is_expired<S: TickSource + ?Sized>(&self, clock: &S) -> bool {
        self.is_running() && self.elapsed_ticks(clock) >= self.duration_ticks
    }

    /// Ticks since the timer was started (0 when stopped)
    pub fn elapsed_ticks<S: TickSource + ?Sized>(&self, clock: &S) -> Tick {
        if !self.is_running() {
            return 0;
        }
        elapsed_ticks(self.start_timestamp, clock.now())
    }

    /// Milliseconds since the timer was started (0 when stopped)
    pub fn elapsed_ms<S: TickSource + ?Sized>(&self, clock: &S) -> u32 {
        ticks_to_ms(self.elapsed_ticks(clock))
    }

    /// Ticks left before expiry (0 when expired or stopped)
    pub fn remaining_ticks<S: TickSource + ?Sized>(&self, clock: &S) -> Tick {
        if !self.is_running() {
            return 0;
        }
        self.duration_ticks
            .saturating_sub(self.elapsed_ticks(clock))
    }

    /// Milliseconds left before expiry (0 when expired or stopped)
    pub fn remaining_ms<S: TickSource + ?Sized>(&self, clock: &S) -> u32 {
        ticks_to_ms(self.remaining_ticks(clock))
    }
}

impl Default for SoftTimer {
    fn default() -> Self {
        Self::new()
    }
}
