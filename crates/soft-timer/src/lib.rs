//! Timebase and Software Timers
//!
//! A single 32-bit tick counter (1 tick = 1 ms) is advanced by the periodic
//! tick interrupt. Any number of [`SoftTimer`]s measure against it.

mod error;
mod timebase;
mod timer;

pub use error::TimerError;
pub use timebase::{elapsed_ticks, ms_to_ticks, ticks_to_ms, Tick, TickSource, Timebase};
pub use timer::SoftTimer;

/// Timing constants
pub mod limits {
    use crate::Tick;

    /// Largest value the tick counter reaches before wrapping to zero
    pub const MAX_TICK: Tick = Tick::MAX;
    /// Tick rate of the timebase
    pub const TICKS_PER_MILLISECOND: u32 = 1;
    /// Milliseconds in one day
    pub const MILLISECONDS_PER_DAY: u32 = 24 * 60 * 60 * 1000;
    /// Longest countdown a timer accepts
    pub const MAX_DURATION_MS: u32 = MILLISECONDS_PER_DAY;
}
