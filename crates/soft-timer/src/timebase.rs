//! System Tick Counter

use crate::limits::{MAX_TICK, TICKS_PER_MILLISECOND};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Timebase tick value
pub type Tick = u32;

/// Anything that can report the current tick
pub trait TickSource {
    /// Current tick count
    fn now(&self) -> Tick;
}

/// Shared tick counter.
///
/// Clones share the same counter: the tick interrupt (or a host thread
/// standing in for it) calls [`Timebase::tick`] while everything else reads.
#[derive(Debug, Clone, Default)]
pub struct Timebase {
    ticks: Arc<AtomicU32>,
}

impl Timebase {
    /// Create a timebase starting at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timebase starting at the given tick
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            ticks: Arc::new(AtomicU32::new(tick)),
        }
    }

    /// Advance by one tick, wrapping at [`MAX_TICK`]. Returns the new value.
    pub fn tick(&self) -> Tick {
        self.ticks.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Advance by `ticks`, wrapping
    pub fn advance(&self, ticks: Tick) -> Tick {
        self.ticks.fetch_add(ticks, Ordering::AcqRel).wrapping_add(ticks)
    }

    /// Force the counter to a value
    pub fn set(&self, tick: Tick) {
        self.ticks.store(tick, Ordering::Release);
    }

    /// Current tick count
    pub fn now(&self) -> Tick {
        self.ticks.load(Ordering::Acquire)
    }

    /// Milliseconds represented by the current tick count
    pub fn uptime_ms(&self) -> u32 {
        ticks_to_ms(self.now())
    }
}

impl TickSource for Timebase {
    fn now(&self) -> Tick {
        Timebase::now(self)
    }
}

/// Ticks between `start` and `end`, allowing for one counter wrap
pub fn elapsed_ticks(start: Tick, end: Tick) -> Tick {
    if end >= start {
        end - start
    } else {
        end + (MAX_TICK - start) + 1
    }
}

/// Convert ticks to whole milliseconds
pub const fn ticks_to_ms(ticks: Tick) -> u32 {
    ticks / TICKS_PER_MILLISECOND
}

/// Convert milliseconds to ticks
pub const fn ms_to_ticks(ms: u32) -> Tick {
    ms * TICKS_PER_MILLISECOND
}
