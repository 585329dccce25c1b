//! Command Frame Accumulator

use crate::consts::{COMMAND_MAX_SIZE_HASCII, COMMAND_START, STOP_CR, STOP_LF};
use serde::{Deserialize, Serialize};

/// Accumulator state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramerState {
    /// Waiting for a START byte
    #[default]
    Idle,
    /// Capturing bytes after a START
    Accumulating,
}

/// Result of feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerEvent {
    /// Nothing to report
    Pending,
    /// A STOP byte ended a frame; read it with [`Framer::frame`]
    Complete,
    /// A START byte discarded a partial frame
    Restarted,
    /// The frame outgrew the accumulator and was discarded
    Overflow,
}

/// Byte-at-a-time frame capture.
///
/// Only the characters between START and STOP are kept. A START while
/// accumulating restarts capture, an oversized frame is discarded and bytes
/// outside a frame are ignored.
#[derive(Debug, Clone)]
pub struct Framer {
    state: FramerState,
    buffer: [u8; COMMAND_MAX_SIZE_HASCII],
    len: usize,
}

impl Framer {
    pub const fn new() -> Self {
        Self {
            state: FramerState::Idle,
            buffer: [0; COMMAND_MAX_SIZE_HASCII],
            len: 0,
        }
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Feed one received byte
    pub fn push(&mut self, byte: u8) -> FramerEvent {
        match (self.state, byte) {
            (FramerState::Idle, COMMAND_START) => {
                self.state = FramerState::Accumulating;
                self.len = 0;
                FramerEvent::Pending
            }
            (FramerState::Idle, _) => FramerEvent::Pending,
            (FramerState::Accumulating, COMMAND_START) => {
                let restarted = self.len > 0;
                self.len = 0;
                if restarted {
                    FramerEvent::Restarted
                } else {
                    FramerEvent::Pending
                }
            }
            (FramerState::Accumulating, STOP_CR | STOP_LF) => {
                self.state = FramerState::Idle;
                FramerEvent::Complete
            }
            (FramerState::Accumulating, _) => {
                if self.len < self.buffer.len() {
                    self.buffer[self.len] = byte;
                    self.len += 1;
                    FramerEvent::Pending
                } else {
                    self.reset();
                    FramerEvent::Overflow
                }
            }
        }
    }

    /// Characters of the last completed (or in-progress) frame
    pub fn frame(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Drop any partial frame and return to idle
    pub fn reset(&mut self) {
        self.state = FramerState::Idle;
        self.len = 0;
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(framer: &mut Framer, bytes: &[u8]) -> Vec<FramerEvent> {
        bytes.iter().map(|&b| framer.push(b)).collect()
    }

    #[test]
    fn test_complete_frame() {
        let mut framer = Framer::new();
        let events = feed(&mut framer, b"noise<0102\r");
        assert_eq!(events.last(), Some(&FramerEvent::Complete));
        assert_eq!(framer.frame(), b"0102");
        assert_eq!(framer.state(), FramerState::Idle);
    }

    #[test]
    fn test_line_feed_terminates() {
        let mut framer = Framer::new();
        assert_eq!(feed(&mut framer, b"<AB\n").last(), Some(&FramerEvent::Complete));
        assert_eq!(framer.frame(), b"AB");
    }

    #[test]
    fn test_start_restarts_capture() {
        let mut framer = Framer::new();
        let events = feed(&mut framer, b"<0001<0203\r");
        assert!(events.contains(&FramerEvent::Restarted));
        assert_eq!(framer.frame(), b"0203");
    }

    #[test]
    fn test_stop_while_idle_ignored() {
        let mut framer = Framer::new();
        assert_eq!(framer.push(b'\r'), FramerEvent::Pending);
        assert_eq!(framer.state(), FramerState::Idle);
    }

    #[test]
    fn test_overflow_discards_frame() {
        let mut framer = Framer::new();
        framer.push(b'<');
        for _ in 0..COMMAND_MAX_SIZE_HASCII {
            assert_eq!(framer.push(b'0'), FramerEvent::Pending);
        }
        assert_eq!(framer.push(b'0'), FramerEvent::Overflow);
        assert_eq!(framer.state(), FramerState::Idle);

        // Tail of the oversized frame is noise until the next START
        assert_eq!(framer.push(b'\r'), FramerEvent::Pending);
        assert_eq!(feed(&mut framer, b"<11\r").last(), Some(&FramerEvent::Complete));
        assert_eq!(framer.frame(), b"11");
    }
}
