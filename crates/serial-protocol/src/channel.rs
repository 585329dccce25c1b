//! Serial Channels

use crate::codec::{decode_command, encode_response, Decoded};
use crate::config::SerialConfig;
use crate::consts::{MAX_CHANNELS, RESPONSE_MAX_SIZE, RX_BUFFER_SIZE, TX_BUFFER_SIZE};
use crate::error::SerialError;
use crate::framer::{Framer, FramerEvent};
use message_router::{Message, ResponseCode};
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use soft_timer::{SoftTimer, Timebase};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-channel traffic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialStatistics {
    /// Bytes queued for transmit
    pub bytes_sent: u32,
    /// Bytes taken from the receive buffer
    pub bytes_received: u32,
    /// Responses queued for transmit
    pub messages_sent: u32,
    /// Frames whose header could be read
    pub messages_received: u32,
    /// Frames discarded without a response
    pub frames_dropped: u32,
}

/// A frame taken off a channel, ready for the router or for an error reply
#[derive(Debug, Clone, Copy)]
pub enum Inbound {
    /// A valid command to dispatch
    Command(Message),
    /// A frame rejected before dispatch; its response code is already set
    Rejected(Message),
}

/// Driver side of a channel's ring buffers.
///
/// Cloned into whatever moves bytes to and from the port (a UART interrupt,
/// a reader thread or an async task) while the channel stays with the
/// protocol loop.
#[derive(Debug, Clone)]
pub struct UartHandle {
    channel: usize,
    rx: Arc<RingBuffer<RX_BUFFER_SIZE>>,
    tx: Arc<RingBuffer<TX_BUFFER_SIZE>>,
}

impl UartHandle {
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Queue bytes read from the port. Returns the count accepted.
    pub fn receive(&self, bytes: &[u8]) -> usize {
        self.rx.write_slice(bytes)
    }

    /// Take bytes to write to the port
    pub fn transmit(&self, out: &mut [u8]) -> usize {
        self.tx.read_into(out)
    }

    /// Bytes waiting to be written to the port
    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }
}

/// One UART port: ring buffers, frame accumulator and statistics
#[derive(Debug)]
pub struct SerialChannel {
    index: usize,
    rx: Arc<RingBuffer<RX_BUFFER_SIZE>>,
    tx: Arc<RingBuffer<TX_BUFFER_SIZE>>,
    framer: Framer,
    message: Message,
    statistics: SerialStatistics,
    since_last_message: SoftTimer,
    last_response_code: ResponseCode,
}

impl SerialChannel {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            rx: Arc::new(RingBuffer::new()),
            tx: Arc::new(RingBuffer::new()),
            framer: Framer::new(),
            message: Message::default(),
            statistics: SerialStatistics::default(),
            since_last_message: SoftTimer::new(),
            last_response_code: ResponseCode::None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Handle for the port driver
    pub fn uart(&self) -> UartHandle {
        UartHandle {
            channel: self.index,
            rx: Arc::clone(&self.rx),
            tx: Arc::clone(&self.tx),
        }
    }

    /// Queue received bytes (driver side). Returns the count accepted.
    pub fn push_rx(&self, bytes: &[u8]) -> usize {
        self.rx.write_slice(bytes)
    }

    /// Take bytes waiting for transmit (driver side)
    pub fn pop_tx(&self, out: &mut [u8]) -> usize {
        self.tx.read_into(out)
    }

    /// Bytes waiting for transmit
    pub fn tx_pending(&self) -> usize {
        self.tx.len()
    }

    /// Consume buffered bytes until one frame completes.
    ///
    /// Partial frames persist across calls. Frames that cannot be answered
    /// are dropped and counted here.
    pub fn poll(&mut self, config: &SerialConfig, clock: &Timebase) -> Option<Inbound> {
        while let Some(byte) = self.rx.read() {
            self.statistics.bytes_received = self.statistics.bytes_received.wrapping_add(1);

            match self.framer.push(byte) {
                FramerEvent::Pending => {}
                FramerEvent::Restarted => {
                    debug!("Channel {}: partial frame discarded by new start byte", self.index);
                }
                FramerEvent::Overflow => {
                    self.statistics.frames_dropped = self.statistics.frames_dropped.wrapping_add(1);
                    warn!("Channel {}: oversized frame dropped", self.index);
                }
                FramerEvent::Complete => {
                    if let Some(inbound) = self.decode(config, clock) {
                        return Some(inbound);
                    }
                }
            }
        }
        None
    }

    fn decode(&mut self, config: &SerialConfig, clock: &Timebase) -> Option<Inbound> {
        match decode_command(self.framer.frame(), config, &mut self.message) {
            Decoded::Dropped(reason) => {
                self.statistics.frames_dropped = self.statistics.frames_dropped.wrapping_add(1);
                warn!("Channel {}: frame dropped: {}", self.index, reason);
                None
            }
            Decoded::Rejected(code) => {
                self.count_received(clock);
                debug!(
                    "Channel {}: message {} rejected: {}",
                    self.index, self.message.header.message_id, code
                );
                Some(Inbound::Rejected(self.message))
            }
            Decoded::Command => {
                self.count_received(clock);
                Some(Inbound::Command(self.message))
            }
        }
    }

    fn count_received(&mut self, clock: &Timebase) {
        self.statistics.messages_received = self.statistics.messages_received.wrapping_add(1);
        self.since_last_message.start_measurement(clock);
    }

    /// Encode the response held by `message` into the transmit buffer
    pub fn send_response(&mut self, message: &Message, config: &SerialConfig) {
        let code = message.response_code();
        self.last_response_code = code;
        if !code.is_ok() {
            warn!(
                "Channel {}: message {} to module {} failed: {}",
                self.index, message.header.message_id, message.header.module_id, code
            );
        }

        let mut frame = [0u8; RESPONSE_MAX_SIZE];
        let len = match encode_response(message, config, &mut frame) {
            Ok(len) => len,
            Err(e) => {
                warn!("Channel {}: response not sent: {}", self.index, e);
                return;
            }
        };

        let written = self.tx.write_slice(&frame[..len]);
        self.statistics.bytes_sent = self.statistics.bytes_sent.wrapping_add(written as u32);
        self.statistics.messages_sent = self.statistics.messages_sent.wrapping_add(1);
    }

    pub fn statistics(&self) -> SerialStatistics {
        self.statistics
    }

    /// Milliseconds since the last frame with a readable header (0 if none yet)
    pub fn ms_since_last_message(&self, clock: &Timebase) -> u32 {
        self.since_last_message.elapsed_ms(clock)
    }

    /// Response code of the last reply sent on this channel
    pub fn last_response_code(&self) -> ResponseCode {
        self.last_response_code
    }

    pub fn reset_statistics(&mut self) {
        self.statistics = SerialStatistics::default();
        self.since_last_message.stop();
    }
}

/// Every serial channel of the board plus the shared protocol settings
#[derive(Debug)]
pub struct SerialPorts {
    config: SerialConfig,
    channels: Vec<SerialChannel>,
    timebase: Timebase,
}

impl SerialPorts {
    /// Create `config.channel_count` channels
    pub fn init(config: SerialConfig, timebase: Timebase) -> Result<Self, SerialError> {
        if config.channel_count == 0 || config.channel_count > MAX_CHANNELS {
            return Err(SerialError::InvalidChannelCount {
                count: config.channel_count,
                max: MAX_CHANNELS,
            });
        }

        info!(
            "Serial protocol initialized: {} channels, crc {:?}, hex {:?}",
            config.channel_count, config.crc_policy, config.hex_policy
        );

        Ok(Self {
            channels: (0..config.channel_count).map(SerialChannel::new).collect(),
            config,
            timebase,
        })
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    pub fn timebase(&self) -> &Timebase {
        &self.timebase
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Result<&SerialChannel, SerialError> {
        self.channels
            .get(index)
            .ok_or(SerialError::InvalidChannel(index))
    }

    pub fn channel_mut(&mut self, index: usize) -> Result<&mut SerialChannel, SerialError> {
        self.channels
            .get_mut(index)
            .ok_or(SerialError::InvalidChannel(index))
    }

    /// Take the next frame from channel `index`
    pub fn poll(&mut self, index: usize) -> Option<Inbound> {
        let channel = self.channels.get_mut(index)?;
        channel.poll(&self.config, &self.timebase)
    }

    /// Queue the reply to a frame taken from channel `index`
    pub fn respond(&mut self, index: usize, message: &Message) {
        if let Some(channel) = self.channels.get_mut(index) {
            channel.send_response(message, &self.config);
        }
    }
}
