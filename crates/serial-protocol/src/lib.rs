//! Serial Command Protocol
//!
//! Human-readable framing of router messages over a byte stream. Every field
//! travels as ASCII-coded hex (HASCII), two characters per byte:
//!
//! ```text
//! command  : '<' MODULE CMD MSG LEN DATA.. CRC_LO CRC_HI ('\r' | '\n')
//! response : '>' MODULE CMD MSG LEN DATA.. CRC_LO CRC_HI '\r'
//! ```
//!
//! Each [`SerialChannel`] owns its receive and transmit ring buffers, a frame
//! accumulator and its statistics. [`update`] drives every channel of a
//! [`SerialPorts`] once per scheduler pass.

mod channel;
mod codec;
mod config;
mod crc;
mod error;
mod framer;
mod handlers;
pub mod hex;

pub use channel::{Inbound, SerialChannel, SerialPorts, SerialStatistics, UartHandle};
pub use codec::{decode_command, decode_response, encode_command, encode_response, Decoded};
pub use config::{CrcPolicy, HexPolicy, SerialConfig};
pub use crc::{crc16, crc16_update, frame_crc};
pub use error::SerialError;
pub use framer::{Framer, FramerEvent, FramerState};
pub use handlers::{command_table, commands, update, StatisticsResponse};

/// Wire constants
pub mod consts {
    /// Starts an inbound command
    pub const COMMAND_START: u8 = b'<';
    /// Starts an outbound response
    pub const RESPONSE_START: u8 = b'>';
    /// Carriage return terminator
    pub const STOP_CR: u8 = b'\r';
    /// Line feed terminator
    pub const STOP_LF: u8 = b'\n';

    /// HASCII characters per byte
    pub const HEX_CHARS_PER_BYTE: usize = 2;
    /// Module, command, message and length bytes
    pub const HEADER_SIZE: usize = 4;
    /// CRC bytes
    pub const FOOTER_SIZE: usize = 2;
    /// Header length on the wire
    pub const HEADER_SIZE_HASCII: usize = HEADER_SIZE * HEX_CHARS_PER_BYTE;
    /// Footer length on the wire
    pub const FOOTER_SIZE_HASCII: usize = FOOTER_SIZE * HEX_CHARS_PER_BYTE;
    /// Largest command body captured between START and STOP
    pub const COMMAND_MAX_SIZE_HASCII: usize =
        (HEADER_SIZE + message_router::MESSAGE_DATA_MAX_SIZE + FOOTER_SIZE) * HEX_CHARS_PER_BYTE;
    /// Largest encoded response including START and STOP
    pub const RESPONSE_MAX_SIZE: usize = COMMAND_MAX_SIZE_HASCII + 2;

    /// Receive ring size per channel
    pub const RX_BUFFER_SIZE: usize = 128;
    /// Transmit ring size per channel
    pub const TX_BUFFER_SIZE: usize = 128;

    /// Most channels a board can declare
    pub const MAX_CHANNELS: usize = 8;
}
