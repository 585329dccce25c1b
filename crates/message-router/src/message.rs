//! Request/Response Envelope

use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest command or response payload in bytes
pub const MESSAGE_DATA_MAX_SIZE: usize = 48;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u16);

        impl From<u16> for $name {
            fn from(value: u16) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:02X}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Destination subsystem of a command
    ModuleId
);
id_newtype!(
    /// Operation within a module
    CommandId
);
id_newtype!(
    /// Caller-assigned token echoed back in the response
    MessageId
);

/// Outcome of routing and handling a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponseCode {
    /// Handled successfully
    #[default]
    None = 0,
    /// No module with the requested id
    InvalidModuleId = 1,
    /// Module has no command with the requested id
    InvalidCommandId = 2,
    /// Command payload size does not match the command definition
    InvalidCommandLength = 3,
    /// Response does not fit the response buffer
    InvalidResponseLength = 4,
    /// Frame checksum or encoding check failed
    InvalidChecksum = 5,
    /// Handler could not complete the request
    InternalError = 6,
}

impl ResponseCode {
    /// Short name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::None => "none",
            ResponseCode::InvalidModuleId => "invalid module id",
            ResponseCode::InvalidCommandId => "invalid command id",
            ResponseCode::InvalidCommandLength => "invalid command length",
            ResponseCode::InvalidResponseLength => "invalid response length",
            ResponseCode::InvalidChecksum => "invalid checksum",
            ResponseCode::InternalError => "internal error",
        }
    }

    /// Whether the message was handled without error
    pub fn is_ok(&self) -> bool {
        *self == ResponseCode::None
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing and correlation fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Destination module
    pub module_id: ModuleId,
    /// Command within the module
    pub command_id: CommandId,
    /// Correlation token
    pub message_id: MessageId,
}

impl MessageHeader {
    /// Build a header from raw ids
    pub fn new(module_id: u16, command_id: u16, message_id: u16) -> Self {
        Self {
            module_id: ModuleId(module_id),
            command_id: CommandId(command_id),
            message_id: MessageId(message_id),
        }
    }
}

/// Fixed-capacity payload buffer.
///
/// `max_length` may be set below [`MESSAGE_DATA_MAX_SIZE`] to model a smaller
/// transport buffer; `len()` never exceeds it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageBuffer {
    max_length: usize,
    length: usize,
    data: [u8; MESSAGE_DATA_MAX_SIZE],
}

impl MessageBuffer {
    /// Empty buffer limited to `max_length` bytes (clamped to the storage size)
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.min(MESSAGE_DATA_MAX_SIZE),
            length: 0,
            data: [0; MESSAGE_DATA_MAX_SIZE],
        }
    }

    /// Capacity visible to handlers
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Bytes currently held
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the buffer holds no data
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The valid bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// The whole writable region up to `max_length`
    pub fn writable(&mut self) -> &mut [u8] {
        &mut self.data[..self.max_length]
    }

    /// Replace the contents with `bytes`
    pub fn set(&mut self, bytes: &[u8]) -> Result<(), RouterError> {
        if bytes.len() > self.max_length {
            return Err(RouterError::PayloadTooLarge {
                len: bytes.len(),
                max: self.max_length,
            });
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.length = bytes.len();
        Ok(())
    }

    /// Mark `len` bytes of the writable region as valid (clamped to capacity)
    pub(crate) fn set_len(&mut self, len: usize) {
        self.length = len.min(self.max_length);
    }

    /// Change the capacity limit, clearing the contents
    pub fn reset(&mut self, max_length: usize) {
        self.max_length = max_length.min(MESSAGE_DATA_MAX_SIZE);
        self.length = 0;
    }

    /// Drop the contents
    pub fn clear(&mut self) {
        self.length = 0;
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new(MESSAGE_DATA_MAX_SIZE)
    }
}

impl fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("max_length", &self.max_length)
            .field("data", &self.as_slice())
            .finish()
    }
}

/// Reusable request/response envelope.
///
/// A transport owns one per port and refills it for every frame; nothing in it
/// is heap allocated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Message {
    /// Routing header
    pub header: MessageHeader,
    command: MessageBuffer,
    response: MessageBuffer,
    response_code: ResponseCode,
}

impl Message {
    /// Empty message with full-size buffers
    pub fn new(header: MessageHeader) -> Self {
        Self {
            header,
            ..Default::default()
        }
    }

    /// Message carrying `command` as its request payload
    pub fn with_command(header: MessageHeader, command: &[u8]) -> Result<Self, RouterError> {
        let mut message = Self::new(header);
        message.command.set(command)?;
        Ok(message)
    }

    /// Request payload
    pub fn command(&self) -> &MessageBuffer {
        &self.command
    }

    /// Request payload, mutable (transport side)
    pub fn command_mut(&mut self) -> &mut MessageBuffer {
        &mut self.command
    }

    /// Response payload
    pub fn response(&self) -> &MessageBuffer {
        &self.response
    }

    /// Response payload, mutable (handler side)
    pub fn response_mut(&mut self) -> &mut MessageBuffer {
        &mut self.response
    }

    /// Valid request bytes
    pub fn command_data(&self) -> &[u8] {
        self.command.as_slice()
    }

    /// Valid response bytes
    pub fn response_data(&self) -> &[u8] {
        self.response.as_slice()
    }

    /// Current response code
    pub fn response_code(&self) -> ResponseCode {
        self.response_code
    }

    /// Overwrite the response code
    pub fn set_response_code(&mut self, code: ResponseCode) {
        self.response_code = code;
    }

    /// Check the request payload is exactly `expected` bytes.
    ///
    /// Sets [`ResponseCode::InvalidCommandLength`] on mismatch.
    pub fn verify_command_size(&mut self, expected: usize) -> bool {
        if self.command.len() == expected {
            true
        } else {
            self.response_code = ResponseCode::InvalidCommandLength;
            false
        }
    }

    /// Check a response of `size` bytes fits.
    ///
    /// Sets [`ResponseCode::InvalidResponseLength`] when it does not.
    pub fn verify_response_size(&mut self, size: usize) -> bool {
        if size <= self.response.max_length() {
            true
        } else {
            self.response_code = ResponseCode::InvalidResponseLength;
            false
        }
    }

    /// Check the request carries no payload
    pub fn verify_no_command_parameters(&mut self) -> bool {
        self.verify_command_size(0)
    }

    /// Check an empty response fits (always true)
    pub fn verify_no_response_parameters(&mut self) -> bool {
        self.verify_response_size(0)
    }

    /// Guard every handler runs before any side effect: exact command size,
    /// then response capacity.
    pub fn verify_parameter_sizes(&mut self, command_size: usize, max_response_size: usize) -> bool {
        self.verify_command_size(command_size) && self.verify_response_size(max_response_size)
    }

    /// Declare how many response bytes the handler wrote.
    ///
    /// A size beyond the buffer sets [`ResponseCode::InvalidResponseLength`]
    /// and leaves the response empty.
    pub fn set_response_size(&mut self, size: usize) {
        if size > self.response.max_length() {
            self.response_code = ResponseCode::InvalidResponseLength;
            self.response.set_len(0);
        } else {
            self.response.set_len(size);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> MessageHeader {
        MessageHeader::new(0x01, 0x02, 0x03)
    }

    #[test]
    fn test_verify_command_size_mismatch() {
        let mut message = Message::with_command(header(), &[1, 2, 3]).unwrap();
        assert!(!message.verify_parameter_sizes(4, 0));
        assert_eq!(message.response_code(), ResponseCode::InvalidCommandLength);
    }

    #[test]
    fn test_verify_response_too_large() {
        let mut message = Message::new(header());
        message.response_mut().reset(8);
        assert!(!message.verify_parameter_sizes(0, 9));
        assert_eq!(message.response_code(), ResponseCode::InvalidResponseLength);
    }

    #[test]
    fn test_verify_passes() {
        let mut message = Message::with_command(header(), &[0; 4]).unwrap();
        assert!(message.verify_parameter_sizes(4, MESSAGE_DATA_MAX_SIZE));
        assert_eq!(message.response_code(), ResponseCode::None);
    }

    #[test]
    fn test_set_response_size_beyond_capacity() {
        let mut message = Message::new(header());
        message.response_mut().reset(4);
        message.set_response_size(5);
        assert!(message.response().is_empty());
        assert_eq!(message.response_code(), ResponseCode::InvalidResponseLength);
    }

    #[test]
    fn test_command_too_large() {
        let err = Message::with_command(header(), &[0; MESSAGE_DATA_MAX_SIZE + 1]).unwrap_err();
        assert_eq!(
            err,
            RouterError::PayloadTooLarge {
                len: MESSAGE_DATA_MAX_SIZE + 1,
                max: MESSAGE_DATA_MAX_SIZE
            }
        );
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ModuleId(0x0A).to_string(), "0x0A");
    }
}
