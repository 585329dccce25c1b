//! Fixed-Size Payload Codec
//!
//! Every command and response is a fixed-size little-endian record. A type
//! implementing [`Payload`] states its exact size, so a handler built with
//! [`respond_with`] never reads or writes outside the validated region.

use crate::message::{Message, ResponseCode};

/// A fixed-size wire record
pub trait Payload: Sized {
    /// Exact encoded size in bytes
    const SIZE: usize;

    /// Decode from `bytes` (at least `SIZE` long)
    fn read_from(bytes: &[u8]) -> Self;

    /// Encode into `out` (at least `SIZE` long)
    fn write_to(&self, out: &mut [u8]);
}

/// Little-endian cursor over a command payload.
///
/// Reads past the end yield zero instead of panicking.
#[derive(Debug)]
pub struct PayloadReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if let Some(src) = self.bytes.get(self.pos..self.pos + N) {
            out.copy_from_slice(src);
        }
        self.pos += N;
        out
    }

    pub fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    pub fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    pub fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    pub fn bytes<const N: usize>(&mut self) -> [u8; N] {
        self.take()
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Little-endian cursor over a response payload.
///
/// Writes past the end are discarded instead of panicking.
#[derive(Debug)]
pub struct PayloadWriter<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl<'a> PayloadWriter<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, pos: 0 }
    }

    fn put(&mut self, src: &[u8]) -> &mut Self {
        if let Some(dst) = self.out.get_mut(self.pos..self.pos + src.len()) {
            dst.copy_from_slice(src);
        }
        self.pos += src.len();
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.put(&[value])
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.put(&value.to_le_bytes())
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.put(value)
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Payload for () {
    const SIZE: usize = 0;

    fn read_from(_bytes: &[u8]) -> Self {}

    fn write_to(&self, _out: &mut [u8]) {}
}

macro_rules! int_payload {
    ($($ty:ident),*) => {
        $(
            impl Payload for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn read_from(bytes: &[u8]) -> Self {
                    PayloadReader::new(bytes).$ty()
                }

                fn write_to(&self, out: &mut [u8]) {
                    PayloadWriter::new(out).$ty(*self);
                }
            }
        )*
    };
}

int_payload!(u8, u16, u32);

impl<const N: usize> Payload for [u8; N] {
    const SIZE: usize = N;

    fn read_from(bytes: &[u8]) -> Self {
        PayloadReader::new(bytes).bytes()
    }

    fn write_to(&self, out: &mut [u8]) {
        PayloadWriter::new(out).bytes(self);
    }
}

/// Run a typed handler against `message`.
///
/// Verifies the command is exactly `Cmd::SIZE` bytes and that `Resp::SIZE`
/// fits the response buffer, then decodes, calls `handler` and encodes the
/// result. Returns `false` (with the response code set) when the guard fails;
/// `handler` is not called in that case.
pub fn respond_with<Cmd, Resp, F>(message: &mut Message, handler: F) -> bool
where
    Cmd: Payload,
    Resp: Payload,
    F: FnOnce(Cmd) -> Resp,
{
    if !message.verify_parameter_sizes(Cmd::SIZE, Resp::SIZE) {
        return false;
    }

    let command = Cmd::read_from(message.command_data());
    let response = handler(command);
    response.write_to(message.response_mut().writable());
    message.set_response_size(Resp::SIZE);
    true
}

/// Like [`respond_with`], for handlers that can reject a well-formed request.
///
/// An `Err(code)` from `handler` is stored on the message and the response
/// is left empty.
pub fn try_respond_with<Cmd, Resp, F>(message: &mut Message, handler: F) -> bool
where
    Cmd: Payload,
    Resp: Payload,
    F: FnOnce(Cmd) -> Result<Resp, ResponseCode>,
{
    if !message.verify_parameter_sizes(Cmd::SIZE, Resp::SIZE) {
        return false;
    }

    let command = Cmd::read_from(message.command_data());
    match handler(command) {
        Ok(response) => {
            response.write_to(message.response_mut().writable());
            message.set_response_size(Resp::SIZE);
            true
        }
        Err(code) => {
            message.set_response_code(code);
            message.set_response_size(0);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageHeader, MESSAGE_DATA_MAX_SIZE};
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        index: u16,
        value: u32,
    }

    impl Payload for Pair {
        const SIZE: usize = 6;

        fn read_from(bytes: &[u8]) -> Self {
            let mut r = PayloadReader::new(bytes);
            Self {
                index: r.u16(),
                value: r.u32(),
            }
        }

        fn write_to(&self, out: &mut [u8]) {
            PayloadWriter::new(out).u16(self.index).u32(self.value);
        }
    }

    #[test]
    fn test_little_endian_layout() {
        let mut out = [0u8; 6];
        Pair {
            index: 0x0102,
            value: 0x0A0B0C0D,
        }
        .write_to(&mut out);
        assert_eq!(out, [0x02, 0x01, 0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(
            Pair::read_from(&out),
            Pair {
                index: 0x0102,
                value: 0x0A0B0C0D
            }
        );
    }

    #[test]
    fn test_short_buffers_do_not_panic() {
        let mut r = PayloadReader::new(&[0x34, 0x12, 0x99]);
        assert_eq!(r.u16(), 0x1234);
        assert_eq!(r.u16(), 0);

        let mut out = [0u8; 3];
        let mut w = PayloadWriter::new(&mut out);
        w.u16(0xBEEF).u16(0xCAFE);
        assert_eq!(w.position(), 4);
        assert_eq!(out, [0xEF, 0xBE, 0x00]);
    }

    #[test]
    fn test_respond_with_encodes_response() {
        let header = MessageHeader::new(1, 1, 7);
        let mut message = Message::with_command(header, &[0x05, 0x00]).unwrap();
        let handled = respond_with(&mut message, |index: u16| Pair {
            index,
            value: u32::from(index) * 10,
        });
        assert!(handled);
        assert_eq!(message.response_code(), ResponseCode::None);
        assert_eq!(message.response_data(), &[0x05, 0x00, 50, 0, 0, 0]);
    }

    #[test]
    fn test_respond_with_skips_handler_on_bad_size() {
        let header = MessageHeader::new(1, 1, 7);
        let mut message = Message::with_command(header, &[1, 2, 3]).unwrap();
        let mut called = false;
        let handled = respond_with(&mut message, |_: u32| {
            called = true;
        });
        assert!(!handled);
        assert!(!called);
        assert_eq!(message.response_code(), ResponseCode::InvalidCommandLength);
        assert!(message.response().is_empty());
    }

    #[test]
    fn test_respond_with_rejects_oversized_response() {
        let header = MessageHeader::new(1, 1, 7);
        let mut message = Message::new(header);
        message.response_mut().reset(4);
        let handled = respond_with(&mut message, |()| [0u8; 5]);
        assert!(!handled);
        assert_eq!(message.response_code(), ResponseCode::InvalidResponseLength);
    }

    #[test]
    fn test_try_respond_with_error_code() {
        let header = MessageHeader::new(1, 1, 7);
        let mut message = Message::with_command(header, &[9, 0]).unwrap();
        let handled = try_respond_with(&mut message, |index: u16| {
            if index < 4 {
                Ok(index)
            } else {
                Err(ResponseCode::InternalError)
            }
        });
        assert!(!handled);
        assert_eq!(message.response_code(), ResponseCode::InternalError);
        assert!(message.response().is_empty());
    }

    proptest! {
        #[test]
        fn prop_size_guard_runs_handler_only_on_exact_size(len in 0usize..=MESSAGE_DATA_MAX_SIZE) {
            let data = vec![0xA5u8; len];
            let mut message = Message::with_command(MessageHeader::new(1, 1, 1), &data).unwrap();
            let mut called = false;
            let handled = respond_with(&mut message, |pair: Pair| {
                called = true;
                pair.index
            });

            prop_assert_eq!(handled, len == Pair::SIZE);
            prop_assert_eq!(called, len == Pair::SIZE);
            if len == Pair::SIZE {
                prop_assert_eq!(message.response_data(), &[0xA5, 0xA5]);
            } else {
                prop_assert_eq!(message.response_code(), ResponseCode::InvalidCommandLength);
                prop_assert!(message.response().is_empty());
            }
        }
    }
}
