//! Frame Encode / Decode

use crate::config::{CrcPolicy, HexPolicy, SerialConfig};
use crate::consts::{
    COMMAND_START, FOOTER_SIZE, FOOTER_SIZE_HASCII, HEADER_SIZE, HEADER_SIZE_HASCII,
    HEX_CHARS_PER_BYTE, RESPONSE_START, STOP_CR, STOP_LF,
};
use crate::crc::frame_crc;
use crate::error::SerialError;
use crate::hex;
use message_router::{Message, MessageHeader, ResponseCode, MESSAGE_DATA_MAX_SIZE};

/// Outcome of decoding a captured command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// No usable header; nothing can be sent back
    Dropped(&'static str),
    /// Header parsed but the frame is unusable; reply with empty data
    Rejected(ResponseCode),
    /// The message holds a command ready for the router
    Command,
}

/// Decode the characters captured between START and STOP into `message`.
///
/// Header fields are one byte each. The frame length must match the declared
/// data length exactly; a mismatch is answered rather than dropped because
/// the header is already known.
pub fn decode_command(frame: &[u8], config: &SerialConfig, message: &mut Message) -> Decoded {
    if frame.len() < HEADER_SIZE_HASCII + FOOTER_SIZE_HASCII {
        return Decoded::Dropped("frame shorter than header and footer");
    }

    let mut head = [0u8; HEADER_SIZE];
    if hex::decode_into(&frame[..HEADER_SIZE_HASCII], &mut head, config.hex_policy).is_none() {
        return Decoded::Dropped("bad hex digit in header");
    }

    message.header = MessageHeader::new(head[0].into(), head[1].into(), head[2].into());
    message.command_mut().clear();
    message.response_mut().clear();
    message.set_response_code(ResponseCode::None);

    let declared = head[3] as usize;
    let data_end = HEADER_SIZE_HASCII + declared * HEX_CHARS_PER_BYTE;
    if frame.len() != data_end + FOOTER_SIZE_HASCII || declared > message.command().max_length() {
        return reject(message, ResponseCode::InvalidCommandLength);
    }

    let mut data = [0u8; MESSAGE_DATA_MAX_SIZE];
    if hex::decode_into(&frame[HEADER_SIZE_HASCII..data_end], &mut data[..declared], config.hex_policy)
        .is_none()
    {
        return reject(message, ResponseCode::InvalidChecksum);
    }

    let mut footer = [0u8; FOOTER_SIZE];
    if hex::decode_into(&frame[data_end..], &mut footer, config.hex_policy).is_none() {
        return reject(message, ResponseCode::InvalidChecksum);
    }

    let data = &data[..declared];
    if config.crc_policy == CrcPolicy::Verify {
        let received = u16::from_le_bytes(footer);
        let calculated = frame_crc(config.crc_seed, &message.header, data);
        if received != calculated {
            return reject(message, ResponseCode::InvalidChecksum);
        }
    }

    if message.command_mut().set(data).is_err() {
        return reject(message, ResponseCode::InvalidCommandLength);
    }
    Decoded::Command
}

fn reject(message: &mut Message, code: ResponseCode) -> Decoded {
    message.command_mut().clear();
    message.set_response_code(code);
    Decoded::Rejected(code)
}

fn encode_frame(
    start: u8,
    header: &MessageHeader,
    data: &[u8],
    crc: Option<u16>,
    out: &mut [u8],
) -> Result<usize, SerialError> {
    if data.len() > MESSAGE_DATA_MAX_SIZE {
        return Err(SerialError::BufferTooSmall {
            needed: data.len(),
            available: MESSAGE_DATA_MAX_SIZE,
        });
    }

    let footer = if crc.is_some() { FOOTER_SIZE_HASCII } else { 0 };
    let needed = 1 + HEADER_SIZE_HASCII + data.len() * HEX_CHARS_PER_BYTE + footer + 1;
    if out.len() < needed {
        return Err(SerialError::BufferTooSmall {
            needed,
            available: out.len(),
        });
    }

    let head = [
        header.module_id.0 as u8,
        header.command_id.0 as u8,
        header.message_id.0 as u8,
        data.len() as u8,
    ];
    let crc_bytes = crc.map(u16::to_le_bytes);

    out[0] = start;
    let mut pos = 1;
    for &byte in head
        .iter()
        .chain(data)
        .chain(crc_bytes.iter().flatten())
    {
        out[pos..pos + 2].copy_from_slice(&hex::encode_byte(byte));
        pos += 2;
    }
    out[pos] = STOP_CR;
    Ok(pos + 1)
}

/// Encode the response held by `message` into `out`, returning the length.
///
/// Only the low byte of each header id goes on the wire.
pub fn encode_response(
    message: &Message,
    config: &SerialConfig,
    out: &mut [u8],
) -> Result<usize, SerialError> {
    let data = message.response_data();
    let crc = config
        .response_crc
        .then(|| frame_crc(config.crc_seed, &message.header, data));
    encode_frame(RESPONSE_START, &message.header, data, crc, out)
}

/// Encode a command frame as a host would send it
pub fn encode_command(
    header: &MessageHeader,
    data: &[u8],
    crc_seed: u16,
    out: &mut [u8],
) -> Result<usize, SerialError> {
    let crc = frame_crc(crc_seed, header, data);
    encode_frame(COMMAND_START, header, data, Some(crc), out)
}

/// Parse a complete response line (`'>' ... '\r'`) as a host would receive it
pub fn decode_response(
    line: &[u8],
    config: &SerialConfig,
) -> Result<(MessageHeader, Vec<u8>), SerialError> {
    let body = match line {
        [RESPONSE_START, body @ .., STOP_CR | STOP_LF] => body,
        _ => return Err(SerialError::InvalidFrame("missing start or stop byte")),
    };
    if body.len() < HEADER_SIZE_HASCII {
        return Err(SerialError::InvalidFrame("shorter than a header"));
    }

    let mut head = [0u8; HEADER_SIZE];
    hex::decode_into(&body[..HEADER_SIZE_HASCII], &mut head, HexPolicy::Strict)
        .ok_or(SerialError::InvalidFrame("bad hex digit in header"))?;
    let header = MessageHeader::new(head[0].into(), head[1].into(), head[2].into());

    let declared = head[3] as usize;
    let data_end = HEADER_SIZE_HASCII + declared * HEX_CHARS_PER_BYTE;
    let footer = if config.response_crc { FOOTER_SIZE_HASCII } else { 0 };
    if body.len() != data_end + footer {
        return Err(SerialError::InvalidFrame("length does not match header"));
    }

    let mut data = vec![0u8; declared];
    hex::decode_into(&body[HEADER_SIZE_HASCII..data_end], &mut data, HexPolicy::Strict)
        .ok_or(SerialError::InvalidFrame("bad hex digit in data"))?;

    if config.response_crc {
        let mut crc = [0u8; FOOTER_SIZE];
        hex::decode_into(&body[data_end..], &mut crc, HexPolicy::Strict)
            .ok_or(SerialError::InvalidFrame("bad hex digit in checksum"))?;
        let actual = u16::from_le_bytes(crc);
        let expected = frame_crc(config.crc_seed, &header, &data);
        if actual != expected {
            return Err(SerialError::ChecksumMismatch { expected, actual });
        }
    }

    Ok((header, data))
}
