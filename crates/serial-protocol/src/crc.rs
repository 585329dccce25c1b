//! CRC-16 (poly 0x1021, MSB first)

use message_router::MessageHeader;

/// Fold `bytes` into a running CRC
pub fn crc16_update(mut crc: u16, bytes: &[u8]) -> u16 {
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// CRC of `bytes` starting from `seed`
pub fn crc16(seed: u16, bytes: &[u8]) -> u16 {
    crc16_update(seed, bytes)
}

/// CRC over the wire bytes of a frame: header ids, length, then data
pub fn frame_crc(seed: u16, header: &MessageHeader, data: &[u8]) -> u16 {
    let head = [
        header.module_id.0 as u8,
        header.command_id.0 as u8,
        header.message_id.0 as u8,
        data.len() as u8,
    ];
    crc16_update(crc16_update(seed, &head), data)
}
