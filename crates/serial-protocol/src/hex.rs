//! ASCII-Coded Hex (HASCII)

use crate::config::HexPolicy;

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode a byte as two upper-case hex characters, high nibble first
pub fn encode_byte(byte: u8) -> [u8; 2] {
    [DIGITS[(byte >> 4) as usize], DIGITS[(byte & 0x0F) as usize]]
}

/// Value of one hex digit; both cases accepted
pub fn decode_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Decode a two-character pair.
///
/// Under [`HexPolicy::Lenient`] a bad digit counts as zero and this never
/// fails; under [`HexPolicy::Strict`] it yields `None`.
pub fn decode_byte(pair: &[u8], policy: HexPolicy) -> Option<u8> {
    let [hi, lo] = pair else {
        return None;
    };
    let nibble = |c: u8| match policy {
        HexPolicy::Strict => decode_nibble(c),
        HexPolicy::Lenient => Some(decode_nibble(c).unwrap_or(0)),
    };
    Some((nibble(*hi)? << 4) | nibble(*lo)?)
}

/// Decode `hex` into `out`, two characters per byte.
///
/// Returns the number of bytes written, or `None` on a bad digit (strict) or
/// odd-length input.
pub fn decode_into(hex: &[u8], out: &mut [u8], policy: HexPolicy) -> Option<usize> {
    if hex.len() % 2 != 0 || hex.len() / 2 > out.len() {
        return None;
    }
    for (slot, pair) in out.iter_mut().zip(hex.chunks_exact(2)) {
        *slot = decode_byte(pair, policy)?;
    }
    Some(hex.len() / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_upper_case() {
        assert_eq!(&encode_byte(0xAB), b"AB");
        assert_eq!(&encode_byte(0x0F), b"0F");
    }

    #[test]
    fn test_decode_either_case() {
        assert_eq!(decode_byte(b"ab", HexPolicy::Strict), Some(0xAB));
        assert_eq!(decode_byte(b"Cd", HexPolicy::Strict), Some(0xCD));
    }

    #[test]
    fn test_bad_digit_policies() {
        assert_eq!(decode_byte(b"G1", HexPolicy::Strict), None);
        assert_eq!(decode_byte(b"G1", HexPolicy::Lenient), Some(0x01));
        assert_eq!(decode_byte(b"1", HexPolicy::Lenient), None);
    }

    #[test]
    fn test_decode_into() {
        let mut out = [0u8; 4];
        assert_eq!(decode_into(b"DEADBEEF", &mut out, HexPolicy::Strict), Some(4));
        assert_eq!(out, [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(decode_into(b"DEADBEEF00", &mut out, HexPolicy::Strict), None);
        assert_eq!(decode_into(b"DEA", &mut out, HexPolicy::Strict), None);
    }

    proptest! {
        #[test]
        fn prop_every_byte_survives_hex(byte in any::<u8>()) {
            let pair = encode_byte(byte);
            prop_assert_eq!(decode_byte(&pair, HexPolicy::Strict), Some(byte));
        }
    }
}
