//! Serial Protocol Configuration

use serde::{Deserialize, Serialize};

/// What to do with the CRC footer of an inbound command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrcPolicy {
    /// Reject a mismatch with `InvalidChecksum`
    #[default]
    Verify,
    /// Accept any footer
    Ignore,
}

/// What to do with a character that is not a hex digit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HexPolicy {
    /// Drop the frame (bad header) or reject it with `InvalidChecksum`
    #[default]
    Strict,
    /// Decode the character as zero
    Lenient,
}

/// Serial protocol configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Number of channels (UART ports)
    pub channel_count: usize,
    /// Seed for every frame CRC
    pub crc_seed: u16,
    /// Inbound CRC handling
    pub crc_policy: CrcPolicy,
    /// Inbound hex digit handling
    pub hex_policy: HexPolicy,
    /// Append the CRC footer to responses
    pub response_crc: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            channel_count: 1,
            crc_seed: 0,
            crc_policy: CrcPolicy::Verify,
            hex_policy: HexPolicy::Strict,
            response_crc: true,
        }
    }
}
