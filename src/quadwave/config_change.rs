//! Configuration change notification
//!
//! Sent by the device after five taps on the pad. Stateless: each message
//! stands alone.

use serde::Serialize;
use std::fmt;

use super::MessageKind;
use crate::error::DecodeError;

/// Minimum config-change payload length
pub const CONFIG_PAYLOAD_LEN: usize = 4;

/// Active device configuration (shown as an LED color on the unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceConfig {
    Blue,
    Green,
    Purple,
    /// Value this bridge has no name for
    Unknown(u8),
}

impl From<u8> for DeviceConfig {
    fn from(value: u8) -> Self {
        match value {
            0 => DeviceConfig::Blue,
            1 => DeviceConfig::Green,
            2 => DeviceConfig::Purple,
            other => DeviceConfig::Unknown(other),
        }
    }
}

impl fmt::Display for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceConfig::Blue => write!(f, "blue"),
            DeviceConfig::Green => write!(f, "green"),
            DeviceConfig::Purple => write!(f, "purple"),
            DeviceConfig::Unknown(n) => write!(f, "unknown ({})", n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Decoded config-change message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigChange {
    pub config: DeviceConfig,
    pub firmware: FirmwareVersion,
}

impl fmt::Display for ConfigChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config set to {}", self.config)?;
        write!(f, "Firmware version: {}", self.firmware)
    }
}

/// Decode `config, major, minor, patch`
pub fn decode_config_change(payload: &[u8]) -> Result<ConfigChange, DecodeError> {
    DecodeError::require_len(MessageKind::ConfigChange, payload, CONFIG_PAYLOAD_LEN)?;

    Ok(ConfigChange {
        config: DeviceConfig::from(payload[0]),
        firmware: FirmwareVersion {
            major: payload[1],
            minor: payload[2],
            patch: payload[3],
        },
    })
}
