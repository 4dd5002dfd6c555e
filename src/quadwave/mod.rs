//! Quadwave SysEx protocol
//!
//! Constants and decoders for the vendor-specific messages sent by the Misa
//! Quadwave: fretted neck state, multi-touch pad state and configuration changes.

pub mod classifier;
pub mod config_change;
pub mod neck;
pub mod touch;

use serde::Serialize;
use std::fmt;

pub use classifier::{classify, Classified};
pub use config_change::{decode_config_change, ConfigChange, DeviceConfig, FirmwareVersion};
pub use neck::{NeckEvent, NeckSnapshot, NeckState};
pub use touch::{TouchEvent, TouchKind, TouchPoint, TouchSnapshot, TouchState};

/// Manufacturer ID that prefixes every Quadwave SysEx body
pub const MFG_ID: [u8; 3] = [0x00, 0x22, 0x0A];

/// Number of strings on the neck
pub const NUM_STRINGS: usize = 4;

/// Frets addressable per string (bit 0 → fret 1 … bit 15 → fret 16)
pub const NUM_FRETS: u8 = 16;

/// Bytes per string in a neck payload
pub const NECK_BYTES_PER_STRING: usize = 3;

/// Maximum simultaneous touches reported by the pad
pub const MAX_TOUCHES: usize = 5;

/// Bytes per touch record: x_lo, x_hi, y_lo, y_hi, z, pressed
pub const TOUCH_RECORD_LEN: usize = 6;

/// Message kind discriminator following the manufacturer ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Neck,
    Touch,
    ConfigChange,
}

impl MessageKind {
    /// Map the wire byte to a known kind; `None` means pass-through
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(MessageKind::Neck),
            0x02 => Some(MessageKind::Touch),
            0x03 => Some(MessageKind::ConfigChange),
            _ => None,
        }
    }

    /// Wire byte for this kind
    pub fn as_byte(self) -> u8 {
        match self {
            MessageKind::Neck => 0x01,
            MessageKind::Touch => 0x02,
            MessageKind::ConfigChange => 0x03,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Neck => write!(f, "neck"),
            MessageKind::Touch => write!(f, "touch"),
            MessageKind::ConfigChange => write!(f, "config-change"),
        }
    }
}
