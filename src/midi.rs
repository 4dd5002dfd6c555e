//! MIDI frame helpers
//!
//! The bridge never rewrites standard MIDI. It only needs to know whether a
//! frame is System Exclusive and, if so, where its body starts and ends.

use std::fmt;

/// SysEx start byte
pub const SYSEX_START: u8 = 0xF0;

/// SysEx end byte (EOX)
pub const SYSEX_END: u8 = 0xF7;

/// Coarse classification of a raw transport frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// System Exclusive (0xF0 … 0xF7)
    SysEx,
    /// Channel voice message (0x80-0xEF)
    Channel,
    /// System common / realtime message other than SysEx
    System,
    /// Empty frame or a frame starting with a data byte
    Invalid,
}

impl FrameType {
    /// Classify a frame by its status byte
    pub fn of(data: &[u8]) -> Self {
        match data.first() {
            None => FrameType::Invalid,
            Some(&SYSEX_START) => FrameType::SysEx,
            Some(&status) if status < 0x80 => FrameType::Invalid,
            Some(&status) if status < 0xF0 => FrameType::Channel,
            Some(_) => FrameType::System,
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameType::SysEx => write!(f, "sysex"),
            FrameType::Channel => write!(f, "channel"),
            FrameType::System => write!(f, "system"),
            FrameType::Invalid => write!(f, "invalid"),
        }
    }
}

/// Body of a SysEx frame with the `F0`/`F7` framing removed.
///
/// A missing trailing `F7` is tolerated; some backends split long dumps.
pub fn sysex_body(data: &[u8]) -> Option<&[u8]> {
    if FrameType::of(data) != FrameType::SysEx {
        return None;
    }
    let body = &data[1..];
    Some(body.strip_suffix(&[SYSEX_END]).unwrap_or(body))
}

/// Wrap a body in `F0 … F7`
pub fn build_sysex(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 2);
    frame.push(SYSEX_START);
    frame.extend_from_slice(body);
    frame.push(SYSEX_END);
    frame
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
