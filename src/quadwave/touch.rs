//! Touch state engine
//!
//! A touch payload is one advisory count byte followed by up to
//! [`MAX_TOUCHES`] six-byte records `x_lo, x_hi, y_lo, y_hi, z, pressed`.
//! Touches have no identity beyond their slot index in the payload.

use serde::Serialize;
use std::fmt;

use super::{MessageKind, MAX_TOUCHES, TOUCH_RECORD_LEN};
use crate::error::DecodeError;

/// One touch slot as reported by the pad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TouchPoint {
    /// 14-bit horizontal position
    pub x: u16,
    /// 14-bit vertical position
    pub y: u16,
    /// 7-bit pressure
    pub z: u8,
    pub pressed: bool,
}

impl TouchPoint {
    /// Stand-in for a slot missing from one side of a diff
    pub const RELEASED: TouchPoint = TouchPoint {
        x: 0,
        y: 0,
        z: 0,
        pressed: false,
    };

    fn from_record(record: &[u8]) -> Self {
        let (x_lo, x_hi, y_lo, y_hi) = (record[0] as u16, record[1] as u16, record[2] as u16, record[3] as u16);
        TouchPoint {
            x: (x_hi << 7) | x_lo,
            y: (y_hi << 7) | y_lo,
            z: record[4],
            pressed: record[5] != 0,
        }
    }

    /// Encode as a six-byte record
    pub fn to_record(&self) -> [u8; TOUCH_RECORD_LEN] {
        [
            (self.x & 0x7F) as u8,
            ((self.x >> 7) & 0x7F) as u8,
            (self.y & 0x7F) as u8,
            ((self.y >> 7) & 0x7F) as u8,
            self.z & 0x7F,
            self.pressed as u8,
        ]
    }
}

/// Touches in slot order, at most [`MAX_TOUCHES`]
pub type TouchSnapshot = Vec<TouchPoint>;

/// Minimum touch payload length (the count byte)
pub const TOUCH_MIN_PAYLOAD_LEN: usize = 1;

/// Decode a touch payload.
///
/// The leading count byte is not trusted: the snapshot holds every complete
/// record present, up to [`MAX_TOUCHES`]. A trailing partial record is dropped.
pub fn decode_touches(payload: &[u8]) -> Result<TouchSnapshot, DecodeError> {
    DecodeError::require_len(MessageKind::Touch, payload, TOUCH_MIN_PAYLOAD_LEN)?;

    Ok(payload[1..]
        .chunks_exact(TOUCH_RECORD_LEN)
        .take(MAX_TOUCHES)
        .map(TouchPoint::from_record)
        .collect())
}

/// Encode a touch payload; `count` is written as the advisory count byte
pub fn encode_touches(count: u8, touches: &[TouchPoint]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + touches.len() * TOUCH_RECORD_LEN);
    payload.push(count);
    for touch in touches {
        payload.extend_from_slice(&touch.to_record());
    }
    payload
}

/// Touch transition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchKind {
    Pressed,
    Released,
    Dragged,
}

/// A touch transition for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TouchEvent {
    pub slot: usize,
    pub x: u16,
    pub y: u16,
    pub z: u8,
    pub kind: TouchKind,
}

impl fmt::Display for TouchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.kind {
            TouchKind::Pressed => "pressed at",
            TouchKind::Released => "released at",
            TouchKind::Dragged => "dragged to",
        };
        write!(
            f,
            "Touch {} {} x={} y={} z={}",
            self.slot, action, self.x, self.y, self.z
        )
    }
}

fn classify_slot(prev: &TouchPoint, curr: &TouchPoint) -> Option<TouchKind> {
    match (prev.pressed, curr.pressed) {
        (false, true) => Some(TouchKind::Pressed),
        (true, false) => Some(TouchKind::Released),
        (true, true) if prev.x != curr.x || prev.y != curr.y => Some(TouchKind::Dragged),
        _ => None,
    }
}

/// Transitions between two snapshots in ascending slot order.
///
/// Slots present on only one side are compared against
/// [`TouchPoint::RELEASED`]. Every event reports the current point's
/// coordinates, including `Released`.
pub fn diff_touches(prev: &[TouchPoint], curr: &[TouchPoint]) -> Vec<TouchEvent> {
    let slots = prev.len().max(curr.len());
    (0..slots)
        .filter_map(|slot| {
            let p = prev.get(slot).unwrap_or(&TouchPoint::RELEASED);
            let c = curr.get(slot).unwrap_or(&TouchPoint::RELEASED);
            classify_slot(p, c).map(|kind| TouchEvent {
                slot,
                x: c.x,
                y: c.y,
                z: c.z,
                kind,
            })
        })
        .collect()
}

/// Previous/current touch snapshots for one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchState {
    prev: TouchSnapshot,
    curr: TouchSnapshot,
}

impl TouchState {
    /// Create an engine with both snapshots empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both snapshots
    pub fn reset(&mut self) {
        self.prev.clear();
        self.curr.clear();
    }

    /// Decode a payload, advance previous ← current and return the transitions.
    ///
    /// On error the stored snapshots are left as they were.
    pub fn update(&mut self, payload: &[u8]) -> Result<Vec<TouchEvent>, DecodeError> {
        let next = decode_touches(payload)?;
        self.prev = std::mem::replace(&mut self.curr, next);
        Ok(self.events())
    }

    /// Transitions between the stored snapshots
    pub fn events(&self) -> Vec<TouchEvent> {
        diff_touches(&self.prev, &self.curr)
    }

    pub fn previous(&self) -> &[TouchPoint] {
        &self.prev
    }

    pub fn current(&self) -> &[TouchPoint] {
        &self.curr
    }
}
