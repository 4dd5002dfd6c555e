//! Neck state engine
//!
//! Each string's fretting is a bitmask carried as three 7-bit bytes,
//! big-endian base-128: `(b0 << 14) | (b1 << 7) | b2`. Bit `i` means fret
//! `i + 1` is held. The encoding has room for 21 bits but only frets 1-16
//! exist; higher bits are kept in the snapshot and ignored when diffing.

use serde::Serialize;
use std::fmt;

use super::{MessageKind, NECK_BYTES_PER_STRING, NUM_FRETS, NUM_STRINGS};
use crate::error::DecodeError;

/// Per-string fret bitmasks
pub type NeckSnapshot = [u32; NUM_STRINGS];

/// Minimum neck payload length
pub const NECK_PAYLOAD_LEN: usize = NUM_STRINGS * NECK_BYTES_PER_STRING;

/// Bit position for a fret (1..=16)
pub fn fret_to_bit(fret: u8) -> Option<u8> {
    (1..=NUM_FRETS).contains(&fret).then(|| fret - 1)
}

/// Fret number for a bit position (0..=15)
pub fn bit_to_fret(bit: u8) -> Option<u8> {
    (bit < NUM_FRETS).then(|| bit + 1)
}

/// Build a string mask from held frets; frets outside 1..=16 are ignored
pub fn fret_mask(frets: &[u8]) -> u32 {
    frets
        .iter()
        .filter_map(|&f| fret_to_bit(f))
        .fold(0, |mask, bit| mask | (1 << bit))
}

/// Encode one string mask as three 7-bit bytes (low 21 bits)
pub fn encode_mask(mask: u32) -> [u8; NECK_BYTES_PER_STRING] {
    [
        ((mask >> 14) & 0x7F) as u8,
        ((mask >> 7) & 0x7F) as u8,
        (mask & 0x7F) as u8,
    ]
}

/// Encode a full neck payload
pub fn encode_neck(snapshot: &NeckSnapshot) -> Vec<u8> {
    snapshot.iter().flat_map(|&m| encode_mask(m)).collect()
}

/// Decode a neck payload into per-string masks.
///
/// Bytes beyond the first twelve are ignored.
pub fn decode_neck(payload: &[u8]) -> Result<NeckSnapshot, DecodeError> {
    DecodeError::require_len(MessageKind::Neck, payload, NECK_PAYLOAD_LEN)?;

    let mut snapshot = [0u32; NUM_STRINGS];
    for (mask, chunk) in snapshot
        .iter_mut()
        .zip(payload.chunks_exact(NECK_BYTES_PER_STRING))
    {
        let (b0, b1, b2) = (chunk[0] as u32, chunk[1] as u32, chunk[2] as u32);
        *mask = (b0 << 14) | (b1 << 7) | b2;
    }
    Ok(snapshot)
}

/// A single fret transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NeckEvent {
    /// 0-based string index
    pub string: usize,
    /// Fret number, 1..=16
    pub fret: u8,
    /// true = pressed, false = released
    pub on: bool,
}

impl fmt::Display for NeckEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "String {} fret {} {}",
            self.string + 1,
            self.fret,
            if self.on { "ON" } else { "OFF" }
        )
    }
}

/// Transitions between two snapshots, strings ascending then frets ascending
pub fn diff_neck(prev: &NeckSnapshot, curr: &NeckSnapshot) -> Vec<NeckEvent> {
    let mut events = Vec::new();
    for (string, (&p, &c)) in prev.iter().zip(curr.iter()).enumerate() {
        let changed = p ^ c;
        if changed == 0 {
            continue;
        }
        for bit in 0..NUM_FRETS {
            if changed & (1 << bit) == 0 {
                continue;
            }
            if let Some(fret) = bit_to_fret(bit) {
                events.push(NeckEvent {
                    string,
                    fret,
                    on: c & (1 << bit) != 0,
                });
            }
        }
    }
    events
}

/// Previous/current neck snapshots for one device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeckState {
    prev: NeckSnapshot,
    curr: NeckSnapshot,
}

impl NeckState {
    /// Create an engine with both snapshots zeroed
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero both snapshots
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Decode a payload, advance previous ← current and return the transitions.
    ///
    /// On error the stored snapshots are left as they were.
    pub fn update(&mut self, payload: &[u8]) -> Result<Vec<NeckEvent>, DecodeError> {
        let next = decode_neck(payload)?;
        self.prev = self.curr;
        self.curr = next;
        Ok(self.events())
    }

    /// Transitions between the stored snapshots
    pub fn events(&self) -> Vec<NeckEvent> {
        diff_neck(&self.prev, &self.curr)
    }

    pub fn previous(&self) -> &NeckSnapshot {
        &self.prev
    }

    pub fn current(&self) -> &NeckSnapshot {
        &self.curr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fret_bit_map() {
        assert_eq!(fret_to_bit(1), Some(0));
        assert_eq!(fret_to_bit(16), Some(15));
        assert_eq!(fret_to_bit(0), None);
        assert_eq!(fret_to_bit(17), None);
        assert_eq!(bit_to_fret(0), Some(1));
        assert_eq!(bit_to_fret(15), Some(16));
        assert_eq!(bit_to_fret(16), None);
    }

    #[test]
    fn test_decode_base128() {
        let payload = [0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x03, 0x7F, 0x7F, 0x00, 0x00, 0x00];
        let snapshot = decode_neck(&payload).unwrap();
        assert_eq!(snapshot, [0x0001, 0x0080, 0xFFFF, 0x0000]);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut payload = encode_neck(&[fret_mask(&[3]), 0, 0, 0]);
        payload.extend_from_slice(&[0x7F, 0x7F]);
        assert_eq!(decode_neck(&payload).unwrap(), [0b100, 0, 0, 0]);
    }

    #[test]
    fn test_decode_short_payload() {
        let err = decode_neck(&[0; 5]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedPayload {
                kind: MessageKind::Neck,
                expected: 12,
                actual: 5,
            }
        );
    }

    #[test]
    fn test_single_press_release() {
        let mut neck = NeckState::new();

        let events = neck.update(&encode_neck(&[fret_mask(&[1]), 0, 0, 0])).unwrap();
        assert_eq!(events, vec![NeckEvent { string: 0, fret: 1, on: true }]);

        let events = neck.update(&encode_neck(&[0, 0, 0, 0])).unwrap();
        assert_eq!(events, vec![NeckEvent { string: 0, fret: 1, on: false }]);
    }

    #[test]
    fn test_multi_fret_ordering() {
        let mut neck = NeckState::new();
        let events = neck
            .update(&encode_neck(&[fret_mask(&[4, 1]), fret_mask(&[6]), 0, fret_mask(&[16])]))
            .unwrap();

        assert_eq!(
            events,
            vec![
                NeckEvent { string: 0, fret: 1, on: true },
                NeckEvent { string: 0, fret: 4, on: true },
                NeckEvent { string: 1, fret: 6, on: true },
                NeckEvent { string: 3, fret: 16, on: true },
            ]
        );
    }

    #[test]
    fn test_slide_reports_off_and_on() {
        let mut neck = NeckState::new();
        neck.update(&encode_neck(&[0, fret_mask(&[5]), 0, 0])).unwrap();
        let events = neck.update(&encode_neck(&[0, fret_mask(&[7]), 0, 0])).unwrap();

        assert_eq!(
            events,
            vec![
                NeckEvent { string: 1, fret: 5, on: false },
                NeckEvent { string: 1, fret: 7, on: true },
            ]
        );
    }

    #[test]
    fn test_high_bits_ignored() {
        let mut neck = NeckState::new();
        // bits 16..=20 set by firmware are not frets
        let events = neck.update(&encode_neck(&[0x1F_0000, 0, 0, 0])).unwrap();
        assert!(events.is_empty());
        assert_eq!(neck.current()[0], 0x1F_0000);
    }

    #[test]
    fn test_malformed_leaves_state_untouched() {
        let mut neck = NeckState::new();
        neck.update(&encode_neck(&[fret_mask(&[2]), 0, 0, 0])).unwrap();
        neck.update(&encode_neck(&[fret_mask(&[2, 3]), 0, 0, 0])).unwrap();
        let before = neck.clone();

        assert!(neck.update(&[0x00, 0x00, 0x01, 0x00, 0x00]).is_err());
        assert_eq!(neck, before);
        assert_eq!(neck.events(), vec![NeckEvent { string: 0, fret: 3, on: true }]);
    }

    #[test]
    fn test_reset() {
        let mut neck = NeckState::new();
        neck.update(&encode_neck(&[fret_mask(&[1]), 0, 0, 0])).unwrap();
        neck.reset();
        assert_eq!(neck.previous(), &[0; NUM_STRINGS]);
        assert_eq!(neck.current(), &[0; NUM_STRINGS]);
        assert!(neck.events().is_empty());
    }

    #[test]
    fn test_display() {
        let on = NeckEvent { string: 0, fret: 1, on: true };
        let off = NeckEvent { string: 3, fret: 12, on: false };
        assert_eq!(on.to_string(), "String 1 fret 1 ON");
        assert_eq!(off.to_string(), "String 4 fret 12 OFF");
    }

    proptest! {
        #[test]
        fn prop_mask_round_trip(masks in prop::array::uniform4(0u32..=0xFFFF)) {
            prop_assert_eq!(decode_neck(&encode_neck(&masks)).unwrap(), masks);
        }

        #[test]
        fn prop_diff_idempotent(
            prev in prop::array::uniform4(0u32..=0xFFFF),
            curr in prop::array::uniform4(0u32..=0xFFFF),
        ) {
            prop_assert_eq!(diff_neck(&prev, &curr), diff_neck(&prev, &curr));
        }

        #[test]
        fn prop_no_change_no_events(masks in prop::array::uniform4(0u32..(1 << 21))) {
            prop_assert!(diff_neck(&masks, &masks).is_empty());
        }

        #[test]
        fn prop_event_count_matches_changed_bits(
            prev in prop::array::uniform4(0u32..=0xFFFF),
            curr in prop::array::uniform4(0u32..=0xFFFF),
        ) {
            let expected: u32 = prev.iter().zip(curr.iter()).map(|(p, c)| (p ^ c).count_ones()).sum();
            prop_assert_eq!(diff_neck(&prev, &curr).len() as u32, expected);
        }
    }
}
