//! Frame classifier
//!
//! Decides whether an inbound frame is a Quadwave control message or opaque
//! traffic to forward untouched.

use super::{MessageKind, MFG_ID};
use crate::midi::sysex_body;

/// Result of classifying one raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    /// Recognized Quadwave message; `payload` starts after the kind byte
    Vendor { kind: MessageKind, payload: &'a [u8] },
    /// Anything else: non-SysEx, foreign manufacturer, unknown kind, too short
    PassThrough,
}

/// Classify a raw frame (status byte included).
///
/// Never fails: short or malformed frames are conservatively passed through.
pub fn classify(frame: &[u8]) -> Classified<'_> {
    let Some(body) = sysex_body(frame) else {
        return Classified::PassThrough;
    };

    match body {
        [m0, m1, m2, kind, payload @ ..] if [*m0, *m1, *m2] == MFG_ID => {
            match MessageKind::from_byte(*kind) {
                Some(kind) => Classified::Vendor { kind, payload },
                None => Classified::PassThrough,
            }
        }
        _ => Classified::PassThrough,
    }
}
