//! Decode errors for Quadwave payloads

use thiserror::Error;

use crate::quadwave::MessageKind;

/// Failure to decode a single vendor payload.
///
/// These are local to one frame: the engine that returned one has not touched
/// its stored snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed {kind} payload: expected at least {expected} bytes, got {actual}")]
    MalformedPayload {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },
}

impl DecodeError {
    /// Check a payload against the minimum length for its message kind
    pub(crate) fn require_len(kind: MessageKind, payload: &[u8], expected: usize) -> Result<(), Self> {
        if payload.len() < expected {
            return Err(DecodeError::MalformedPayload {
                kind,
                expected,
                actual: payload.len(),
            });
        }
        Ok(())
    }
}
