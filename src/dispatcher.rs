//! Frame dispatcher
//!
//! Classifies each inbound frame, routes Quadwave messages to the matching
//! state engine and hands everything else back for forwarding. Frames are
//! processed one at a time, to completion, in the order they are given.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::events::DeviceEvent;
use crate::midi::{format_hex, FrameType};
use crate::quadwave::{classify, decode_config_change, Classified, MessageKind, NeckState, TouchState};

/// Receiver for dispatcher output
pub trait FrameSink {
    /// A decoded device event
    fn on_event(&mut self, event: DeviceEvent);

    /// A frame that is not ours, to forward verbatim
    fn pass_through(&mut self, frame: &[u8]);
}

/// What happened to one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Decoded; carries the number of events emitted (may be 0)
    Decoded { kind: MessageKind, events: usize },
    /// Forwarded untouched
    PassedThrough,
    /// Recognized but malformed; nothing emitted, engine state unchanged
    Dropped { kind: MessageKind },
}

/// Per-session frame counters.
///
/// The per-kind counters only count frames that decoded; malformed ones are
/// counted in `dropped` alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub neck_frames: u64,
    pub touch_frames: u64,
    pub config_frames: u64,
    pub passed_through: u64,
    pub dropped: u64,
    pub events: u64,
}

/// Routes frames to the neck and touch engines
#[derive(Debug, Default)]
pub struct Dispatcher {
    neck: NeckState,
    touch: TouchState,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one raw frame
    pub fn handle_frame<S: FrameSink + ?Sized>(&mut self, frame: &[u8], sink: &mut S) -> Dispatch {
        trace!("RX {} {}", FrameType::of(frame), format_hex(frame));

        match classify(frame) {
            Classified::PassThrough => {
                self.stats.passed_through += 1;
                sink.pass_through(frame);
                Dispatch::PassedThrough
            }
            Classified::Vendor { kind, payload } => self.dispatch(kind, payload, sink),
        }
    }

    /// Route a classified payload to its decoder
    pub fn dispatch<S: FrameSink + ?Sized>(
        &mut self,
        kind: MessageKind,
        payload: &[u8],
        sink: &mut S,
    ) -> Dispatch {
        let decoded: Result<Vec<DeviceEvent>, _> = match kind {
            MessageKind::Neck => self
                .neck
                .update(payload)
                .map(|events| events.into_iter().map(DeviceEvent::from).collect()),
            MessageKind::Touch => self
                .touch
                .update(payload)
                .map(|events| events.into_iter().map(DeviceEvent::from).collect()),
            MessageKind::ConfigChange => {
                decode_config_change(payload).map(|change| vec![DeviceEvent::from(change)])
            }
        };

        match decoded {
            Ok(events) => {
                debug!(kind = ?kind, len = payload.len(), events = events.len(), "Decoded Quadwave frame");
                let count = events.len();
                match kind {
                    MessageKind::Neck => self.stats.neck_frames += 1,
                    MessageKind::Touch => self.stats.touch_frames += 1,
                    MessageKind::ConfigChange => self.stats.config_frames += 1,
                }
                self.stats.events += count as u64;
                for event in events {
                    sink.on_event(event);
                }
                Dispatch::Decoded { kind, events: count }
            }
            Err(e) => {
                warn!("Dropping Quadwave frame: {}", e);
                self.stats.dropped += 1;
                Dispatch::Dropped { kind }
            }
        }
    }

    /// Zero both engines; counters are kept
    pub fn reset(&mut self) {
        self.neck.reset();
        self.touch.reset();
    }

    pub fn neck(&self) -> &NeckState {
        &self.neck
    }

    pub fn touch(&self) -> &TouchState {
        &self.touch
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}
