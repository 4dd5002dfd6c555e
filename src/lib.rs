//! Quadwave Bridge
//!
//! Decodes Misa Quadwave SysEx (neck fretting, multi-touch pad, configuration
//! changes) into discrete events and passes every other MIDI message through
//! unchanged.

pub mod bridge;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod midi;
pub mod quadwave;

pub use dispatcher::{Dispatch, DispatchStats, Dispatcher, FrameSink};
pub use error::DecodeError;
pub use events::DeviceEvent;
