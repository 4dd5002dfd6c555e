//! Decoded device events
//!
//! What the dispatcher hands to a [`FrameSink`](crate::dispatcher::FrameSink).

use serde::Serialize;
use std::fmt;

use crate::config::{EventFormat, EventsConfig};
use crate::quadwave::{ConfigChange, NeckEvent, TouchEvent};

/// One decoded event from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    Neck(NeckEvent),
    Touch(TouchEvent),
    Config(ConfigChange),
}

impl From<NeckEvent> for DeviceEvent {
    fn from(event: NeckEvent) -> Self {
        DeviceEvent::Neck(event)
    }
}

impl From<TouchEvent> for DeviceEvent {
    fn from(event: TouchEvent) -> Self {
        DeviceEvent::Touch(event)
    }
}

impl From<ConfigChange> for DeviceEvent {
    fn from(change: ConfigChange) -> Self {
        DeviceEvent::Config(change)
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceEvent::Neck(e) => fmt::Display::fmt(e, f),
            DeviceEvent::Touch(e) => fmt::Display::fmt(e, f),
            DeviceEvent::Config(c) => fmt::Display::fmt(c, f),
        }
    }
}

/// Turns events into output lines
#[derive(Debug, Clone)]
pub struct EventRenderer {
    format: EventFormat,
    timestamps: bool,
}

#[derive(Serialize)]
struct Stamped<'a> {
    timestamp: String,
    #[serde(flatten)]
    event: &'a DeviceEvent,
}

impl EventRenderer {
    pub fn new(format: EventFormat, timestamps: bool) -> Self {
        Self { format, timestamps }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.format, config.timestamps)
    }

    /// Render one event; text output may span several lines
    pub fn render(&self, event: &DeviceEvent) -> serde_json::Result<String> {
        let now = || chrono::Local::now().format("%H:%M:%S%.3f").to_string();

        match (self.format, self.timestamps) {
            (EventFormat::Text, false) => Ok(event.to_string()),
            (EventFormat::Text, true) => Ok(event
                .to_string()
                .lines()
                .map(|line| format!("[{}] {}", now(), line))
                .collect::<Vec<_>>()
                .join("\n")),
            (EventFormat::Json, false) => serde_json::to_string(event),
            (EventFormat::Json, true) => serde_json::to_string(&Stamped {
                timestamp: now(),
                event,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadwave::TouchKind;
    use serde_json::json;

    #[test]
    fn test_json_shape() {
        let event = DeviceEvent::from(NeckEvent { string: 2, fret: 5, on: true });
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({ "type": "neck", "string": 2, "fret": 5, "on": true })
        );

        let event = DeviceEvent::from(TouchEvent {
            slot: 1,
            x: 100,
            y: 200,
            z: 3,
            kind: TouchKind::Released,
        });
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({ "type": "touch", "slot": 1, "x": 100, "y": 200, "z": 3, "kind": "released" })
        );
    }

    #[test]
    fn test_render_text() {
        let renderer = EventRenderer::new(EventFormat::Text, false);
        let event = DeviceEvent::from(TouchEvent {
            slot: 0,
            x: 1000,
            y: 2000,
            z: 30,
            kind: TouchKind::Pressed,
        });
        assert_eq!(renderer.render(&event).unwrap(), "Touch 0 pressed at x=1000 y=2000 z=30");
    }

    #[test]
    fn test_render_text_timestamps_every_line() {
        let renderer = EventRenderer::new(EventFormat::Text, true);
        let event = DeviceEvent::from(crate::quadwave::decode_config_change(&[0, 1, 0, 0]).unwrap());
        let rendered = renderer.render(&event).unwrap();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("Config set to blue"));
        assert!(lines[1].ends_with("Firmware version: 1.0.0"));
    }

    #[test]
    fn test_render_json_with_timestamp() {
        let renderer = EventRenderer::new(EventFormat::Json, true);
        let event = DeviceEvent::from(NeckEvent { string: 1, fret: 16, on: false });
        let value: serde_json::Value = serde_json::from_str(&renderer.render(&event).unwrap()).unwrap();
        assert_eq!(value["type"], "neck");
        assert_eq!(value["fret"], 16);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_display_delegates() {
        let event = DeviceEvent::from(NeckEvent { string: 0, fret: 3, on: false });
        assert_eq!(event.to_string(), "String 1 fret 3 OFF");
    }
}
