//! Quadwave bridge runtime
//!
//! Owns the MIDI connections. Frames arrive on the midir callback thread, are
//! queued in arrival order, and are dispatched one by one on the main task.
//! Unrecognized traffic goes straight back out on the output port.

use anyhow::{anyhow, Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{BridgeConfig, MidiConfig};
use crate::discovery::{dump_ports, match_any, match_exact_or_substring, match_substring};
use crate::dispatcher::{DispatchStats, Dispatcher, FrameSink};
use crate::events::{DeviceEvent, EventRenderer};
use crate::midi::format_hex;

/// Sink that prints events and forwards pass-through frames to MIDI out
pub struct MidiSink {
    output: MidiOutputConnection,
    renderer: EventRenderer,
}

impl FrameSink for MidiSink {
    fn on_event(&mut self, event: DeviceEvent) {
        match self.renderer.render(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to render event {:?}: {}", event, e),
        }
    }

    fn pass_through(&mut self, frame: &[u8]) {
        if let Err(e) = self.output.send(frame) {
            warn!("Failed to forward {} byte frame: {}", frame.len(), e);
        }
    }
}

/// Frames queued between the midir callback and the dispatch loop
pub const FRAME_QUEUE_CAPACITY: usize = 1000;

/// Running bridge between the Quadwave input and the output port
pub struct QuadwaveBridge {
    input: MidiInputConnection<()>,
    frame_rx: mpsc::Receiver<Vec<u8>>,
    dispatcher: Dispatcher,
    sink: MidiSink,
}

impl QuadwaveBridge {
    /// Open both ports described by `config`
    pub fn open(config: &BridgeConfig) -> Result<Self> {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);

        let (input_name, input) = open_input(&config.midi, frame_tx)?;
        let (output_name, output) = open_output(&config.midi)?;

        info!("🚀 '{}' → '{}'. Ctrl+C to quit.", input_name, output_name);

        Ok(Self {
            input,
            frame_rx,
            dispatcher: Dispatcher::new(),
            sink: MidiSink {
                output,
                renderer: EventRenderer::from_config(&config.events),
            },
        })
    }

    /// Process frames until `shutdown` resolves or the input goes away
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<DispatchStats> {
        let stats = pump_frames(&mut self.frame_rx, &mut self.dispatcher, &mut self.sink, shutdown).await;

        let _ = self.input.close();
        let _ = self.sink.output.close();
        debug!("MIDI ports closed");
        Ok(stats)
    }
}

/// Dispatch queued frames in arrival order until `shutdown` resolves or every
/// sender is gone, then return the session counters
pub async fn pump_frames<S: FrameSink + ?Sized>(
    frame_rx: &mut mpsc::Receiver<Vec<u8>>,
    dispatcher: &mut Dispatcher,
    sink: &mut S,
    shutdown: impl Future<Output = ()>,
) -> DispatchStats {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            frame = frame_rx.recv() => match frame {
                Some(frame) => {
                    dispatcher.handle_frame(&frame, sink);
                }
                None => {
                    warn!("MIDI input closed, stopping bridge");
                    break;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping bridge");
                break;
            }
        }
    }

    dispatcher.stats()
}

/// Queue a frame from the midir callback; a full queue drops the frame
fn enqueue_frame(frame_tx: &mpsc::Sender<Vec<u8>>, data: &[u8]) {
    match frame_tx.try_send(data.to_vec()) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(frame)) => {
            warn!("Frame queue full, dropping {} byte frame: {}", frame.len(), format_hex(&frame));
        }
        // Receiver gone means we are shutting down
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

fn open_input(
    config: &MidiConfig,
    frame_tx: mpsc::Sender<Vec<u8>>,
) -> Result<(String, MidiInputConnection<()>)> {
    let mut midi_in = MidiInput::new("Quadwave-Bridge-Input").context("Failed to create MIDI input")?;
    // SysEx is filtered by default
    midi_in.ignore(Ignore::None);

    let names: Vec<String> = midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .filter(|name| !name.contains(&config.virtual_port_name))
        .collect();
    debug!("Found {} candidate MIDI input ports", names.len());

    let name = match &config.input_port {
        Some(pattern) => match_substring(&names, pattern)
            .ok_or_else(|| anyhow!("Input port '{}' not found{}", pattern, dump_ports()))?,
        None => match_any(&names, &config.input_patterns)
            .ok_or_else(|| anyhow!("Quadwave input not found{}", dump_ports()))?,
    }
    .to_string();

    let port = midi_in
        .ports()
        .into_iter()
        .find(|port| midi_in.port_name(port).map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| anyhow!("Input port '{}' disappeared", name))?;

    info!("Connecting to input port: {}", name);

    let connection = midi_in
        .connect(
            &port,
            "quadwave-bridge-in",
            move |_timestamp, data, _| enqueue_frame(&frame_tx, data),
            (),
        )
        .map_err(|e| anyhow!("Failed to connect to input port '{}': {}", name, e))?;

    Ok((name, connection))
}

fn open_output(config: &MidiConfig) -> Result<(String, MidiOutputConnection)> {
    let midi_out = MidiOutput::new("Quadwave-Bridge-Output").context("Failed to create MIDI output")?;

    match &config.output_port {
        Some(requested) => {
            let names: Vec<String> = midi_out
                .ports()
                .iter()
                .filter_map(|port| midi_out.port_name(port).ok())
                .collect();
            let name = match_exact_or_substring(&names, requested)
                .ok_or_else(|| anyhow!("No such output port '{}'{}", requested, dump_ports()))?
                .to_string();
            connect_output(midi_out, name)
        }
        None => open_default_output(midi_out, config),
    }
}

fn connect_output(midi_out: MidiOutput, name: String) -> Result<(String, MidiOutputConnection)> {
    let port = midi_out
        .ports()
        .into_iter()
        .find(|port| midi_out.port_name(port).map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| anyhow!("Output port '{}' disappeared", name))?;

    info!("Connecting to output port: {}", name);

    let connection = midi_out
        .connect(&port, "quadwave-bridge-out")
        .map_err(|e| anyhow!("Failed to connect to output port '{}': {}", name, e))?;

    Ok((name, connection))
}

#[cfg(unix)]
fn open_default_output(midi_out: MidiOutput, config: &MidiConfig) -> Result<(String, MidiOutputConnection)> {
    use midir::os::unix::VirtualOutput;

    let name = config.virtual_port_name.clone();
    let connection = midi_out
        .create_virtual(&name)
        .map_err(|e| anyhow!("Failed to create virtual output '{}': {}", name, e))?;

    info!("Created virtual output port: {}", name);
    Ok((name, connection))
}

#[cfg(not(unix))]
fn open_default_output(midi_out: MidiOutput, config: &MidiConfig) -> Result<(String, MidiOutputConnection)> {
    // No virtual ports here; fall back to a loopback driver port
    let names: Vec<String> = midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect();
    let name = match_substring(&names, &config.loopback_pattern)
        .ok_or_else(|| {
            anyhow!(
                "Need a loopback port matching '{}' (e.g. loopMIDI){}",
                config.loopback_pattern,
                dump_ports()
            )
        })?
        .to_string();
    connect_output(midi_out, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::build_sysex;
    use crate::quadwave::neck::{encode_neck, fret_mask};
    use crate::quadwave::{MessageKind, NeckEvent, MFG_ID};

    #[derive(Default)]
    struct Recorder {
        events: Vec<DeviceEvent>,
        forwarded: Vec<Vec<u8>>,
    }

    impl FrameSink for Recorder {
        fn on_event(&mut self, event: DeviceEvent) {
            self.events.push(event);
        }

        fn pass_through(&mut self, frame: &[u8]) {
            self.forwarded.push(frame.to_vec());
        }
    }

    fn neck_frame(masks: [u32; 4]) -> Vec<u8> {
        let mut body = MFG_ID.to_vec();
        body.push(MessageKind::Neck.as_byte());
        body.extend_from_slice(&encode_neck(&masks));
        build_sysex(&body)
    }

    #[tokio::test]
    async fn test_pump_drains_in_order_until_input_closes() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();

        tx.send(vec![0x90, 60, 100]).await.unwrap();
        tx.send(neck_frame([fret_mask(&[1]), 0, 0, 0])).await.unwrap();
        tx.send(neck_frame([0; 4])).await.unwrap();
        tx.send(vec![0x80, 60, 0]).await.unwrap();
        drop(tx);

        let stats = pump_frames(&mut rx, &mut dispatcher, &mut sink, std::future::pending()).await;

        assert_eq!(sink.forwarded, vec![vec![0x90, 60, 100], vec![0x80, 60, 0]]);
        assert_eq!(
            sink.events,
            vec![
                DeviceEvent::Neck(NeckEvent { string: 0, fret: 1, on: true }),
                DeviceEvent::Neck(NeckEvent { string: 0, fret: 1, on: false }),
            ]
        );
        assert_eq!(stats.neck_frames, 2);
        assert_eq!(stats.passed_through, 2);
        assert_eq!(stats.events, 2);
    }

    #[tokio::test]
    async fn test_pump_stops_on_shutdown() {
        let (_tx, mut rx) = mpsc::channel::<Vec<u8>>(8);
        let mut dispatcher = Dispatcher::new();
        let mut sink = Recorder::default();

        let stats = pump_frames(&mut rx, &mut dispatcher, &mut sink, std::future::ready(())).await;

        assert_eq!(stats, DispatchStats::default());
        assert!(sink.events.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_newest_frame() {
        let (tx, mut rx) = mpsc::channel(1);

        enqueue_frame(&tx, &[0x90, 60, 100]);
        enqueue_frame(&tx, &[0x80, 60, 0]);
        drop(tx);

        assert_eq!(rx.recv().await, Some(vec![0x90, 60, 100]));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_enqueue_after_shutdown_is_silent() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        enqueue_frame(&tx, &[0xF8]);
    }
}
