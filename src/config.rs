//! Configuration management for Quadwave Bridge
//!
//! Handles loading, parsing, and validation of the optional YAML configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Input port pattern (case-insensitive substring); auto-detected when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,
    /// Output port name (exact, then substring); virtual/loopback when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_port: Option<String>,
    #[serde(default = "default_virtual_port_name")]
    pub virtual_port_name: String,
    #[serde(default = "default_loopback_pattern")]
    pub loopback_pattern: String,
    #[serde(default = "default_input_patterns")]
    pub input_patterns: Vec<String>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: None,
            output_port: None,
            virtual_port_name: default_virtual_port_name(),
            loopback_pattern: default_loopback_pattern(),
            input_patterns: default_input_patterns(),
        }
    }
}

/// Event presentation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub format: EventFormat,
    #[serde(default)]
    pub timestamps: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            format: EventFormat::Text,
            timestamps: false,
        }
    }
}

/// How decoded events are written to stdout
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// One human-readable line per event
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl BridgeConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: BridgeConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    ///
    /// `required` turns a missing file into an error.
    pub async fn load_or_default(path: &str, required: bool) -> Result<Self> {
        if !required && !Path::new(path).exists() {
            return Ok(Self::default());
        }
        Self::load(path).await
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = &self.midi.input_port {
            if input.trim().is_empty() {
                anyhow::bail!("MIDI input_port cannot be empty (omit it to auto-detect)");
            }
        }
        if let Some(output) = &self.midi.output_port {
            if output.trim().is_empty() {
                anyhow::bail!("MIDI output_port cannot be empty (omit it to use a virtual port)");
            }
        }
        if self.midi.virtual_port_name.trim().is_empty() {
            anyhow::bail!("MIDI virtual_port_name cannot be empty");
        }
        if self.midi.loopback_pattern.trim().is_empty() {
            anyhow::bail!("MIDI loopback_pattern cannot be empty");
        }
        if self.midi.input_patterns.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("MIDI input_patterns cannot contain empty patterns");
        }
        Ok(())
    }
}

fn default_virtual_port_name() -> String { "Quadwave Bridge".to_string() }
fn default_loopback_pattern() -> String { "loop".to_string() }
fn default_input_patterns() -> Vec<String> { vec!["quadwave".to_string()] }
