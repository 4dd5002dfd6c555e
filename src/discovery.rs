//! MIDI port discovery
//!
//! Lists ports and resolves the configured input/output patterns to real ports.

use anyhow::Result;
use colored::*;
use midir::{MidiInput, MidiOutput};
use tracing::debug;

/// Information about a MIDI port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
    pub is_virtual: bool,
}

/// Heuristic for software ports (loopMIDI, IAC, our own virtual port)
pub fn looks_virtual(name: &str) -> bool {
    name.contains("Virtual")
        || name.contains("loopMIDI")
        || name.contains("IAC")
        || name.contains("Bridge")
}

fn port_infos(names: Vec<String>) -> Vec<PortInfo> {
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| PortInfo {
            index,
            is_virtual: looks_virtual(&name),
            name,
        })
        .collect()
}

/// Names of all input ports
pub fn input_port_names() -> Result<Vec<String>> {
    let midi_in = MidiInput::new("Quadwave-Bridge-Discovery")?;
    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// Names of all output ports
pub fn output_port_names() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("Quadwave-Bridge-Discovery")?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}

/// Discover input ports
pub fn discover_input_ports() -> Result<Vec<PortInfo>> {
    Ok(port_infos(input_port_names()?))
}

/// Discover output ports
pub fn discover_output_ports() -> Result<Vec<PortInfo>> {
    Ok(port_infos(output_port_names()?))
}

/// First name containing `pattern`, case-insensitive
pub fn match_substring<'a>(names: &'a [String], pattern: &str) -> Option<&'a str> {
    let pattern = pattern.to_lowercase();
    let found = names
        .iter()
        .find(|name| name.to_lowercase().contains(&pattern))
        .map(String::as_str);
    if let Some(name) = found {
        debug!("Found port '{}' matching pattern '{}'", name, pattern);
    }
    found
}

/// First name containing any of `patterns`, trying patterns in order
pub fn match_any<'a>(names: &'a [String], patterns: &[String]) -> Option<&'a str> {
    patterns
        .iter()
        .find_map(|pattern| match_substring(names, pattern))
}

/// Exact name first, then case-insensitive substring
pub fn match_exact_or_substring<'a>(names: &'a [String], requested: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|name| name.as_str() == requested)
        .map(String::as_str)
        .or_else(|| match_substring(names, requested))
}

/// Plain-text port dump for error messages
pub fn dump_ports() -> String {
    fn section(names: Result<Vec<String>>) -> String {
        match names {
            Ok(names) if names.is_empty() => "  - <none>".to_string(),
            Ok(names) => names
                .iter()
                .map(|n| format!("  - {}", n))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("  - <unavailable: {}>", e),
        }
    }

    format!(
        "\nINPUTS:\n{}\n\nOUTPUTS:\n{}\n",
        section(input_port_names()),
        section(output_port_names())
    )
}

/// Print available ports
pub fn list_ports_formatted() {
    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    let sections = [
        ("Input Ports:", discover_input_ports()),
        ("Output Ports:", discover_output_ports()),
    ];

    for (title, ports) in sections {
        println!("\n{}", title.bold());
        match ports {
            Ok(ports) if ports.is_empty() => println!("  {}", "No ports found".dimmed()),
            Ok(ports) => {
                for port in ports {
                    let marker = if port.is_virtual {
                        "[VIRTUAL]".yellow()
                    } else {
                        "[PHYSICAL]".green()
                    };
                    println!("  {}: {} {}", port.index, marker, port.name);
                }
            }
            Err(e) => println!("  {}", format!("Unavailable: {}", e).red()),
        }
    }

    println!();
}
