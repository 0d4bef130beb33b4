//! Inbound traffic monitor and port listing

use anyhow::Result;
use chrono::Local;
use colored::*;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use v96_remote::midi::format_hex;
use v96_remote::{EventValue, Mixer, MixerEvent, MidiTransport, Transport};

/// One monitored message, as printed in JSON mode
#[derive(Debug, Serialize)]
pub struct MonitorRecord {
    pub timestamp: String,
    pub raw: String,
    pub event: Option<MixerEvent>,
}

impl MonitorRecord {
    pub fn new(raw: &[u8], event: Option<MixerEvent>) -> Self {
        Self {
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
            raw: format_hex(raw),
            event,
        }
    }

    fn print(&self) {
        let hex = match &self.event {
            Some(event) => match event.value {
                EventValue::Level(_) => self.raw.bright_yellow(),
                EventValue::On(_) => self.raw.bright_green(),
                EventValue::Word(_) => self.raw.bright_magenta(),
            },
            None => self.raw.bright_black(),
        };

        let parsed = match &self.event {
            Some(event) => format!(" => {}", event.to_string().bright_blue()),
            None => String::new(),
        };

        println!("[{}] {} | {}{}", self.timestamp.dimmed(), "IN ".green(), hex, parsed);
    }
}

/// Print every inbound message with its decoded event until the stream closes
pub async fn run<T: Transport>(
    mixer: Arc<Mixer<T>>,
    mut inbound: mpsc::Receiver<Vec<u8>>,
    json: bool,
) {
    if !json {
        println!("{}", "=== Console Monitor ===".bold().cyan());
        println!("{}", "Format: [timestamp] DIR | HEX => EVENT".dimmed());
        println!("{}\n", "─".repeat(80).dimmed());
    }

    while let Some(raw) = inbound.recv().await {
        let record = MonitorRecord::new(&raw, mixer.handle_message(&raw));

        if json {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize monitor record: {}", e),
            }
        } else {
            record.print();
        }
    }
}

/// List all MIDI ports
pub fn list_ports_formatted() -> Result<()> {
    let (inputs, outputs) = MidiTransport::list_ports()?;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    for (title, ports) in [("Input Ports:", inputs), ("Output Ports:", outputs)] {
        println!("\n{}", title.bold());
        if ports.is_empty() {
            println!("  {}", "No ports found".dimmed());
        }
        for (index, name) in ports.iter().enumerate() {
            println!("  {} {}", format!("[{}]", index).yellow(), name);
        }
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use v96_remote::{EventKind, MemoryTransport};

    #[test]
    fn test_record_json() {
        let raw = [0xF0, 0x43, 0x10, 0x3E, 0x7F, 0x01, 0x1A, 0x00, 0x00, 0, 0, 0, 1, 0xF7];
        let event = MixerEvent {
            kind: EventKind::ChannelOn,
            channel: 1,
            value: EventValue::On(true),
        };

        let json = serde_json::to_value(MonitorRecord::new(&raw, Some(event))).unwrap();
        assert_eq!(json["raw"], "F0 43 10 3E 7F 01 1A 00 00 00 00 00 01 F7");
        assert_eq!(json["event"]["type"], "channelOn");
        assert_eq!(json["event"]["value"], true);

        let json = serde_json::to_value(MonitorRecord::new(&[0xF0, 0xF7], None)).unwrap();
        assert!(json["event"].is_null());
    }

    #[tokio::test]
    async fn test_run_drains_inbound() {
        let mixer = Arc::new(Mixer::new(MemoryTransport::new()));
        let (tx, rx) = mpsc::channel(4);
        tx.send(vec![0xF0, 0x01, 0xF7]).await.unwrap();
        drop(tx);

        // Returns once the sender is gone
        run(mixer, rx, true).await;
    }
}
