//! Console session
//!
//! [`Mixer`] ties the codec to a [`Transport`]: typed setters and getters
//! build commands and send them, inbound messages are classified into
//! [`MixerEvent`]s. Fader settings come from a [`SharedMixerConfig`] and are
//! read once per call.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SharedMixerConfig;
use crate::midi::format_hex;
use crate::observer::{Observer, TracingObserver};
use crate::protocol::event::decode;
use crate::protocol::{
    Command, FaderRange, FaderResolution, MixerConfig, MixerEvent, Result, Target,
};
use crate::transport::Transport;

/// Remote control session for one console
pub struct Mixer<T: Transport> {
    transport: T,
    config: SharedMixerConfig,
    observer: Arc<dyn Observer>,
}

impl<T: Transport> Mixer<T> {
    /// Create a session with default fader settings
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SharedMixerConfig::default())
    }

    /// Create a session sharing existing fader settings
    pub fn with_config(transport: T, config: SharedMixerConfig) -> Self {
        Self {
            transport,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the trace sink
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle to the live fader settings
    pub fn shared_config(&self) -> &SharedMixerConfig {
        &self.config
    }

    /// Current fader settings
    pub fn config(&self) -> MixerConfig {
        self.config.snapshot()
    }

    pub fn set_fader_resolution(&self, resolution: FaderResolution) {
        info!("Fader resolution set to {}", resolution);
        self.config.set_fader_resolution(resolution);
    }

    pub fn set_fader_range(&self, range: FaderRange) {
        info!("Fader range set to {}", range);
        self.config.set_fader_range(range);
    }

    /// Frame and send a command
    pub async fn send(&self, command: Command) -> Result<()> {
        self.observer.trace(&format!("Command: {}", command));
        let frame = command.to_frame();
        self.observer.trace(&format!("-> send: {}", format_hex(&frame)));
        self.transport.send_bytes(&frame).await?;
        Ok(())
    }

    /// Classify one inbound message
    pub fn handle_message(&self, raw: &[u8]) -> Option<MixerEvent> {
        let config = self.config.snapshot();
        self.observer.trace(&format!("<- recv: {}", format_hex(raw)));

        let event = decode(raw, config)?;
        self.observer.trace(&format!("Event: {}", event));
        Some(event)
    }

    /// Classify inbound messages until either side of the pipe closes
    pub async fn run(
        &self,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        events: mpsc::Sender<MixerEvent>,
    ) {
        while let Some(raw) = inbound.recv().await {
            if let Some(event) = self.handle_message(&raw) {
                if events.send(event).await.is_err() {
                    debug!("Event receiver dropped, stopping inbound loop");
                    return;
                }
            }
        }
        warn!("Inbound message stream closed");
    }

    // Generic controls

    pub async fn set_on(&self, target: Target, on: bool) -> Result<()> {
        debug!("Setting {} {}", target, if on { "on" } else { "off" });
        self.send(Command::set_on(target, on)?).await
    }

    pub async fn get_on(&self, target: Target) -> Result<()> {
        debug!("Requesting {} on status", target);
        self.send(Command::request_on(target)?).await
    }

    pub async fn set_level(&self, target: Target, percent: f64) -> Result<()> {
        debug!("Setting {} level to {}%", target, percent);
        let command = Command::set_level(target, percent, self.config.snapshot())?;
        self.send(command).await
    }

    pub async fn get_level(&self, target: Target) -> Result<()> {
        debug!("Requesting {} level", target);
        self.send(Command::request_level(target)?).await
    }

    pub async fn set_solo(&self, target: Target, solo: bool) -> Result<()> {
        debug!("Setting {} solo {}", target, if solo { "on" } else { "off" });
        self.send(Command::set_solo(target, solo)?).await
    }

    pub async fn get_solo(&self, target: Target) -> Result<()> {
        debug!("Requesting {} solo status", target);
        self.send(Command::request_solo(target)?).await
    }

    // Input channels

    pub async fn set_channel_on(&self, channel: u8, on: bool) -> Result<()> {
        self.set_on(Target::Channel(channel), on).await
    }

    pub async fn get_channel_on(&self, channel: u8) -> Result<()> {
        self.get_on(Target::Channel(channel)).await
    }

    /// Level 0-100, or 0-200 in relative range
    pub async fn set_channel_level(&self, channel: u8, level: f64) -> Result<()> {
        self.set_level(Target::Channel(channel), level).await
    }

    pub async fn get_channel_level(&self, channel: u8) -> Result<()> {
        self.get_level(Target::Channel(channel)).await
    }

    // Aux outputs

    pub async fn set_aux_on(&self, aux: u8, on: bool) -> Result<()> {
        self.set_on(Target::Aux(aux), on).await
    }

    pub async fn get_aux_on(&self, aux: u8) -> Result<()> {
        self.get_on(Target::Aux(aux)).await
    }

    pub async fn set_aux_level(&self, aux: u8, level: f64) -> Result<()> {
        self.set_level(Target::Aux(aux), level).await
    }

    pub async fn get_aux_level(&self, aux: u8) -> Result<()> {
        self.get_level(Target::Aux(aux)).await
    }

    // Bus outputs

    pub async fn set_bus_on(&self, bus: u8, on: bool) -> Result<()> {
        self.set_on(Target::Bus(bus), on).await
    }

    pub async fn get_bus_on(&self, bus: u8) -> Result<()> {
        self.get_on(Target::Bus(bus)).await
    }

    pub async fn set_bus_level(&self, bus: u8, level: f64) -> Result<()> {
        self.set_level(Target::Bus(bus), level).await
    }

    pub async fn get_bus_level(&self, bus: u8) -> Result<()> {
        self.get_level(Target::Bus(bus)).await
    }

    // Group masters

    pub async fn set_in_group_master_on(&self, group: u8, on: bool) -> Result<()> {
        self.set_on(Target::InGroup(group), on).await
    }

    pub async fn get_in_group_master_on(&self, group: u8) -> Result<()> {
        self.get_on(Target::InGroup(group)).await
    }

    pub async fn set_in_group_master_level(&self, group: u8, level: f64) -> Result<()> {
        self.set_level(Target::InGroup(group), level).await
    }

    pub async fn get_in_group_master_level(&self, group: u8) -> Result<()> {
        self.get_level(Target::InGroup(group)).await
    }

    pub async fn set_out_group_master_on(&self, group: u8, on: bool) -> Result<()> {
        self.set_on(Target::OutGroup(group), on).await
    }

    pub async fn get_out_group_master_on(&self, group: u8) -> Result<()> {
        self.get_on(Target::OutGroup(group)).await
    }

    pub async fn set_out_group_master_level(&self, group: u8, level: f64) -> Result<()> {
        self.set_level(Target::OutGroup(group), level).await
    }

    pub async fn get_out_group_master_level(&self, group: u8) -> Result<()> {
        self.get_level(Target::OutGroup(group)).await
    }

    // Solo

    pub async fn solo_channel(&self, channel: u8, solo: bool) -> Result<()> {
        self.set_solo(Target::Channel(channel), solo).await
    }

    pub async fn get_channel_solo(&self, channel: u8) -> Result<()> {
        self.get_solo(Target::Channel(channel)).await
    }

    /// Master layer slot 1-16: buses 1-8, then auxes 1-8
    pub async fn solo_master_channel(&self, channel: u8, solo: bool) -> Result<()> {
        self.set_solo(Target::Master(channel), solo).await
    }

    pub async fn get_master_channel_solo(&self, channel: u8) -> Result<()> {
        self.get_solo(Target::Master(channel)).await
    }

    pub async fn solo_bus(&self, bus: u8, solo: bool) -> Result<()> {
        self.set_solo(Target::Bus(bus), solo).await
    }

    pub async fn get_bus_solo(&self, bus: u8) -> Result<()> {
        self.get_solo(Target::Bus(bus)).await
    }

    pub async fn solo_aux(&self, aux: u8, solo: bool) -> Result<()> {
        self.set_solo(Target::Aux(aux), solo).await
    }

    pub async fn get_aux_solo(&self, aux: u8) -> Result<()> {
        self.get_solo(Target::Aux(aux)).await
    }

    pub async fn solo_in_group(&self, group: u8, solo: bool) -> Result<()> {
        self.set_solo(Target::InGroup(group), solo).await
    }

    pub async fn get_in_group_solo(&self, group: u8) -> Result<()> {
        self.get_solo(Target::InGroup(group)).await
    }

    pub async fn solo_out_group(&self, group: u8, solo: bool) -> Result<()> {
        self.set_solo(Target::OutGroup(group), solo).await
    }

    pub async fn get_out_group_solo(&self, group: u8) -> Result<()> {
        self.get_solo(Target::OutGroup(group)).await
    }

    /// Clear every active solo with the SOLO CLEAR remote key
    pub async fn clear_solo(&self) -> Result<()> {
        debug!("Clearing solo...");
        self.send(Command::clear_solo()).await
    }

    // Scene library

    pub async fn recall_scene(&self, scene: u16) -> Result<()> {
        debug!("Recalling scene #{}...", scene);
        self.send(Command::recall_scene(scene)?).await
    }

    /// Store current settings into a scene memory
    pub async fn store_scene(&self, scene: u16) -> Result<()> {
        debug!("Storing scene #{}...", scene);
        self.send(Command::store_scene(scene)?).await
    }
}
