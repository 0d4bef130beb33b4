//! Configuration management
//!
//! Handles loading and validating the YAML configuration file, and the
//! live fader settings shared by a running session.

pub mod watcher;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::fs;

pub use watcher::ConfigWatcher;

use crate::protocol::{FaderRange, FaderResolution, MixerConfig};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    pub midi: MidiConfig,
    #[serde(default)]
    pub mixer: MixerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// MIDI port configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Input port name pattern (case-insensitive substring)
    pub input_port: String,
    /// Output port name pattern (case-insensitive substring)
    pub output_port: String,
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Parse and validate YAML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.midi.input_port.trim().is_empty() {
            anyhow::bail!("MIDI input_port cannot be empty");
        }
        if self.midi.output_port.trim().is_empty() {
            anyhow::bail!("MIDI output_port cannot be empty");
        }
        if let Some(dir) = &self.logging.directory {
            if dir.trim().is_empty() {
                anyhow::bail!("logging.directory cannot be empty when set");
            }
        }

        Ok(())
    }
}

/// Fader settings shared between a session and whoever reconfigures it.
///
/// Each encode/decode call takes one [`snapshot`](Self::snapshot) up front;
/// a change only affects calls that start after it.
#[derive(Debug, Clone, Default)]
pub struct SharedMixerConfig {
    inner: Arc<RwLock<MixerConfig>>,
}

impl SharedMixerConfig {
    pub fn new(config: MixerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> MixerConfig {
        *self.inner.read()
    }

    pub fn replace(&self, config: MixerConfig) {
        *self.inner.write() = config;
    }

    pub fn set_fader_resolution(&self, resolution: FaderResolution) {
        self.inner.write().fader_resolution = resolution;
    }

    pub fn set_fader_range(&self, range: FaderRange) {
        self.inner.write().fader_range = range;
    }
}
