//! Configuration file watcher for live fader settings
//!
//! Only the `mixer` section is applied to a running session; port and
//! logging changes need a restart and are reported as such.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;
use crate::protocol::MixerConfig;

/// Watches the config file and yields new fader settings when they change
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<MixerConfig>,
}

impl ConfigWatcher {
    /// Start watching a config file already loaded as `baseline`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config_path: String, baseline: AppConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel(10);
        let path = config_path.clone();

        // notify callbacks run on their own OS thread
        let runtime_handle = tokio::runtime::Handle::current();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("Watch error: {}", e);
                    return;
                }
            };

            if !matches!(event.kind, EventKind::Modify(_)) {
                return;
            }
            debug!("Config file modified: {:?}", event.paths);

            let path = path.clone();
            let baseline = baseline.clone();
            let tx = tx.clone();

            runtime_handle.spawn(async move {
                // Let the editor finish writing
                tokio::time::sleep(Duration::from_millis(100)).await;

                let reloaded = match AppConfig::load(&path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Failed to reload config (keeping old settings): {:#}", e);
                        return;
                    }
                };

                if reloaded.midi != baseline.midi || reloaded.logging != baseline.logging {
                    warn!("MIDI and logging changes take effect after a restart");
                }

                if let Err(e) = tx.send(reloaded.mixer).await {
                    error!("Failed to send config update: {}", e);
                }
            });
        })?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path))?;

        info!("Config file watcher started for: {}", config_path);

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next reloaded fader settings.
    ///
    /// Returns `None` once the watcher has shut down.
    pub async fn next_mixer_config(&mut self) -> Option<MixerConfig> {
        self.rx.recv().await
    }
}
