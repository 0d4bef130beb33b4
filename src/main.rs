//! V96 Remote
//!
//! Remote control and monitoring for Yamaha 01V96 consoles over MIDI SysEx.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod monitor;

use v96_remote::config::{AppConfig, ConfigWatcher, LoggingConfig, SharedMixerConfig};
use v96_remote::{Mixer, MixerEvent, MidiTransport};

/// Event queue depth between the session and its consumer
const EVENT_CAPACITY: usize = 256;

/// V96 Remote - control a Yamaha 01V96 over MIDI SysEx
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI ports
    #[arg(long)]
    list_ports: bool,

    /// Print every inbound message with its decoded event
    #[arg(long)]
    monitor: bool,

    /// Monitor output as JSON lines
    #[arg(long, requires = "monitor")]
    json: bool,

    /// Interactive command prompt
    #[arg(long, conflicts_with = "monitor")]
    repl: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if args.list_ports {
        let _guard = init_logging(&args.log_level, &LoggingConfig::default())?;
        return monitor::list_ports_formatted();
    }

    let config = AppConfig::load(&args.config).await?;
    let _guard = init_logging(&args.log_level, &config.logging)?;

    info!("Starting V96 Remote v{}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config_watcher = ConfigWatcher::new(args.config.clone(), config.clone())?;
    info!("Configuration loaded with hot-reload enabled");

    let mut transport = MidiTransport::new(&config.midi.input_port, &config.midi.output_port);
    transport
        .connect()
        .context("Failed to connect to console")?;
    let inbound = transport
        .take_receiver()
        .ok_or_else(|| anyhow!("Inbound message receiver already taken"))?;

    let shared = SharedMixerConfig::new(config.mixer);
    let mixer = Arc::new(Mixer::with_config(transport, shared));
    info!(
        "Fader resolution: {}, range: {}",
        config.mixer.fader_resolution, config.mixer.fader_range
    );

    run_app(mixer, inbound, config_watcher, &args, shutdown_signal()).await?;

    info!("V96 Remote shutdown complete");
    Ok(())
}

async fn run_app(
    mixer: Arc<Mixer<MidiTransport>>,
    inbound: mpsc::Receiver<Vec<u8>>,
    mut config_watcher: ConfigWatcher,
    args: &Args,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let inbound_task = if args.monitor {
        tokio::spawn(monitor::run(mixer.clone(), inbound, args.json))
    } else {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let session = mixer.clone();
        tokio::spawn(async move { session.run(inbound, event_tx).await });
        tokio::spawn(log_events(event_rx))
    };

    let repl = args.repl.then(|| {
        let mixer = mixer.clone();
        let runtime = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || cli::run_repl(mixer, runtime))
    });
    let repl_done = async move {
        match repl {
            Some(handle) => handle.await,
            None => std::future::pending().await,
        }
    };

    info!("Ready");

    tokio::pin!(shutdown);
    tokio::pin!(repl_done);

    loop {
        tokio::select! {
            Some(new_config) = config_watcher.next_mixer_config() => {
                info!(
                    "Configuration changed: fader resolution {}, range {}",
                    new_config.fader_resolution, new_config.fader_range
                );
                mixer.shared_config().replace(new_config);
            }

            result = &mut repl_done => {
                match result {
                    Ok(Ok(())) => info!("REPL closed"),
                    Ok(Err(e)) => warn!("REPL failed: {:#}", e),
                    Err(e) => warn!("REPL task panicked: {}", e),
                }
                break;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    inbound_task.abort();

    Ok(())
}

async fn log_events(mut events: mpsc::Receiver<MixerEvent>) {
    while let Some(event) = events.recv().await {
        info!("{}", event);
    }
}

fn init_logging(level: &str, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir))?;
            let appender = tracing_appender::rolling::daily(dir, "v96-remote.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if logging.json {
        registry.with(fmt::layer().json()).try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    }

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
