use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use media_device_monitor::config::{Config, ConfigLoader};
use media_device_monitor::device::DeviceKind;
use media_device_monitor::logging::{self, IdFormat, LoggingConfig};
use media_device_monitor::notifier::select_notifier;
use media_device_monitor::service::{DeviceHarness, SignalHandler, probe_devices};
use media_device_monitor::system::{
    CpalMediaDevices, MediaDevices, PreviewOutput, StandardFileSystem, platform_change_source,
};
use media_device_monitor::ui::DeviceSelectors;

const LOG_RETENTION_DAYS: u64 = 7;
const VIDEO_UNAVAILABLE: &str =
    "capture.video is enabled but this build has no video backend; every capture start will fail";

#[derive(Parser)]
#[command(name = "media-device-monitor")]
#[command(about = "Capture device hot-plug monitor with automatic stream recovery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shorten device and group ids in log output
    #[arg(long)]
    short_ids: bool,

    /// Poll for device changes even when native notifications exist
    #[arg(long)]
    polling: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture and follow device changes (default)
    Monitor,
    /// List all available devices
    ListDevices {
        /// Show group ids as well
        #[arg(short, long)]
        verbose: bool,
    },
    /// Request capture permission once, then list microphones and speakers
    Probe,
    /// Validate configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = match cli.config.clone() {
        Some(path) => ConfigLoader::new_production(path),
        None => ConfigLoader::new_with_default_path()?,
    };
    let mut config = logging::with_bootstrap_logging(|| loader.load_config())?;
    if cli.short_ids {
        config.logging.short_ids = true;
    }
    if cli.polling {
        config.general.force_polling = true;
    }

    let logging_config = LoggingConfig::from_config(&config, cli.verbose);
    let (_guard, log_dir) = logging::initialize_logging(logging_config)?;
    if let Some(dir) = log_dir {
        match logging::cleanup_old_logs(&dir, LOG_RETENTION_DAYS) {
            Ok(0) => {}
            Ok(removed) => info!("Removed {} old log files", removed),
            Err(e) => warn!("Could not clean up old logs: {:#}", e),
        }
    }
    info!(
        "Configuration loaded from {}",
        loader.get_config_path().display()
    );

    match cli.command.unwrap_or(Commands::Monitor) {
        Commands::Monitor => run_monitor(config).await,
        Commands::ListDevices { verbose } => list_devices(verbose).await,
        Commands::Probe => {
            let ids = IdFormat::from_short(config.logging.short_ids);
            probe_devices(&CpalMediaDevices::new(), config.capture.video, ids).await?;
            Ok(())
        }
        Commands::CheckConfig => check_config(&config, &loader),
    }
}

async fn run_monitor(config: Config) -> Result<()> {
    let media = Arc::new(CpalMediaDevices::new());
    let notifier = select_notifier(
        platform_change_source(),
        config.general.force_polling,
        config.general.poll_interval(),
    );

    let mut selectors = DeviceSelectors::new();
    for kind in DeviceKind::ALL {
        selectors = selectors.with_preferred(kind, config.capture.preferred(kind));
    }

    if config.capture.video && !CpalMediaDevices::SUPPORTS_VIDEO {
        warn!("{}", VIDEO_UNAVAILABLE);
    }

    let mut harness = DeviceHarness::new(media, PreviewOutput::new(), selectors, notifier, &config);
    if let Err(e) = harness.start().await {
        if !harness.is_listening() {
            return Err(e.context("Failed to watch for device changes"));
        }
        // The next added device restarts capture
        warn!("Capture not started: {:#}", e);
    }

    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let signals = SignalHandler::new(commands_tx);
    tokio::spawn(async move {
        if let Err(e) = signals.listen_for_signals().await {
            warn!("Signal handling stopped: {:#}", e);
        }
    });

    harness.run(commands_rx).await
}

async fn list_devices(verbose: bool) -> Result<()> {
    let devices = CpalMediaDevices::new().enumerate().await?;

    println!("Available devices:");
    if devices.is_empty() {
        println!("  No devices found!");
        return Ok(());
    }

    for kind in DeviceKind::ALL {
        for (i, device) in devices.iter().filter(|d| d.kind == kind).enumerate() {
            println!("  {}. {}", i + 1, device);
            if verbose {
                println!("       group: {}", device.group_id);
            }
        }
    }
    Ok(())
}

fn check_config(config: &Config, loader: &ConfigLoader<StandardFileSystem>) -> Result<()> {
    config.validate()?;

    println!("Configuration is valid: {}", loader.get_config_path().display());
    println!("  Poll interval: {} ms", config.general.poll_interval_ms);
    println!("  Force polling: {}", config.general.force_polling);
    println!("  Capture audio: {}", config.capture.audio);
    println!("  Capture video: {}", config.capture.video);
    println!(
        "  Platform auto switch: {}",
        config.policy.platform_auto_switch
    );
    if config.capture.video && !CpalMediaDevices::SUPPORTS_VIDEO {
        println!("  Warning: {}", VIDEO_UNAVAILABLE);
    }
    Ok(())
}
