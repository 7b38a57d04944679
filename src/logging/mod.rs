pub mod format;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

pub use format::{IdFormat, log_devices};

/// Enhanced logging configuration
pub struct LoggingConfig {
    pub level: Level,
    pub file_output: bool,
    pub console_output: bool,
    pub log_dir: Option<PathBuf>,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_output: false,
            console_output: true,
            log_dir: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Build from the `[logging]` section, with `verbose` forcing debug
    pub fn from_config(config: &crate::config::Config, verbose: bool) -> Self {
        let level = if verbose {
            Level::DEBUG
        } else {
            config
                .general
                .log_level
                .parse::<Level>()
                .unwrap_or(Level::INFO)
        };

        Self {
            level,
            file_output: config.logging.file_output,
            console_output: true,
            log_dir: config.logging.log_dir.clone(),
            json_format: config.logging.json_format,
        }
    }
}

/// Initialize logging with optional file rotation and structured output
///
/// Returns a tuple of (WorkerGuard, log_dir); the guard must outlive the
/// program's last log line.
pub fn initialize_logging(config: LoggingConfig) -> Result<(Option<WorkerGuard>, Option<PathBuf>)> {
    let mut layers = Vec::new();
    let mut guard = None;

    let env_filter = EnvFilter::new(format!(
        "media_device_monitor={}",
        config.level.as_str().to_lowercase()
    ));

    if config.console_output {
        let console_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .boxed()
        } else {
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .boxed()
        };
        layers.push(console_layer);
    }

    let log_dir = if config.file_output {
        let dir = match config.log_dir.clone() {
            Some(dir) => dir,
            None => get_default_log_dir()?,
        };

        std::fs::create_dir_all(&dir)?;

        let file_appender = tracing_appender::rolling::daily(&dir, "media-device-monitor.log");
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(non_blocking)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(non_blocking)
                .boxed()
        };
        layers.push(file_layer);

        Some(dir)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    Ok((guard, log_dir))
}

/// Run `f` with a plain stderr subscriber installed, so events emitted
/// before `initialize_logging` (config loading) are not lost
pub fn with_bootstrap_logging<T>(f: impl FnOnce() -> T) -> T {
    with_console_writer(std::io::stderr, f)
}

fn with_console_writer<W, T>(writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = fmt::Subscriber::builder()
        .with_writer(writer)
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Get the default log directory path
pub fn get_default_log_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
    Ok(home_dir.join(".local/share/media-device-monitor/logs"))
}

/// Clean up old log files (keep last N days)
pub fn cleanup_old_logs(log_dir: &Path, keep_days: u64) -> Result<usize> {
    use std::time::{Duration, SystemTime};

    let cutoff_time = SystemTime::now() - Duration::from_secs(60 * 60 * 24 * keep_days);

    if !log_dir.exists() {
        return Ok(0);
    }

    let mut cleaned_count = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() || !is_log_file(&path) {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if modified >= cutoff_time {
            continue;
        }

        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove old log file {}: {}", path.display(), e);
        } else {
            cleaned_count += 1;
            tracing::debug!("Removed old log file: {}", path.display());
        }
    }

    if cleaned_count > 0 {
        tracing::info!(
            "Cleaned up {} old log files from {}",
            cleaned_count,
            log_dir.display()
        );
    }

    Ok(cleaned_count)
}

// Daily rolling appends the date after the extension: name.log.2026-10-17
fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".log") || n.contains(".log."))
}
