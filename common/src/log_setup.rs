use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, bail};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where and how verbosely to log.
///
/// `RUST_LOG` takes precedence over `base_level` when set.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub base_level: String,
    pub directory: PathBuf,
    pub file_prefix: String,
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_prefix: "tessera".to_string(),
            max_log_files: 5,
        }
    }
}

/// Installs the global subscriber: console output (warnings and errors go to
/// stderr) plus a daily-rolling log file.
///
/// Fails if a subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> anyhow::Result<()> {
    if LOG_GUARD.get().is_some() {
        bail!("Logging already initialized");
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.base_level))
        .with_context(|| format!("Invalid log filter: {}", config.base_level))?;

    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!(
            "Failed to create logs directory {}",
            config.directory.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .max_log_files(config.max_log_files)
        .build(&config.directory)
        .context("Failed to create log file appender")?;

    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_writer = std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_thread_ids(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logger initialization failed")?;

    if LOG_GUARD.set(guard).is_err() {
        bail!("Logging already initialized");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_logs_info_to_logs_dir() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, "info");
        assert_eq!(config.directory, PathBuf::from("logs"));
        assert_eq!(config.file_prefix, "tessera");
        assert!(config.max_log_files > 0);
    }
}
