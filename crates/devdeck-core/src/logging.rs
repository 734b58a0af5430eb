//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

const LOG_FILE_NAME: &str = "devdeck.log";

/// Filter used when `DEVDECK_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "devdeck_core=info,devdeck_device=info,devdeck_app=info,warn";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/devdeck/logs/` so they never
/// interleave with the terminal UI. Log level is controlled by the
/// `DEVDECK_LOG` environment variable.
///
/// # Examples
/// ```bash
/// DEVDECK_LOG=debug devdeck
/// DEVDECK_LOG=devdeck_app::cache=trace devdeck
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    let env_filter =
        EnvFilter::try_from_env("DEVDECK_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("devdeck starting, logging to {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("devdeck").join("logs")
}

/// Get the log file path for the current day
pub fn current_log_file() -> PathBuf {
    log_directory().join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_directory_is_namespaced() {
        let dir = log_directory();
        assert!(dir.ends_with("devdeck/logs"));
    }

    #[test]
    fn test_current_log_file_lives_in_log_directory() {
        let file = current_log_file();
        assert_eq!(file.parent(), Some(log_directory().as_path()));
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("devdeck.log"));
    }
}
