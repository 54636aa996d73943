//! Logging setup.
//!
//! Log lines always go to stderr. When a directory is configured, a second
//! copy without ANSI colours is written to a daily-rolling file through a
//! non-blocking writer; keep the returned guard alive until exit or the tail
//! of the log is lost.

use std::path::PathBuf;

use thiserror::Error;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Default log level for the crate's own targets.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "waydensity.log";

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level for `waydensity*` targets, overridden by `RUST_LOG`.
    pub level: String,
    /// Directory for rolling log files; stderr only when `None`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Builds the filter: `RUST_LOG` when set, else `level` for this crate's
/// targets and `warn` for dependencies.
pub fn build_filter(level: &str) -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::builder().from_env_lossy()
    } else {
        EnvFilter::builder().parse_lossy(format!(
            "warn,waydensity={0},waydensity_cli={0}",
            level
        ))
    }
}

/// Installs the global subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(&config.level);
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_timer(LocalTime::rfc_3339())
        .with_writer(std::io::stderr);

    let Some(directory) = &config.directory else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
        return Ok(None);
    };

    std::fs::create_dir_all(directory).map_err(|source| LoggingError::CreateDir {
        path: directory.clone(),
        source,
    })?;
    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(LocalTime::rfc_3339())
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.directory.is_none());
    }

    #[test]
    fn test_unwritable_directory_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let config = LoggingConfig {
            level: "debug".to_string(),
            directory: Some(blocker.join("logs")),
        };
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::CreateDir { .. })
        ));
    }
}
