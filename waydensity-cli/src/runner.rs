//! Shared setup for commands that talk to Overpass.

use std::path::Path;

use tracing::info;
use waydensity::config::ConfigFile;
use waydensity::logging::{init_logging, WorkerGuard};
use waydensity::overpass::{OverpassClient, ReqwestClient};
use waydensity::AreaProcessor;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for the process lifetime.
pub struct CliRunner {
    config: ConfigFile,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Loads `config_path` (or the default file) and installs logging.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::load_or_default()?,
        };
        let log_guard = init_logging(&config.logging)?;

        Ok(Self {
            config,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            endpoint = %self.config.overpass.endpoint,
            "WayDensity starting"
        );
    }

    /// Builds a processor backed by the real HTTP client.
    pub fn create_processor(&self) -> Result<AreaProcessor<ReqwestClient>, CliError> {
        let client = OverpassClient::new(ReqwestClient::new()?, self.config.overpass_config());
        Ok(AreaProcessor::new(client, self.config.pipeline_config()))
    }

    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Io)
    }
}
