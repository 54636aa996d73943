//! CLI error type.

use thiserror::Error;
use waydensity::config::ConfigError;
use waydensity::logging::LoggingError;
use waydensity::overpass::ProviderError;
use waydensity::server::ServerError;
use waydensity::ProcessError;

/// Exit code for bad user input.
pub const EXIT_INPUT: u8 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(String),

    #[error("{0}")]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Serve(#[from] ServerError),

    #[error("HTTP client error: {0}")]
    Http(#[from] ProviderError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Input(_) => EXIT_INPUT,
            Self::Process(e) if e.is_client_error() => EXIT_INPUT,
            _ => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Input("bad".to_string()).exit_code(), 2);
        assert_eq!(
            CliError::Process(ProcessError::InvalidInput("x".to_string())).exit_code(),
            2
        );
        assert_eq!(CliError::Process(ProcessError::Cancelled).exit_code(), 1);
        assert_eq!(CliError::Config("x".to_string()).exit_code(), 1);
    }
}
