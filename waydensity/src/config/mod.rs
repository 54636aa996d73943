//! INI configuration file
//!
//! Settings live in `~/.waydensity/config.ini`. Every key is optional;
//! missing keys fall back to the library defaults, so an empty file is a
//! valid configuration.
//!
//! ```ini
//! [overpass]
//! endpoint = https://overpass-api.de/api/interpreter
//! request_timeout_secs = 30
//! query_timeout_secs = 25
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 500
//! max_delay_ms = 8000
//!
//! [tiling]
//! area_threshold_km2 = 60
//! tile_size_deg = 0.05
//! max_tiles = 20000
//!
//! [fetch]
//! batch_size = 500
//! batch_pause_ms = 1000
//!
//! [response]
//! max_geometry_km = 1500
//!
//! [server]
//! bind = 127.0.0.1:3001
//!
//! [logging]
//! level = info
//! directory = /var/log/waydensity
//! ```

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::aggregate::DEFAULT_MAX_GEOMETRY_KM;
use crate::fetch::{
    BatchConfig, RetryPolicy, DEFAULT_BATCH_PAUSE_MS, DEFAULT_BATCH_SIZE,
    DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS,
};
use crate::logging::LoggingConfig;
use crate::overpass::{
    OverpassConfig, DEFAULT_ENDPOINT, DEFAULT_QUERY_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::pipeline::PipelineConfig;
use crate::tiling::TilingConfig;

/// Directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".waydensity";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors from loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for [{section}] {key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// `[overpass]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassSettings {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for OverpassSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause_ms: DEFAULT_BATCH_PAUSE_MS,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3001)),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub overpass: OverpassSettings,
    pub retry: RetrySettings,
    pub tiling: TilingConfig,
    pub fetch: FetchSettings,
    /// `[response] max_geometry_km`
    pub max_geometry_km: f64,
    pub server: ServerSettings,
    pub logging: LoggingConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            overpass: OverpassSettings::default(),
            retry: RetrySettings::default(),
            tiling: TilingConfig::default(),
            fetch: FetchSettings::default(),
            max_geometry_km: DEFAULT_MAX_GEOMETRY_KM,
            server: ServerSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `~/.waydensity`, or `./.waydensity` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Default configuration file path.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

impl ConfigFile {
    /// Loads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_if_exists(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the default file, falling back to defaults when it is missing.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_if_exists(&config_file_path())
    }

    /// Parses INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let reader = SectionReader { ini };

        let overpass = OverpassSettings {
            endpoint: reader
                .raw("overpass", "endpoint")
                .map(str::to_string)
                .unwrap_or(defaults.overpass.endpoint),
            request_timeout_secs: reader.parse_checked(
                "overpass",
                "request_timeout_secs",
                defaults.overpass.request_timeout_secs,
                |v| *v > 0,
            )?,
            query_timeout_secs: reader.parse_checked(
                "overpass",
                "query_timeout_secs",
                defaults.overpass.query_timeout_secs,
                |v| *v > 0,
            )?,
        };

        let retry = RetrySettings {
            max_attempts: reader.parse_checked(
                "retry",
                "max_attempts",
                defaults.retry.max_attempts,
                |v| *v >= 1,
            )?,
            initial_delay_ms: reader.parse(
                "retry",
                "initial_delay_ms",
                defaults.retry.initial_delay_ms,
            )?,
            max_delay_ms: reader.parse("retry", "max_delay_ms", defaults.retry.max_delay_ms)?,
        };

        let tiling = TilingConfig {
            area_threshold_km2: reader.parse_checked(
                "tiling",
                "area_threshold_km2",
                defaults.tiling.area_threshold_km2,
                |v| v.is_finite() && *v >= 0.0,
            )?,
            tile_size_deg: reader.parse_checked(
                "tiling",
                "tile_size_deg",
                defaults.tiling.tile_size_deg,
                |v| v.is_finite() && *v > 0.0,
            )?,
            max_tiles: reader.parse_checked(
                "tiling",
                "max_tiles",
                defaults.tiling.max_tiles,
                |v| *v >= 1,
            )?,
        };

        let fetch = FetchSettings {
            batch_size: reader.parse_checked(
                "fetch",
                "batch_size",
                defaults.fetch.batch_size,
                |v| *v >= 1,
            )?,
            batch_pause_ms: reader.parse(
                "fetch",
                "batch_pause_ms",
                defaults.fetch.batch_pause_ms,
            )?,
        };

        let max_geometry_km = reader.parse_checked(
            "response",
            "max_geometry_km",
            defaults.max_geometry_km,
            |v| !v.is_nan() && *v >= 0.0,
        )?;

        let server = ServerSettings {
            bind: reader.parse("server", "bind", defaults.server.bind)?,
        };

        let level: String = reader
            .raw("logging", "level")
            .map(str::to_string)
            .unwrap_or(defaults.logging.level);
        if level.parse::<tracing::Level>().is_err() {
            return Err(invalid("logging", "level", &level));
        }
        let logging = LoggingConfig {
            level,
            directory: reader
                .raw("logging", "directory")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            overpass,
            retry,
            tiling,
            fetch,
            max_geometry_km,
            server,
            logging,
        })
    }

    /// Writes every setting to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("overpass"))
            .set("endpoint", self.overpass.endpoint.as_str())
            .set(
                "request_timeout_secs",
                self.overpass.request_timeout_secs.to_string(),
            )
            .set(
                "query_timeout_secs",
                self.overpass.query_timeout_secs.to_string(),
            );
        ini.with_section(Some("retry"))
            .set("max_attempts", self.retry.max_attempts.to_string())
            .set("initial_delay_ms", self.retry.initial_delay_ms.to_string())
            .set("max_delay_ms", self.retry.max_delay_ms.to_string());
        ini.with_section(Some("tiling"))
            .set(
                "area_threshold_km2",
                self.tiling.area_threshold_km2.to_string(),
            )
            .set("tile_size_deg", self.tiling.tile_size_deg.to_string())
            .set("max_tiles", self.tiling.max_tiles.to_string());
        ini.with_section(Some("fetch"))
            .set("batch_size", self.fetch.batch_size.to_string())
            .set("batch_pause_ms", self.fetch.batch_pause_ms.to_string());
        ini.with_section(Some("response"))
            .set("max_geometry_km", self.max_geometry_km.to_string());
        ini.with_section(Some("server"))
            .set("bind", self.server.bind.to_string());
        {
            let mut logging = ini.with_section(Some("logging"));
            logging.set("level", self.logging.level.as_str());
            if let Some(directory) = &self.logging.directory {
                logging.set("directory", directory.to_string_lossy());
            }
        }

        ini.write_to_file(path).map_err(write_error)
    }

    /// Overpass client settings.
    pub fn overpass_config(&self) -> OverpassConfig {
        OverpassConfig {
            endpoint: self.overpass.endpoint.clone(),
            request_timeout: Duration::from_secs(self.overpass.request_timeout_secs),
            query_timeout_secs: self.overpass.query_timeout_secs,
            retry: RetryPolicy::exponential(self.retry.max_attempts)
                .with_initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
                .with_max_delay(Duration::from_millis(self.retry.max_delay_ms)),
        }
    }

    /// Pipeline settings.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            tiling: self.tiling.clone(),
            batch: BatchConfig::new(
                self.fetch.batch_size,
                Duration::from_millis(self.fetch.batch_pause_ms),
            ),
            max_geometry_km: self.max_geometry_km,
        }
    }
}

struct SectionReader<'a> {
    ini: &'a Ini,
}

impl SectionReader<'_> {
    fn raw(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key).map(str::trim)
    }

    fn parse<T: FromStr>(&self, section: &str, key: &str, default: T) -> Result<T, ConfigError> {
        match self.raw(section, key) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| invalid(section, key, value)),
        }
    }

    fn parse_checked<T: FromStr + Display>(
        &self,
        section: &str,
        key: &str,
        default: T,
        valid: impl Fn(&T) -> bool,
    ) -> Result<T, ConfigError> {
        let value = self.parse(section, key, default)?;
        if valid(&value) {
            Ok(value)
        } else {
            Err(invalid(section, key, &value.to_string()))
        }
    }
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(ConfigFile::from_ini_str("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let config = ConfigFile::from_ini_str(
            "[tiling]\ntile_size_deg = 0.1\n\n[retry]\nmax_attempts = 5\n\n[server]\nbind = 0.0.0.0:8080\n",
        )
        .unwrap();

        assert_eq!(config.tiling.tile_size_deg, 0.1);
        assert_eq!(config.tiling.area_threshold_km2, 60.0);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.overpass_config().retry.max_attempts, 5);
    }

    #[test]
    fn test_unparsable_value() {
        let err = ConfigFile::from_ini_str("[fetch]\nbatch_size = lots\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section,
                key,
                value,
            } => {
                assert_eq!(section, "fetch");
                assert_eq!(key, "batch_size");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_values() {
        for text in [
            "[tiling]\ntile_size_deg = 0\n",
            "[tiling]\ntile_size_deg = -0.5\n",
            "[retry]\nmax_attempts = 0\n",
            "[fetch]\nbatch_size = 0\n",
            "[logging]\nlevel = loud\n",
        ] {
            assert!(
                matches!(
                    ConfigFile::from_ini_str(text),
                    Err(ConfigError::InvalidValue { .. })
                ),
                "accepted: {text}"
            );
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = ConfigFile::default();
        config.tiling.area_threshold_km2 = 25.5;
        config.fetch.batch_pause_ms = 250;
        config.logging.directory = Some(temp.path().join("logs"));
        config.save(&path).unwrap();

        assert_eq!(ConfigFile::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_if_exists_missing_file() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_if_exists(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            ConfigFile::load(&temp.path().join("absent.ini")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_pipeline_config() {
        let config =
            ConfigFile::from_ini_str("[fetch]\nbatch_size = 20\nbatch_pause_ms = 0\n").unwrap();
        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.batch.batch_size, 20);
        assert!(pipeline.batch.pause.is_zero());
        assert_eq!(pipeline.max_geometry_km, DEFAULT_MAX_GEOMETRY_KM);
    }

    #[test]
    fn test_config_path_location() {
        let path = config_file_path();
        assert!(path.ends_with(".waydensity/config.ini"));
    }
}
