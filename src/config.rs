//! Configuration module for ozima.

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

use crate::{OzimaError, Result};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored files.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Directory holding in-progress chunked uploads.
    ///
    /// Must not live inside `path`, otherwise partial uploads would be visible.
    #[serde(default = "default_chunk_path")]
    pub chunk_path: String,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Largest `total_chunks` a chunked upload may declare.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: u32,
    /// Directory for temporary archives (empty = system temp directory).
    #[serde(default)]
    pub archive_path: String,
}

fn default_storage_path() -> String {
    "storage".to_string()
}

fn default_chunk_path() -> String {
    "uploads".to_string()
}

fn default_max_upload_size() -> u64 {
    1024
}

fn default_max_chunks() -> u32 {
    crate::upload::DEFAULT_MAX_CHUNKS
}

impl StorageConfig {
    /// Maximum request body size in bytes.
    pub fn max_upload_size_bytes(&self) -> usize {
        (self.max_upload_size_mb as usize).saturating_mul(1024 * 1024)
    }

    /// Directory temporary archives are built in.
    pub fn archive_dir(&self) -> PathBuf {
        if self.archive_path.is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.archive_path)
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            chunk_path: default_chunk_path(),
            max_upload_size_mb: default_max_upload_size(),
            max_chunks: default_max_chunks(),
            archive_path: String::new(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token every protected request must present.
    #[serde(default)]
    pub api_token: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory log files are written to.
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Name of the active log file inside `dir`.
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
    /// Size in megabytes at which the log file is rotated.
    #[serde(default = "default_log_max_size")]
    pub max_size_mb: u64,
    /// Number of rotated files kept next to the active one.
    #[serde(default = "default_log_backup_count")]
    pub backup_count: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_file_name() -> String {
    "api.log".to_string()
}

fn default_log_max_size() -> u64 {
    5
}

fn default_log_backup_count() -> usize {
    2
}

impl LoggingConfig {
    /// Full path of the active log file.
    pub fn file_path(&self) -> PathBuf {
        Path::new(&self.dir).join(&self.file_name)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file_name: default_log_file_name(),
            max_size_mb: default_log_max_size(),
            backup_count: default_log_backup_count(),
        }
    }
}

/// Listener configuration for one HTTP service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Whether the service is started.
    pub enabled: bool,
    /// Host address to bind.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
}

/// A service section as written; absent keys take that service's defaults.
#[derive(Debug, Deserialize)]
struct ServiceSection {
    enabled: Option<bool>,
    host: Option<String>,
    port: Option<u16>,
}

impl ServiceSection {
    fn or_defaults(self, defaults: ServiceConfig) -> ServiceConfig {
        ServiceConfig {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            host: self.host.unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
        }
    }
}

fn deserialize_storage_api<'de, D>(deserializer: D) -> std::result::Result<ServiceConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ServiceSection::deserialize(deserializer)?.or_defaults(default_storage_api()))
}

fn deserialize_fs_api<'de, D>(deserializer: D) -> std::result::Result<ServiceConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(ServiceSection::deserialize(deserializer)?.or_defaults(default_fs_api()))
}

fn default_service_enabled() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_storage_api() -> ServiceConfig {
    ServiceConfig {
        enabled: default_service_enabled(),
        host: default_host(),
        port: 5000,
    }
}

fn default_fs_api() -> ServiceConfig {
    ServiceConfig {
        enabled: default_service_enabled(),
        host: default_host(),
        port: 8000,
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File storage API listener.
    #[serde(
        default = "default_storage_api",
        deserialize_with = "deserialize_storage_api"
    )]
    pub storage_api: ServiceConfig,
    /// Filesystem operations API listener.
    #[serde(default = "default_fs_api", deserialize_with = "deserialize_fs_api")]
    pub fs_api: ServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            storage_api: default_storage_api(),
            fs_api: default_fs_api(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(OzimaError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| OzimaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `OZIMA_API_TOKEN`: bearer token
    /// - `OZIMA_STORAGE_PATH`: storage root
    /// - `OZIMA_LOG_DIR`: log directory
    /// - `OZIMA_LOG_MAX_SIZE_MB`: log rotation size
    /// - `OZIMA_LOG_BACKUP_COUNT`: rotated log files to keep
    ///
    /// Empty or unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = env_string("OZIMA_API_TOKEN") {
            self.auth.api_token = token;
        }
        if let Some(path) = env_string("OZIMA_STORAGE_PATH") {
            self.storage.path = path;
        }
        if let Some(dir) = env_string("OZIMA_LOG_DIR") {
            self.logging.dir = dir;
        }
        if let Some(size) = env_parsed("OZIMA_LOG_MAX_SIZE_MB") {
            self.logging.max_size_mb = size;
        }
        if let Some(count) = env_parsed("OZIMA_LOG_BACKUP_COUNT") {
            self.logging.backup_count = count;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - no API token is configured
    /// - the chunk directory is the storage root or inside it
    pub fn validate(&self) -> Result<()> {
        if self.auth.api_token.is_empty() {
            return Err(OzimaError::Config(
                "api_token is not set. \
                 Set it in config.toml or via OZIMA_API_TOKEN environment variable."
                    .to_string(),
            ));
        }

        if Path::new(&self.storage.chunk_path).starts_with(&self.storage.path) {
            return Err(OzimaError::Config(
                "chunk_path must not be inside the storage path".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|value| value.parse().ok())
}
