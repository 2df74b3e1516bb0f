//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sync::SyncConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream source and refresh configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Fetch cap; upstreams reporting more records are truncated in
    /// upstream pagination order
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_source_url() -> String {
    "http://localhost:9000/messages".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay() -> u64 {
    1000
}

fn default_page_delay() -> u64 {
    50
}

fn default_max_records() -> usize {
    50_000
}

fn default_refresh_interval() -> u64 {
    300
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay(),
            page_delay_ms: default_page_delay(),
            max_records: default_max_records(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

impl SourceConfig {
    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Project the refresh-cycle knobs into the synchronizer's config
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            page_size: self.page_size,
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            page_delay: Duration::from_millis(self.page_delay_ms),
            max_records: self.max_records,
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
        }
    }
}

/// Search engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    #[serde(default = "default_result_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_cache_size() -> usize {
    1000
}

fn default_result_page_size() -> usize {
    10
}

fn default_max_page_size() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            default_page_size: default_result_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("trawl").join("config.toml")),
            Some(PathBuf::from("/etc/trawl/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Source overrides
        if let Ok(url) = std::env::var("TRAWL_SOURCE_URL") {
            self.source.url = url;
        }
        if let Ok(interval) = std::env::var("TRAWL_REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.source.refresh_interval_secs = secs;
            }
        }
        if let Ok(max_records) = std::env::var("TRAWL_MAX_RECORDS") {
            if let Ok(cap) = max_records.parse() {
                self.source.max_records = cap;
            }
        }

        // Search overrides
        if let Ok(cache_size) = std::env::var("TRAWL_CACHE_SIZE") {
            if let Ok(size) = cache_size.parse() {
                self.search.cache_size = size;
            }
        }

        // API overrides
        if let Ok(host) = std::env::var("TRAWL_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("TRAWL_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("TRAWL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("TRAWL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            search: SearchConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Trawl Configuration
#
# Environment variables override these settings:
# - TRAWL_SOURCE_URL
# - TRAWL_REFRESH_INTERVAL_SECS
# - TRAWL_MAX_RECORDS
# - TRAWL_CACHE_SIZE
# - TRAWL_API_HOST
# - TRAWL_API_PORT
# - TRAWL_LOG_LEVEL
# - TRAWL_LOG_FORMAT

[source]
# Upstream message collection (paginated GET endpoint)
url = "http://localhost:9000/messages"

# Items requested per page during a full fetch
page_size = 100

# HTTP request timeout (seconds)
timeout_secs = 30

# Attempts per page before a refresh cycle fails
max_retries = 3

# Base backoff delay between attempts (ms); doubles per attempt
retry_base_delay_ms = 1000

# Pause between consecutive page fetches (ms)
page_delay_ms = 50

# Hard cap on fetched documents
max_records = 50000

# Background refresh period (seconds)
refresh_interval_secs = 300

[search]
# Ranked-result cache capacity (entries)
cache_size = 1000

# Result page size when the request omits one
default_page_size = 10

# Largest allowed result page size
max_page_size = 100

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

# Allowed CORS origins; empty allows any origin
cors_origins = []

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
