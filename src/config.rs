//! Application configuration management.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::player::MAX_TICK_SECS;

/// Global configuration instance.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address the control API binds to.
    pub host: String,
    /// Port the control API listens on.
    pub port: u16,
    /// Base URL of the remote REST API.
    pub api_base_url: String,
    /// Base URL of the local wallet bridge, if one is configured.
    pub wallet_url: Option<String>,
    /// Path to the JSON file backing session storage.
    pub storage_file: PathBuf,
    /// Seconds of played time before a track is reported as recently played.
    pub played_threshold_secs: f64,
    /// Timeout for remote API requests, in seconds.
    pub request_timeout_secs: u64,
    /// Interval between playback clock ticks, in milliseconds.
    pub tick_interval_ms: u64,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json or pretty).
    pub log_format: LogFormat,
    /// Allowed CORS origins (comma-separated, or * for all).
    pub cors_origins: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable colored output.
    Pretty,
    /// JSON structured logging.
    Json,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Self {
        let host = env_or("HOST", "127.0.0.1");

        let port = env_or("PORT", "8090")
            .parse::<u16>()
            .expect("PORT must be a valid u16");

        let api_base_url = env_or("API_BASE_URL", "http://localhost:5000/api")
            .trim_end_matches('/')
            .to_string();

        let wallet_url = std::env::var("WALLET_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let storage_file = PathBuf::from(env_or("STORAGE_FILE", "./data/storage.json"));

        let played_threshold_secs = env_or("PLAYED_THRESHOLD_SECS", "10")
            .parse::<f64>()
            .expect("PLAYED_THRESHOLD_SECS must be a number");

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .expect("REQUEST_TIMEOUT_SECS must be a valid integer");

        let tick_interval_ms = env_or("TICK_INTERVAL_MS", "250")
            .parse::<u64>()
            .expect("TICK_INTERVAL_MS must be a valid integer");

        let log_level = env_or("LOG_LEVEL", "info");

        let log_format = match env_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let cors_origins = env_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host,
            port,
            api_base_url,
            wallet_url,
            storage_file,
            played_threshold_secs,
            request_timeout_secs,
            tick_interval_ms,
            log_level,
            log_format,
            cors_origins,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url(&self.api_base_url)
            .map_err(|reason| ConfigError::InvalidApiBaseUrl(self.api_base_url.clone(), reason))?;
        if let Some(wallet_url) = &self.wallet_url {
            check_http_url(wallet_url)
                .map_err(|reason| ConfigError::InvalidWalletUrl(wallet_url.clone(), reason))?;
        }

        if self.played_threshold_secs.is_nan() || self.played_threshold_secs <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.played_threshold_secs));
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        // A longer tick would look like a seek to the dwell tracker on every step.
        let max_tick_ms = (MAX_TICK_SECS * 1000.0) as u64;
        if self.tick_interval_ms > max_tick_ms {
            return Err(ConfigError::TickIntervalTooLong(self.tick_interval_ms, max_tick_ms));
        }

        // Ensure storage file parent directory exists
        if let Some(parent) = self.storage_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::DataDirectoryCreationFailed(parent.display().to_string(), e)
                })?;
            }
        }

        Ok(())
    }

    /// Get the control API bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Remote request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Playback clock tick interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_BASE_URL '{0}': {1}")]
    InvalidApiBaseUrl(String, String),

    #[error("Invalid WALLET_URL '{0}': {1}")]
    InvalidWalletUrl(String, String),

    #[error("PLAYED_THRESHOLD_SECS must be positive, got {0}")]
    InvalidThreshold(f64),

    #[error("TICK_INTERVAL_MS must be positive")]
    InvalidTickInterval,

    #[error("TICK_INTERVAL_MS is {0}, must be at most {1}")]
    TickIntervalTooLong(u64, u64),

    #[error("Failed to create data directory '{0}': {1}")]
    DataDirectoryCreationFailed(String, std::io::Error),
}

/// Initialize the global configuration.
///
/// Should be called once at application startup.
pub fn init() -> &'static Config {
    CONFIG.get_or_init(|| {
        dotenvy::dotenv().ok();
        Config::from_env()
    })
}

/// Get the global configuration.
///
/// # Panics
/// Panics if configuration has not been initialized.
pub fn get() -> &'static Config {
    CONFIG.get().expect("Configuration not initialized. Call config::init() first.")
}
