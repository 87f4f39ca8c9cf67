use crate::error::ConfigError;
use core_types::CompositeNullPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on concurrent provider queries.
pub const MAX_CONCURRENCY: usize = 16;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub datastream: DatastreamConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the Datastream Web Service.
#[derive(Debug, Clone, Deserialize)]
pub struct DatastreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Usually supplied through `SECTOR_MONITOR__DATASTREAM__USERNAME`.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Timeout applied by the HTTP client to every request.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

/// Parameters for one snapshot build.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// How many metric queries may be in flight at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-query deadline; an expired query degrades its metric to null.
    #[serde(default = "default_query_timeout", with = "humantime_serde")]
    pub query_timeout: Duration,
    /// Distance in calendar days of the trend reference window.
    #[serde(default = "default_reference_offset_days")]
    pub reference_offset_days: u32,
    #[serde(default)]
    pub composite_null_policy: CompositeNullPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

// --- Default Implementations ---
// These allow a user to omit whole sections from their toml.

fn default_base_url() -> String {
    "https://product.datastream.com/DSWSClient/V1/DSService.svc/rest".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrency() -> usize {
    6
}

fn default_query_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_reference_offset_days() -> u32 {
    90
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            query_timeout: default_query_timeout(),
            reference_offset_days: default_reference_offset_days(),
            composite_null_policy: CompositeNullPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl Config {
    /// Checks value ranges and the presence of credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datastream.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "datastream.base_url must not be empty".to_string(),
            ));
        }
        if self.datastream.username.is_empty() || self.datastream.password.is_empty() {
            return Err(ConfigError::ValidationError(
                "datastream.username and datastream.password are required".to_string(),
            ));
        }
        if self.datastream.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "datastream.request_timeout must be greater than zero".to_string(),
            ));
        }
        self.snapshot.validate()
    }
}

impl SnapshotConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONCURRENCY).contains(&self.max_concurrency) {
            return Err(ConfigError::ValidationError(format!(
                "snapshot.max_concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                self.max_concurrency
            )));
        }
        if self.query_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "snapshot.query_timeout must be greater than zero".to_string(),
            ));
        }
        if self.reference_offset_days == 0 {
            return Err(ConfigError::ValidationError(
                "snapshot.reference_offset_days must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
