use crate::error::ConfigError;
use config::{Environment, File, FileFormat};

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, DatastreamConfig, LoggingConfig, SnapshotConfig};

/// Prefix of environment variables that override file settings,
/// e.g. `SECTOR_MONITOR__DATASTREAM__PASSWORD`.
pub const ENV_PREFIX: &str = "SECTOR_MONITOR";

/// Loads the application configuration.
///
/// Reads the TOML file at `path` (the file is optional), overlays any
/// `SECTOR_MONITOR__*` environment variables, deserializes the result into our
/// strongly-typed `Config` struct and validates it.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(
        base_url = %config.datastream.base_url,
        max_concurrency = config.snapshot.max_concurrency,
        "Configuration loaded."
    );
    Ok(config)
}

/// Parses a configuration from TOML text without consulting the environment.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::CompositeNullPolicy;
    use std::time::Duration;

    const MINIMAL: &str = r#"
        [datastream]
        username = "ZUSER"
        password = "secret"
    "#;

    #[test]
    fn minimal_file_gets_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert!(config.datastream.base_url.starts_with("https://"));
        assert_eq!(config.datastream.request_timeout, Duration::from_secs(30));
        assert_eq!(config.snapshot.max_concurrency, 6);
        assert_eq!(config.snapshot.query_timeout, Duration::from_secs(20));
        assert_eq!(config.snapshot.reference_offset_days, 90);
        assert_eq!(config.snapshot.composite_null_policy, CompositeNullPolicy::SkipNull);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn snapshot_section_overrides_defaults() {
        let toml = format!(
            "{MINIMAL}\n[snapshot]\nmax_concurrency = 4\nquery_timeout = \"5s\"\ncomposite_null_policy = \"null_if_any_null\"\n"
        );
        let config = parse_config(&toml).unwrap();
        assert_eq!(config.snapshot.max_concurrency, 4);
        assert_eq!(config.snapshot.query_timeout, Duration::from_secs(5));
        assert_eq!(
            config.snapshot.composite_null_policy,
            CompositeNullPolicy::NullIfAnyNull
        );
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let err = parse_config("[datastream]\nusername = \"ZUSER\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn concurrency_out_of_range_is_rejected() {
        let toml = format!("{MINIMAL}\n[snapshot]\nmax_concurrency = 0\n");
        assert!(matches!(
            parse_config(&toml),
            Err(ConfigError::ValidationError(_))
        ));
        let toml = format!("{MINIMAL}\n[snapshot]\nmax_concurrency = 64\n");
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn zero_reference_offset_is_rejected() {
        let toml = format!("{MINIMAL}\n[snapshot]\nreference_offset_days = 0\n");
        assert!(parse_config(&toml).is_err());
    }
}
