use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid similarity threshold {0}: must be within 0.0..=1.0")]
    InvalidThreshold(f64),

    #[error(
        "Invalid epic thresholds: suggest_threshold ({0}) must be below auto_assign_threshold ({1})"
    )]
    InvalidThresholdOrder(f64, f64),

    #[error("Invalid active hour {0}: must be below 24")]
    InvalidActiveHour(u32),

    #[error("Invalid generation timeout: must be at least 1 second")]
    InvalidGenerationTimeout,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .promptdeck/config.yaml (project config, created by init)
    /// 3. .promptdeck/local.yaml (project local overrides, optional)
    /// 4. Environment variables (PROMPTDECK_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.promptdeck/) so multiple
    /// decks on one machine stay independent.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".promptdeck/config.yaml"))
            .merge(Yaml::file(".promptdeck/local.yaml"))
            .merge(Env::prefixed("PROMPTDECK_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("PROMPTDECK_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }
        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.generation.timeout_secs == 0 {
            return Err(ConfigError::InvalidGenerationTimeout);
        }

        for threshold in [
            config.automation.suggest_threshold,
            config.automation.auto_assign_threshold,
        ] {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::InvalidThreshold(threshold));
            }
        }
        if config.automation.suggest_threshold >= config.automation.auto_assign_threshold {
            return Err(ConfigError::InvalidThresholdOrder(
                config.automation.suggest_threshold,
                config.automation.auto_assign_threshold,
            ));
        }

        for hour in [
            config.scheduler.active_hours_start,
            config.scheduler.active_hours_end,
        ] {
            if hour >= 24 {
                return Err(ConfigError::InvalidActiveHour(hour));
            }
        }

        if config.events.queue_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "events.queue_capacity cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}
