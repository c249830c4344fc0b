//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::DispatcherConfig;
use crate::services::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Concurrent transfer execution workers
    pub transfer_workers: usize,

    /// Pending transfer events before publishers wait
    pub transfer_queue_capacity: usize,

    /// Save attempts per account mutation
    pub retry_max_attempts: u32,

    pub retry_base_delay_ms: u64,

    pub retry_max_delay_ms: u64,

    /// Striped account locks; 0 runs purely optimistic
    pub account_lock_stripes: usize,

    /// Load the two demo accounts and a batch of transfers on startup
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            transfer_workers: 8,
            transfer_queue_capacity: 1024,
            retry_max_attempts: 100,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 64,
            account_lock_stripes: 64,
            seed_demo_data: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            transfer_workers: parse_or(&lookup, "TRANSFER_WORKERS", defaults.transfer_workers)?,
            transfer_queue_capacity: parse_or(
                &lookup,
                "TRANSFER_QUEUE_CAPACITY",
                defaults.transfer_queue_capacity,
            )?,
            retry_max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts)?,
            retry_base_delay_ms: parse_or(
                &lookup,
                "RETRY_BASE_DELAY_MS",
                defaults.retry_base_delay_ms,
            )?,
            retry_max_delay_ms: parse_or(&lookup, "RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms)?,
            account_lock_stripes: parse_or(
                &lookup,
                "ACCOUNT_LOCK_STRIPES",
                defaults.account_lock_stripes,
            )?,
            seed_demo_data: parse_or(&lookup, "SEED_DEMO_DATA", defaults.seed_demo_data)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer_workers == 0 {
            return Err(ConfigError::InvalidValue("TRANSFER_WORKERS"));
        }
        if self.transfer_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue("TRANSFER_QUEUE_CAPACITY"));
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("RETRY_MAX_ATTEMPTS"));
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::InvalidValue("RETRY_BASE_DELAY_MS"));
        }
        Ok(())
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            workers: self.transfer_workers,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
