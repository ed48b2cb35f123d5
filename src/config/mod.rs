//! Configuration module for request_params.
//!
//! This module provides centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use request_params::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("Body limit: {}", config.params.max_body_size);
//! ```

mod error;
mod logging;
mod params;
mod parse;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use params::{ParamsConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_MEMORY_THRESHOLD};
pub use parse::{parse_duration, parse_size};

/// Complete application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Parameter aggregation limits.
    pub params: ParamsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            params: ParamsConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  Max body size: {} bytes", self.params.max_body_size);
        info!(
            "  Upload memory threshold: {} bytes",
            self.params.memory_threshold
        );
        info!("  Spool dir: {:?}", self.params.spool_dir);

        match self.params.read_timeout {
            Some(timeout) => info!("  Body read timeout: {}ms", timeout.as_millis()),
            None => info!("  Body read timeout: disabled"),
        }

        info!("  Log format: {:?}", self.logging.format);
    }
}
