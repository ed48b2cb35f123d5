//! Parameter parsing configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::parse::{env_duration, env_opt, env_size};
use super::ConfigError;

/// Default body ceiling (10 MB).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// Default in-memory limit for a single file part (256 KB).
pub const DEFAULT_MEMORY_THRESHOLD: usize = 256 * 1024;

/// Limits and storage settings for request parameter aggregation.
///
/// ```rust,ignore
/// let config = ParamsConfig::default()
///     .with_max_body_size(2 * 1024 * 1024)
///     .with_memory_threshold(64 * 1024)
///     .with_read_timeout(Some(Duration::from_secs(10)));
/// ```
///
/// # Environment Variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `MAX_BODY_SIZE` | `10M` | Maximum accepted body size |
/// | `UPLOAD_MEMORY_THRESHOLD` | `256K` | File parts above this are spooled to disk |
/// | `UPLOAD_SPOOL_DIR` | OS temp dir | Directory for spooled parts |
/// | `BODY_READ_TIMEOUT` | `30s` | Body read deadline (`off` to disable) |
#[derive(Clone, Debug)]
pub struct ParamsConfig {
    /// Maximum accepted body size in bytes.
    pub max_body_size: u64,
    /// File parts larger than this many bytes are spooled to disk.
    pub memory_threshold: usize,
    /// Directory for spooled file parts.
    pub spool_dir: PathBuf,
    /// Deadline for reading the whole body (None = no deadline).
    pub read_timeout: Option<Duration>,
}

impl ParamsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_body_size = env_size("MAX_BODY_SIZE", DEFAULT_MAX_BODY_SIZE)?;
        if max_body_size == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_BODY_SIZE".into(),
                message: "must be greater than zero".into(),
            });
        }

        let memory_threshold = env_size("UPLOAD_MEMORY_THRESHOLD", DEFAULT_MEMORY_THRESHOLD as u64)?;
        let memory_threshold = usize::try_from(memory_threshold).map_err(|_| ConfigError::Invalid {
            key: "UPLOAD_MEMORY_THRESHOLD".into(),
            message: "too large for this platform".into(),
        })?;

        Ok(Self {
            max_body_size,
            memory_threshold,
            spool_dir: env_opt("UPLOAD_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            read_timeout: env_duration("BODY_READ_TIMEOUT", "30s")?,
        })
    }

    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn with_memory_threshold(mut self, bytes: usize) -> Self {
        self.memory_threshold = bytes;
        self
    }

    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = dir.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            spool_dir: std::env::temp_dir(),
            read_timeout: Some(Duration::from_secs(30)),
        }
    }
}
