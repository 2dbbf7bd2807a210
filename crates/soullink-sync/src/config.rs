//! Sync configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! path_prefix = "trackers"
//! notification_buffer = 64
//!
//! [retry]
//! max_attempts = 5
//! initial_backoff_ms = 100
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use soullink_model::DEFAULT_PATH_PREFIX;
use std::path::Path;
use std::time::Duration;

/// Backoff settings for remote writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per write, including the first
    pub max_attempts: usize,
    /// Delay before the first retry
    pub initial_backoff_ms: u64,
    /// Upper bound for a single delay
    pub max_backoff_ms: u64,
    /// Growth factor between delays
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before the first retry
    #[inline]
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Upper bound for a single delay
    #[inline]
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }
}

/// Replication settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote path prefix for tracker documents
    pub path_prefix: String,
    /// Capacity of each remote notification channel
    pub notification_buffer: usize,
    /// Capacity of the local change broadcast
    pub change_buffer: usize,
    /// Write retry policy
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            notification_buffer: 64,
            change_buffer: 256,
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With remote path prefix
    #[inline]
    #[must_use]
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into();
        self
    }

    /// With notification buffer size
    #[inline]
    #[must_use]
    pub fn with_notification_buffer(mut self, size: usize) -> Self {
        self.notification_buffer = size;
        self
    }

    /// With local change buffer size
    #[inline]
    #[must_use]
    pub fn with_change_buffer(mut self, size: usize) -> Self {
        self.change_buffer = size;
        self
    }

    /// With write retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed TOML
    /// - `ConfigError::Invalid` if values are out of range
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - see [`SyncConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ConfigError::Invalid` describing the first bad value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notification_buffer == 0 || self.change_buffer == 0 {
            return Err(ConfigError::Invalid("buffer sizes must be at least 1".into()));
        }
        self.retry.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(SyncConfig::from_toml_str("").unwrap(), SyncConfig::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SyncConfig::from_toml_str(
            r#"
            path_prefix = "runs"

            [retry]
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.path_prefix, "runs");
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_backoff_ms, 100);
        assert_eq!(config.change_buffer, 256);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            SyncConfig::from_toml_str("[retry]\nmax_attempts = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("[retry]\nbackoff_multiplier = 0.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("change_buffer = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SyncConfig::from_toml_str("path_prefix = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "notification_buffer = 8").unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.notification_buffer, 8);

        let missing = SyncConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn builder_methods() {
        let config = SyncConfig::new()
            .with_path_prefix("p")
            .with_change_buffer(4)
            .with_notification_buffer(2);
        assert_eq!(config.path_prefix, "p");
        assert_eq!(config.change_buffer, 4);
        assert_eq!(config.notification_buffer, 2);
        assert!(config.validate().is_ok());
    }
}
