//! Reconciliation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the retry cap.
pub const RETRY_MAX_VAR: &str = "FLOWSYNC_RETRY_MAX";

/// Environment variable holding the backoff interval in milliseconds.
pub const RETRY_BACKOFF_MS_VAR: &str = "FLOWSYNC_RETRY_BACKOFF_MS";

/// Tuning for the connection reconciler's retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Retries after the first attempt before a connection is reported invalid.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed pause between attempts.
    #[serde(default = "default_retry_backoff", with = "duration_ms")]
    pub retry_backoff: Duration,
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(3000)
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

impl TopologyConfig {
    /// Set the retry cap.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff interval.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Total attempts a single connection may consume.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Unset variables fall back to defaults; set but unparsable values are errors.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let max_retries = match reader(RETRY_MAX_VAR) {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidValue(RETRY_MAX_VAR.into(), e.to_string()))?,
            Err(_) => default_max_retries(),
        };

        let retry_backoff = match reader(RETRY_BACKOFF_MS_VAR) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| {
                    ConfigError::InvalidValue(RETRY_BACKOFF_MS_VAR.into(), e.to_string())
                })?,
            Err(_) => default_retry_backoff(),
        };

        Ok(Self {
            max_retries,
            retry_backoff,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
