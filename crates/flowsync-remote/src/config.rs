//! Remote endpoint configuration types
//!
//! Connection, TLS and authentication settings shared by client implementations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const REDACTED: &str = "***REDACTED***";

/// Common connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    60
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl ConnectionSettings {
    /// Create new connection settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    /// Get connection timeout as Duration.
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    /// Get read timeout as Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// TLS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Whether to verify the server certificate.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_certificate: true,
        }
    }
}

impl TlsConfig {
    /// Validate the TLS configuration and log security warnings.
    pub fn validate_security(&self) {
        if !self.verify_certificate {
            tracing::warn!(
                target: "security",
                "TLS certificate verification is DISABLED for the remote engine client. \
                 Only use this against local development instances."
            );
        }
    }

    /// Create a TLS config that skips certificate verification.
    #[cfg(any(test, debug_assertions))]
    pub fn insecure() -> Self {
        Self {
            verify_certificate: false,
        }
    }
}

/// Authentication method configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    #[default]
    None,

    /// Pre-issued bearer token.
    Bearer { token: String },

    /// Username/password exchanged for a bearer token at the engine's token endpoint.
    Credentials { username: String, password: String },
}

impl AuthConfig {
    /// Create bearer token authentication config.
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthConfig::Bearer {
            token: token.into(),
        }
    }

    /// Create username/password authentication config.
    pub fn credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create a redacted version.
    pub fn redacted(&self) -> Self {
        match self {
            AuthConfig::None => AuthConfig::None,
            AuthConfig::Bearer { .. } => AuthConfig::Bearer {
                token: REDACTED.to_string(),
            },
            AuthConfig::Credentials { username, .. } => AuthConfig::Credentials {
                username: username.clone(),
                password: REDACTED.to_string(),
            },
        }
    }
}
