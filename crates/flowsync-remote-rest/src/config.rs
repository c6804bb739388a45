//! REST client configuration
//!
//! Connection details for the dataflow engine's REST API.

use serde::{Deserialize, Serialize};

use flowsync_remote::config::{AuthConfig, ConnectionSettings, TlsConfig};
use flowsync_remote::error::{RemoteError, RemoteResult};

/// Configuration for [`NifiRestClient`](crate::NifiRestClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NifiRestConfig {
    /// Base URL of the API (e.g., "https://nifi:8443/nifi-api").
    pub base_url: String,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,

    /// TLS configuration.
    #[serde(default)]
    pub tls: TlsConfig,

    /// Connection settings (timeouts).
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Client id sent with every revision. A random id is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl NifiRestConfig {
    /// Create a new config with required fields.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: AuthConfig::None,
            tls: TlsConfig::default(),
            connection: ConnectionSettings::default(),
            client_id: None,
        }
    }

    /// Set authentication.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Set bearer token authentication.
    pub fn with_bearer_token(self, token: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::bearer(token))
    }

    /// Set username/password authentication.
    pub fn with_credentials(
        self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.with_auth(AuthConfig::credentials(username, password))
    }

    /// Set TLS configuration.
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Set connection settings.
    pub fn with_connection(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// Set a fixed client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Build the full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RemoteResult<()> {
        if self.base_url.is_empty() {
            return Err(RemoteError::InvalidConfiguration {
                message: "base_url is required".to_string(),
            });
        }

        let url = url::Url::parse(&self.base_url).map_err(|e| RemoteError::InvalidConfiguration {
            message: format!("invalid base_url: {e}"),
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(RemoteError::InvalidConfiguration {
                message: format!("unsupported scheme: {}", url.scheme()),
            });
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(RemoteError::InvalidConfiguration {
                message: "base_url has no host".to_string(),
            });
        }

        if self.connection.connection_timeout_secs == 0 || self.connection.read_timeout_secs == 0 {
            return Err(RemoteError::InvalidConfiguration {
                message: "timeouts must be greater than zero".to_string(),
            });
        }

        if let AuthConfig::Credentials { username, .. } = &self.auth {
            if username.is_empty() {
                return Err(RemoteError::InvalidConfiguration {
                    message: "username is required for credentials authentication".to_string(),
                });
            }
        }

        self.tls.validate_security();

        Ok(())
    }

    /// Get a redacted copy for logging.
    pub fn redacted(&self) -> Self {
        Self {
            auth: self.auth.redacted(),
            ..self.clone()
        }
    }
}
