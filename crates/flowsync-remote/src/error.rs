//! Remote endpoint error types
//!
//! Error definitions with transient/permanent classification for retry logic.

use thiserror::Error;

/// Error that can occur while talking to the remote dataflow engine.
#[derive(Debug, Error)]
pub enum RemoteError {
    // Connection errors (usually transient)
    /// Failed to establish connection to the remote engine.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Request timed out.
    #[error("connection timeout after {timeout_secs} seconds")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Remote engine is temporarily unavailable or rejecting requests.
    #[error("remote engine unavailable: {message}")]
    TargetUnavailable { message: String },

    /// Network error during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Authentication errors (usually permanent)
    /// Invalid credentials provided.
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Insufficient permissions for the operation.
    #[error("authorization failed: insufficient permissions for {operation}")]
    AuthorizationFailed { operation: String },

    // Configuration errors (permanent)
    /// Client configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Resource errors
    /// Component does not exist on the remote engine.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Revision conflict or component in a state that rejects the change.
    #[error("conflict on {kind} {id}: {message}")]
    Conflict {
        kind: String,
        id: String,
        message: String,
    },

    /// Invalid data in a request or response.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Operation failed.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    // Internal errors
    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RemoteError {
    /// Check if this error is transient and the operation should be retried.
    ///
    /// Transient errors are those caused by temporary conditions that may resolve
    /// themselves, such as network issues or temporary unavailability.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::ConnectionFailed { .. }
                | RemoteError::ConnectionTimeout { .. }
                | RemoteError::TargetUnavailable { .. }
                | RemoteError::NetworkError { .. }
        )
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            RemoteError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            RemoteError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            RemoteError::TargetUnavailable { .. } => "TARGET_UNAVAILABLE",
            RemoteError::NetworkError { .. } => "NETWORK_ERROR",
            RemoteError::AuthenticationFailed { .. } => "AUTH_FAILED",
            RemoteError::AuthorizationFailed { .. } => "AUTHORIZATION_FAILED",
            RemoteError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            RemoteError::NotFound { .. } => "NOT_FOUND",
            RemoteError::Conflict { .. } => "CONFLICT",
            RemoteError::InvalidData { .. } => "INVALID_DATA",
            RemoteError::OperationFailed { .. } => "OPERATION_FAILED",
            RemoteError::Serialization { .. } => "SERIALIZATION_ERROR",
            RemoteError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        RemoteError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RemoteError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a target unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        RemoteError::TargetUnavailable {
            message: message.into(),
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RemoteError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        RemoteError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(
        kind: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RemoteError::Conflict {
            kind: kind.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        RemoteError::InvalidData {
            message: message.into(),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        RemoteError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        RemoteError::Internal {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type for remote endpoint operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
