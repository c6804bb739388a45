//! Topology type definitions
//!
//! Enums and constants shared by the model and the remote client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Component type tag carried by property edits that target a remote group.
pub const REMOTE_PROCESS_GROUP: &str = "REMOTE_PROCESS_GROUP";

/// Property key holding a remote group's single target endpoint.
pub const TARGET_URI_KEY: &str = "targetUri";

/// Property key holding a remote group's comma-separated target endpoints.
pub const TARGET_URIS_KEY: &str = "targetUris";

/// Kind of component at either end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConnectableType {
    /// A processor
    Processor,
    /// Input port of a remote group
    RemoteInputPort,
    /// Output port of a remote group
    RemoteOutputPort,
    /// Local input port
    InputPort,
    /// Local output port
    OutputPort,
    /// Funnel
    Funnel,
}

impl ConnectableType {
    /// Get all connectable types.
    #[must_use]
    pub fn all() -> &'static [ConnectableType] {
        &[
            ConnectableType::Processor,
            ConnectableType::RemoteInputPort,
            ConnectableType::RemoteOutputPort,
            ConnectableType::InputPort,
            ConnectableType::OutputPort,
            ConnectableType::Funnel,
        ]
    }

    /// Get the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectableType::Processor => "PROCESSOR",
            ConnectableType::RemoteInputPort => "REMOTE_INPUT_PORT",
            ConnectableType::RemoteOutputPort => "REMOTE_OUTPUT_PORT",
            ConnectableType::InputPort => "INPUT_PORT",
            ConnectableType::OutputPort => "OUTPUT_PORT",
            ConnectableType::Funnel => "FUNNEL",
        }
    }

    /// Check if this endpoint lives inside a remote group.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ConnectableType::RemoteInputPort | ConnectableType::RemoteOutputPort
        )
    }
}

impl fmt::Display for ConnectableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectableType {
    type Err = ParseConnectableTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectableType::all()
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| ParseConnectableTypeError(s.to_string()))
    }
}

impl TryFrom<String> for ConnectableType {
    type Error = ParseConnectableTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConnectableType> for String {
    fn from(value: ConnectableType) -> Self {
        value.as_str().to_string()
    }
}

/// Error parsing connectable type from string.
#[derive(Debug, Clone)]
pub struct ParseConnectableTypeError(String);

impl fmt::Display for ParseConnectableTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid connectable type '{}'", self.0)
    }
}

impl std::error::Error for ParseConnectableTypeError {}

/// Transport used by a remote group to reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportProtocol {
    /// Raw socket site-to-site
    #[default]
    Raw,
    /// HTTP(S) site-to-site
    Http,
}

impl TransportProtocol {
    /// Get the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportProtocol::Raw => "RAW",
            TransportProtocol::Http => "HTTP",
        }
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RAW" => Ok(TransportProtocol::Raw),
            "HTTP" | "HTTPS" => Ok(TransportProtocol::Http),
            _ => Err(format!("Unknown transport protocol: {s}")),
        }
    }
}
