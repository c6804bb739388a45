//! # Remote Endpoint Framework
//!
//! Core abstractions for talking to a remote dataflow engine's control API.
//!
//! This crate holds the pieces shared between the reconciliation engine and
//! concrete clients:
//!
//! - [`RemoteEndpointClient`] - the async contract the engine depends on
//! - [`model`] - connections, remote groups, ports, property edits
//! - [`error`] - errors with transient/permanent classification
//! - [`config`] - connection, TLS and authentication settings
//!
//! ## Example
//!
//! ```ignore
//! use flowsync_remote::prelude::*;
//!
//! async fn port_names(client: &dyn RemoteEndpointClient) -> RemoteResult<Vec<String>> {
//!     let ports = client.list_site_to_site_input_ports().await?;
//!     Ok(ports.into_iter().map(|p| p.name).collect())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod traits;
pub mod types;

pub use traits::RemoteEndpointClient;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{AuthConfig, ConnectionSettings, TlsConfig};
    pub use crate::error::{RemoteError, RemoteResult};
    pub use crate::model::{
        Connectable, Connection, Position, PropertyEdit, RemoteGroup, RemotePort, SiteToSitePort,
    };
    pub use crate::traits::RemoteEndpointClient;
    pub use crate::types::{ConnectableType, TransportProtocol, REMOTE_PROCESS_GROUP};
}

// Re-export async_trait for client implementors
pub use async_trait::async_trait;
