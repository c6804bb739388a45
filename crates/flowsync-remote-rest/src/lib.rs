//! # Dataflow Engine REST Client
//!
//! [`RemoteEndpointClient`](flowsync_remote::RemoteEndpointClient) backed by
//! the engine's REST API.
//!
//! ## Features
//!
//! - Bearer token or username/password authentication (token cached per client)
//! - Revision handling for optimistic locking on every mutating call
//! - Queue draining before forced connection deletes
//! - HTTP status mapping onto transient and permanent [`RemoteError`]s
//!
//! ## Example
//!
//! ```ignore
//! use flowsync_remote_rest::{NifiRestClient, NifiRestConfig};
//!
//! let config = NifiRestConfig::new("https://nifi:8443/nifi-api")
//!     .with_credentials("admin", "secret");
//! let client = NifiRestClient::new(config)?;
//! let ports = client.list_site_to_site_input_ports().await?;
//! ```
//!
//! [`RemoteError`]: flowsync_remote::error::RemoteError

pub mod client;
pub mod config;
pub mod dto;

pub use client::NifiRestClient;
pub use config::NifiRestConfig;
