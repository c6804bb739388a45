//! Remote endpoint traits
//!
//! Contract the reconciliation engine depends on to read and change topology
//! on the remote dataflow engine.

use async_trait::async_trait;

use crate::error::RemoteResult;
use crate::model::{Connectable, Connection, RemoteGroup, SiteToSitePort};

/// Control-plane client for the remote dataflow engine.
///
/// Implementations translate each call into the engine's API. Every method
/// returns a `RemoteResult` so callers can classify failures; the engine
/// decides which of them are fatal.
#[async_trait]
pub trait RemoteEndpointClient: Send + Sync {
    /// Delete a connection.
    ///
    /// With `force`, queued data on the connection is dropped first so the
    /// delete is not rejected for a non-empty queue.
    async fn delete_connection(&self, connection: &Connection, force: bool) -> RemoteResult<()>;

    /// Delete a remote group by id.
    async fn delete_remote_group(&self, group_id: &str) -> RemoteResult<()>;

    /// Create a remote group from a descriptor whose id is unset.
    ///
    /// Returns `None` if the engine accepted the request but produced no group.
    async fn create_remote_group(&self, descriptor: &RemoteGroup)
        -> RemoteResult<Option<RemoteGroup>>;

    /// Fetch the current state of a remote group.
    async fn find_remote_group_by_id(&self, group_id: &str) -> RemoteResult<Option<RemoteGroup>>;

    /// List the input ports advertised for site-to-site transfer.
    async fn list_site_to_site_input_ports(&self) -> RemoteResult<Vec<SiteToSitePort>>;

    /// Create a connection inside `parent_group_id`.
    ///
    /// Fails while the destination is not yet accepting connections.
    async fn create_connection(
        &self,
        parent_group_id: &str,
        source: &Connectable,
        destination: &Connectable,
    ) -> RemoteResult<Connection>;

    /// Update an existing connection.
    ///
    /// Returns `None` if the connection no longer exists.
    async fn update_connection(&self, connection: &Connection) -> RemoteResult<Option<Connection>>;

    /// Display name for this client instance.
    fn display_name(&self) -> &str {
        "remote endpoint"
    }
}
