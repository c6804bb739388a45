//! Remote group recreation.
//!
//! Replaces a remote group whose endpoint changed: its inbound connections and
//! the group itself are deleted, and a new group is created from a copy of the
//! old descriptor with the edits applied.

use std::sync::Arc;

use flowsync_remote::model::{PropertyEdit, RemoteGroup};
use flowsync_remote::types::TransportProtocol;
use flowsync_remote::RemoteEndpointClient;

use crate::change::PendingConnectionChange;
use crate::snapshot::TopologyIndex;

/// Result of recreating one remote group.
#[derive(Debug, Clone)]
pub enum RecreationOutcome {
    /// The replacement group exists on the remote engine.
    Recreated {
        removed_group_id: String,
        created: RemoteGroup,
        cleanup_warnings: Vec<String>,
    },
    /// The old group is gone but no replacement could be created.
    Failed {
        removed_group_id: String,
        reason: String,
        cleanup_warnings: Vec<String>,
    },
}

impl RecreationOutcome {
    /// Check if the replacement could not be created.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecreationOutcome::Failed { .. })
    }
}

/// Deletes and recreates remote groups whose endpoint was edited.
pub struct RecreationCoordinator<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    client: Arc<C>,
}

impl<C> RecreationCoordinator<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    /// Create a new coordinator.
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Recreate `existing` with `edits` applied.
    ///
    /// Pending changes whose destination lies in the old group are pointed at
    /// the replacement and lose their connection id, since the old
    /// connections are deleted here.
    pub async fn recreate(
        &self,
        existing: &RemoteGroup,
        edits: &[PropertyEdit],
        changes: &mut [PendingConnectionChange],
        index: &TopologyIndex,
    ) -> RecreationOutcome {
        let group_id = existing.id.clone().unwrap_or_default();
        let mut cleanup_warnings = Vec::new();

        tracing::info!(
            group_id = %group_id,
            target_uri = ?existing.target_uri,
            edits = edits.len(),
            "Recreating remote group with new endpoint"
        );

        let affected: Vec<usize> = changes
            .iter()
            .enumerate()
            .filter(|(_, c)| index.destination_group_id(&c.old) == group_id)
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &affected {
            let connection = &changes[idx].old;
            if let Err(e) = self.client.delete_connection(connection, true).await {
                tracing::warn!(
                    group_id = %group_id,
                    connection_id = %connection.id_or_placeholder(),
                    error = %e,
                    error_code = e.error_code(),
                    "Failed to delete connection into remote group"
                );
                cleanup_warnings.push(format!(
                    "failed to delete connection {}: {e}",
                    connection.id_or_placeholder()
                ));
            }
        }

        if let Err(e) = self.client.delete_remote_group(&group_id).await {
            tracing::warn!(
                group_id = %group_id,
                error = %e,
                error_code = e.error_code(),
                "Failed to delete remote group"
            );
            cleanup_warnings.push(format!("failed to delete remote group {group_id}: {e}"));
        }

        let mut descriptor = existing.replacement();
        apply_property_edits(&mut descriptor, edits);

        let reason = match self.client.create_remote_group(&descriptor).await {
            Ok(Some(created)) => match created.id.clone() {
                Some(new_id) => {
                    for &idx in &affected {
                        changes[idx].retarget_group(&new_id);
                    }
                    tracing::info!(
                        old_group_id = %group_id,
                        new_group_id = %new_id,
                        connections = affected.len(),
                        "Remote group recreated"
                    );
                    return RecreationOutcome::Recreated {
                        removed_group_id: group_id,
                        created,
                        cleanup_warnings,
                    };
                }
                None => "remote engine returned a group without an id".to_string(),
            },
            Ok(None) => "remote engine did not return the created group".to_string(),
            Err(e) => e.to_string(),
        };

        tracing::error!(
            group_id = %group_id,
            reason = %reason,
            "Unable to recreate remote group"
        );

        RecreationOutcome::Failed {
            removed_group_id: group_id,
            reason,
            cleanup_warnings,
        }
    }
}

/// Apply user edits to a remote group descriptor.
///
/// Keys are matched case-insensitively. An edit with no value clears the
/// property. Values that cannot be parsed and unknown keys are skipped.
pub fn apply_property_edits(group: &mut RemoteGroup, edits: &[PropertyEdit]) {
    for edit in edits {
        let value = edit.value.clone();
        match edit.key.to_ascii_lowercase().as_str() {
            "targeturi" => {
                group.target_uris = value.clone();
                group.target_uri = value;
            }
            "targeturis" => {
                group.target_uri = value.as_deref().and_then(|uris| {
                    uris.split(',')
                        .map(str::trim)
                        .find(|u| !u.is_empty())
                        .map(str::to_string)
                });
                group.target_uris = value;
            }
            "name" => group.name = value,
            "comments" => group.comments = value,
            "communicationstimeout" => group.communications_timeout = value,
            "yieldduration" => group.yield_duration = value,
            "localnetworkinterface" => group.local_network_interface = value,
            "proxyhost" => group.proxy_host = value,
            "proxyuser" => group.proxy_user = value,
            "proxypassword" => group.proxy_password = value,
            "transportprotocol" => match value.as_deref().map(str::parse::<TransportProtocol>) {
                None => group.transport_protocol = None,
                Some(Ok(protocol)) => group.transport_protocol = Some(protocol),
                Some(Err(e)) => {
                    tracing::warn!(key = %edit.key, error = %e, "Ignoring invalid property value");
                }
            },
            "proxyport" => match value.as_deref().map(|v| v.trim().parse::<u16>()) {
                None => group.proxy_port = None,
                Some(Ok(port)) => group.proxy_port = Some(port),
                Some(Err(e)) => {
                    tracing::warn!(key = %edit.key, error = %e, "Ignoring invalid property value");
                }
            },
            _ => {
                tracing::debug!(key = %edit.key, "Ignoring unsupported remote group property");
            }
        }
    }
}
