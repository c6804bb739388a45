//! Destination port remapping.
//!
//! Recreating a remote group gives its ports fresh ids, so a destination port
//! id recorded in the snapshot may no longer exist. Ports keep their names
//! across recreation, which makes the name a usable fallback key.

use std::collections::HashMap;
use std::sync::Arc;

use flowsync_remote::model::{Connection, SiteToSitePort};
use flowsync_remote::RemoteEndpointClient;

use crate::change::PendingConnectionChange;
use crate::snapshot::TopologyIndex;

/// Site-to-site input ports keyed by id and by name.
#[derive(Debug, Clone, Default)]
pub struct PortCatalog {
    by_id: HashMap<String, SiteToSitePort>,
    by_name: HashMap<String, SiteToSitePort>,
}

impl PortCatalog {
    /// Index a port listing. The first port wins on a duplicate name.
    pub fn new(ports: impl IntoIterator<Item = SiteToSitePort>) -> Self {
        let mut catalog = Self::default();
        for port in ports {
            catalog
                .by_name
                .entry(port.name.clone())
                .or_insert_with(|| port.clone());
            catalog.by_id.entry(port.id.clone()).or_insert(port);
        }
        catalog
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&SiteToSitePort> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Result of remapping a batch of pending changes.
#[derive(Debug, Clone, Default)]
pub struct RemapOutcome {
    /// Indices of changes that need a create or update on the remote engine.
    pub to_reconcile: Vec<usize>,
    /// Connections with no destination port on the target.
    pub non_existent: Vec<Connection>,
    /// Connections that could not be checked because the catalog was unavailable.
    pub invalid: Vec<Connection>,
}

/// Resolves destination ports against the remote engine's site-to-site catalog.
pub struct PortRemapper<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    client: Arc<C>,
}

impl<C> PortRemapper<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    /// Create a new remapper.
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Resolve the destination port of every change whose port is indexed.
    ///
    /// Changes with an unindexed destination are left alone. The catalog is
    /// fetched at most once per call.
    pub async fn remap(
        &self,
        changes: &mut [PendingConnectionChange],
        index: &TopologyIndex,
    ) -> RemapOutcome {
        let mut outcome = RemapOutcome::default();

        let candidates: Vec<usize> = changes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.old.targets_remote_input_port())
            .filter(|(_, c)| index.port(&c.old.destination.id).is_some())
            .map(|(idx, _)| idx)
            .collect();

        if candidates.is_empty() {
            return outcome;
        }

        let catalog = match self.client.list_site_to_site_input_ports().await {
            Ok(ports) => PortCatalog::new(ports),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    error_code = e.error_code(),
                    transient = e.is_transient(),
                    connections = candidates.len(),
                    "Failed to list site-to-site input ports"
                );
                outcome.invalid = candidates
                    .into_iter()
                    .map(|idx| changes[idx].old.clone())
                    .collect();
                return outcome;
            }
        };

        tracing::debug!(ports = catalog.len(), "Loaded site-to-site port catalog");

        for idx in candidates {
            let change = &mut changes[idx];
            let port_id = change.old.destination.id.clone();

            if catalog.contains_id(&port_id) {
                if change.needs_creation() {
                    outcome.to_reconcile.push(idx);
                }
                continue;
            }

            let name = match change.old.destination.name.as_deref() {
                Some(name) => name.to_string(),
                None => index
                    .port(&port_id)
                    .map(|p| p.port.name.clone())
                    .unwrap_or_default(),
            };

            match catalog.find_by_name(&name) {
                Some(port) => {
                    tracing::info!(
                        connection_id = %change.old.id_or_placeholder(),
                        destination = %name,
                        old_port_id = %port_id,
                        new_port_id = %port.id,
                        "Remapped destination port by name"
                    );
                    change.rewrite_destination(&port.id);
                    outcome.to_reconcile.push(idx);
                }
                None => {
                    tracing::warn!(
                        connection_id = %change.old.id_or_placeholder(),
                        destination = %name,
                        parent_group_id = %change.old.parent_group_id,
                        "Destination port does not exist on the target"
                    );
                    outcome.non_existent.push(change.old.clone());
                }
            }
        }

        outcome
    }
}
