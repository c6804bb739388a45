//! Top-level reconciliation pass.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use flowsync_remote::model::{PropertyEdit, RemoteGroup};
use flowsync_remote::RemoteEndpointClient;

use crate::change::PendingConnectionChange;
use crate::config::TopologyConfig;
use crate::drift::DriftDetector;
use crate::reconciler::ConnectionReconciler;
use crate::recreation::RecreationCoordinator;
use crate::remap::PortRemapper;
use crate::snapshot::{ProcessGroupSnapshot, TopologyIndex};
use crate::validation::ValidationResult;

/// Validates and repairs the remote groups of one feed.
///
/// Runs the stages in order: endpoint drift detection, group recreation,
/// destination port remapping and connection reconciliation. Stages after a
/// failed recreation are skipped. Nothing is rolled back.
pub struct RemoteGroupValidator<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    client: Arc<C>,
    config: TopologyConfig,
    modified_properties: Vec<PropertyEdit>,
}

impl<C> RemoteGroupValidator<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    /// Create a validator for the properties a user modified on the feed.
    pub fn new(client: Arc<C>, modified_properties: Vec<PropertyEdit>) -> Self {
        Self {
            client,
            config: TopologyConfig::default(),
            modified_properties,
        }
    }

    /// Set the retry configuration.
    #[must_use]
    pub fn with_config(mut self, config: TopologyConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one reconciliation pass over `snapshot`.
    ///
    /// Remote failures are never returned as errors; they are recorded in the
    /// result. Unless a recreation failed, the snapshot is updated to match
    /// the remote engine even when some connections are invalid: replaced
    /// connections keep their position, removed groups are dropped and
    /// created groups are appended.
    #[instrument(
        skip_all,
        fields(process_group_id = %snapshot.id, client = self.client.display_name())
    )]
    pub async fn validate_and_fix_remote_groups(
        &self,
        snapshot: &mut ProcessGroupSnapshot,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let index = TopologyIndex::build(snapshot);

        let (mut changes, orphaned): (Vec<_>, Vec<_>) = snapshot
            .remote_input_connections()
            .cloned()
            .map(PendingConnectionChange::new)
            .partition(|c| index.port(&c.old.destination.id).is_some());

        for change in orphaned {
            tracing::warn!(
                connection_id = %change.old.id_or_placeholder(),
                destination = %change.old.destination.name_or_empty(),
                port_id = %change.old.destination.id,
                "Connection targets a port no remote group exposes"
            );
            result.add_non_existent_port_connection(change.old);
        }

        let drift = DriftDetector::detect(&self.modified_properties);
        let coordinator = RecreationCoordinator::new(Arc::clone(&self.client));
        for (group_id, edits) in drift.iter() {
            let Some(existing) = index.group(group_id) else {
                tracing::warn!(group_id = %group_id, "Edited remote group is not in the snapshot");
                continue;
            };
            let outcome = coordinator
                .recreate(existing, edits, &mut changes, &index)
                .await;
            let fatal = outcome.is_fatal();
            result.record_recreation(outcome);
            if fatal {
                break;
            }
        }

        let fatal = result.is_unable_to_recreate_remote_group();
        if !changes.is_empty() && !fatal {
            let remap = PortRemapper::new(Arc::clone(&self.client))
                .remap(&mut changes, &index)
                .await;
            result.record_remap(&remap);

            let reconciler =
                ConnectionReconciler::new(Arc::clone(&self.client), self.config.clone());
            let mut owners: HashMap<String, RemoteGroup> = HashMap::new();
            for idx in remap.to_reconcile {
                let change = &mut changes[idx];
                let owner_id = if change.needs_creation() {
                    change.new.destination.group_id.clone()
                } else {
                    index.destination_group_id(&change.old).to_string()
                };
                let owner = owners
                    .entry(owner_id.clone())
                    .or_insert_with(|| resolve_owner(&owner_id, &result, &index));
                let outcome = reconciler.reconcile(change, owner).await;
                result.record_reconcile(outcome);
            }
        }

        if !fatal {
            for change in changes.iter().filter(|c| c.updated) {
                snapshot.replace_connection(change.old_id(), change.new.clone());
            }
            snapshot.remove_remote_groups(result.removed_remote_group_ids());
            snapshot.add_remote_groups(result.created_remote_groups());
        }

        result.complete();
        let summary = result.summary();
        tracing::info!(
            valid = summary.valid,
            updated = summary.updated_connections,
            invalid = summary.invalid_connections,
            non_existent = summary.non_existent_port_connections,
            created_groups = summary.created_remote_groups,
            removed_groups = summary.removed_remote_groups,
            cleanup_warnings = summary.cleanup_warnings,
            "Remote group validation complete"
        );

        result
    }
}

/// Current descriptor of the group a connection delivers to.
///
/// A group unknown to the pass starts out as a bare id and is loaded by the
/// reconciler's readiness poll.
fn resolve_owner(group_id: &str, result: &ValidationResult, index: &TopologyIndex) -> RemoteGroup {
    result
        .created_remote_groups()
        .iter()
        .find(|g| g.id.as_deref() == Some(group_id))
        .or_else(|| index.group(group_id))
        .cloned()
        .unwrap_or_else(|| RemoteGroup {
            id: Some(group_id.to_string()),
            ..Default::default()
        })
}
