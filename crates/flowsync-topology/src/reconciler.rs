//! Connection reconciliation with bounded retry.
//!
//! A freshly created remote group rejects connections until it has finished
//! its handshake with the target. The reconciler polls through that window
//! with a fixed backoff and a shared attempt budget.

use std::sync::Arc;

use flowsync_remote::error::RemoteError;
use flowsync_remote::model::{Connection, RemoteGroup};
use flowsync_remote::RemoteEndpointClient;

use crate::change::PendingConnectionChange;
use crate::config::TopologyConfig;

/// Terminal result of reconciling one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The remote engine accepted the connection.
    Updated(Connection),
    /// The connection could not be created or updated.
    Invalid(Connection),
}

impl ReconcileOutcome {
    #[must_use]
    pub fn is_updated(&self) -> bool {
        matches!(self, ReconcileOutcome::Updated(_))
    }
}

/// Creates or updates connections on the remote engine.
pub struct ConnectionReconciler<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    client: Arc<C>,
    config: TopologyConfig,
}

impl<C> ConnectionReconciler<C>
where
    C: RemoteEndpointClient + ?Sized,
{
    /// Create a new reconciler.
    pub fn new(client: Arc<C>, config: TopologyConfig) -> Self {
        Self { client, config }
    }

    /// Drive one change to a terminal outcome.
    ///
    /// A change without a connection id is created, retrying every failure.
    /// A change with an id is updated once `owner` is ready to accept
    /// connections; `owner` is refreshed in place while polling. The update
    /// itself is attempted once.
    pub async fn reconcile(
        &self,
        change: &mut PendingConnectionChange,
        owner: &mut RemoteGroup,
    ) -> ReconcileOutcome {
        let max_attempts = self.config.max_attempts();
        let mut attempt: u32 = 1;
        let mut last_error: Option<RemoteError> = None;

        loop {
            if change.needs_creation() {
                let new = &change.new;
                match self
                    .client
                    .create_connection(&new.parent_group_id, &new.source, &new.destination)
                    .await
                {
                    Ok(created) => {
                        tracing::info!(
                            connection_id = %created.id_or_placeholder(),
                            destination = %created.destination.name_or_empty(),
                            parent_group_id = %created.parent_group_id,
                            attempt,
                            "Created connection"
                        );
                        change.adopt(created);
                        return ReconcileOutcome::Updated(change.new.clone());
                    }
                    Err(e) => {
                        tracing::warn!(
                            destination = %new.destination.name_or_empty(),
                            parent_group_id = %new.parent_group_id,
                            attempt,
                            max_attempts,
                            error = %e,
                            transient = e.is_transient(),
                            "Failed to create connection"
                        );
                        last_error = Some(e);
                    }
                }
            } else if !owner.is_ready_for_connections() {
                tracing::info!(
                    connection_id = %change.new.id_or_placeholder(),
                    group_id = ?owner.id,
                    authorization_issues = owner.authorization_issues.len(),
                    input_ports = owner.input_port_count(),
                    attempt,
                    "Remote group not ready for connections"
                );

                if attempt < max_attempts {
                    tokio::time::sleep(self.config.retry_backoff).await;
                    attempt += 1;
                    match self.refresh(owner).await {
                        Ok(true) => continue,
                        Ok(false) => {
                            tracing::warn!(
                                connection_id = %change.new.id_or_placeholder(),
                                group_id = ?owner.id,
                                "Remote group no longer exists"
                            );
                            return ReconcileOutcome::Invalid(change.new.clone());
                        }
                        Err(e) if e.is_transient() => {
                            tracing::warn!(
                                group_id = ?owner.id,
                                attempt,
                                error = %e,
                                "Failed to refresh remote group, will retry"
                            );
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(
                                group_id = ?owner.id,
                                error = %e,
                                error_code = e.error_code(),
                                "Failed to refresh remote group"
                            );
                            return ReconcileOutcome::Invalid(change.new.clone());
                        }
                    }
                }
            } else {
                return match self.client.update_connection(&change.new).await {
                    Ok(Some(updated)) => {
                        tracing::info!(
                            connection_id = %updated.id_or_placeholder(),
                            destination = %updated.destination.name_or_empty(),
                            parent_group_id = %updated.parent_group_id,
                            "Updated connection"
                        );
                        change.adopt(updated);
                        ReconcileOutcome::Updated(change.new.clone())
                    }
                    Ok(None) => {
                        tracing::warn!(
                            connection_id = %change.new.id_or_placeholder(),
                            "Connection no longer exists on the remote engine"
                        );
                        ReconcileOutcome::Invalid(change.new.clone())
                    }
                    Err(e) => {
                        tracing::warn!(
                            connection_id = %change.new.id_or_placeholder(),
                            error = %e,
                            error_code = e.error_code(),
                            "Failed to update connection"
                        );
                        ReconcileOutcome::Invalid(change.new.clone())
                    }
                };
            }

            if attempt >= max_attempts {
                break;
            }
            tokio::time::sleep(self.config.retry_backoff).await;
            attempt += 1;
        }

        tracing::warn!(
            connection_id = %change.new.id_or_placeholder(),
            destination = %change.new.destination.name_or_empty(),
            parent_group_id = %change.new.parent_group_id,
            attempts = attempt,
            last_error = ?last_error.map(|e| e.to_string()),
            "Retry budget exhausted"
        );
        ReconcileOutcome::Invalid(change.new.clone())
    }

    /// Reload `owner` from the remote engine. Returns `false` if it is gone.
    async fn refresh(&self, owner: &mut RemoteGroup) -> Result<bool, RemoteError> {
        let Some(group_id) = owner.id.clone() else {
            return Ok(false);
        };
        match self.client.find_remote_group_by_id(&group_id).await? {
            Some(current) => {
                *owner = current;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
