//! Validation result of a reconciliation pass.
//!
//! The result is the only channel through which a caller learns what a pass
//! changed on the remote engine and what it could not fix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use flowsync_remote::model::{Connection, RemoteGroup};

use crate::reconciler::ReconcileOutcome;
use crate::recreation::RecreationOutcome;
use crate::remap::RemapOutcome;

/// Outcome of one reconciliation pass.
///
/// Each entry is recorded at most once. The pass is valid when no
/// recreation failed and no connection ended up invalid or without a
/// destination port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    updated_connections: Vec<Connection>,
    #[serde(default)]
    invalid_connections: Vec<Connection>,
    #[serde(default)]
    non_existent_port_connections: Vec<Connection>,
    #[serde(default)]
    created_remote_groups: Vec<RemoteGroup>,
    #[serde(default)]
    removed_remote_group_ids: BTreeSet<String>,
    #[serde(default)]
    unable_to_recreate_remote_group: bool,
    /// Failed fire-and-forget deletes. Informational only.
    #[serde(default)]
    cleanup_warnings: Vec<String>,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    /// Create an empty, valid result.
    #[must_use]
    pub fn new() -> Self {
        Self {
            updated_connections: Vec::new(),
            invalid_connections: Vec::new(),
            non_existent_port_connections: Vec::new(),
            created_remote_groups: Vec::new(),
            removed_remote_group_ids: BTreeSet::new(),
            unable_to_recreate_remote_group: false,
            cleanup_warnings: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn add_updated_connection(&mut self, connection: Connection) {
        push_unique(&mut self.updated_connections, connection);
    }

    pub fn add_invalid_connection(&mut self, connection: Connection) {
        push_unique(&mut self.invalid_connections, connection);
    }

    pub fn add_non_existent_port_connection(&mut self, connection: Connection) {
        push_unique(&mut self.non_existent_port_connections, connection);
    }

    pub fn add_created_remote_group(&mut self, group: RemoteGroup) {
        push_unique(&mut self.created_remote_groups, group);
    }

    pub fn add_removed_remote_group_id(&mut self, group_id: impl Into<String>) {
        self.removed_remote_group_ids.insert(group_id.into());
    }

    /// Set the fatal flag.
    pub fn mark_unable_to_recreate_remote_group(&mut self) {
        self.unable_to_recreate_remote_group = true;
    }

    pub fn add_cleanup_warning(&mut self, warning: impl Into<String>) {
        self.cleanup_warnings.push(warning.into());
    }

    /// Fold in the outcome of one recreation.
    pub fn record_recreation(&mut self, outcome: RecreationOutcome) {
        match outcome {
            RecreationOutcome::Recreated {
                removed_group_id,
                created,
                cleanup_warnings,
            } => {
                self.add_removed_remote_group_id(removed_group_id);
                self.add_created_remote_group(created);
                self.cleanup_warnings.extend(cleanup_warnings);
            }
            RecreationOutcome::Failed {
                removed_group_id,
                cleanup_warnings,
                ..
            } => {
                self.add_removed_remote_group_id(removed_group_id);
                self.cleanup_warnings.extend(cleanup_warnings);
                self.mark_unable_to_recreate_remote_group();
            }
        }
    }

    /// Fold in the connections the remapper gave up on.
    pub fn record_remap(&mut self, outcome: &RemapOutcome) {
        for connection in &outcome.non_existent {
            self.add_non_existent_port_connection(connection.clone());
        }
        for connection in &outcome.invalid {
            self.add_invalid_connection(connection.clone());
        }
    }

    /// Fold in the outcome of one connection.
    pub fn record_reconcile(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Updated(connection) => self.add_updated_connection(connection),
            ReconcileOutcome::Invalid(connection) => self.add_invalid_connection(connection),
        }
    }

    /// Stamp the completion time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Check if the pass left the topology executable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.unable_to_recreate_remote_group
            && self.invalid_connections.is_empty()
            && self.non_existent_port_connections.is_empty()
    }

    #[must_use]
    pub fn updated_connections(&self) -> &[Connection] {
        &self.updated_connections
    }

    #[must_use]
    pub fn invalid_connections(&self) -> &[Connection] {
        &self.invalid_connections
    }

    #[must_use]
    pub fn non_existent_port_connections(&self) -> &[Connection] {
        &self.non_existent_port_connections
    }

    #[must_use]
    pub fn created_remote_groups(&self) -> &[RemoteGroup] {
        &self.created_remote_groups
    }

    #[must_use]
    pub fn removed_remote_group_ids(&self) -> &BTreeSet<String> {
        &self.removed_remote_group_ids
    }

    #[must_use]
    pub fn is_unable_to_recreate_remote_group(&self) -> bool {
        self.unable_to_recreate_remote_group
    }

    #[must_use]
    pub fn cleanup_warnings(&self) -> &[String] {
        &self.cleanup_warnings
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Invalid and non-existent-port connections together, for reporting.
    #[must_use]
    pub fn all_invalid_connections(&self) -> Vec<&Connection> {
        self.invalid_connections
            .iter()
            .chain(&self.non_existent_port_connections)
            .collect()
    }

    /// Counts per outcome set.
    #[must_use]
    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            valid: self.is_valid(),
            updated_connections: self.updated_connections.len(),
            invalid_connections: self.invalid_connections.len(),
            non_existent_port_connections: self.non_existent_port_connections.len(),
            created_remote_groups: self.created_remote_groups.len(),
            removed_remote_groups: self.removed_remote_group_ids.len(),
            unable_to_recreate_remote_group: self.unable_to_recreate_remote_group,
            cleanup_warnings: self.cleanup_warnings.len(),
            duration_ms: self
                .completed_at
                .map(|end| (end - self.started_at).num_milliseconds().max(0)),
        }
    }
}

/// Counts of a [`ValidationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub valid: bool,
    pub updated_connections: usize,
    pub invalid_connections: usize,
    pub non_existent_port_connections: usize,
    pub created_remote_groups: usize,
    pub removed_remote_groups: usize,
    pub unable_to_recreate_remote_group: bool,
    pub cleanup_warnings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

fn push_unique<T: PartialEq>(entries: &mut Vec<T>, entry: T) {
    if !entries.contains(&entry) {
        entries.push(entry);
    }
}
