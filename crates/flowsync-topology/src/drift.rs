//! Endpoint drift detection.
//!
//! A remote group's target endpoint is fixed once the group exists, so any
//! edit to `targetUri` or `targetUris` means the group must be recreated.

use std::collections::BTreeMap;

use flowsync_remote::model::PropertyEdit;

/// Endpoint edits grouped by remote group id, in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointDrift {
    by_group: BTreeMap<String, Vec<PropertyEdit>>,
}

impl EndpointDrift {
    /// Check if no group needs recreation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_group.is_empty()
    }

    /// Number of drifted groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_group.len()
    }

    /// Check if a group drifted.
    #[must_use]
    pub fn contains(&self, group_id: &str) -> bool {
        self.by_group.contains_key(group_id)
    }

    /// Endpoint edits for one group.
    #[must_use]
    pub fn edits_for(&self, group_id: &str) -> &[PropertyEdit] {
        self.by_group.get(group_id).map_or(&[], Vec::as_slice)
    }

    /// Drifted groups with their edits.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PropertyEdit])> {
        self.by_group
            .iter()
            .map(|(id, edits)| (id.as_str(), edits.as_slice()))
    }
}

/// Finds remote groups whose endpoint was edited.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftDetector;

impl DriftDetector {
    /// Group endpoint edits by the remote group they target.
    ///
    /// Edits to other properties or other component types are ignored.
    #[must_use]
    pub fn detect(edits: &[PropertyEdit]) -> EndpointDrift {
        let mut by_group: BTreeMap<String, Vec<PropertyEdit>> = BTreeMap::new();
        for edit in edits.iter().filter(|e| e.changes_remote_endpoint()) {
            by_group
                .entry(edit.component_id.clone())
                .or_default()
                .push(edit.clone());
        }

        if !by_group.is_empty() {
            tracing::debug!(groups = by_group.len(), "Detected remote endpoint drift");
        }

        EndpointDrift { by_group }
    }
}
