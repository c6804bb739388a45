//! Working copies of connections being rewired.

use flowsync_remote::model::Connection;

/// A connection paired with the version the pass intends to leave behind.
///
/// `new` starts as a copy of `old`, keeping the same id. Recreating the
/// destination group clears the id; remapping may rewrite the destination id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnectionChange {
    pub old: Connection,
    pub new: Connection,
    /// Set once the remote engine accepted a create or update.
    pub updated: bool,
}

impl PendingConnectionChange {
    /// Start a change from the connection currently in the snapshot.
    pub fn new(old: Connection) -> Self {
        let new = Connection {
            id: old.id.clone(),
            version: old.version,
            name: old.name.clone(),
            parent_group_id: old.parent_group_id.clone(),
            source: old.source.clone(),
            destination: old.destination.clone(),
            selected_relationships: old.selected_relationships.clone(),
        };
        Self {
            old,
            new,
            updated: false,
        }
    }

    /// Check if the remote engine assigned the new connection a fresh id.
    #[must_use]
    pub fn is_newly_created(&self) -> bool {
        match (&self.new.id, &self.old.id) {
            (Some(new_id), Some(old_id)) => !new_id.eq_ignore_ascii_case(old_id),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Check if the connection has to be created rather than updated.
    #[must_use]
    pub fn needs_creation(&self) -> bool {
        self.new.id.is_none()
    }

    /// Point the new connection at a replacement group.
    ///
    /// The old connection was deleted along with its group, so the new one
    /// loses its id and its revision.
    pub fn retarget_group(&mut self, group_id: &str) {
        self.new.id = None;
        self.new.version = None;
        self.new.destination.group_id = group_id.to_string();
    }

    /// Point the new connection at a different port.
    pub fn rewrite_destination(&mut self, port_id: &str) {
        self.new.destination.id = port_id.to_string();
    }

    /// Adopt the connection returned by the remote engine.
    pub fn adopt(&mut self, connection: Connection) {
        self.new = connection;
        self.updated = true;
    }

    /// Id of the connection in the snapshot.
    #[must_use]
    pub fn old_id(&self) -> Option<&str> {
        self.old.id.as_deref()
    }
}
