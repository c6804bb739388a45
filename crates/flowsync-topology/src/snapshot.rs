//! Process-group snapshot and lookup index.
//!
//! A snapshot is the content of one feed's process group as loaded for a
//! single reconciliation pass. The pass mutates it in place and hands it back
//! to the caller for persistence.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use flowsync_remote::model::{Connection, RemoteGroup, RemotePort};

/// Contents of one feed's process group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupSnapshot {
    /// Process group id.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Connections, in canvas order.
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Remote groups, in canvas order.
    #[serde(default)]
    pub remote_groups: Vec<RemoteGroup>,
}

impl ProcessGroupSnapshot {
    /// Create an empty snapshot.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add a connection.
    #[must_use]
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    /// Add a remote group.
    #[must_use]
    pub fn with_remote_group(mut self, group: RemoteGroup) -> Self {
        self.remote_groups.push(group);
        self
    }

    /// Find a connection by id.
    #[must_use]
    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.id.as_deref() == Some(id))
    }

    /// Find a remote group by id.
    #[must_use]
    pub fn remote_group(&self, id: &str) -> Option<&RemoteGroup> {
        self.remote_groups
            .iter()
            .find(|g| g.id.as_deref() == Some(id))
    }

    /// Connections whose destination is a remote input port.
    pub fn remote_input_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(|c| c.targets_remote_input_port())
    }

    /// Replace the connection with id `old_id`, keeping its position.
    ///
    /// Appends `replacement` if no connection has that id.
    pub fn replace_connection(&mut self, old_id: Option<&str>, replacement: Connection) {
        let position = old_id.and_then(|id| {
            self.connections
                .iter()
                .position(|c| c.id.as_deref() == Some(id))
        });
        match position {
            Some(idx) => self.connections[idx] = replacement,
            None => self.connections.push(replacement),
        }
    }

    /// Drop remote groups whose id is in `ids`.
    pub fn remove_remote_groups(&mut self, ids: &BTreeSet<String>) {
        self.remote_groups
            .retain(|g| g.id.as_ref().map_or(true, |id| !ids.contains(id)));
    }

    /// Append remote groups not already present.
    pub fn add_remote_groups<'a>(&mut self, groups: impl IntoIterator<Item = &'a RemoteGroup>) {
        for group in groups {
            let present = group
                .id
                .as_deref()
                .is_some_and(|id| self.remote_group(id).is_some());
            if !present {
                self.remote_groups.push(group.clone());
            }
        }
    }
}

/// An input port together with the id of the remote group that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPort {
    pub port: RemotePort,
    pub group_id: String,
}

/// Id-keyed view of a snapshot's remote groups and their input ports.
///
/// When two entries share an id, the first one in snapshot order wins.
#[derive(Debug, Clone, Default)]
pub struct TopologyIndex {
    groups: HashMap<String, RemoteGroup>,
    ports: HashMap<String, IndexedPort>,
}

impl TopologyIndex {
    /// Index a snapshot.
    #[must_use]
    pub fn build(snapshot: &ProcessGroupSnapshot) -> Self {
        let mut index = Self::default();
        for group in &snapshot.remote_groups {
            let Some(group_id) = group.id.clone() else {
                continue;
            };
            for port in &group.input_ports {
                index
                    .ports
                    .entry(port.id.clone())
                    .or_insert_with(|| IndexedPort {
                        port: port.clone(),
                        group_id: group_id.clone(),
                    });
            }
            index.groups.entry(group_id).or_insert_with(|| group.clone());
        }
        index
    }

    /// Look up a remote group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&RemoteGroup> {
        self.groups.get(id)
    }

    /// Look up an input port.
    #[must_use]
    pub fn port(&self, id: &str) -> Option<&IndexedPort> {
        self.ports.get(id)
    }

    /// Remote group owning the port a connection delivers to.
    #[must_use]
    pub fn destination_group_id<'a>(&'a self, connection: &'a Connection) -> &'a str {
        self.port(&connection.destination.id)
            .map_or(connection.destination.group_id.as_str(), |p| {
                p.group_id.as_str()
            })
    }

    /// Number of indexed input ports.
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}
