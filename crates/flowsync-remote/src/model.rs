//! Topology model types
//!
//! Descriptors for the components exchanged with the remote dataflow engine:
//! connections and their endpoints, remote groups and their ports, the
//! site-to-site port catalog, and user-submitted property edits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{
    ConnectableType, TransportProtocol, REMOTE_PROCESS_GROUP, TARGET_URIS_KEY, TARGET_URI_KEY,
};

fn default_true() -> bool {
    true
}

/// Canvas position of a component.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One end of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connectable {
    /// Component id.
    pub id: String,
    /// Id of the group that owns the component (the remote group for remote ports).
    pub group_id: String,
    /// Component display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Component kind.
    #[serde(rename = "type")]
    pub connectable_type: ConnectableType,
    /// Whether the remote port is transmitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitting: Option<bool>,
}

impl Connectable {
    /// Create a connectable reference.
    pub fn new(
        id: impl Into<String>,
        group_id: impl Into<String>,
        connectable_type: ConnectableType,
    ) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            name: None,
            connectable_type,
            transmitting: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name, or empty string if not recorded.
    #[must_use]
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// A connection between two components of a process group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Connection id; `None` until the remote engine assigns one.
    #[serde(default)]
    pub id: Option<String>,
    /// Revision version used for optimistic locking on the remote engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Process group containing the connection.
    pub parent_group_id: String,
    /// Upstream end.
    pub source: Connectable,
    /// Downstream end.
    pub destination: Connectable,
    /// Relationships routed over this connection.
    #[serde(default)]
    pub selected_relationships: BTreeSet<String>,
}

impl Connection {
    /// Create a connection.
    pub fn new(
        id: impl Into<String>,
        parent_group_id: impl Into<String>,
        source: Connectable,
        destination: Connectable,
    ) -> Self {
        Self {
            id: Some(id.into()),
            version: None,
            name: None,
            parent_group_id: parent_group_id.into(),
            source,
            destination,
            selected_relationships: BTreeSet::new(),
        }
    }

    /// Add a selected relationship.
    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.selected_relationships.insert(relationship.into());
        self
    }

    /// Check if the downstream end is an input port of a remote group.
    #[must_use]
    pub fn targets_remote_input_port(&self) -> bool {
        self.destination.connectable_type == ConnectableType::RemoteInputPort
    }

    /// Id for logging, `"<unassigned>"` when the engine has not assigned one.
    #[must_use]
    pub fn id_or_placeholder(&self) -> &str {
        self.id.as_deref().unwrap_or("<unassigned>")
    }
}

/// A port exposed by a remote group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePort {
    /// Port id as seen from the local engine.
    pub id: String,
    /// Port id on the target instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    /// Owning remote group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Port name; stable across remote-group recreation.
    pub name: String,
    /// Whether the port still exists on the target.
    #[serde(default = "default_true")]
    pub exists: bool,
    /// Whether the port has an incoming connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

impl RemotePort {
    /// Create a remote port that exists on the target.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_id: None,
            group_id: None,
            name: name.into(),
            exists: true,
            connected: None,
        }
    }

    /// Set the exists flag.
    pub fn with_exists(mut self, exists: bool) -> Self {
        self.exists = exists;
        self
    }
}

/// Descriptor of a remote process group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGroup {
    /// Group id; never reused across a recreation.
    #[serde(default)]
    pub id: Option<String>,
    /// Revision version used for optimistic locking on the remote engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Process group containing this remote group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Primary target endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_uri: Option<String>,
    /// Comma-separated target endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_uris: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communications_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_protocol: Option<TransportProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_network_interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Input ports discovered on the target.
    #[serde(default)]
    pub input_ports: Vec<RemotePort>,
    /// Output ports discovered on the target.
    #[serde(default)]
    pub output_ports: Vec<RemotePort>,
    /// Open authorization issues; non-empty while trust with the target is pending.
    #[serde(default)]
    pub authorization_issues: Vec<String>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitting: Option<bool>,
}

impl RemoteGroup {
    /// Create a remote group pointing at a target endpoint.
    pub fn new(id: impl Into<String>, target_uri: impl Into<String>) -> Self {
        let target_uri = target_uri.into();
        Self {
            id: Some(id.into()),
            target_uris: Some(target_uri.clone()),
            target_uri: Some(target_uri),
            ..Default::default()
        }
    }

    /// Set the parent process group.
    pub fn with_parent_group(mut self, parent_group_id: impl Into<String>) -> Self {
        self.parent_group_id = Some(parent_group_id.into());
        self
    }

    /// Add an input port.
    pub fn with_input_port(mut self, port: RemotePort) -> Self {
        self.input_ports.push(port);
        self
    }

    /// Add an authorization issue.
    pub fn with_authorization_issue(mut self, issue: impl Into<String>) -> Self {
        self.authorization_issues.push(issue.into());
        self
    }

    /// Check if the remote engine has not yet established trust with the target.
    #[must_use]
    pub fn has_authorization_issues(&self) -> bool {
        !self.authorization_issues.is_empty()
    }

    /// Number of input ports reported for the target.
    #[must_use]
    pub fn input_port_count(&self) -> usize {
        self.input_ports.len()
    }

    /// Check if connections into this group will be accepted.
    #[must_use]
    pub fn is_ready_for_connections(&self) -> bool {
        !self.has_authorization_issues() && self.input_port_count() > 0
    }

    /// Find an input port by id.
    #[must_use]
    pub fn input_port(&self, port_id: &str) -> Option<&RemotePort> {
        self.input_ports.iter().find(|p| p.id == port_id)
    }

    /// Individual target endpoints.
    #[must_use]
    pub fn target_uri_list(&self) -> Vec<&str> {
        self.target_uris
            .as_deref()
            .or(self.target_uri.as_deref())
            .map(|uris| {
                uris.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build the descriptor for a replacement group.
    ///
    /// Configuration is copied field by field; identity and everything the
    /// remote engine derives from the target (ports, issues, revision) is reset.
    #[must_use]
    pub fn replacement(&self) -> RemoteGroup {
        RemoteGroup {
            id: None,
            version: None,
            parent_group_id: self.parent_group_id.clone(),
            name: self.name.clone(),
            target_uri: self.target_uri.clone(),
            target_uris: self.target_uris.clone(),
            comments: self.comments.clone(),
            communications_timeout: self.communications_timeout.clone(),
            yield_duration: self.yield_duration.clone(),
            transport_protocol: self.transport_protocol,
            local_network_interface: self.local_network_interface.clone(),
            proxy_host: self.proxy_host.clone(),
            proxy_port: self.proxy_port,
            proxy_user: self.proxy_user.clone(),
            proxy_password: self.proxy_password.clone(),
            position: self.position,
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            authorization_issues: Vec::new(),
            validation_errors: Vec::new(),
            transmitting: None,
        }
    }
}

/// An input port advertised in the site-to-site catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteToSitePort {
    pub id: String,
    pub name: String,
}

impl SiteToSitePort {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A user-submitted change to one configuration property of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEdit {
    /// Component type tag (e.g. `REMOTE_PROCESS_GROUP`).
    pub component_type: String,
    pub component_id: String,
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl PropertyEdit {
    pub fn new(
        component_type: impl Into<String>,
        component_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            component_type: component_type.into(),
            component_id: component_id.into(),
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Edit of a remote group property.
    pub fn remote_group(
        group_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(REMOTE_PROCESS_GROUP, group_id, key, value)
    }

    /// Check if this edit changes the target endpoint of a remote group.
    #[must_use]
    pub fn changes_remote_endpoint(&self) -> bool {
        self.component_type.eq_ignore_ascii_case(REMOTE_PROCESS_GROUP)
            && (self.key.eq_ignore_ascii_case(TARGET_URI_KEY)
                || self.key.eq_ignore_ascii_case(TARGET_URIS_KEY))
    }
}
