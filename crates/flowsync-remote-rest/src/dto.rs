//! Wire types of the dataflow engine's REST API.
//!
//! Every component is exchanged inside an entity that carries its revision.
//! These types convert to and from the topology model.

use serde::{Deserialize, Serialize};

use flowsync_remote::error::{RemoteError, RemoteResult};
use flowsync_remote::model::{
    Connectable, Connection, Position, RemoteGroup, RemotePort, SiteToSitePort,
};
use flowsync_remote::types::{ConnectableType, TransportProtocol};

/// Optimistic-locking revision of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionDto {
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl RevisionDto {
    pub fn new(version: i64, client_id: &str) -> Self {
        Self {
            version,
            client_id: Some(client_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectableDto {
    pub id: String,
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub connectable_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitting: Option<bool>,
}

impl From<&Connectable> for ConnectableDto {
    fn from(value: &Connectable) -> Self {
        Self {
            id: value.id.clone(),
            group_id: value.group_id.clone(),
            name: value.name.clone(),
            connectable_type: value.connectable_type.as_str().to_string(),
            transmitting: value.transmitting,
        }
    }
}

impl TryFrom<ConnectableDto> for Connectable {
    type Error = RemoteError;

    fn try_from(value: ConnectableDto) -> RemoteResult<Self> {
        let connectable_type = value
            .connectable_type
            .parse::<ConnectableType>()
            .map_err(|e| RemoteError::invalid_data(e.to_string()))?;
        Ok(Connectable {
            id: value.id,
            group_id: value.group_id,
            name: value.name,
            connectable_type,
            transmitting: value.transmitting,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: ConnectableDto,
    pub destination: ConnectableDto,
    #[serde(default)]
    pub selected_relationships: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub revision: RevisionDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ConnectionDto>,
}

impl ConnectionEntity {
    /// Request body for a new or updated connection.
    pub fn request(connection: &ConnectionDto, revision: RevisionDto) -> Self {
        Self {
            id: connection.id.clone(),
            revision,
            component: Some(connection.clone()),
        }
    }

    /// Convert a response into the model, carrying the revision along.
    pub fn into_connection(self) -> RemoteResult<Connection> {
        let component = self
            .component
            .ok_or_else(|| RemoteError::invalid_data("connection response has no component"))?;
        Ok(Connection {
            id: component.id.or(self.id),
            version: Some(self.revision.version),
            name: component.name,
            parent_group_id: component.parent_group_id.unwrap_or_default(),
            source: component.source.try_into()?,
            destination: component.destination.try_into()?,
            selected_relationships: component.selected_relationships.into_iter().collect(),
        })
    }
}

impl From<&Connection> for ConnectionDto {
    fn from(value: &Connection) -> Self {
        Self {
            id: value.id.clone(),
            parent_group_id: Some(value.parent_group_id.clone()),
            name: value.name.clone(),
            source: (&value.source).into(),
            destination: (&value.destination).into(),
            selected_relationships: value.selected_relationships.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePortDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

impl From<RemotePortDto> for RemotePort {
    fn from(value: RemotePortDto) -> Self {
        RemotePort {
            id: value.id,
            target_id: value.target_id,
            group_id: value.group_id,
            name: value.name,
            exists: value.exists.unwrap_or(true),
            connected: value.connected,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGroupContentsDto {
    #[serde(default)]
    pub input_ports: Vec<RemotePortDto>,
    #[serde(default)]
    pub output_ports: Vec<RemotePortDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGroupDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_uris: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communications_timeout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_protocol: Option<String>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<RemoteGroupContentsDto>,
    #[serde(default)]
    pub authorization_issues: Vec<String>,
    #[serde(default)]
    pub validation_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmitting: Option<bool>,
}

impl From<&RemoteGroup> for RemoteGroupDto {
    fn from(value: &RemoteGroup) -> Self {
        Self {
            id: value.id.clone(),
            parent_group_id: value.parent_group_id.clone(),
            name: value.name.clone(),
            target_uri: value.target_uri.clone(),
            target_uris: value.target_uris.clone(),
            comments: value.comments.clone(),
            communications_timeout: value.communications_timeout.clone(),
            yield_duration: value.yield_duration.clone(),
            transport_protocol: value.transport_protocol.map(|p| p.as_str().to_string()),
            local_network_interface: value.local_network_interface.clone(),
            proxy_host: value.proxy_host.clone(),
            proxy_port: value.proxy_port,
            proxy_user: value.proxy_user.clone(),
            proxy_password: value.proxy_password.clone(),
            position: value.position,
            // Ports and issues are derived by the engine from the target.
            contents: None,
            authorization_issues: Vec::new(),
            validation_errors: Vec::new(),
            transmitting: None,
        }
    }
}

impl From<RemoteGroupDto> for RemoteGroup {
    fn from(value: RemoteGroupDto) -> Self {
        let contents = value.contents.unwrap_or_default();
        RemoteGroup {
            id: value.id,
            version: None,
            parent_group_id: value.parent_group_id,
            name: value.name,
            target_uri: value.target_uri,
            target_uris: value.target_uris,
            comments: value.comments,
            communications_timeout: value.communications_timeout,
            yield_duration: value.yield_duration,
            transport_protocol: value
                .transport_protocol
                .and_then(|p| p.parse::<TransportProtocol>().ok()),
            local_network_interface: value.local_network_interface,
            proxy_host: value.proxy_host,
            proxy_port: value.proxy_port,
            proxy_user: value.proxy_user,
            proxy_password: value.proxy_password,
            position: value.position,
            input_ports: contents.input_ports.into_iter().map(Into::into).collect(),
            output_ports: contents.output_ports.into_iter().map(Into::into).collect(),
            authorization_issues: value.authorization_issues,
            validation_errors: value.validation_errors,
            transmitting: value.transmitting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGroupEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub revision: RevisionDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<RemoteGroupDto>,
}

impl RemoteGroupEntity {
    /// Convert a response into the model. `None` if it carries no component.
    pub fn into_remote_group(self) -> Option<RemoteGroup> {
        let version = self.revision.version;
        let fallback_id = self.id;
        self.component.map(|component| {
            let mut group = RemoteGroup::from(component);
            group.version = Some(version);
            if group.id.is_none() {
                group.id = fallback_id;
            }
            group
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDto {
    #[serde(default)]
    pub input_ports: Vec<PortDto>,
}

/// Site-to-site details of the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerEntity {
    #[serde(default)]
    pub controller: ControllerDto,
}

impl ControllerEntity {
    pub fn into_input_ports(self) -> Vec<SiteToSitePort> {
        self.controller
            .input_ports
            .into_iter()
            .map(|p| SiteToSitePort::new(p.id, p.name))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequestDto {
    pub id: String,
    #[serde(default)]
    pub finished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Asynchronous request to empty a connection's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRequestEntity {
    pub drop_request: DropRequestDto,
}
