//! REST client implementation
//!
//! Implements [`RemoteEndpointClient`] against the dataflow engine's REST API.

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use flowsync_remote::config::AuthConfig;
use flowsync_remote::error::{RemoteError, RemoteResult};
use flowsync_remote::model::{Connectable, Connection, RemoteGroup, SiteToSitePort};
use flowsync_remote::RemoteEndpointClient;

use crate::config::NifiRestConfig;
use crate::dto::{
    ConnectionDto, ConnectionEntity, ControllerEntity, DropRequestEntity, RemoteGroupDto,
    RemoteGroupEntity, RevisionDto,
};

/// Polls of a queue drop request before the connection is deleted anyway.
const DROP_REQUEST_POLLS: u32 = 10;

const DROP_REQUEST_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Client for the dataflow engine's REST API.
pub struct NifiRestClient {
    /// Configuration.
    config: NifiRestConfig,

    /// Display name for this client instance.
    display_name: String,

    /// HTTP client.
    client: Arc<Client>,

    /// Client id sent with every revision.
    client_id: String,

    /// Token obtained with configured credentials.
    access_token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for NifiRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NifiRestClient")
            .field("config", &self.config.redacted())
            .field("display_name", &self.display_name)
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl NifiRestClient {
    /// Create a new client with the given configuration.
    pub fn new(config: NifiRestConfig) -> RemoteResult<Self> {
        config.validate()?;

        let display_name = format!("REST: {}", config.base_url);
        let client = Self::build_client(&config)?;
        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            config,
            display_name,
            client: Arc::new(client),
            client_id,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Build the reqwest client with configuration.
    fn build_client(config: &NifiRestConfig) -> RemoteResult<Client> {
        let mut builder = Client::builder()
            .timeout(config.connection.read_timeout())
            .connect_timeout(config.connection.connection_timeout());

        if !config.tls.verify_certificate {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().map_err(|e| RemoteError::InvalidConfiguration {
            message: format!("Failed to build HTTP client: {e}"),
        })
    }

    /// Client id sent with revisions.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Drop the cached access token so the next request logs in again.
    pub async fn clear_access_token(&self) {
        *self.access_token.write().await = None;
    }

    /// Get authentication header value.
    async fn get_auth_header(&self) -> RemoteResult<Option<String>> {
        match &self.config.auth {
            AuthConfig::None => Ok(None),
            AuthConfig::Bearer { token } => Ok(Some(format!("Bearer {token}"))),
            AuthConfig::Credentials { username, password } => {
                {
                    let token_guard = self.access_token.read().await;
                    if let Some(ref token) = *token_guard {
                        return Ok(Some(format!("Bearer {token}")));
                    }
                }

                let token = self.fetch_access_token(username, password).await?;

                {
                    let mut token_guard = self.access_token.write().await;
                    *token_guard = Some(token.clone());
                }

                Ok(Some(format!("Bearer {token}")))
            }
        }
    }

    /// Exchange username and password for an access token.
    async fn fetch_access_token(&self, username: &str, password: &str) -> RemoteResult<String> {
        let url = self.config.url("/access/token");
        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            return Err(RemoteError::AuthenticationFailed {
                message: format!("token request rejected with HTTP {}", response.status()),
            });
        }

        let token = response
            .text()
            .await
            .map_err(|e| RemoteError::network_with_source("Failed to read access token", e))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(RemoteError::AuthenticationFailed {
                message: "empty access token".to_string(),
            });
        }

        debug!(username = %username, "Obtained access token");
        Ok(token.to_string())
    }

    /// Build a request with all configured headers.
    async fn build_request(&self, method: Method, path: &str) -> RemoteResult<RequestBuilder> {
        let url = self.config.url(path);
        let mut builder = self
            .client
            .request(method, &url)
            .header(header::ACCEPT, "application/json");

        if let Some(auth_value) = self.get_auth_header().await? {
            builder = builder.header(header::AUTHORIZATION, auth_value);
        }

        Ok(builder)
    }

    /// Send a request and map transport failures.
    async fn send(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> RemoteResult<Response> {
        debug!(method = %method, path = %path, "Sending REST request");

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        debug!(
            method = %method,
            path = %path,
            status = %response.status(),
            "Received REST response"
        );

        Ok(response)
    }

    /// Send a request, treating any non-success status as an error.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        kind: &str,
        id: &str,
    ) -> RemoteResult<Response> {
        let mut builder = self.build_request(method.clone(), path).await?;
        if let Some(json_body) = body {
            builder = builder.json(json_body);
        }
        let response = self.send(method, path, builder).await?;
        self.check_status(response, kind, id).await
    }

    /// Return the response if successful, otherwise the mapped error.
    async fn check_status(
        &self,
        response: Response,
        kind: &str,
        id: &str,
    ) -> RemoteResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(self.handle_response_error(status, &body, kind, id))
    }

    /// Map a transport failure.
    fn map_transport_error(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::ConnectionTimeout {
                timeout_secs: self.config.connection.read_timeout_secs,
            }
        } else if e.is_connect() {
            RemoteError::connection_failed_with_source(
                format!("Failed to connect to {}", self.config.base_url),
                e,
            )
        } else {
            RemoteError::network_with_source("Request failed", e)
        }
    }

    /// Handle API response errors.
    fn handle_response_error(
        &self,
        status: StatusCode,
        body: &str,
        kind: &str,
        id: &str,
    ) -> RemoteError {
        let message = if body.trim().is_empty() {
            status.to_string()
        } else {
            body.trim().to_string()
        };

        match status {
            StatusCode::UNAUTHORIZED => RemoteError::AuthenticationFailed { message },
            StatusCode::FORBIDDEN => RemoteError::AuthorizationFailed {
                operation: format!("{kind} {id}"),
            },
            StatusCode::NOT_FOUND => RemoteError::not_found(kind, id),
            StatusCode::CONFLICT => RemoteError::conflict(kind, id, message),
            StatusCode::TOO_MANY_REQUESTS => {
                RemoteError::unavailable(format!("Rate limited: {message}"))
            }
            StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::BAD_GATEWAY
            | StatusCode::GATEWAY_TIMEOUT => RemoteError::unavailable(message),
            StatusCode::BAD_REQUEST => RemoteError::invalid_data(message),
            _ => RemoteError::operation_failed(format!("HTTP {status}: {message}")),
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::network_with_source("Failed to read response body", e))?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Current revision of a component, `None` if it does not exist.
    async fn current_version(&self, path: &str, kind: &str, id: &str) -> RemoteResult<Option<i64>> {
        let builder = self.build_request(Method::GET, path).await?;
        let response = self.send(Method::GET, path, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check_status(response, kind, id).await?;
        let body: Value = Self::parse_json(response).await?;
        Ok(Some(
            body.pointer("/revision/version")
                .and_then(Value::as_i64)
                .unwrap_or(0),
        ))
    }

    /// Delete a component at the given revision.
    async fn delete_at_revision(
        &self,
        path: &str,
        version: i64,
        kind: &str,
        id: &str,
    ) -> RemoteResult<()> {
        let builder = self
            .build_request(Method::DELETE, path)
            .await?
            .query(&[("version", version.to_string()), ("clientId", self.client_id.clone())]);
        let response = self.send(Method::DELETE, path, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(kind = %kind, id = %id, "Component already deleted");
            return Ok(());
        }
        self.check_status(response, kind, id).await?;
        Ok(())
    }

    /// Empty a connection's queue.
    ///
    /// Waits a bounded time for the drop to finish, then removes the request.
    async fn drop_queue(&self, connection_id: &str) -> RemoteResult<()> {
        let path = format!("/flowfile-queues/{connection_id}/drop-requests");
        let response = self
            .execute(Method::POST, &path, None, "connection", connection_id)
            .await?;
        let mut request: DropRequestEntity = Self::parse_json(response).await?;
        let request_path = format!("{path}/{}", request.drop_request.id);

        let mut polls = 0;
        while !request.drop_request.finished && polls < DROP_REQUEST_POLLS {
            tokio::time::sleep(DROP_REQUEST_POLL_INTERVAL).await;
            polls += 1;
            let response = self
                .execute(Method::GET, &request_path, None, "drop request", connection_id)
                .await?;
            request = Self::parse_json(response).await?;
        }

        if let Some(reason) = &request.drop_request.failure_reason {
            warn!(connection_id = %connection_id, reason = %reason, "Queue drop failed");
        } else if !request.drop_request.finished {
            warn!(connection_id = %connection_id, polls, "Queue drop still running");
        }

        self.execute(Method::DELETE, &request_path, None, "drop request", connection_id)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteEndpointClient for NifiRestClient {
    #[instrument(skip(self, connection), fields(connection_id = %connection.id_or_placeholder()))]
    async fn delete_connection(&self, connection: &Connection, force: bool) -> RemoteResult<()> {
        let id = connection
            .id
            .as_deref()
            .ok_or_else(|| RemoteError::invalid_data("connection has no id"))?;

        if force {
            self.drop_queue(id).await?;
        }

        let path = format!("/connections/{id}");
        let Some(version) = self.current_version(&path, "connection", id).await? else {
            debug!(connection_id = %id, "Connection already deleted");
            return Ok(());
        };
        self.delete_at_revision(&path, version, "connection", id).await?;

        info!(connection_id = %id, "Deleted connection");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_remote_group(&self, group_id: &str) -> RemoteResult<()> {
        let path = format!("/remote-process-groups/{group_id}");
        let Some(version) = self
            .current_version(&path, "remote process group", group_id)
            .await?
        else {
            debug!(group_id = %group_id, "Remote group already deleted");
            return Ok(());
        };
        self.delete_at_revision(&path, version, "remote process group", group_id)
            .await?;

        info!(group_id = %group_id, "Deleted remote group");
        Ok(())
    }

    #[instrument(skip(self, descriptor), fields(target_uris = ?descriptor.target_uris))]
    async fn create_remote_group(
        &self,
        descriptor: &RemoteGroup,
    ) -> RemoteResult<Option<RemoteGroup>> {
        let parent = descriptor
            .parent_group_id
            .as_deref()
            .ok_or_else(|| RemoteError::invalid_data("remote group has no parent group"))?;

        let entity = RemoteGroupEntity {
            id: None,
            revision: RevisionDto::new(0, &self.client_id),
            component: Some(RemoteGroupDto::from(descriptor)),
        };
        let body = serde_json::to_value(&entity)?;
        let path = format!("/process-groups/{parent}/remote-process-groups");
        let response = self
            .execute(Method::POST, &path, Some(&body), "process group", parent)
            .await?;

        let created: RemoteGroupEntity = Self::parse_json(response).await?;
        let created = created.into_remote_group();
        match &created {
            Some(group) => info!(group_id = ?group.id, "Created remote group"),
            None => warn!(parent_group_id = %parent, "Engine returned no remote group"),
        }
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_remote_group_by_id(&self, group_id: &str) -> RemoteResult<Option<RemoteGroup>> {
        let path = format!("/remote-process-groups/{group_id}");
        let builder = self.build_request(Method::GET, &path).await?;
        let response = self.send(Method::GET, &path, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self
            .check_status(response, "remote process group", group_id)
            .await?;
        let entity: RemoteGroupEntity = Self::parse_json(response).await?;
        Ok(entity.into_remote_group())
    }

    #[instrument(skip(self))]
    async fn list_site_to_site_input_ports(&self) -> RemoteResult<Vec<SiteToSitePort>> {
        let response = self
            .execute(Method::GET, "/site-to-site", None, "site-to-site", "controller")
            .await?;
        let entity: ControllerEntity = Self::parse_json(response).await?;
        Ok(entity.into_input_ports())
    }

    #[instrument(skip(self, source, destination), fields(destination = %destination.id))]
    async fn create_connection(
        &self,
        parent_group_id: &str,
        source: &Connectable,
        destination: &Connectable,
    ) -> RemoteResult<Connection> {
        let component = ConnectionDto {
            id: None,
            parent_group_id: Some(parent_group_id.to_string()),
            name: None,
            source: source.into(),
            destination: destination.into(),
            selected_relationships: Vec::new(),
        };
        let entity = ConnectionEntity::request(&component, RevisionDto::new(0, &self.client_id));
        let body = serde_json::to_value(&entity)?;
        let path = format!("/process-groups/{parent_group_id}/connections");
        let response = self
            .execute(Method::POST, &path, Some(&body), "process group", parent_group_id)
            .await?;

        let created: ConnectionEntity = Self::parse_json(response).await?;
        let connection = created.into_connection()?;
        info!(connection_id = %connection.id_or_placeholder(), "Created connection");
        Ok(connection)
    }

    #[instrument(skip(self, connection), fields(connection_id = %connection.id_or_placeholder()))]
    async fn update_connection(&self, connection: &Connection) -> RemoteResult<Option<Connection>> {
        let id = connection
            .id
            .as_deref()
            .ok_or_else(|| RemoteError::invalid_data("connection has no id"))?;
        let path = format!("/connections/{id}");

        let version = match connection.version {
            Some(version) => version,
            None => match self.current_version(&path, "connection", id).await? {
                Some(version) => version,
                None => return Ok(None),
            },
        };

        let entity = ConnectionEntity::request(
            &ConnectionDto::from(connection),
            RevisionDto::new(version, &self.client_id),
        );
        let body = serde_json::to_value(&entity)?;
        let builder = self.build_request(Method::PUT, &path).await?.json(&body);
        let response = self.send(Method::PUT, &path, builder).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check_status(response, "connection", id).await?;

        let updated: ConnectionEntity = Self::parse_json(response).await?;
        Ok(Some(updated.into_connection()?))
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}
