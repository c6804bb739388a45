//! Shared helpers for reconciliation integration tests.
//!
//! Provides a scripted in-memory `RemoteEndpointClient` and snapshot fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use flowsync_remote::error::{RemoteError, RemoteResult};
use flowsync_remote::model::{
    Connectable, Connection, RemoteGroup, RemotePort, SiteToSitePort,
};
use flowsync_remote::types::ConnectableType;
use flowsync_remote::RemoteEndpointClient;
use flowsync_topology::ProcessGroupSnapshot;

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

// =============================================================================
// Mock Remote Endpoint
// =============================================================================

/// Behaviour of `create_remote_group`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupCreation {
    Success,
    ReturnsNone,
    Error,
}

/// Behaviour of `update_connection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionUpdate {
    Success,
    ReturnsNone,
    Error,
}

/// In-memory remote engine with call counters and scripted failures.
pub struct MockEndpoint {
    catalog: Mutex<Vec<SiteToSitePort>>,
    catalog_error: AtomicBool,
    group_creation: Mutex<GroupCreation>,
    created_group_ports: Mutex<Vec<RemotePort>>,
    created_group_issues: Mutex<Vec<String>>,
    find_group_responses: Mutex<VecDeque<RemoteResult<Option<RemoteGroup>>>>,
    connection_update: Mutex<ConnectionUpdate>,
    /// Number of leading `create_connection` calls that fail.
    create_connection_failures: AtomicUsize,
    delete_connection_error: AtomicBool,
    delete_group_error: AtomicBool,

    pub deleted_connections: Mutex<Vec<String>>,
    pub deleted_groups: Mutex<Vec<String>>,
    pub group_descriptors: Mutex<Vec<RemoteGroup>>,
    pub created_connections: Mutex<Vec<Connection>>,

    delete_connection_calls: AtomicUsize,
    delete_group_calls: AtomicUsize,
    create_group_calls: AtomicUsize,
    find_group_calls: AtomicUsize,
    list_ports_calls: AtomicUsize,
    create_connection_calls: AtomicUsize,
    update_connection_calls: AtomicUsize,
}

impl MockEndpoint {
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: Mutex::new(Vec::new()),
            catalog_error: AtomicBool::new(false),
            group_creation: Mutex::new(GroupCreation::Success),
            created_group_ports: Mutex::new(Vec::new()),
            created_group_issues: Mutex::new(Vec::new()),
            find_group_responses: Mutex::new(VecDeque::new()),
            connection_update: Mutex::new(ConnectionUpdate::Success),
            create_connection_failures: AtomicUsize::new(0),
            delete_connection_error: AtomicBool::new(false),
            delete_group_error: AtomicBool::new(false),
            deleted_connections: Mutex::new(Vec::new()),
            deleted_groups: Mutex::new(Vec::new()),
            group_descriptors: Mutex::new(Vec::new()),
            created_connections: Mutex::new(Vec::new()),
            delete_connection_calls: AtomicUsize::new(0),
            delete_group_calls: AtomicUsize::new(0),
            create_group_calls: AtomicUsize::new(0),
            find_group_calls: AtomicUsize::new(0),
            list_ports_calls: AtomicUsize::new(0),
            create_connection_calls: AtomicUsize::new(0),
            update_connection_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_catalog(self, ports: Vec<SiteToSitePort>) -> Self {
        *self.catalog.lock().unwrap() = ports;
        self
    }

    pub fn with_catalog_error(self) -> Self {
        self.catalog_error.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_group_creation(self, behaviour: GroupCreation) -> Self {
        *self.group_creation.lock().unwrap() = behaviour;
        self
    }

    /// Ports reported by groups created through the mock.
    pub fn with_created_group_ports(self, ports: Vec<RemotePort>) -> Self {
        *self.created_group_ports.lock().unwrap() = ports;
        self
    }

    /// Authorization issues reported by groups created through the mock.
    pub fn with_created_group_issue(self, issue: &str) -> Self {
        self.created_group_issues
            .lock()
            .unwrap()
            .push(issue.to_string());
        self
    }

    /// Queue a response for `find_remote_group_by_id`. Exhausted queues answer `None`.
    pub fn with_find_group_response(self, response: RemoteResult<Option<RemoteGroup>>) -> Self {
        self.find_group_responses
            .lock()
            .unwrap()
            .push_back(response);
        self
    }

    pub fn with_connection_update(self, behaviour: ConnectionUpdate) -> Self {
        *self.connection_update.lock().unwrap() = behaviour;
        self
    }

    pub fn with_create_connection_failures(self, failures: usize) -> Self {
        self.create_connection_failures
            .store(failures, Ordering::SeqCst);
        self
    }

    pub fn with_delete_errors(self) -> Self {
        self.delete_connection_error.store(true, Ordering::SeqCst);
        self.delete_group_error.store(true, Ordering::SeqCst);
        self
    }

    pub fn delete_connection_calls(&self) -> usize {
        self.delete_connection_calls.load(Ordering::SeqCst)
    }

    pub fn delete_group_calls(&self) -> usize {
        self.delete_group_calls.load(Ordering::SeqCst)
    }

    pub fn create_group_calls(&self) -> usize {
        self.create_group_calls.load(Ordering::SeqCst)
    }

    pub fn find_group_calls(&self) -> usize {
        self.find_group_calls.load(Ordering::SeqCst)
    }

    pub fn list_ports_calls(&self) -> usize {
        self.list_ports_calls.load(Ordering::SeqCst)
    }

    pub fn create_connection_calls(&self) -> usize {
        self.create_connection_calls.load(Ordering::SeqCst)
    }

    pub fn update_connection_calls(&self) -> usize {
        self.update_connection_calls.load(Ordering::SeqCst)
    }

    /// Total calls that change state on the remote engine.
    pub fn mutating_calls(&self) -> usize {
        self.delete_connection_calls()
            + self.delete_group_calls()
            + self.create_group_calls()
            + self.create_connection_calls()
            + self.update_connection_calls()
    }
}

#[async_trait]
impl RemoteEndpointClient for MockEndpoint {
    async fn delete_connection(&self, connection: &Connection, _force: bool) -> RemoteResult<()> {
        self.delete_connection_calls.fetch_add(1, Ordering::SeqCst);
        if self.delete_connection_error.load(Ordering::SeqCst) {
            return Err(RemoteError::conflict(
                "connection",
                connection.id_or_placeholder(),
                "queue not empty",
            ));
        }
        self.deleted_connections
            .lock()
            .unwrap()
            .push(connection.id_or_placeholder().to_string());
        Ok(())
    }

    async fn delete_remote_group(&self, group_id: &str) -> RemoteResult<()> {
        self.delete_group_calls.fetch_add(1, Ordering::SeqCst);
        if self.delete_group_error.load(Ordering::SeqCst) {
            return Err(RemoteError::unavailable("engine restarting"));
        }
        self.deleted_groups.lock().unwrap().push(group_id.to_string());
        Ok(())
    }

    async fn create_remote_group(
        &self,
        descriptor: &RemoteGroup,
    ) -> RemoteResult<Option<RemoteGroup>> {
        let n = self.create_group_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.group_descriptors
            .lock()
            .unwrap()
            .push(descriptor.clone());
        match *self.group_creation.lock().unwrap() {
            GroupCreation::Success => {
                let mut created = descriptor.clone();
                created.id = Some(format!("new-group-{n}"));
                created.version = Some(0);
                created.input_ports = self.created_group_ports.lock().unwrap().clone();
                created.authorization_issues = self.created_group_issues.lock().unwrap().clone();
                Ok(Some(created))
            }
            GroupCreation::ReturnsNone => Ok(None),
            GroupCreation::Error => Err(RemoteError::operation_failed("invalid target")),
        }
    }

    async fn find_remote_group_by_id(&self, _group_id: &str) -> RemoteResult<Option<RemoteGroup>> {
        self.find_group_calls.fetch_add(1, Ordering::SeqCst);
        self.find_group_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }

    async fn list_site_to_site_input_ports(&self) -> RemoteResult<Vec<SiteToSitePort>> {
        self.list_ports_calls.fetch_add(1, Ordering::SeqCst);
        if self.catalog_error.load(Ordering::SeqCst) {
            return Err(RemoteError::unavailable("site-to-site disabled"));
        }
        Ok(self.catalog.lock().unwrap().clone())
    }

    async fn create_connection(
        &self,
        parent_group_id: &str,
        source: &Connectable,
        destination: &Connectable,
    ) -> RemoteResult<Connection> {
        let n = self.create_connection_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.create_connection_failures.load(Ordering::SeqCst) {
            return Err(RemoteError::connection_failed(
                "destination group is not accepting connections",
            ));
        }
        let created = Connection::new(
            format!("new-conn-{n}"),
            parent_group_id,
            source.clone(),
            destination.clone(),
        );
        self.created_connections
            .lock()
            .unwrap()
            .push(created.clone());
        Ok(created)
    }

    async fn update_connection(&self, connection: &Connection) -> RemoteResult<Option<Connection>> {
        self.update_connection_calls.fetch_add(1, Ordering::SeqCst);
        match *self.connection_update.lock().unwrap() {
            ConnectionUpdate::Success => {
                let mut updated = connection.clone();
                updated.version = Some(connection.version.unwrap_or(0) + 1);
                Ok(Some(updated))
            }
            ConnectionUpdate::ReturnsNone => Ok(None),
            ConnectionUpdate::Error => Err(RemoteError::unavailable("engine busy")),
        }
    }

    fn display_name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub const PARENT: &str = "feed-pg";

pub fn processor(id: &str) -> Connectable {
    Connectable::new(id, PARENT, ConnectableType::Processor).with_name(id)
}

/// Connection from a processor to a remote input port.
pub fn remote_connection(id: &str, port_id: &str, port_name: &str, group_id: &str) -> Connection {
    Connection::new(
        id,
        PARENT,
        processor("proc-1"),
        Connectable::new(port_id, group_id, ConnectableType::RemoteInputPort).with_name(port_name),
    )
    .with_relationship("success")
}

/// Connection from a processor to a funnel.
pub fn local_connection(id: &str) -> Connection {
    Connection::new(
        id,
        PARENT,
        processor("proc-1"),
        Connectable::new("funnel-1", PARENT, ConnectableType::Funnel),
    )
}

/// Remote group with the given input ports.
pub fn remote_group(id: &str, target_uri: &str, ports: &[(&str, &str)]) -> RemoteGroup {
    ports.iter().fold(
        RemoteGroup::new(id, target_uri).with_parent_group(PARENT),
        |group, (port_id, name)| group.with_input_port(RemotePort::new(*port_id, *name)),
    )
}

pub fn snapshot() -> ProcessGroupSnapshot {
    ProcessGroupSnapshot::new(PARENT)
}
