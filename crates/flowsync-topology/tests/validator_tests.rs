//! Remote Group Validator Tests
//!
//! End-to-end passes of `RemoteGroupValidator` against a scripted endpoint:
//! - Untouched local topology
//! - Endpoint drift and group recreation
//! - Port remapping by id and by name
//! - Fatal recreation failures and cleanup warnings
//! - Snapshot merge

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    init_test_logging, local_connection, remote_connection, remote_group, snapshot,
    GroupCreation, MockEndpoint, PARENT,
};
use flowsync_remote::model::{PropertyEdit, RemotePort, SiteToSitePort};
use flowsync_topology::{RemoteGroupValidator, TopologyConfig};

fn validator(
    client: &Arc<MockEndpoint>,
    edits: Vec<PropertyEdit>,
) -> RemoteGroupValidator<MockEndpoint> {
    RemoteGroupValidator::new(Arc::clone(client), edits).with_config(
        TopologyConfig::default()
            .with_max_retries(10)
            .with_retry_backoff(Duration::from_millis(3000)),
    )
}

// =============================================================================
// Untouched Topology
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_local_connections_are_left_alone() {
    init_test_logging();
    let client = Arc::new(MockEndpoint::new().with_catalog(vec![SiteToSitePort::new("p1", "in")]));
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(local_connection("c-local"))
        .with_connection(remote_connection("c1", "p1", "in", "g1"));
    let before = snap.clone();

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    let mentions_local = result
        .updated_connections()
        .iter()
        .chain(result.invalid_connections())
        .chain(result.non_existent_port_connections())
        .any(|c| c.id.as_deref() == Some("c-local"));
    assert!(!mentions_local);
    assert_eq!(client.mutating_calls(), 0);
    assert_eq!(snap, before);
}

#[tokio::test(start_paused = true)]
async fn test_identity_preserved_when_port_in_catalog() {
    let client = Arc::new(MockEndpoint::new().with_catalog(vec![
        SiteToSitePort::new("p1", "in"),
        SiteToSitePort::new("p5", "in-v2"),
    ]));
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"));

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert!(result.updated_connections().is_empty());
    assert_eq!(client.list_ports_calls(), 1);
    assert_eq!(client.update_connection_calls(), 0);
    assert_eq!(snap.connection("c1").unwrap().destination.id, "p1");
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_without_remote_connections_skips_catalog() {
    let client = Arc::new(MockEndpoint::new());
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(local_connection("c-local"));

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert_eq!(client.list_ports_calls(), 0);
    assert!(result.completed_at().is_some());
}

// =============================================================================
// Port Remapping
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_name_fallback_rewrites_destination() {
    let client =
        Arc::new(MockEndpoint::new().with_catalog(vec![SiteToSitePort::new("P2", "ingest")]));
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("P1", "ingest")]))
        .with_connection(remote_connection("c1", "P1", "ingest", "g1"));

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert_eq!(result.updated_connections().len(), 1);
    assert_eq!(result.updated_connections()[0].destination.id, "P2");
    assert_eq!(client.update_connection_calls(), 1);
    assert_eq!(client.create_connection_calls(), 0);

    let merged = snap.connection("c1").unwrap();
    assert_eq!(merged.destination.id, "P2");
    assert_eq!(snap.connections.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_remap_of_missing_port() {
    init_test_logging();
    let client = Arc::new(MockEndpoint::new().with_catalog(vec![SiteToSitePort::new("p9", "in")]));
    let rg1 = remote_group("RG1", "http://a", &[])
        .with_input_port(RemotePort::new("p1", "in").with_exists(false));
    let mut snap = snapshot()
        .with_remote_group(rg1)
        .with_connection(remote_connection("C1", "p1", "in", "RG1"));

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    let updated = result.updated_connections();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id.as_deref(), Some("C1"));
    assert_eq!(updated[0].destination.id, "p9");
    assert_eq!(snap.connection("C1").unwrap().destination.id, "p9");
}

#[tokio::test(start_paused = true)]
async fn test_port_missing_by_id_and_name_is_non_existent() {
    let client =
        Arc::new(MockEndpoint::new().with_catalog(vec![SiteToSitePort::new("p9", "audit")]));
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"));
    let before = snap.clone();

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(!result.is_valid());
    assert_eq!(result.non_existent_port_connections().len(), 1);
    assert!(result.invalid_connections().is_empty());
    assert!(result.updated_connections().is_empty());
    assert_eq!(client.update_connection_calls(), 0);
    assert_eq!(snap, before);
}

#[tokio::test(start_paused = true)]
async fn test_orphaned_destination_is_non_existent() {
    let client = Arc::new(MockEndpoint::new());
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "gone", "in", "g1"));

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(!result.is_valid());
    assert_eq!(result.non_existent_port_connections()[0].id.as_deref(), Some("c1"));
    assert_eq!(client.list_ports_calls(), 0);
    assert_eq!(result.all_invalid_connections().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_catalog_failure_marks_connections_invalid() {
    let client = Arc::new(MockEndpoint::new().with_catalog_error());
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in"), ("p2", "audit")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"))
        .with_connection(remote_connection("c2", "p2", "audit", "g1"));

    let result = validator(&client, Vec::new())
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(!result.is_valid());
    assert_eq!(result.invalid_connections().len(), 2);
    assert_eq!(client.mutating_calls(), 0);
}

// =============================================================================
// Recreation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_group_without_edits_is_not_recreated() {
    let client = Arc::new(
        MockEndpoint::new()
            .with_catalog(vec![SiteToSitePort::new("p1", "in"), SiteToSitePort::new("q1", "audit")])
            .with_created_group_ports(vec![RemotePort::new("q1", "audit")]),
    );
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_remote_group(remote_group("g2", "http://b", &[("p2", "audit")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"))
        .with_connection(remote_connection("c2", "p2", "audit", "g2"));

    let edits = vec![
        PropertyEdit::remote_group("g2", "targetUri", "http://b2"),
        PropertyEdit::remote_group("g1", "comments", "not an endpoint change"),
    ];
    let result = validator(&client, edits)
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert_eq!(*client.deleted_groups.lock().unwrap(), vec!["g2".to_string()]);
    assert_eq!(*client.deleted_connections.lock().unwrap(), vec!["c2".to_string()]);
    assert_eq!(client.create_group_calls(), 1);
    assert!(snap.remote_group("g1").is_some());
    assert!(snap.connection("c1").is_some());
    assert_eq!(result.updated_connections()[0].destination.id, "q1");
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_edit_recreates_group_and_replaces_connections() {
    init_test_logging();
    let client = Arc::new(
        MockEndpoint::new()
            .with_catalog(vec![SiteToSitePort::new("p7", "in")])
            .with_created_group_ports(vec![RemotePort::new("p7", "in")]),
    );
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://old", &[("p1", "in")]))
        .with_connection(local_connection("c-local"))
        .with_connection(remote_connection("c1", "p1", "in", "g1"))
        .with_connection(remote_connection("c2", "p1", "in", "g1"));

    let edits = vec![PropertyEdit::remote_group("g1", "targetUri", "http://new")];
    let result = validator(&client, edits)
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert!(result.removed_remote_group_ids().contains("g1"));
    let created = result.created_remote_groups();
    assert_eq!(created.len(), 1);
    let new_group_id = created[0].id.clone().unwrap();
    assert_ne!(new_group_id, "g1");

    let descriptor = client.group_descriptors.lock().unwrap()[0].clone();
    assert_eq!(descriptor.id, None);
    assert_eq!(descriptor.target_uri.as_deref(), Some("http://new"));
    assert_eq!(descriptor.parent_group_id.as_deref(), Some(PARENT));

    assert_eq!(client.delete_connection_calls(), 2);
    assert_eq!(client.create_connection_calls(), 2);
    assert_eq!(result.updated_connections().len(), 2);

    let ids: Vec<_> = snap
        .connections
        .iter()
        .map(|c| c.id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["c-local", "new-conn-1", "new-conn-2"]);
    for connection in snap.remote_input_connections() {
        assert_eq!(connection.destination.group_id, new_group_id);
        assert_eq!(connection.destination.id, "p7");
    }
    assert!(snap.remote_group("g1").is_none());
    assert!(snap.remote_group(&new_group_id).is_some());
    assert_eq!(snap.remote_groups.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recreation_failure_aborts_pass() {
    let client = Arc::new(MockEndpoint::new().with_group_creation(GroupCreation::ReturnsNone));
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_remote_group(remote_group("g2", "http://b", &[("p2", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"))
        .with_connection(remote_connection("c2", "p2", "in", "g2"));
    let before = snap.clone();

    let edits = vec![
        PropertyEdit::remote_group("g1", "targetUri", "http://a2"),
        PropertyEdit::remote_group("g2", "targetUri", "http://b2"),
    ];
    let result = validator(&client, edits)
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(!result.is_valid());
    assert!(result.is_unable_to_recreate_remote_group());
    assert_eq!(client.create_group_calls(), 1);
    assert_eq!(*client.deleted_groups.lock().unwrap(), vec!["g1".to_string()]);
    assert_eq!(client.list_ports_calls(), 0);
    assert_eq!(client.create_connection_calls(), 0);
    assert_eq!(snap, before);
}

#[tokio::test(start_paused = true)]
async fn test_recreation_error_is_fatal() {
    let client = Arc::new(MockEndpoint::new().with_group_creation(GroupCreation::Error));
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"));

    let edits = vec![PropertyEdit::remote_group("g1", "targetUris", "http://z")];
    let result = validator(&client, edits)
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_unable_to_recreate_remote_group());
    assert!(result.created_remote_groups().is_empty());
    assert!(result.removed_remote_group_ids().contains("g1"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_deletes_become_cleanup_warnings() {
    let client = Arc::new(
        MockEndpoint::new()
            .with_delete_errors()
            .with_catalog(vec![SiteToSitePort::new("p7", "in")])
            .with_created_group_ports(vec![RemotePort::new("p7", "in")]),
    );
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"));

    let result = validator(&client, vec![PropertyEdit::remote_group("g1", "targetUri", "http://b")])
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert_eq!(result.cleanup_warnings().len(), 2);
    assert!(result.removed_remote_group_ids().contains("g1"));
    assert_eq!(result.updated_connections().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_edit_for_unknown_group_is_skipped() {
    let client = Arc::new(MockEndpoint::new());
    let mut snap = snapshot().with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]));

    let edits = vec![PropertyEdit::remote_group("g404", "targetUri", "http://x")];
    let result = validator(&client, edits)
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(result.is_valid());
    assert_eq!(client.mutating_calls(), 0);
    assert!(result.removed_remote_group_ids().is_empty());
}

// =============================================================================
// Retry Budget
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_connection_creation_exhausts_retry_budget() {
    let client = Arc::new(
        MockEndpoint::new()
            .with_catalog(vec![SiteToSitePort::new("p7", "in")])
            .with_created_group_ports(vec![RemotePort::new("p7", "in")])
            .with_create_connection_failures(usize::MAX),
    );
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"));
    let start = tokio::time::Instant::now();

    let result = validator(&client, vec![PropertyEdit::remote_group("g1", "targetUri", "http://b")])
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert_eq!(client.create_connection_calls(), 11);
    assert_eq!(result.invalid_connections().len(), 1);
    assert!(result.updated_connections().is_empty());
    assert!(!result.is_valid());
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert!(snap.remote_group("g1").is_none());
    assert!(snap.remote_group("new-group-1").is_some());
    assert_eq!(snap.connection("c1").unwrap().destination.group_id, "g1");
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_reflects_recreation_when_one_connection_fails() {
    let client = Arc::new(
        MockEndpoint::new()
            .with_catalog(vec![SiteToSitePort::new("p7", "in")])
            .with_created_group_ports(vec![RemotePort::new("p7", "in")])
            .with_create_connection_failures(11),
    );
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"))
        .with_connection(remote_connection("c2", "p1", "in", "g1"));

    let result = validator(&client, vec![PropertyEdit::remote_group("g1", "targetUri", "http://b")])
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(!result.is_valid());
    assert!(!result.is_unable_to_recreate_remote_group());
    assert_eq!(client.create_connection_calls(), 12);
    assert_eq!(result.invalid_connections().len(), 1);
    assert_eq!(result.updated_connections().len(), 1);

    let group_ids: Vec<_> = snap.remote_groups.iter().map(|g| g.id.clone()).collect();
    assert_eq!(group_ids, vec![Some("new-group-1".to_string())]);
    let connection_ids: Vec<_> = snap.connections.iter().map(|c| c.id.clone()).collect();
    assert_eq!(
        connection_ids,
        vec![Some("c1".to_string()), Some("new-conn-12".to_string())]
    );
    assert_eq!(
        snap.connection("new-conn-12").unwrap().destination.group_id,
        "new-group-1"
    );
}

#[tokio::test(start_paused = true)]
async fn test_orphan_does_not_block_recreated_connections() {
    let client = Arc::new(
        MockEndpoint::new()
            .with_catalog(vec![SiteToSitePort::new("p7", "in")])
            .with_created_group_ports(vec![RemotePort::new("p7", "in")]),
    );
    let mut snap = snapshot()
        .with_remote_group(remote_group("g1", "http://a", &[("p1", "in")]))
        .with_connection(remote_connection("c1", "p1", "in", "g1"))
        .with_connection(remote_connection("c-orphan", "gone", "lost", "g9"));

    let result = validator(&client, vec![PropertyEdit::remote_group("g1", "targetUri", "http://b")])
        .validate_and_fix_remote_groups(&mut snap)
        .await;

    assert!(!result.is_valid());
    assert_eq!(result.non_existent_port_connections().len(), 1);
    assert_eq!(
        result.non_existent_port_connections()[0].id.as_deref(),
        Some("c-orphan")
    );
    assert_eq!(*client.deleted_connections.lock().unwrap(), vec!["c1".to_string()]);
    assert_eq!(client.list_ports_calls(), 1);
    assert_eq!(client.create_connection_calls(), 1);
    assert_eq!(result.updated_connections().len(), 1);

    assert!(snap.connection("c1").is_none());
    let recreated = snap.connection("new-conn-1").unwrap();
    assert_eq!(recreated.destination.group_id, "new-group-1");
    assert_eq!(recreated.destination.id, "p7");
    assert!(snap.connection("c-orphan").is_some());
    assert!(snap.remote_group("g1").is_none());
    assert!(snap.remote_group("new-group-1").is_some());
}
