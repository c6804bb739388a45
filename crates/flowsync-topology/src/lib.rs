//! # Remote Topology Reconciliation
//!
//! Repairs a feed's process group after the remote groups it sends data to
//! have drifted.
//!
//! ## Overview
//!
//! A reconciliation pass:
//! - Detects remote groups whose target endpoint was edited
//! - Deletes and recreates those groups, along with their inbound connections
//! - Resolves destination ports on the target by id, falling back to name
//! - Creates or updates connections, polling while a new group finishes its
//!   handshake with the target
//! - Reports every outcome in a single [`ValidationResult`]
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     RemoteGroupValidator                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐          │
//! │  │    Drift     │──►│  Recreation  │──►│     Port     │          │
//! │  │   Detector   │   │  Coordinator │   │   Remapper   │          │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘          │
//! │                            │                  │                  │
//! │                            │                  ▼                  │
//! │                            │          ┌──────────────┐           │
//! │                            │          │  Connection  │           │
//! │                            │          │  Reconciler  │           │
//! │                            │          └──────┬───────┘           │
//! │                            ▼                 ▼                   │
//! │                     ┌─────────────────────────────┐              │
//! │                     │      ValidationResult       │              │
//! │                     └─────────────────────────────┘              │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use flowsync_topology::{RemoteGroupValidator, TopologyConfig};
//!
//! let validator = RemoteGroupValidator::new(Arc::new(client), modified_properties)
//!     .with_config(TopologyConfig::from_env()?);
//!
//! let result = validator.validate_and_fix_remote_groups(&mut snapshot).await;
//! if !result.is_valid() {
//!     for connection in result.all_invalid_connections() {
//!         // report
//!     }
//! }
//! ```

pub mod change;
pub mod config;
pub mod drift;
pub mod reconciler;
pub mod recreation;
pub mod remap;
pub mod snapshot;
pub mod validation;
pub mod validator;

pub use change::PendingConnectionChange;
pub use config::{ConfigError, TopologyConfig};
pub use drift::{DriftDetector, EndpointDrift};
pub use reconciler::{ConnectionReconciler, ReconcileOutcome};
pub use recreation::{apply_property_edits, RecreationCoordinator, RecreationOutcome};
pub use remap::{PortCatalog, PortRemapper, RemapOutcome};
pub use snapshot::{IndexedPort, ProcessGroupSnapshot, TopologyIndex};
pub use validation::{ValidationResult, ValidationSummary};
pub use validator::RemoteGroupValidator;
