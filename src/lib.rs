//! Lifecycle controller for managed in-memory cache replication groups.
//!
//! The crate reconciles a declarative replication group configuration with
//! the state reported by a cloud control plane. Create, update, and delete
//! calls are asynchronous on the remote side, so each operation submits its
//! request and then polls until the group converges (available → modifying →
//! available, or deleting → gone) before reading the result back into the
//! declarative model.

pub mod attributes;
pub mod client;
pub mod config;
pub mod controller;
pub mod desired;
pub mod error;
pub mod mapper;
pub mod observed;
pub mod poller;
pub mod resource;
pub mod schema;
pub mod status;
pub mod telemetry;
pub mod test_support;

pub use attributes::{AttributeMap, AttributeValue};
pub use client::{
    ApiError, ApiFuture, CreateReplicationGroupRequest, Endpoint, ModifyReplicationGroupRequest,
    NodeGroup, REPLICATION_GROUP_NOT_FOUND, ReplicationGroup, ReplicationGroupApi, Tag,
};
pub use config::{ConfigError, ControllerConfig, ControllerTimeouts};
pub use controller::ReplicationGroupController;
pub use desired::{ReplicationGroupSpec, ReplicationGroupSpecBuilder};
pub use error::{ControllerError, Operation};
pub use mapper::ModifyPlan;
pub use observed::{EndpointKind, ObservedEndpoint, ObservedState};
pub use poller::{Convergence, PollError, PollSchedule, WaitRequest, WaitTarget};
pub use resource::{LifecyclePhase, ManagedResource, ResourceHandle};
pub use schema::{FieldDescriptor, FieldKind, Presence, REPLICATION_GROUP_SCHEMA, SchemaError};
pub use status::{ReplicationGroupStatus, UnrecognisedStatus};
pub use telemetry::init_tracing;
