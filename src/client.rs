//! Narrow interface to the replication group control-plane API.
//!
//! The controller never talks to the network directly. Implementors own
//! transport, request signing, and retries; the controller only tells the
//! structured not-found fault apart from every other failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code reported by the control plane when a replication group does
/// not exist.
pub const REPLICATION_GROUP_NOT_FOUND: &str = "ReplicationGroupNotFoundFault";

/// Key/value tag attached to a replication group at creation time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// Parameters for creating a replication group.
///
/// Optional members are `None` (or empty) when the caller left them unset so
/// the control plane applies its own defaults.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateReplicationGroupRequest {
    /// Identifier requested for the new group; becomes the handle.
    pub replication_group_id: String,
    /// Human readable description.
    pub description: String,
    /// Whether a replica is promoted automatically when the primary fails.
    pub automatic_failover_enabled: bool,
    /// Compute and memory capacity of each node.
    pub cache_node_type: Option<String>,
    /// Cache engine name.
    pub engine: String,
    /// Engine version; the control plane picks the latest when unset.
    pub engine_version: Option<String>,
    /// Port the nodes accept connections on.
    pub port: u16,
    /// Number of clusters (primary plus replicas).
    pub num_cache_clusters: Option<u32>,
    /// Availability zones in which the clusters are placed.
    pub preferred_cache_cluster_azs: Vec<String>,
    /// Parameter group applied to every cluster.
    pub cache_parameter_group_name: Option<String>,
    /// Subnet group the clusters are launched in.
    pub cache_subnet_group_name: Option<String>,
    /// VPC security group identifiers.
    pub security_group_ids: Vec<String>,
    /// Cache security group names.
    pub cache_security_group_names: Vec<String>,
    /// Weekly maintenance window (`ddd:hh24:mi-ddd:hh24:mi`).
    pub preferred_maintenance_window: Option<String>,
    /// Daily snapshot window (`hh24:mi-hh24:mi`).
    pub snapshot_window: Option<String>,
    /// Days automatic snapshots are retained.
    pub snapshot_retention_limit: Option<u32>,
    /// Tags applied to the group.
    pub tags: Vec<Tag>,
}

/// Network address of a node or node group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// DNS name clients connect to.
    pub address: String,
    /// TCP port.
    pub port: u16,
}

/// Shard of a replication group as reported by describe.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeGroup {
    /// Identifier of the node group (for example `0001`).
    pub node_group_id: String,
    /// Status string of the node group.
    pub status: Option<String>,
    /// Endpoint of the primary node; present for multi-node topologies.
    pub primary_endpoint: Option<Endpoint>,
    /// Plain endpoint; present for single-node topologies.
    pub endpoint: Option<Endpoint>,
}

/// Replication group as returned by create, describe, and modify.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReplicationGroup {
    /// Identifier of the group.
    pub replication_group_id: String,
    /// Description stored by the control plane.
    pub description: Option<String>,
    /// Raw status string (`creating`, `available`, ...).
    pub status: String,
    /// Automatic failover status (`enabled`, `enabling`, `disabled`,
    /// `disabling`).
    pub automatic_failover: Option<String>,
    /// Identifiers of the member clusters.
    pub member_clusters: Vec<String>,
    /// Node groups; a single entry unless cluster mode is enabled.
    pub node_groups: Vec<NodeGroup>,
    /// Node type of the member clusters.
    pub cache_node_type: Option<String>,
    /// Weekly maintenance window.
    pub preferred_maintenance_window: Option<String>,
    /// Daily snapshot window.
    pub snapshot_window: Option<String>,
    /// Days automatic snapshots are retained.
    pub snapshot_retention_limit: Option<u32>,
}

/// In-place modification of a replication group.
///
/// Every member except the identifier and `apply_immediately` is optional;
/// `None` leaves the remote value untouched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModifyReplicationGroupRequest {
    /// Identifier of the group to modify.
    pub replication_group_id: String,
    /// Apply now rather than in the next maintenance window.
    pub apply_immediately: bool,
    /// New automatic failover setting.
    pub automatic_failover_enabled: Option<bool>,
    /// New description.
    pub description: Option<String>,
    /// New engine version.
    pub engine_version: Option<String>,
    /// Replacement set of VPC security group identifiers.
    pub security_group_ids: Option<Vec<String>>,
    /// Replacement set of cache security group names.
    pub cache_security_group_names: Option<Vec<String>>,
    /// New parameter group.
    pub cache_parameter_group_name: Option<String>,
    /// New weekly maintenance window.
    pub preferred_maintenance_window: Option<String>,
    /// New daily snapshot window.
    pub snapshot_window: Option<String>,
    /// New snapshot retention in days.
    pub snapshot_retention_limit: Option<u32>,
}

impl ModifyReplicationGroupRequest {
    /// Starts an empty modification that applies immediately.
    #[must_use]
    pub fn new(replication_group_id: impl Into<String>) -> Self {
        Self {
            replication_group_id: replication_group_id.into(),
            apply_immediately: true,
            automatic_failover_enabled: None,
            description: None,
            engine_version: None,
            security_group_ids: None,
            cache_security_group_names: None,
            cache_parameter_group_name: None,
            preferred_maintenance_window: None,
            snapshot_window: None,
            snapshot_retention_limit: None,
        }
    }

    /// Returns `true` when at least one attribute is being changed.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.automatic_failover_enabled.is_some()
            || self.description.is_some()
            || self.engine_version.is_some()
            || self.security_group_ids.is_some()
            || self.cache_security_group_names.is_some()
            || self.cache_parameter_group_name.is_some()
            || self.preferred_maintenance_window.is_some()
            || self.snapshot_window.is_some()
            || self.snapshot_retention_limit.is_some()
    }
}

/// Errors returned by a [`ReplicationGroupApi`] implementation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Structured fault returned by the control plane.
    #[error("{code}: {message}")]
    Service {
        /// Machine readable fault code.
        code: String,
        /// Message returned by the control plane.
        message: String,
    },
    /// Failure below the service layer (connection, decoding, signing).
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}

impl ApiError {
    /// Builds the fault the control plane reports for a missing group.
    #[must_use]
    pub fn not_found(replication_group_id: &str) -> Self {
        Self::Service {
            code: REPLICATION_GROUP_NOT_FOUND.to_owned(),
            message: format!("replication group {replication_group_id} not found"),
        }
    }

    /// Returns `true` for the structured not-found fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Service { code, .. } if code == REPLICATION_GROUP_NOT_FOUND)
    }
}

/// Future returned by client operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Control-plane operations the controller relies on.
///
/// Implementations must be safe to share between controllers managing
/// different replication groups.
pub trait ReplicationGroupApi: Send + Sync {
    /// Starts creating a replication group.
    fn create_replication_group<'a>(
        &'a self,
        request: &'a CreateReplicationGroupRequest,
    ) -> ApiFuture<'a, ReplicationGroup>;

    /// Fetches the current state of a replication group.
    fn describe_replication_group<'a>(
        &'a self,
        replication_group_id: &'a str,
    ) -> ApiFuture<'a, ReplicationGroup>;

    /// Applies an in-place modification.
    fn modify_replication_group<'a>(
        &'a self,
        request: &'a ModifyReplicationGroupRequest,
    ) -> ApiFuture<'a, ReplicationGroup>;

    /// Starts deleting a replication group.
    fn delete_replication_group<'a>(&'a self, replication_group_id: &'a str) -> ApiFuture<'a, ()>;
}

impl<T> ReplicationGroupApi for Arc<T>
where
    T: ReplicationGroupApi + ?Sized,
{
    fn create_replication_group<'a>(
        &'a self,
        request: &'a CreateReplicationGroupRequest,
    ) -> ApiFuture<'a, ReplicationGroup> {
        (**self).create_replication_group(request)
    }

    fn describe_replication_group<'a>(
        &'a self,
        replication_group_id: &'a str,
    ) -> ApiFuture<'a, ReplicationGroup> {
        (**self).describe_replication_group(replication_group_id)
    }

    fn modify_replication_group<'a>(
        &'a self,
        request: &'a ModifyReplicationGroupRequest,
    ) -> ApiFuture<'a, ReplicationGroup> {
        (**self).modify_replication_group(request)
    }

    fn delete_replication_group<'a>(&'a self, replication_group_id: &'a str) -> ApiFuture<'a, ()> {
        (**self).delete_replication_group(replication_group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_fault_is_recognised() {
        assert!(ApiError::not_found("cache1").is_not_found());
    }

    #[test]
    fn other_faults_are_not_treated_as_absence() {
        let throttled = ApiError::Service {
            code: String::from("Throttling"),
            message: String::from("rate exceeded"),
        };
        let transport = ApiError::Transport {
            message: String::from("connection reset"),
        };
        assert!(!throttled.is_not_found());
        assert!(!transport.is_not_found());
    }

    #[test]
    fn empty_modification_has_no_changes() {
        let request = ModifyReplicationGroupRequest::new("cache1");
        assert!(request.apply_immediately);
        assert!(!request.has_changes());
    }
}
