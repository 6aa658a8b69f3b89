//! Last-known remote representation of a replication group.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;
use crate::status::ReplicationGroupStatus;

/// Which node-group endpoint the address was taken from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// Primary endpoint of a multi-node group.
    Primary,
    /// Plain endpoint of a single-node group.
    Node,
}

/// Address clients connect to.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObservedEndpoint {
    /// Origin of the address.
    pub kind: EndpointKind,
    /// DNS name.
    pub address: String,
    /// TCP port.
    pub port: u16,
}

/// Observation of an available replication group.
///
/// Never user-writable; replaced wholesale whenever a read finds the group
/// available.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObservedState {
    /// Identifier reported by the control plane.
    pub replication_group_id: String,
    /// Status at observation time.
    pub status: ReplicationGroupStatus,
    /// Description stored remotely.
    pub description: Option<String>,
    /// Whether automatic failover is enabled or being enabled.
    pub automatic_failover: bool,
    /// Identifiers of member clusters.
    pub member_clusters: Vec<String>,
    /// Number of member clusters.
    pub num_cache_clusters: usize,
    /// Connection endpoint, when the response carried one.
    pub endpoint: Option<ObservedEndpoint>,
    /// Node type of the member clusters.
    pub node_type: Option<String>,
    /// Weekly maintenance window.
    pub maintenance_window: Option<String>,
    /// Daily snapshot window.
    pub snapshot_window: Option<String>,
    /// Days automatic snapshots are kept.
    pub snapshot_retention_limit: Option<u32>,
}

impl ObservedState {
    /// Address of the primary endpoint, if the group exposes one.
    #[must_use]
    pub fn primary_endpoint_address(&self) -> Option<&str> {
        self.endpoint
            .as_ref()
            .filter(|endpoint| endpoint.kind == EndpointKind::Primary)
            .map(|endpoint| endpoint.address.as_str())
    }

    /// Address of whichever endpoint was observed.
    #[must_use]
    pub fn endpoint_address(&self) -> Option<&str> {
        self.endpoint
            .as_ref()
            .map(|endpoint| endpoint.address.as_str())
    }

    /// Port of whichever endpoint was observed.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.endpoint.as_ref().map(|endpoint| endpoint.port)
    }

    /// Flattens the observation into computed attributes.
    #[must_use]
    pub fn to_attributes(&self) -> AttributeMap {
        let mut attrs = AttributeMap::new();
        attrs.insert("replication_group_id", self.replication_group_id.as_str());
        attrs.insert("status", self.status.as_str());
        attrs.insert_opt("description", self.description.clone());
        attrs.insert("automatic_failover", self.automatic_failover);
        attrs.insert(
            "num_cache_clusters",
            i64::try_from(self.num_cache_clusters).unwrap_or(i64::MAX),
        );
        attrs.insert(
            "member_clusters",
            self.member_clusters.iter().cloned().collect::<BTreeSet<_>>(),
        );
        attrs.insert_opt("node_type", self.node_type.clone());
        if let Some(endpoint) = &self.endpoint {
            let key = match endpoint.kind {
                EndpointKind::Primary => "primary_endpoint_address",
                EndpointKind::Node => "endpoint_address",
            };
            attrs.insert(key, endpoint.address.as_str());
            attrs.insert("port", i64::from(endpoint.port));
        }
        attrs.insert_opt("maintenance_window", self.maintenance_window.clone());
        attrs.insert_opt("snapshot_window", self.snapshot_window.clone());
        attrs.insert_opt(
            "snapshot_retention_limit",
            self.snapshot_retention_limit.map(i64::from),
        );
        attrs
    }
}
