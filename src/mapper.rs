//! Translation between the declarative model and API objects.
//!
//! The forward direction builds create and modify requests from a
//! [`ReplicationGroupSpec`]. The reverse direction turns a described
//! [`ReplicationGroup`] into an [`ObservedState`], degrading malformed
//! responses to missing fields rather than failing.

use tracing::debug;

use crate::client::{
    CreateReplicationGroupRequest, Endpoint, ModifyReplicationGroupRequest, ReplicationGroup, Tag,
};
use crate::desired::ReplicationGroupSpec;
use crate::observed::{EndpointKind, ObservedEndpoint, ObservedState};
use crate::resource::ResourceHandle;
use crate::schema;
use crate::status::{ReplicationGroupStatus, UnrecognisedStatus};

/// Builds the create request for `spec`.
///
/// Optional members are only populated when the spec sets them.
#[must_use]
pub fn to_create_request(spec: &ReplicationGroupSpec) -> CreateReplicationGroupRequest {
    CreateReplicationGroupRequest {
        replication_group_id: spec.replication_group_id.clone(),
        description: spec.description.clone(),
        automatic_failover_enabled: spec.automatic_failover,
        cache_node_type: present(spec.node_type.as_deref()),
        engine: spec.engine.clone(),
        engine_version: present(spec.engine_version.as_deref()),
        port: spec.port,
        num_cache_clusters: spec.num_cache_clusters,
        preferred_cache_cluster_azs: spec.availability_zones.iter().cloned().collect(),
        cache_parameter_group_name: present(spec.parameter_group_name.as_deref()),
        cache_subnet_group_name: present(spec.subnet_group_name.as_deref()),
        security_group_ids: spec.security_group_ids.iter().cloned().collect(),
        cache_security_group_names: spec.security_group_names.iter().cloned().collect(),
        preferred_maintenance_window: present(spec.maintenance_window.as_deref()),
        snapshot_window: present(spec.snapshot_window.as_deref()),
        snapshot_retention_limit: spec.snapshot_retention_limit,
        tags: spec
            .tags
            .iter()
            .map(|(key, value)| Tag {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value.filter(|text| !text.is_empty()).map(str::to_owned)
}

/// Outcome of diffing prior and desired configuration for an update.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModifyPlan {
    /// Modification to send, or `None` when no mutable field changed.
    pub request: Option<ModifyReplicationGroupRequest>,
    /// ForceNew attributes that changed and were left out of the request.
    pub ignored_force_new: Vec<&'static str>,
}

/// Diffs `prior` against `desired` and collects every changed mutable field
/// into a single modification of `handle`.
///
/// ForceNew attributes never enter the request. A mutable field cleared in
/// `desired` is left unchanged remotely because the modify call cannot unset
/// it.
#[must_use]
pub fn to_modify_request(
    handle: &ResourceHandle,
    prior: &ReplicationGroupSpec,
    desired: &ReplicationGroupSpec,
) -> ModifyPlan {
    let mut request = ModifyReplicationGroupRequest::new(handle.as_str());
    let mut ignored_force_new = Vec::new();

    for field in schema::changed_fields(&prior.to_attributes(), &desired.to_attributes()) {
        if field.force_new {
            ignored_force_new.push(field.name);
            continue;
        }
        match field.name {
            "automatic_failover" => {
                request.automatic_failover_enabled = Some(desired.automatic_failover);
            }
            "description" => request.description = Some(desired.description.clone()),
            "engine_version" => request.engine_version = present(desired.engine_version.as_deref()),
            "security_group_ids" => {
                request.security_group_ids =
                    Some(desired.security_group_ids.iter().cloned().collect());
            }
            "security_group_names" => {
                request.cache_security_group_names =
                    Some(desired.security_group_names.iter().cloned().collect());
            }
            "parameter_group_name" => {
                request.cache_parameter_group_name =
                    present(desired.parameter_group_name.as_deref());
            }
            "maintenance_window" => {
                request.preferred_maintenance_window =
                    present(desired.maintenance_window.as_deref());
            }
            "snapshot_window" => {
                request.snapshot_window = present(desired.snapshot_window.as_deref());
            }
            "snapshot_retention_limit" => {
                request.snapshot_retention_limit = desired.snapshot_retention_limit;
            }
            other => debug!(field = other, "attribute has no modify counterpart"),
        }
    }

    ModifyPlan {
        request: request.has_changes().then_some(request),
        ignored_force_new,
    }
}

/// Builds an [`ObservedState`] from a described group.
///
/// # Errors
///
/// Returns [`UnrecognisedStatus`] when the status string is outside the
/// closed set the controller understands.
pub fn from_observed(group: &ReplicationGroup) -> Result<ObservedState, UnrecognisedStatus> {
    let status = group.status.parse::<ReplicationGroupStatus>()?;
    Ok(ObservedState {
        replication_group_id: group.replication_group_id.clone(),
        status,
        description: group.description.clone(),
        automatic_failover: failover_enabled(group.automatic_failover.as_deref()),
        member_clusters: group.member_clusters.clone(),
        num_cache_clusters: group.member_clusters.len(),
        endpoint: extract_endpoint(group),
        node_type: group.cache_node_type.clone(),
        maintenance_window: group.preferred_maintenance_window.clone(),
        snapshot_window: group.snapshot_window.clone(),
        snapshot_retention_limit: group.snapshot_retention_limit,
    })
}

/// Replaces `slot` with the observation of `group` when the group is
/// available. Returns whether the slot was written.
///
/// # Errors
///
/// Returns [`UnrecognisedStatus`] when the status string is not understood;
/// the slot is left untouched.
pub fn refresh_observed(
    slot: &mut Option<ObservedState>,
    group: &ReplicationGroup,
) -> Result<bool, UnrecognisedStatus> {
    let status = group.status.parse::<ReplicationGroupStatus>()?;
    if status != ReplicationGroupStatus::Available {
        debug!(
            replication_group_id = %group.replication_group_id,
            status = %status,
            "group not available; keeping previous observation"
        );
        return Ok(false);
    }
    *slot = Some(from_observed(group)?);
    Ok(true)
}

/// Picks the connection endpoint from the first node group: the primary
/// endpoint when present, otherwise the plain endpoint.
#[must_use]
pub fn extract_endpoint(group: &ReplicationGroup) -> Option<ObservedEndpoint> {
    let node_group = group.node_groups.first()?;
    let primary = node_group
        .primary_endpoint
        .as_ref()
        .and_then(|endpoint| observed_endpoint(EndpointKind::Primary, endpoint));
    primary.or_else(|| {
        node_group
            .endpoint
            .as_ref()
            .and_then(|endpoint| observed_endpoint(EndpointKind::Node, endpoint))
    })
}

fn observed_endpoint(kind: EndpointKind, endpoint: &Endpoint) -> Option<ObservedEndpoint> {
    (!endpoint.address.is_empty()).then(|| ObservedEndpoint {
        kind,
        address: endpoint.address.clone(),
        port: endpoint.port,
    })
}

fn failover_enabled(status: Option<&str>) -> bool {
    matches!(status, Some("enabled" | "enabling"))
}
