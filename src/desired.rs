//! Desired configuration of a replication group.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;
use crate::schema::{self, SchemaError};

/// Configuration submitted by the user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReplicationGroupSpec {
    /// Identifier of the group. Immutable.
    pub replication_group_id: String,
    /// Human readable description.
    pub description: String,
    /// Cache engine; only `redis` supports replication groups.
    pub engine: String,
    /// Engine version; the remote side picks one when unset.
    pub engine_version: Option<String>,
    /// Node type of every cluster.
    pub node_type: Option<String>,
    /// Port the nodes listen on.
    pub port: u16,
    /// Number of clusters (primary plus replicas).
    pub num_cache_clusters: Option<u32>,
    /// Promote a replica automatically when the primary fails.
    pub automatic_failover: bool,
    /// VPC security group identifiers.
    pub security_group_ids: BTreeSet<String>,
    /// Cache security group names.
    pub security_group_names: BTreeSet<String>,
    /// Parameter group name.
    pub parameter_group_name: Option<String>,
    /// Subnet group name.
    pub subnet_group_name: Option<String>,
    /// Weekly maintenance window.
    pub maintenance_window: Option<String>,
    /// Daily snapshot window.
    pub snapshot_window: Option<String>,
    /// Days automatic snapshots are kept.
    pub snapshot_retention_limit: Option<u32>,
    /// Preferred availability zones for the clusters.
    pub availability_zones: BTreeSet<String>,
    /// Tags applied at creation.
    pub tags: BTreeMap<String, String>,
}

impl ReplicationGroupSpec {
    /// Starts a builder with the two required attributes.
    #[must_use]
    pub fn builder(
        replication_group_id: impl Into<String>,
        description: impl Into<String>,
    ) -> ReplicationGroupSpecBuilder {
        ReplicationGroupSpecBuilder::new(replication_group_id, description)
    }

    /// Builds a spec from flat attributes, applying schema defaults and
    /// coercions.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the attributes fail schema checks.
    pub fn from_attributes(attributes: &AttributeMap) -> Result<Self, SchemaError> {
        let attrs = schema::normalise(attributes)?;
        Ok(Self {
            replication_group_id: required_string(&attrs, "replication_group_id")?,
            description: required_string(&attrs, "description")?,
            engine: required_string(&attrs, "engine")?,
            engine_version: optional_string(&attrs, "engine_version"),
            node_type: optional_string(&attrs, "node_type"),
            port: required_number(&attrs, "port")?,
            num_cache_clusters: optional_number(&attrs, "num_cache_clusters")?,
            automatic_failover: attrs.get_bool("automatic_failover").unwrap_or(false),
            security_group_ids: set(&attrs, "security_group_ids"),
            security_group_names: set(&attrs, "security_group_names"),
            parameter_group_name: optional_string(&attrs, "parameter_group_name"),
            subnet_group_name: optional_string(&attrs, "subnet_group_name"),
            maintenance_window: optional_string(&attrs, "maintenance_window"),
            snapshot_window: optional_string(&attrs, "snapshot_window"),
            snapshot_retention_limit: optional_number(&attrs, "snapshot_retention_limit")?,
            availability_zones: set(&attrs, "availability_zones"),
            tags: attrs.get_map("tags").cloned().unwrap_or_default(),
        })
    }

    /// Flattens the spec into attributes. Unset optional values are omitted.
    #[must_use]
    pub fn to_attributes(&self) -> AttributeMap {
        let mut attrs = AttributeMap::new();
        attrs.insert("replication_group_id", self.replication_group_id.as_str());
        attrs.insert("description", self.description.as_str());
        attrs.insert("engine", self.engine.as_str());
        attrs.insert_opt("engine_version", self.engine_version.clone());
        attrs.insert_opt("node_type", self.node_type.clone());
        attrs.insert("port", i64::from(self.port));
        attrs.insert_opt("num_cache_clusters", self.num_cache_clusters.map(i64::from));
        attrs.insert("automatic_failover", self.automatic_failover);
        attrs.insert("security_group_ids", self.security_group_ids.clone());
        attrs.insert("security_group_names", self.security_group_names.clone());
        attrs.insert_opt("parameter_group_name", self.parameter_group_name.clone());
        attrs.insert_opt("subnet_group_name", self.subnet_group_name.clone());
        attrs.insert_opt("maintenance_window", self.maintenance_window.clone());
        attrs.insert_opt("snapshot_window", self.snapshot_window.clone());
        attrs.insert_opt(
            "snapshot_retention_limit",
            self.snapshot_retention_limit.map(i64::from),
        );
        attrs.insert("availability_zones", self.availability_zones.clone());
        attrs.insert("tags", self.tags.clone());
        attrs
    }

    /// Checks the spec against the schema and returns its normalised form,
    /// with defaults filled in and blank optional values dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when an attribute is missing or invalid.
    pub fn validate(&self) -> Result<Self, SchemaError> {
        Self::from_attributes(&self.to_attributes())
    }
}

fn required_string(attrs: &AttributeMap, name: &str) -> Result<String, SchemaError> {
    attrs
        .get_str(name)
        .map(str::to_owned)
        .ok_or_else(|| SchemaError::MissingRequired {
            field: name.to_owned(),
        })
}

fn optional_string(attrs: &AttributeMap, name: &str) -> Option<String> {
    attrs.get_str(name).map(str::to_owned)
}

fn optional_number<T>(attrs: &AttributeMap, name: &str) -> Result<Option<T>, SchemaError>
where
    T: TryFrom<i64>,
{
    attrs
        .get_int(name)
        .map(|value| {
            T::try_from(value).map_err(|_| SchemaError::Invalid {
                field: name.to_owned(),
                reason: format!("{value} is out of range"),
            })
        })
        .transpose()
}

fn required_number<T>(attrs: &AttributeMap, name: &str) -> Result<T, SchemaError>
where
    T: TryFrom<i64>,
{
    optional_number(attrs, name)?.ok_or_else(|| SchemaError::MissingRequired {
        field: name.to_owned(),
    })
}

fn set(attrs: &AttributeMap, name: &str) -> BTreeSet<String> {
    attrs.get_set(name).cloned().unwrap_or_default()
}

/// Builder for [`ReplicationGroupSpec`] that validates on [`build`].
///
/// [`build`]: ReplicationGroupSpecBuilder::build
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicationGroupSpecBuilder {
    spec: ReplicationGroupSpec,
}

impl ReplicationGroupSpecBuilder {
    /// Creates a builder populated with schema defaults.
    #[must_use]
    pub fn new(replication_group_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            spec: ReplicationGroupSpec {
                replication_group_id: replication_group_id.into().trim().to_owned(),
                description: description.into(),
                engine: String::from("redis"),
                engine_version: None,
                node_type: None,
                port: 6379,
                num_cache_clusters: None,
                automatic_failover: false,
                security_group_ids: BTreeSet::new(),
                security_group_names: BTreeSet::new(),
                parameter_group_name: None,
                subnet_group_name: None,
                maintenance_window: None,
                snapshot_window: None,
                snapshot_retention_limit: None,
                availability_zones: BTreeSet::new(),
                tags: BTreeMap::new(),
            },
        }
    }

    /// Sets the engine.
    #[must_use]
    pub fn engine(mut self, value: impl Into<String>) -> Self {
        self.spec.engine = value.into();
        self
    }

    /// Sets the engine version.
    #[must_use]
    pub fn engine_version(mut self, value: impl Into<String>) -> Self {
        self.spec.engine_version = Some(value.into());
        self
    }

    /// Sets the node type.
    #[must_use]
    pub fn node_type(mut self, value: impl Into<String>) -> Self {
        self.spec.node_type = Some(value.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, value: u16) -> Self {
        self.spec.port = value;
        self
    }

    /// Sets the number of clusters.
    #[must_use]
    pub const fn num_cache_clusters(mut self, value: u32) -> Self {
        self.spec.num_cache_clusters = Some(value);
        self
    }

    /// Sets the automatic failover flag.
    #[must_use]
    pub const fn automatic_failover(mut self, value: bool) -> Self {
        self.spec.automatic_failover = value;
        self
    }

    /// Adds a VPC security group identifier.
    #[must_use]
    pub fn security_group_id(mut self, value: impl Into<String>) -> Self {
        self.spec.security_group_ids.insert(value.into());
        self
    }

    /// Adds a cache security group name.
    #[must_use]
    pub fn security_group_name(mut self, value: impl Into<String>) -> Self {
        self.spec.security_group_names.insert(value.into());
        self
    }

    /// Sets the parameter group.
    #[must_use]
    pub fn parameter_group_name(mut self, value: impl Into<String>) -> Self {
        self.spec.parameter_group_name = Some(value.into());
        self
    }

    /// Sets the subnet group.
    #[must_use]
    pub fn subnet_group_name(mut self, value: impl Into<String>) -> Self {
        self.spec.subnet_group_name = Some(value.into());
        self
    }

    /// Sets the weekly maintenance window.
    #[must_use]
    pub fn maintenance_window(mut self, value: impl Into<String>) -> Self {
        self.spec.maintenance_window = Some(value.into());
        self
    }

    /// Sets the daily snapshot window.
    #[must_use]
    pub fn snapshot_window(mut self, value: impl Into<String>) -> Self {
        self.spec.snapshot_window = Some(value.into());
        self
    }

    /// Sets the snapshot retention in days.
    #[must_use]
    pub const fn snapshot_retention_limit(mut self, value: u32) -> Self {
        self.spec.snapshot_retention_limit = Some(value);
        self
    }

    /// Adds a preferred availability zone.
    #[must_use]
    pub fn availability_zone(mut self, value: impl Into<String>) -> Self {
        self.spec.availability_zones.insert(value.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.tags.insert(key.into(), value.into());
        self
    }

    /// Validates and returns the normalised spec.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when a required attribute is empty or a value
    /// fails validation.
    pub fn build(self) -> Result<ReplicationGroupSpec, SchemaError> {
        self.spec.validate()
    }
}
