//! Declarative field descriptors for the replication group resource.
//!
//! A single table describes every attribute: its kind, whether the user must
//! set it, whether changing it forces replacement, its default, and an
//! optional validator. The attribute mapper, the controller's diff, and the
//! external diff engine all read the same table.

use std::fmt;

use thiserror::Error;

use crate::attributes::{AttributeMap, AttributeValue};

/// Value kind of an attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    /// Free-form string.
    String,
    /// Signed integer.
    Int,
    /// Boolean flag.
    Bool,
    /// Unordered set of strings.
    Set,
    /// String to string mapping.
    Map,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Set => "set",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// Who supplies an attribute's value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Presence {
    /// The user must set it.
    Required,
    /// The user may set it.
    Optional,
    /// The user may set it; the remote side fills it in otherwise.
    OptionalComputed,
    /// Only the remote side sets it.
    Computed,
}

/// Default applied when the user leaves an optional attribute unset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefaultValue {
    /// String default.
    Str(&'static str),
    /// Integer default.
    Int(i64),
    /// Boolean default.
    Bool(bool),
}

impl DefaultValue {
    fn to_value(self) -> AttributeValue {
        match self {
            Self::Str(value) => AttributeValue::from(value),
            Self::Int(value) => AttributeValue::Int(value),
            Self::Bool(value) => AttributeValue::Bool(value),
        }
    }
}

/// Checks a coerced value, returning a reason on rejection.
pub type Validator = fn(&AttributeValue) -> Result<(), String>;

/// Description of a single attribute.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    /// Attribute name.
    pub name: &'static str,
    /// Value kind.
    pub kind: FieldKind,
    /// Who supplies the value.
    pub presence: Presence,
    /// Changing the value requires destroying and recreating the group.
    pub force_new: bool,
    /// Default for unset optional values.
    pub default: Option<DefaultValue>,
    /// Additional value check.
    pub validator: Option<Validator>,
}

impl FieldDescriptor {
    const fn new(name: &'static str, kind: FieldKind, presence: Presence) -> Self {
        Self {
            name,
            kind,
            presence,
            force_new: false,
            default: None,
            validator: None,
        }
    }

    const fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    const fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    const fn validated_by(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Returns `true` when users may set the attribute.
    #[must_use]
    pub const fn is_user_settable(&self) -> bool {
        !matches!(self.presence, Presence::Computed)
    }
}

/// Attribute table of the replication group resource.
pub const REPLICATION_GROUP_SCHEMA: &[FieldDescriptor] = &[
    FieldDescriptor::new("replication_group_id", FieldKind::String, Presence::Required)
        .force_new()
        .validated_by(validate_replication_group_id),
    FieldDescriptor::new("description", FieldKind::String, Presence::Required),
    FieldDescriptor::new("engine", FieldKind::String, Presence::Optional)
        .force_new()
        .default_value(DefaultValue::Str("redis"))
        .validated_by(validate_engine),
    FieldDescriptor::new("engine_version", FieldKind::String, Presence::Optional),
    FieldDescriptor::new("node_type", FieldKind::String, Presence::Optional).force_new(),
    FieldDescriptor::new("port", FieldKind::Int, Presence::Optional)
        .force_new()
        .default_value(DefaultValue::Int(6379))
        .validated_by(validate_port),
    FieldDescriptor::new("num_cache_clusters", FieldKind::Int, Presence::Optional)
        .force_new()
        .validated_by(validate_cluster_count),
    FieldDescriptor::new("automatic_failover", FieldKind::Bool, Presence::Optional)
        .default_value(DefaultValue::Bool(false)),
    FieldDescriptor::new("security_group_ids", FieldKind::Set, Presence::OptionalComputed),
    FieldDescriptor::new("security_group_names", FieldKind::Set, Presence::OptionalComputed),
    FieldDescriptor::new("parameter_group_name", FieldKind::String, Presence::Optional),
    FieldDescriptor::new("subnet_group_name", FieldKind::String, Presence::Optional).force_new(),
    FieldDescriptor::new("maintenance_window", FieldKind::String, Presence::OptionalComputed),
    FieldDescriptor::new("snapshot_window", FieldKind::String, Presence::OptionalComputed),
    FieldDescriptor::new(
        "snapshot_retention_limit",
        FieldKind::Int,
        Presence::OptionalComputed,
    )
    .validated_by(validate_retention_limit),
    FieldDescriptor::new("availability_zones", FieldKind::Set, Presence::Optional).force_new(),
    FieldDescriptor::new("tags", FieldKind::Map, Presence::Optional).force_new(),
    FieldDescriptor::new("status", FieldKind::String, Presence::Computed),
    FieldDescriptor::new("primary_endpoint_address", FieldKind::String, Presence::Computed),
    FieldDescriptor::new("endpoint_address", FieldKind::String, Presence::Computed),
    FieldDescriptor::new("member_clusters", FieldKind::Set, Presence::Computed),
];

/// Errors raised while normalising attributes against the schema.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SchemaError {
    /// A required attribute is absent.
    #[error("missing required attribute {field}")]
    MissingRequired {
        /// Attribute name.
        field: String,
    },
    /// The value cannot be coerced to the declared kind.
    #[error("attribute {field} expects a {expected} value, got {found}")]
    TypeMismatch {
        /// Attribute name.
        field: String,
        /// Declared kind.
        expected: FieldKind,
        /// Kind supplied by the caller.
        found: String,
    },
    /// The validator rejected the value.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Attribute name.
        field: String,
        /// Validator message.
        reason: String,
    },
    /// The attribute is not part of the schema.
    #[error("unknown attribute {field}")]
    UnknownAttribute {
        /// Attribute name.
        field: String,
    },
}

/// Looks up the descriptor of an attribute.
#[must_use]
pub fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
    REPLICATION_GROUP_SCHEMA
        .iter()
        .find(|field| field.name == name)
}

/// Applies defaults, coerces values to their declared kinds, and runs
/// validators. Computed attributes supplied by the caller are dropped.
///
/// # Errors
///
/// Returns [`SchemaError`] for unknown attributes, missing required
/// attributes, uncoercible values, and validator failures.
pub fn normalise(attributes: &AttributeMap) -> Result<AttributeMap, SchemaError> {
    if let Some((name, _)) = attributes.iter().find(|(name, _)| descriptor(name).is_none()) {
        return Err(SchemaError::UnknownAttribute {
            field: name.to_owned(),
        });
    }

    let mut normalised = AttributeMap::new();
    for field in REPLICATION_GROUP_SCHEMA
        .iter()
        .filter(|field| field.is_user_settable())
    {
        let supplied = attributes.get(field.name).filter(|value| !is_blank(value));
        let value = match (supplied, field.default) {
            (Some(raw), _) => raw.coerce(field.kind).ok_or_else(|| SchemaError::TypeMismatch {
                field: field.name.to_owned(),
                expected: field.kind,
                found: raw.kind_name().to_owned(),
            })?,
            (None, Some(default)) => default.to_value(),
            (None, None) if field.presence == Presence::Required => {
                return Err(SchemaError::MissingRequired {
                    field: field.name.to_owned(),
                });
            }
            (None, None) => continue,
        };

        if let Some(validator) = field.validator {
            validator(&value).map_err(|reason| SchemaError::Invalid {
                field: field.name.to_owned(),
                reason,
            })?;
        }
        normalised.insert(field.name, value);
    }
    Ok(normalised)
}

/// Returns the user-settable fields whose values differ between two
/// attribute maps. An absent value and an empty set or map compare equal.
#[must_use]
pub fn changed_fields(prior: &AttributeMap, desired: &AttributeMap) -> Vec<&'static FieldDescriptor> {
    REPLICATION_GROUP_SCHEMA
        .iter()
        .filter(|field| field.is_user_settable())
        .filter(|field| {
            significant(prior.get(field.name)) != significant(desired.get(field.name))
        })
        .collect()
}

/// Names of ForceNew attributes that differ; a non-empty result means the
/// group must be replaced rather than modified.
#[must_use]
pub fn force_new_changes(prior: &AttributeMap, desired: &AttributeMap) -> Vec<&'static str> {
    changed_fields(prior, desired)
        .into_iter()
        .filter(|field| field.force_new)
        .map(|field| field.name)
        .collect()
}

fn significant(value: Option<&AttributeValue>) -> Option<&AttributeValue> {
    value.filter(|present| !is_blank(present))
}

fn is_blank(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::String(text) => text.is_empty(),
        AttributeValue::Set(items) => items.is_empty(),
        AttributeValue::Map(entries) => entries.is_empty(),
        AttributeValue::Bool(_) | AttributeValue::Int(_) => false,
    }
}

fn validate_replication_group_id(value: &AttributeValue) -> Result<(), String> {
    let AttributeValue::String(id) = value else {
        return Err(String::from("must be a string"));
    };
    if id.chars().count() > 20 {
        return Err(format!("{id:?} cannot be longer than 20 characters"));
    }
    if !id
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
    {
        return Err(format!(
            "only lowercase alphanumeric characters and hyphens allowed in {id:?}"
        ));
    }
    if !id.starts_with(|ch: char| ch.is_ascii_lowercase()) {
        return Err(format!("first character of {id:?} must be a letter"));
    }
    if id.contains("--") {
        return Err(format!("{id:?} cannot contain two consecutive hyphens"));
    }
    if id.ends_with('-') {
        return Err(format!("{id:?} cannot end with a hyphen"));
    }
    Ok(())
}

fn validate_engine(value: &AttributeValue) -> Result<(), String> {
    match value {
        AttributeValue::String(engine) if engine == "redis" => Ok(()),
        other => Err(format!(
            "replication groups only support the redis engine, got {other:?}"
        )),
    }
}

fn validate_in_range(value: &AttributeValue, min: i64, max: i64) -> Result<(), String> {
    match value {
        AttributeValue::Int(number) if (min..=max).contains(number) => Ok(()),
        AttributeValue::Int(number) => Err(format!("{number} is outside {min}..={max}")),
        other => Err(format!("expected an integer, got {other:?}")),
    }
}

fn validate_port(value: &AttributeValue) -> Result<(), String> {
    validate_in_range(value, 1, 65_535)
}

fn validate_cluster_count(value: &AttributeValue) -> Result<(), String> {
    validate_in_range(value, 1, 6)
}

fn validate_retention_limit(value: &AttributeValue) -> Result<(), String> {
    validate_in_range(value, 0, 35)
}
