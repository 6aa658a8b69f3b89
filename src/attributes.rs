//! Flat key/value attributes exchanged with the declarative engine.
//!
//! The engine hands the controller a map of attribute names to loosely typed
//! values. Values arriving as strings are coerced to the kind the schema
//! declares before they reach the typed model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::FieldKind;

/// Single attribute value.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Free-form string.
    String(String),
    /// Unordered set of strings.
    Set(BTreeSet<String>),
    /// String to string mapping.
    Map(BTreeMap<String, String>),
}

impl AttributeValue {
    /// Name of the value's kind, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    /// Converts the value to `kind`, parsing string-encoded scalars.
    ///
    /// Returns `None` when the value cannot represent `kind`.
    #[must_use]
    pub fn coerce(&self, kind: FieldKind) -> Option<Self> {
        match (kind, self) {
            (FieldKind::String, Self::String(_))
            | (FieldKind::Int, Self::Int(_))
            | (FieldKind::Bool, Self::Bool(_))
            | (FieldKind::Set, Self::Set(_))
            | (FieldKind::Map, Self::Map(_)) => Some(self.clone()),
            (FieldKind::String, Self::Int(value)) => Some(Self::String(value.to_string())),
            (FieldKind::String, Self::Bool(value)) => Some(Self::String(value.to_string())),
            (FieldKind::Int, Self::String(raw)) => raw.trim().parse().ok().map(Self::Int),
            (FieldKind::Bool, Self::String(raw)) => parse_bool(raw).map(Self::Bool),
            (FieldKind::Set, Self::String(raw)) if raw.trim().is_empty() => {
                Some(Self::Set(BTreeSet::new()))
            }
            _ => None,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<BTreeSet<String>> for AttributeValue {
    fn from(value: BTreeSet<String>) -> Self {
        Self::Set(value)
    }
}

impl From<BTreeMap<String, String>> for AttributeValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Map(value)
    }
}

/// Ordered map of attribute names to values.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, AttributeValue>);

impl AttributeMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parses a JSON object of attributes.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload is not an object of
    /// supported values.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Inserts or replaces an attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Inserts the attribute only when `value` is present.
    pub fn insert_opt<V>(&mut self, name: &str, value: Option<V>)
    where
        V: Into<AttributeValue>,
    {
        if let Some(present) = value {
            self.insert(name, present);
        }
    }

    /// Returns the raw value of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0.get(name)
    }

    /// Returns a string attribute, ignoring values of other kinds.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(AttributeValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns an integer attribute.
    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.0.get(name) {
            Some(AttributeValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Returns a boolean attribute.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(AttributeValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    /// Returns a set attribute.
    #[must_use]
    pub fn get_set(&self, name: &str) -> Option<&BTreeSet<String>> {
        match self.0.get(name) {
            Some(AttributeValue::Set(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a map attribute.
    #[must_use]
    pub fn get_map(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        match self.0.get(name) {
            Some(AttributeValue::Map(value)) => Some(value),
            _ => None,
        }
    }

    /// Iterates over attribute names and values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
