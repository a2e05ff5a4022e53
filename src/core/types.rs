use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Value;

/// Name of the identity field on every record.
pub const ID_FIELD: &str = "id";

/// Opaque record identifier assigned by the underlying store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Business entity type name, e.g. "Account" or "Invoice".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityType(pub String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A mutable business-entity record: an optional identity plus a field map.
///
/// Field order is kept stable (BTreeMap) so batch-level field unions and
/// log output are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Option<RecordId>,
    pub entity_type: EntityType,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            id: None,
            entity_type: entity_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder-style identity assignment.
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Names of fields carrying a non-NULL value, identity field excluded.
    pub fn populated_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(name, value)| name.as_str() != ID_FIELD && !value.is_null())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl From<EntityType> for Record {
    fn from(entity_type: EntityType) -> Self {
        Self::new(entity_type)
    }
}
