use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::EntityType;

/// Record-level operation a principal may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrudOperation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Existence-level permissions on one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPermissions {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
}

impl ObjectPermissions {
    pub fn full() -> Self {
        Self {
            create: true,
            read: true,
            update: true,
            delete: true,
        }
    }

    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    pub fn allows(&self, operation: CrudOperation) -> bool {
        match operation {
            CrudOperation::Create => self.create,
            CrudOperation::Read => self.read,
            CrudOperation::Update => self.update,
            CrudOperation::Delete => self.delete,
        }
    }
}

/// Field-level permissions on one field of one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermissions {
    pub create: bool,
    pub read: bool,
    pub update: bool,
}

impl FieldPermissions {
    pub fn full() -> Self {
        Self {
            create: true,
            read: true,
            update: true,
        }
    }

    pub fn allows(&self, operation: CrudOperation) -> bool {
        match operation {
            CrudOperation::Create => self.create,
            CrudOperation::Read => self.read,
            CrudOperation::Update => self.update,
            CrudOperation::Delete => false,
        }
    }
}

/// The acting principal: who is performing writes in this transaction.
///
/// An elevated principal bypasses every permission check, the way an admin
/// grant overrides individual ones. Non-elevated principals hold explicit
/// grants; anything not granted is denied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    id: String,
    elevated: bool,
    objects: HashMap<EntityType, ObjectPermissions>,
    fields: HashMap<EntityType, HashMap<String, FieldPermissions>>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            elevated: false,
            objects: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    /// A principal that passes every check.
    pub fn elevated(id: impl Into<String>) -> Self {
        Self {
            elevated: true,
            ..Self::new(id)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    pub fn with_object(mut self, entity_type: impl Into<EntityType>, perms: ObjectPermissions) -> Self {
        self.objects.insert(entity_type.into(), perms);
        self
    }

    pub fn with_field(
        mut self,
        entity_type: impl Into<EntityType>,
        field: impl Into<String>,
        perms: FieldPermissions,
    ) -> Self {
        self.fields
            .entry(entity_type.into())
            .or_default()
            .insert(field.into(), perms);
        self
    }

    /// Existence-level check.
    pub fn can(&self, operation: CrudOperation, entity_type: &EntityType) -> bool {
        if self.elevated {
            return true;
        }
        self.objects
            .get(entity_type)
            .map(|perms| perms.allows(operation))
            .unwrap_or(false)
    }

    /// Field-level check. Fields without an explicit grant are denied.
    pub fn can_field(
        &self,
        operation: CrudOperation,
        entity_type: &EntityType,
        field: &str,
    ) -> bool {
        if self.elevated {
            return true;
        }
        self.fields
            .get(entity_type)
            .and_then(|fields| fields.get(field))
            .map(|perms| perms.allows(operation))
            .unwrap_or(false)
    }
}
