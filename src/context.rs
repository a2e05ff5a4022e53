// ============================================================================
// Transaction Context
// ============================================================================

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::core::Value;

/// Transaction-scoped key/value store shared by every handler within one
/// logical unit of work.
///
/// The id is generated once and immutable. Keys are opaque strings; callers
/// avoid collisions by convention (e.g. namespacing by entity id). No
/// operation fails: lock poisoning is recovered, since the engine is
/// single-threaded per transaction a poisoned lock cannot carry a torn
/// write.
pub struct TransactionContext {
    id: String,
    data: RwLock<HashMap<String, Value>>,
}

impl TransactionContext {
    /// Create a context with a fresh opaque id: acting principal, UTC
    /// timestamp, random suffix.
    pub fn new(principal_id: &str) -> Self {
        let id = format!(
            "{}-{}-{}",
            principal_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        Self {
            id,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn keys(&self) -> HashSet<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn size(&self) -> usize {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every entry. The id stays.
    pub fn clear(&self) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
