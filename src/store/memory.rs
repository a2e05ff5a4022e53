use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::core::{EntityType, Record, RecordId};

use super::{RecordStore, SaveError, SaveOutcome, Visibility};

/// In-memory reference store: entity type → record id → record.
///
/// Assigns ids on insert and reports per-record failures (duplicate id on
/// insert, unknown id on update/delete) instead of failing the batch, so
/// partial-write paths behave like a real backing store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<EntityType, HashMap<RecordId, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_type: &EntityType, id: &RecordId) -> Option<Record> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_type)
            .and_then(|table| table.get(id))
            .cloned()
    }

    pub fn count(&self, entity_type: &EntityType) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_type)
            .map(|table| table.len())
            .unwrap_or(0)
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, records: &[Record], _visibility: Visibility) -> Vec<SaveOutcome> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .map(|record| {
                let table = tables.entry(record.entity_type.clone()).or_default();
                let id = record
                    .id
                    .clone()
                    .unwrap_or_else(|| RecordId::new(Uuid::new_v4().to_string()));
                if table.contains_key(&id) {
                    return SaveOutcome::failed(SaveError::new(
                        "DUPLICATE_ID",
                        format!("Record '{}' already exists", id),
                    ));
                }
                let mut stored = record.clone();
                stored.id = Some(id.clone());
                table.insert(id.clone(), stored);
                SaveOutcome::ok(id)
            })
            .collect()
    }

    fn update(&self, records: &[Record], _visibility: Visibility) -> Vec<SaveOutcome> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .map(|record| {
                let table = tables.entry(record.entity_type.clone()).or_default();
                let id = match record.id.clone() {
                    Some(id) => id,
                    None => {
                        return SaveOutcome::failed(SaveError::new(
                            "MISSING_ID",
                            "Cannot update a record without an id",
                        ))
                    }
                };
                match table.get_mut(&id) {
                    Some(stored) => {
                        for (name, value) in &record.fields {
                            stored.fields.insert(name.clone(), value.clone());
                        }
                        SaveOutcome::ok(id)
                    }
                    None => SaveOutcome::failed(SaveError::new(
                        "NOT_FOUND",
                        format!("Record '{}' does not exist", id),
                    )),
                }
            })
            .collect()
    }

    fn delete(&self, records: &[Record], _visibility: Visibility) -> Vec<SaveOutcome> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .map(|record| {
                let table = tables.entry(record.entity_type.clone()).or_default();
                let id = match record.id.clone() {
                    Some(id) => id,
                    None => {
                        return SaveOutcome::failed(SaveError::new(
                            "MISSING_ID",
                            "Cannot delete a record without an id",
                        ))
                    }
                };
                match table.remove(&id) {
                    Some(_) => SaveOutcome::ok(id),
                    None => SaveOutcome::failed(SaveError::new(
                        "NOT_FOUND",
                        format!("Record '{}' does not exist", id),
                    )),
                }
            })
            .collect()
    }
}
