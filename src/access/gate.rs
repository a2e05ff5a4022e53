use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::ConfigStore;
use crate::core::{EntityType, HookError, Record, Result};
use crate::observe::{LogLevel, LogSink};
use crate::session::Session;
use crate::store::{RecordStore, SaveOutcome, Visibility};

use super::{CrudOperation, Principal};

/// Access-control enforcement gate in front of the underlying record store.
///
/// Structural precondition failures (existence-level, field-level) abort the
/// whole batch before any write. Failures raised by the store during the
/// write are partial: they come back per record and are logged in
/// aggregate, never raised.
pub struct AccessGate {
    session: Arc<Session>,
    principal: Arc<Principal>,
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn LogSink>,
}

impl AccessGate {
    const SOURCE: &'static str = "access";

    pub fn new(
        session: Arc<Session>,
        principal: Arc<Principal>,
        store: Arc<dyn RecordStore>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            session,
            principal,
            store,
            sink,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Insert a homogeneous batch. Empty input returns an empty result
    /// without side effects.
    pub fn insert_records(&self, records: &[Record]) -> Result<Vec<SaveOutcome>> {
        self.write(records, CrudOperation::Create)
    }

    /// Update a homogeneous batch.
    pub fn update_records(&self, records: &[Record]) -> Result<Vec<SaveOutcome>> {
        self.write(records, CrudOperation::Update)
    }

    /// Delete a homogeneous batch. Field-level checks do not apply.
    pub fn delete_records(&self, records: &[Record]) -> Result<Vec<SaveOutcome>> {
        self.write(records, CrudOperation::Delete)
    }

    fn write(&self, records: &[Record], operation: CrudOperation) -> Result<Vec<SaveOutcome>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        // Batches are homogeneous by precondition; the first record names
        // the type for the whole call.
        let entity = records[0].entity_type.clone();
        let config = self.session.config();

        if self.object_check_enabled(config, &entity)
            && !self.principal.can(operation, &entity)
        {
            return Err(HookError::AccessDenied(format!(
                "Principal '{}' may not {} {} records",
                self.principal.id(),
                operation,
                entity
            )));
        }

        if matches!(operation, CrudOperation::Create | CrudOperation::Update)
            && self.field_check_enabled(config, &entity)
        {
            self.check_fields(records, operation, &entity)?;
        }

        let visibility = if self.sharing_enabled(config, &entity) {
            Visibility::Restricted
        } else {
            Visibility::Elevated
        };

        let outcomes = match operation {
            CrudOperation::Create => self.store.insert(records, visibility),
            CrudOperation::Update => self.store.update(records, visibility),
            CrudOperation::Delete => self.store.delete(records, visibility),
            CrudOperation::Read => Vec::new(),
        };

        self.log_failures(operation, &entity, &outcomes);
        Ok(outcomes)
    }

    /// Union of populated fields across the batch, identity excluded,
    /// checked in deterministic (sorted) order; the first field lacking a
    /// grant fails the call.
    fn check_fields(
        &self,
        records: &[Record],
        operation: CrudOperation,
        entity: &EntityType,
    ) -> Result<()> {
        let fields: BTreeSet<&str> = records
            .iter()
            .flat_map(|record| record.populated_fields())
            .collect();

        for field in fields {
            if !self.principal.can_field(operation, entity, field) {
                return Err(HookError::AccessDenied(format!(
                    "Principal '{}' may not {} field '{}' on {}",
                    self.principal.id(),
                    operation,
                    field,
                    entity
                )));
            }
        }
        Ok(())
    }

    fn object_check_enabled(&self, config: &ConfigStore, entity: &EntityType) -> bool {
        let global = config.get_boolean("access.object_check", true);
        config.get_boolean(&format!("access.object_check.{}", entity), global)
    }

    fn field_check_enabled(&self, config: &ConfigStore, entity: &EntityType) -> bool {
        let global = config.get_boolean("access.field_check", true);
        config.get_boolean(&format!("access.field_check.{}", entity), global)
    }

    fn sharing_enabled(&self, config: &ConfigStore, entity: &EntityType) -> bool {
        let global = config.get_boolean("access.sharing", false);
        config.get_boolean(&format!("access.sharing.{}", entity), global)
    }

    fn log_failures(&self, operation: CrudOperation, entity: &EntityType, outcomes: &[SaveOutcome]) {
        let failures: Vec<String> = outcomes
            .iter()
            .enumerate()
            .filter(|(_, outcome)| !outcome.success)
            .flat_map(|(index, outcome)| {
                outcome
                    .errors
                    .iter()
                    .map(move |error| format!("{}: {} - {}", index, error.status_code, error.message))
            })
            .collect();

        if failures.is_empty() {
            return;
        }

        self.sink.log(
            LogLevel::Warn,
            Self::SOURCE,
            &format!("{} on {} failed for: {}", operation, entity, failures.join("; ")),
            None,
        );
    }
}
