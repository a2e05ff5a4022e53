use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::dispatch::Phase;

use super::{FeatureFlag, HandlerConfig, SystemProperty};

/// Backing store of configuration records.
///
/// The engine only reads configuration; administration tooling writes it.
/// Implementations must return rows in a stable order: when several
/// property rows survive environment resolution, the first one wins.
pub trait ConfigSource: Send + Sync {
    /// All property rows sharing `name`, any environment.
    fn properties(&self, name: &str) -> Vec<SystemProperty>;

    fn feature_flag(&self, name: &str) -> Option<FeatureFlag>;

    /// All handler rows for the (entity, phase) slot, active or not,
    /// in no particular order.
    fn handler_configs(&self, entity_type: &str, phase: Phase) -> Vec<HandlerConfig>;
}

/// In-memory configuration source with builder-style registration.
///
/// Serves tests and hosts that assemble configuration in code rather than
/// from a persistent store.
#[derive(Default)]
pub struct StaticConfigSource {
    properties: RwLock<HashMap<String, Vec<SystemProperty>>>,
    flags: RwLock<HashMap<String, FeatureFlag>>,
    handlers: RwLock<Vec<HandlerConfig>>,
}

impl StaticConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(self, property: SystemProperty) -> Self {
        self.add_property(property);
        self
    }

    pub fn with_flag(self, flag: FeatureFlag) -> Self {
        self.add_flag(flag);
        self
    }

    pub fn with_handler(self, config: HandlerConfig) -> Self {
        self.add_handler(config);
        self
    }

    /// Rows are kept in insertion order; resolution ties go to the earliest.
    pub fn add_property(&self, property: SystemProperty) {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(property.name.clone())
            .or_default()
            .push(property);
    }

    pub fn add_flag(&self, flag: FeatureFlag) {
        self.flags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(flag.name.clone(), flag);
    }

    pub fn add_handler(&self, config: HandlerConfig) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(config);
    }
}

impl ConfigSource for StaticConfigSource {
    fn properties(&self, name: &str) -> Vec<SystemProperty> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn feature_flag(&self, name: &str) -> Option<FeatureFlag> {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn handler_configs(&self, entity_type: &str, phase: Phase) -> Vec<HandlerConfig> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.entity_type == entity_type && c.phase == phase)
            .cloned()
            .collect()
    }
}
