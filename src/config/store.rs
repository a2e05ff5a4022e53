use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::dispatch::Phase;

use super::{ConfigSource, FeatureFlag, HandlerConfig, SystemProperty};

/// Cached, environment-aware view over a [`ConfigSource`].
///
/// Every lookup is cached per name for the lifetime of the store, negative
/// results included. The only invalidation is the explicit
/// [`clear_caches`](Self::clear_caches) used between test executions.
pub struct ConfigStore {
    source: Arc<dyn ConfigSource>,
    environment: Option<String>,
    properties: RwLock<HashMap<String, Option<SystemProperty>>>,
    flags: RwLock<HashMap<String, Option<FeatureFlag>>>,
    chains: RwLock<HashMap<(String, Phase), Arc<Vec<HandlerConfig>>>>,
}

impl ConfigStore {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            environment: None,
            properties: RwLock::new(HashMap::new()),
            flags: RwLock::new(HashMap::new()),
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Pin the current environment used for property resolution.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// Resolve a property by name.
    ///
    /// A row scoped to the current environment wins over an
    /// environment-agnostic row; rows scoped to a different environment are
    /// ignored. Among remaining candidates the first row in source order
    /// wins, so sources must yield rows in a stable order.
    pub fn get_property(&self, name: &str) -> Option<SystemProperty> {
        {
            let cache = self
                .properties
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(name) {
                return cached.clone();
            }
        }

        let rows = self.source.properties(name);
        let resolved = self.resolve_rows(rows);

        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), resolved.clone());
        resolved
    }

    fn resolve_rows(&self, rows: Vec<SystemProperty>) -> Option<SystemProperty> {
        let scoped = rows
            .iter()
            .find(|row| row.environment.as_deref() == self.environment.as_deref() && row.environment.is_some());
        if let Some(row) = scoped {
            return Some(row.clone());
        }
        rows.into_iter().find(|row| row.environment.is_none())
    }

    /// String value of `name`, or `default` when the property or its string
    /// value is absent.
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.get_property(name)
            .and_then(|p| p.string_value)
            .unwrap_or_else(|| default.to_string())
    }

    /// Number value of `name`, or `default` when absent.
    pub fn get_number(&self, name: &str, default: f64) -> f64 {
        self.get_property(name)
            .and_then(|p| p.number_value)
            .unwrap_or(default)
    }

    /// Boolean value of `name`, or `default` when absent.
    pub fn get_boolean(&self, name: &str, default: bool) -> bool {
        self.get_property(name)
            .and_then(|p| p.boolean_value)
            .unwrap_or(default)
    }

    /// Whether the named feature flag is effectively active right now.
    /// Absent flags are inactive.
    pub fn is_feature_enabled(&self, name: &str) -> bool {
        let flag = {
            let cache = self.flags.read().unwrap_or_else(PoisonError::into_inner);
            cache.get(name).cloned()
        };

        let flag = match flag {
            Some(cached) => cached,
            None => {
                let fetched = self.source.feature_flag(name);
                self.flags
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(name.to_string(), fetched.clone());
                fetched
            }
        };

        flag.map(|f| f.is_active_at(Utc::now())).unwrap_or(false)
    }

    /// The ordered, active handler chain for an (entity, phase) slot.
    ///
    /// Inactive rows are excluded entirely. Ordering is a stable ascending
    /// sort by `execution_order`, ties broken by handler identifier. The
    /// resolved chain is built once and shared on subsequent calls.
    pub fn handler_chain(&self, entity_type: &str, phase: Phase) -> Arc<Vec<HandlerConfig>> {
        let key = (entity_type.to_string(), phase);
        {
            let cache = self.chains.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(chain) = cache.get(&key) {
                return Arc::clone(chain);
            }
        }

        let mut rows: Vec<HandlerConfig> = self
            .source
            .handler_configs(entity_type, phase)
            .into_iter()
            .filter(|c| c.active)
            .collect();
        rows.sort_by(|a, b| {
            a.execution_order
                .cmp(&b.execution_order)
                .then_with(|| a.handler.cmp(&b.handler))
        });

        let chain = Arc::new(rows);
        self.chains
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&chain));
        chain
    }

    /// Test-support invalidation of every cache.
    pub fn clear_caches(&self) {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.flags
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.chains
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
