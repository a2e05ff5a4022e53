// ============================================================================
// Session
// ============================================================================

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{ConfigSource, ConfigStore};
use crate::context::TransactionContext;
use crate::core::RecordId;
use crate::dispatch::Phase;

/// Identity of one guarded dispatch: record plus phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuardKey {
    pub record_id: RecordId,
    pub phase: Phase,
}

impl GuardKey {
    pub fn new(record_id: RecordId, phase: Phase) -> Self {
        Self { record_id, phase }
    }
}

/// Transaction-scoped state container.
///
/// Owns everything that must live exactly as long as one logical unit of
/// work: the configuration caches, the recursion-guard set and the lazily
/// created [`TransactionContext`]. A session is never shared across two
/// independently scheduled transactions; the host creates one per
/// transaction and drops (or [`end`](Self::end)s) it at the boundary.
pub struct Session {
    principal_id: String,
    config: ConfigStore,
    guard: RwLock<HashSet<GuardKey>>,
    context: RwLock<Option<Arc<TransactionContext>>>,
}

impl Session {
    /// Open a session for the acting principal against a configuration
    /// source. `environment` pins per-environment property resolution.
    pub fn begin(
        source: Arc<dyn ConfigSource>,
        principal_id: impl Into<String>,
        environment: Option<&str>,
    ) -> Self {
        let mut config = ConfigStore::new(source);
        if let Some(env) = environment {
            config = config.with_environment(env);
        }
        Self {
            principal_id: principal_id.into(),
            config,
            guard: RwLock::new(HashSet::new()),
            context: RwLock::new(None),
        }
    }

    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The shared transaction context, created on first use.
    pub fn context(&self) -> Arc<TransactionContext> {
        {
            let slot = self.context.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ctx) = slot.as_ref() {
                return Arc::clone(ctx);
            }
        }

        let mut slot = self
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slot.get_or_insert_with(|| Arc::new(TransactionContext::new(&self.principal_id))))
    }

    /// Whether a context has been created yet.
    pub fn has_context(&self) -> bool {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn is_guarded(&self, record_id: &RecordId, phase: Phase) -> bool {
        self.guard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&GuardKey::new(record_id.clone(), phase))
    }

    /// Idempotent registration; entries persist until [`reset`](Self::reset).
    pub fn register_guard(&self, record_id: RecordId, phase: Phase) {
        self.guard
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(GuardKey::new(record_id, phase));
    }

    pub fn guard_len(&self) -> usize {
        self.guard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Test-support reset: clears the transaction context, the recursion
    /// guard and every configuration cache.
    pub fn reset(&self) {
        self.guard
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.context
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.config.clear_caches();
    }

    /// Close the session at the transaction boundary.
    pub fn end(self) {
        self.reset();
    }
}
