// ============================================================================
// RustHookFlow Library
// ============================================================================

//! Declarative mutation-hook dispatch engine.
//!
//! Lifecycle events on business-entity records are routed through ordered
//! chains of pluggable handlers, with access-control enforcement in front
//! of writes, advisory resource-quota monitoring, and a transaction-scoped
//! context shared by every handler in one logical unit of work.

pub mod access;
pub mod config;
pub mod context;
pub mod core;
pub mod dispatch;
pub mod limits;
pub mod observe;
pub mod session;
pub mod store;

// Re-export main types for convenience
pub use crate::core::{EntityType, HookError, Record, RecordId, Result, Value};

pub use access::{AccessGate, CrudOperation, FieldPermissions, ObjectPermissions, Principal};
pub use config::{ConfigSource, ConfigStore, FeatureFlag, HandlerConfig, StaticConfigSource, SystemProperty};
pub use context::TransactionContext;
pub use dispatch::{
    Dispatcher, DomainEvent, DomainEventPublisher, HandlerContext, HandlerRegistry, MetricsSink,
    MutationHandler, NullMetricsSink, NullPublisher, Phase, TransactionMetrics,
};
pub use limits::{
    FixedUsageProbe, ProcessUsageProbe, QuotaMonitor, ResourceKind, ResourceSnapshot, UsageProbe,
};
pub use observe::{LogEntry, LogLevel, LogSink, MemorySink, StdLogSink};
pub use session::{GuardKey, Session};
pub use store::{MemoryStore, RecordStore, SaveError, SaveOutcome, Visibility};

use std::sync::Arc;

// ============================================================================
// High-level Runtime Facade
// ============================================================================

/// One logical transaction's worth of wiring: session, handler registry,
/// record store, access gate and collaborators.
///
/// This is the recommended way to embed the engine in a host application.
///
/// # Examples
///
/// ```
/// use rusthookflow::{Phase, Record, Runtime};
///
/// let runtime = Runtime::builder().build();
///
/// let records = vec![Record::new("Account").with_field("name", "Acme")];
/// runtime.dispatch(records, Vec::new(), Phase::BeforeCreate).unwrap();
/// ```
pub struct Runtime {
    session: Arc<Session>,
    registry: Arc<HandlerRegistry>,
    principal: Arc<Principal>,
    store: Arc<dyn RecordStore>,
    probe: Arc<dyn UsageProbe>,
    publisher: Arc<dyn DomainEventPublisher>,
    metrics: Arc<dyn MetricsSink>,
    sink: Arc<dyn LogSink>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Access gate bound to this transaction's principal and store.
    pub fn gate(&self) -> AccessGate {
        AccessGate::new(
            Arc::clone(&self.session),
            Arc::clone(&self.principal),
            Arc::clone(&self.store),
            Arc::clone(&self.sink),
        )
    }

    /// Quota monitor bound to this runtime's probe and sink.
    pub fn monitor(&self) -> QuotaMonitor {
        QuotaMonitor::new(Arc::clone(&self.probe), Arc::clone(&self.sink))
    }

    /// Dispatch one lifecycle event through the configured handler chains.
    ///
    /// `old_records` carries prior state for update/delete/restore phases;
    /// it is indexed by record id.
    pub fn dispatch(
        &self,
        new_records: Vec<Record>,
        old_records: Vec<Record>,
        phase: Phase,
    ) -> Result<()> {
        Dispatcher::new(
            Arc::clone(&self.session),
            new_records,
            Dispatcher::index_by_id(old_records),
            phase,
        )
        .with_registry(Arc::clone(&self.registry))
        .with_probe(Arc::clone(&self.probe))
        .with_publisher(Arc::clone(&self.publisher))
        .with_metrics(Arc::clone(&self.metrics))
        .with_sink(Arc::clone(&self.sink))
        .run()
    }

    /// Test-support reset of all transaction-scoped state.
    pub fn reset(&self) {
        self.session.reset();
    }
}

/// Builder for [`Runtime`]; every component has a working default.
pub struct RuntimeBuilder {
    source: Arc<dyn ConfigSource>,
    environment: Option<String>,
    principal: Arc<Principal>,
    registry: Arc<HandlerRegistry>,
    store: Arc<dyn RecordStore>,
    probe: Arc<dyn UsageProbe>,
    publisher: Arc<dyn DomainEventPublisher>,
    metrics: Arc<dyn MetricsSink>,
    sink: Arc<dyn LogSink>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            source: Arc::new(StaticConfigSource::new()),
            environment: None,
            principal: Arc::new(Principal::elevated("system")),
            registry: Arc::clone(HandlerRegistry::global()),
            store: Arc::new(MemoryStore::new()),
            probe: Arc::new(ProcessUsageProbe::new()),
            publisher: Arc::new(NullPublisher),
            metrics: Arc::new(NullMetricsSink),
            sink: Arc::new(StdLogSink),
        }
    }

    pub fn config_source(mut self, source: Arc<dyn ConfigSource>) -> Self {
        self.source = source;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = Arc::new(principal);
        self
    }

    pub fn registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn record_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = store;
        self
    }

    pub fn usage_probe(mut self, probe: Arc<dyn UsageProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn event_publisher(mut self, publisher: Arc<dyn DomainEventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn metrics_sink(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Runtime {
        let session = Arc::new(Session::begin(
            Arc::clone(&self.source),
            self.principal.id(),
            self.environment.as_deref(),
        ));
        Runtime {
            session,
            registry: self.registry,
            principal: self.principal,
            store: self.store,
            probe: self.probe,
            publisher: self.publisher,
            metrics: self.metrics,
            sink: self.sink,
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runtime_dispatch_is_noop() {
        let runtime = Runtime::builder().build();
        let records = vec![Record::new("Account").with_field("name", "Acme")];
        runtime
            .dispatch(records, Vec::new(), Phase::BeforeCreate)
            .unwrap();
    }

    #[test]
    fn test_gate_uses_runtime_store() {
        let runtime = Runtime::builder().build();
        let gate = runtime.gate();

        let outcomes = gate
            .insert_records(&[Record::new("Account").with_field("name", "Acme")])
            .unwrap();
        assert!(outcomes[0].success);
    }

    #[test]
    fn test_reset_clears_session_state() {
        let runtime = Runtime::builder().build();
        runtime.session().context().put("k", 1i64);
        runtime.reset();
        assert_eq!(runtime.session().context().size(), 0);
    }
}
