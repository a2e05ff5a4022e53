use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use crate::core::{EntityType, HookError, Record, RecordId, Result};
use crate::limits::{ProcessUsageProbe, QuotaMonitor, UsageProbe};
use crate::observe::{LogLevel, LogSink, StdLogSink};
use crate::session::Session;

use super::{
    DomainEvent, DomainEventPublisher, HandlerConfig, HandlerContext, HandlerRegistry, MetricsSink,
    NullMetricsSink, NullPublisher, Phase, TransactionMetrics,
};

/// Entry point for one lifecycle event.
///
/// Constructed per event with the new-record batch, the prior state keyed
/// by id, and the phase; `run` resolves the configured handler chain and
/// drives it to completion under the configured failure policy.
pub struct Dispatcher {
    session: Arc<Session>,
    registry: Arc<HandlerRegistry>,
    new_records: Arc<Vec<Record>>,
    old_records: Arc<HashMap<RecordId, Record>>,
    phase: Phase,
    probe: Arc<dyn UsageProbe>,
    publisher: Arc<dyn DomainEventPublisher>,
    metrics: Arc<dyn MetricsSink>,
    sink: Arc<dyn LogSink>,
}

impl Dispatcher {
    const SOURCE: &'static str = "dispatch";

    pub fn new(
        session: Arc<Session>,
        new_records: Vec<Record>,
        old_records: HashMap<RecordId, Record>,
        phase: Phase,
    ) -> Self {
        Self {
            session,
            registry: Arc::clone(HandlerRegistry::global()),
            new_records: Arc::new(new_records),
            old_records: Arc::new(old_records),
            phase,
            probe: Arc::new(ProcessUsageProbe::new()),
            publisher: Arc::new(NullPublisher),
            metrics: Arc::new(NullMetricsSink),
            sink: Arc::new(StdLogSink),
        }
    }

    /// Key prior-state records by id. Records without an id are dropped;
    /// only stored records can carry prior state.
    pub fn index_by_id(records: Vec<Record>) -> HashMap<RecordId, Record> {
        records
            .into_iter()
            .filter_map(|record| record.id.clone().map(|id| (id, record)))
            .collect()
    }

    pub fn with_registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn UsageProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn DomainEventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Entity type this event is about: taken from the first new record,
    /// falling back to prior state for delete phases.
    fn entity_type(&self) -> Option<EntityType> {
        self.new_records
            .first()
            .map(|record| record.entity_type.clone())
            .or_else(|| {
                self.old_records
                    .values()
                    .next()
                    .map(|record| record.entity_type.clone())
            })
    }

    /// Ids of the records this event is about.
    fn record_ids(&self) -> Vec<RecordId> {
        if self.new_records.is_empty() {
            self.old_records.keys().cloned().collect()
        } else {
            self.new_records
                .iter()
                .filter_map(|record| record.id.clone())
                .collect()
        }
    }

    /// Process one lifecycle event.
    pub fn run(&self) -> Result<()> {
        let entity = match self.entity_type() {
            Some(entity) => entity,
            None => return Ok(()),
        };
        let config = self.session.config();

        if !config.get_boolean(&format!("hooks.{}.enabled", entity), true) {
            return Ok(());
        }

        let guard_enabled =
            config.get_boolean(&format!("hooks.{}.recursion_guard", entity), true);
        let ids = self.record_ids();

        if guard_enabled && !self.phase.is_create() {
            let already_handled = ids
                .iter()
                .any(|id| self.session.is_guarded(id, self.phase));
            if already_handled {
                self.sink.log(
                    LogLevel::Debug,
                    Self::SOURCE,
                    &format!(
                        "Skipping re-entrant {} dispatch for {}",
                        self.phase, entity
                    ),
                    None,
                );
                return Ok(());
            }
        }

        if guard_enabled {
            for id in &ids {
                self.session.register_guard(id.clone(), self.phase);
            }
        }

        let monitor = QuotaMonitor::new(Arc::clone(&self.probe), Arc::clone(&self.sink));
        monitor.check_limits(config);

        let chain = config.handler_chain(entity.as_str(), self.phase);
        self.run_chain(&entity, &chain)?;

        if self.phase.is_after() {
            self.publish_events(&entity);
        }

        self.metrics.record(TransactionMetrics {
            entity_type: entity,
            phase: self.phase,
            record_count: if self.new_records.is_empty() {
                self.old_records.len()
            } else {
                self.new_records.len()
            },
            snapshot: monitor.limit_snapshot(),
        });

        Ok(())
    }

    fn run_chain(&self, entity: &EntityType, chain: &[HandlerConfig]) -> Result<()> {
        let suppress = self
            .session
            .config()
            .get_boolean(&format!("hooks.{}.suppress_errors", entity), false);

        for config in chain {
            let mut handler = match self.registry.resolve(&config.handler) {
                Some(handler) => handler,
                None => {
                    // A missing handler must not abort the batch.
                    let missing = HookError::HandlerNotFound(config.handler.clone());
                    self.sink.log(
                        LogLevel::Error,
                        Self::SOURCE,
                        &format!("Skipping unresolvable handler for {}", entity),
                        Some(&missing as &dyn Error),
                    );
                    continue;
                }
            };

            handler.set_context(HandlerContext {
                new_records: Arc::clone(&self.new_records),
                old_records: Arc::clone(&self.old_records),
                phase: self.phase,
                transaction: self.session.context(),
            });

            if let Err(err) = handler.execute() {
                if suppress {
                    let cause: &(dyn Error + 'static) = err.as_ref();
                    self.sink.log(
                        LogLevel::Error,
                        Self::SOURCE,
                        &format!(
                            "Handler '{}' failed in {} {}; continuing",
                            config.handler, entity, self.phase
                        ),
                        Some(cause),
                    );
                    continue;
                }

                let failure = HookError::HandlerExecution {
                    handler: config.handler.clone(),
                    source: err,
                };
                self.sink.log(
                    LogLevel::Error,
                    Self::SOURCE,
                    &format!("Aborting {} {} chain", entity, self.phase),
                    Some(&failure as &dyn Error),
                );
                return Err(failure);
            }
        }

        Ok(())
    }

    fn publish_events(&self, entity: &EntityType) {
        let events: Vec<DomainEvent> = if self.new_records.is_empty() {
            self.old_records
                .keys()
                .map(|id| DomainEvent {
                    entity_type: entity.clone(),
                    phase: self.phase,
                    record_id: Some(id.clone()),
                })
                .collect()
        } else {
            self.new_records
                .iter()
                .map(|record| DomainEvent {
                    entity_type: entity.clone(),
                    phase: self.phase,
                    record_id: record.id.clone(),
                })
                .collect()
        };

        if let Err(err) = self.publisher.publish(&events) {
            let cause: &(dyn Error + 'static) = err.as_ref();
            self.sink.log(
                LogLevel::Warn,
                Self::SOURCE,
                &format!("Event publish failed for {} {}", entity, self.phase),
                Some(cause),
            );
        }
    }
}
