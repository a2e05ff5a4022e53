use serde::{Deserialize, Serialize};

use crate::core::{EntityType, RecordId};
use crate::limits::ResourceSnapshot;

use super::Phase;

/// Notification describing one changed record after an after-phase.
///
/// Deliberately minimal: consumers wanting a richer schema subscribe
/// through their own publisher implementation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub entity_type: EntityType,
    pub phase: Phase,
    pub record_id: Option<RecordId>,
}

/// External publish collaborator for after-phase notifications.
///
/// Publish failures are caught and logged by the dispatcher, never
/// propagated to the caller.
pub trait DomainEventPublisher: Send + Sync {
    fn publish(&self, events: &[DomainEvent]) -> anyhow::Result<()>;
}

/// Default publisher: discards every batch.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl DomainEventPublisher for NullPublisher {
    fn publish(&self, _events: &[DomainEvent]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Observability summary of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetrics {
    pub entity_type: EntityType,
    pub phase: Phase,
    pub record_count: usize,
    pub snapshot: Vec<ResourceSnapshot>,
}

/// External metrics collaborator; correctness never depends on it.
pub trait MetricsSink: Send + Sync {
    fn record(&self, metrics: TransactionMetrics);
}

/// Default metrics sink: a no-op.
#[derive(Debug, Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record(&self, _metrics: TransactionMetrics) {}
}
