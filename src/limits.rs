// ============================================================================
// Resource Quota Monitor
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use crate::config::ConfigStore;
use crate::observe::{LogLevel, LogSink};

/// Scarce per-transaction resources tracked by the hosting runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Queries,
    QueryRows,
    WriteStatements,
    WriteRows,
    CpuTime,
    HeapSize,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Queries,
        ResourceKind::QueryRows,
        ResourceKind::WriteStatements,
        ResourceKind::WriteRows,
        ResourceKind::CpuTime,
        ResourceKind::HeapSize,
    ];

    /// Key used for per-kind threshold configuration.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Queries => "queries",
            Self::QueryRows => "query_rows",
            Self::WriteStatements => "write_statements",
            Self::WriteRows => "write_rows",
            Self::CpuTime => "cpu_time",
            Self::HeapSize => "heap_size",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Point-in-time consumption of one resource kind. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub kind: ResourceKind,
    pub used: u64,
    pub max: u64,
}

impl ResourceSnapshot {
    /// Integer percentage of the quota consumed. A zero max yields `None`:
    /// the kind is unlimited here and must not be checked.
    pub fn percent_used(&self) -> Option<u64> {
        if self.max == 0 {
            return None;
        }
        Some(self.used * 100 / self.max)
    }
}

/// Live consumption counters exposed by the hosting runtime.
pub trait UsageProbe: Send + Sync {
    fn sample(&self, kind: ResourceKind) -> ResourceSnapshot;
}

/// Scripted probe for tests and hosts that track counters themselves.
#[derive(Default)]
pub struct FixedUsageProbe {
    samples: RwLock<HashMap<ResourceKind, (u64, u64)>>,
}

impl FixedUsageProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample(self, kind: ResourceKind, used: u64, max: u64) -> Self {
        self.set(kind, used, max);
        self
    }

    pub fn set(&self, kind: ResourceKind, used: u64, max: u64) {
        self.samples
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, (used, max));
    }
}

impl UsageProbe for FixedUsageProbe {
    fn sample(&self, kind: ResourceKind) -> ResourceSnapshot {
        let (used, max) = self
            .samples
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied()
            .unwrap_or((0, 0));
        ResourceSnapshot { kind, used, max }
    }
}

/// Best-effort probe for plain processes without hard runtime quotas.
///
/// Reports elapsed wall-clock time for cpu-time and leaves every max at
/// zero, so nothing is checked until a host supplies real limits.
pub struct ProcessUsageProbe {
    started: Instant,
}

impl ProcessUsageProbe {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for ProcessUsageProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageProbe for ProcessUsageProbe {
    fn sample(&self, kind: ResourceKind) -> ResourceSnapshot {
        let used = match kind {
            ResourceKind::CpuTime => self.started.elapsed().as_millis() as u64,
            _ => 0,
        };
        ResourceSnapshot { kind, used, max: 0 }
    }
}

/// Advisory monitor over the fixed set of resource kinds.
///
/// Purely observational: it logs threshold crossings and never alters
/// control flow.
pub struct QuotaMonitor {
    probe: Arc<dyn UsageProbe>,
    sink: Arc<dyn LogSink>,
}

impl QuotaMonitor {
    /// Fixed critical threshold, independent of the configurable warning
    /// threshold.
    pub const CRITICAL_PERCENT: u64 = 90;

    /// Default warning threshold when no per-kind property is set.
    pub const DEFAULT_WARN_PERCENT: f64 = 75.0;

    const SOURCE: &'static str = "limits";

    pub fn new(probe: Arc<dyn UsageProbe>, sink: Arc<dyn LogSink>) -> Self {
        Self { probe, sink }
    }

    /// Sample every resource kind and log warnings/criticals for crossed
    /// thresholds. No-op when `quota.monitoring` is false. Never raises.
    pub fn check_limits(&self, config: &ConfigStore) {
        if !config.get_boolean("quota.monitoring", true) {
            return;
        }

        for kind in ResourceKind::ALL {
            let snapshot = self.probe.sample(kind);
            let percent = match snapshot.percent_used() {
                Some(p) => p,
                None => continue,
            };

            let threshold = config
                .get_number(&format!("quota.threshold.{}", kind.key()), Self::DEFAULT_WARN_PERCENT)
                as u64;

            if percent >= threshold {
                self.sink.log(
                    LogLevel::Warn,
                    Self::SOURCE,
                    &format!(
                        "Resource {} at {}% ({}/{})",
                        kind, percent, snapshot.used, snapshot.max
                    ),
                    None,
                );
            }

            if percent >= Self::CRITICAL_PERCENT {
                self.sink.log(
                    LogLevel::Error,
                    Self::SOURCE,
                    &format!(
                        "CRITICAL: resource {} at {}% ({}/{})",
                        kind, percent, snapshot.used, snapshot.max
                    ),
                    None,
                );
            }
        }
    }

    /// Full `{used, max}` pair for every kind, regardless of thresholds.
    pub fn limit_snapshot(&self) -> Vec<ResourceSnapshot> {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| self.probe.sample(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StaticConfigSource, SystemProperty};
    use crate::observe::MemorySink;

    fn monitor_with(
        probe: FixedUsageProbe,
    ) -> (QuotaMonitor, Arc<MemorySink>, ConfigStore) {
        let sink = Arc::new(MemorySink::new());
        let monitor = QuotaMonitor::new(Arc::new(probe), sink.clone());
        let config = ConfigStore::new(Arc::new(StaticConfigSource::new()));
        (monitor, sink, config)
    }

    #[test]
    fn test_warning_at_default_threshold() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 80, 100);
        let (monitor, sink, config) = monitor_with(probe);

        monitor.check_limits(&config);

        let warnings = sink.entries_at(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("queries"));
        assert!(warnings[0].message.contains("80%"));
        assert!(sink.entries_at(LogLevel::Error).is_empty());
    }

    #[test]
    fn test_below_threshold_is_silent() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 74, 100);
        let (monitor, sink, config) = monitor_with(probe);

        monitor.check_limits(&config);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_critical_emits_both_entries() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::WriteRows, 95, 100);
        let (monitor, sink, config) = monitor_with(probe);

        monitor.check_limits(&config);

        assert_eq!(sink.entries_at(LogLevel::Warn).len(), 1);
        let errors = sink.entries_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("CRITICAL"));
    }

    #[test]
    fn test_zero_max_short_circuits() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::HeapSize, 500, 0);
        let (monitor, sink, config) = monitor_with(probe);

        monitor.check_limits(&config);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_configured_threshold_per_kind() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 60, 100);
        let sink = Arc::new(MemorySink::new());
        let monitor = QuotaMonitor::new(Arc::new(probe), sink.clone());
        let config = ConfigStore::new(Arc::new(
            StaticConfigSource::new()
                .with_property(SystemProperty::new("quota.threshold.queries").number(50.0)),
        ));

        monitor.check_limits(&config);
        assert_eq!(sink.entries_at(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn test_monitoring_disabled_is_noop() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 99, 100);
        let sink = Arc::new(MemorySink::new());
        let monitor = QuotaMonitor::new(Arc::new(probe), sink.clone());
        let config = ConfigStore::new(Arc::new(
            StaticConfigSource::new()
                .with_property(SystemProperty::new("quota.monitoring").boolean(false)),
        ));

        monitor.check_limits(&config);
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_limit_snapshot_covers_every_kind() {
        let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 10, 100);
        let (monitor, _sink, _config) = monitor_with(probe);

        let snapshot = monitor.limit_snapshot();
        assert_eq!(snapshot.len(), ResourceKind::ALL.len());
        let queries = snapshot
            .iter()
            .find(|s| s.kind == ResourceKind::Queries)
            .unwrap();
        assert_eq!((queries.used, queries.max), (10, 100));
    }

    #[test]
    fn test_percent_used_integer_division() {
        let snapshot = ResourceSnapshot {
            kind: ResourceKind::Queries,
            used: 149,
            max: 200,
        };
        assert_eq!(snapshot.percent_used(), Some(74));
    }
}
