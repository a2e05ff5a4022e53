/// Quota monitoring tests
///
/// Threshold crossings observed through a full dispatch, plus the metrics
/// collaborator receiving a snapshot.
/// Run with: cargo test --test limits_tests
use std::sync::{Arc, Mutex};

use rusthookflow::{
    FixedUsageProbe, LogLevel, MemorySink, MetricsSink, Phase, Record, ResourceKind, Runtime,
    StaticConfigSource, SystemProperty, TransactionMetrics,
};

struct CapturingMetrics {
    recorded: Arc<Mutex<Vec<TransactionMetrics>>>,
}

impl MetricsSink for CapturingMetrics {
    fn record(&self, metrics: TransactionMetrics) {
        self.recorded.lock().unwrap().push(metrics);
    }
}

#[test]
fn test_dispatch_emits_quota_warning() {
    let sink = Arc::new(MemorySink::new());
    let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 80, 100);

    let runtime = Runtime::builder()
        .usage_probe(Arc::new(probe))
        .log_sink(sink.clone())
        .build();

    runtime
        .dispatch(
            vec![Record::new("Account").with_field("name", "Acme")],
            Vec::new(),
            Phase::BeforeCreate,
        )
        .unwrap();

    let warnings = sink.entries_at(LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("queries"));
}

#[test]
fn test_dispatch_emits_critical_at_90_percent() {
    let sink = Arc::new(MemorySink::new());
    let probe = FixedUsageProbe::new().with_sample(ResourceKind::WriteStatements, 95, 100);

    let runtime = Runtime::builder()
        .usage_probe(Arc::new(probe))
        .log_sink(sink.clone())
        .build();

    runtime
        .dispatch(
            vec![Record::new("Account").with_field("name", "Acme")],
            Vec::new(),
            Phase::BeforeCreate,
        )
        .unwrap();

    assert_eq!(sink.entries_at(LogLevel::Warn).len(), 1);
    let criticals = sink.entries_at(LogLevel::Error);
    assert_eq!(criticals.len(), 1);
    assert!(criticals[0].message.starts_with("CRITICAL"));
}

#[test]
fn test_monitoring_disabled_silences_dispatch() {
    let sink = Arc::new(MemorySink::new());
    let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 99, 100);
    let source = StaticConfigSource::new()
        .with_property(SystemProperty::new("quota.monitoring").boolean(false));

    let runtime = Runtime::builder()
        .config_source(Arc::new(source))
        .usage_probe(Arc::new(probe))
        .log_sink(sink.clone())
        .build();

    runtime
        .dispatch(
            vec![Record::new("Account").with_field("name", "Acme")],
            Vec::new(),
            Phase::BeforeCreate,
        )
        .unwrap();

    assert!(sink.entries().is_empty());
}

#[test]
fn test_metrics_receive_count_and_snapshot() {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let probe = FixedUsageProbe::new().with_sample(ResourceKind::Queries, 10, 100);

    let runtime = Runtime::builder()
        .usage_probe(Arc::new(probe))
        .metrics_sink(Arc::new(CapturingMetrics {
            recorded: Arc::clone(&recorded),
        }))
        .build();

    runtime
        .dispatch(
            vec![
                Record::new("Account").with_field("name", "A"),
                Record::new("Account").with_field("name", "B"),
            ],
            Vec::new(),
            Phase::AfterCreate,
        )
        .unwrap();

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].record_count, 2);
    assert_eq!(recorded[0].phase, Phase::AfterCreate);
    let queries = recorded[0]
        .snapshot
        .iter()
        .find(|s| s.kind == ResourceKind::Queries)
        .unwrap();
    assert_eq!((queries.used, queries.max), (10, 100));
}
