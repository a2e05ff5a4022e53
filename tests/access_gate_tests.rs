/// Access gate tests
///
/// Existence-level and field-level enforcement, visibility selection and
/// aggregate failure logging in front of the record store.
/// Run with: cargo test --test access_gate_tests
use std::sync::{Arc, Mutex};

use rusthookflow::{
    FieldPermissions, HookError, LogLevel, MemorySink, MemoryStore, ObjectPermissions, Principal,
    Record, RecordStore, Runtime, SaveOutcome, StaticConfigSource, SystemProperty, Visibility,
};

/// Records every call so tests can assert the store was never reached.
struct CountingStore {
    calls: Arc<Mutex<Vec<(&'static str, Visibility)>>>,
    inner: MemoryStore,
}

impl CountingStore {
    fn new() -> (Self, Arc<Mutex<Vec<(&'static str, Visibility)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: Arc::clone(&calls),
                inner: MemoryStore::new(),
            },
            calls,
        )
    }
}

impl RecordStore for CountingStore {
    fn insert(&self, records: &[Record], visibility: Visibility) -> Vec<SaveOutcome> {
        self.calls.lock().unwrap().push(("insert", visibility));
        self.inner.insert(records, visibility)
    }

    fn update(&self, records: &[Record], visibility: Visibility) -> Vec<SaveOutcome> {
        self.calls.lock().unwrap().push(("update", visibility));
        self.inner.update(records, visibility)
    }

    fn delete(&self, records: &[Record], visibility: Visibility) -> Vec<SaveOutcome> {
        self.calls.lock().unwrap().push(("delete", visibility));
        self.inner.delete(records, visibility)
    }
}

fn writer_principal() -> Principal {
    Principal::new("user-1")
        .with_object("Account", ObjectPermissions::full())
        .with_field("Account", "name", FieldPermissions::full())
        .with_field("Account", "phone", FieldPermissions {
            create: true,
            read: true,
            update: false,
        })
}

#[test]
fn test_field_denial_happens_before_any_write() {
    let (store, calls) = CountingStore::new();
    let runtime = Runtime::builder()
        .principal(writer_principal())
        .record_store(Arc::new(store))
        .build();
    let gate = runtime.gate();

    // "phone" is creatable but not updatable for this principal.
    let batch = vec![
        Record::new("Account").with_id("001").with_field("name", "A"),
        Record::new("Account").with_id("002").with_field("phone", "555"),
    ];
    let err = gate.update_records(&batch).unwrap_err();

    match err {
        HookError::AccessDenied(message) => assert!(message.contains("'phone'")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(calls.lock().unwrap().is_empty(), "store must never be called");
}

#[test]
fn test_existence_denial_happens_before_any_write() {
    let (store, calls) = CountingStore::new();
    let runtime = Runtime::builder()
        .principal(Principal::new("user-1").with_object("Account", ObjectPermissions::read_only()))
        .record_store(Arc::new(store))
        .build();

    let err = runtime
        .gate()
        .delete_records(&[Record::new("Account").with_id("001")])
        .unwrap_err();

    assert!(matches!(err, HookError::AccessDenied(_)));
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_writes_run_elevated_by_default() {
    let (store, calls) = CountingStore::new();
    let runtime = Runtime::builder()
        .principal(writer_principal())
        .record_store(Arc::new(store))
        .build();

    runtime
        .gate()
        .insert_records(&[Record::new("Account").with_field("name", "Acme")])
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![("insert", Visibility::Elevated)]);
}

#[test]
fn test_sharing_enforcement_restricts_visibility() {
    let (store, calls) = CountingStore::new();
    let source = StaticConfigSource::new()
        .with_property(SystemProperty::new("access.sharing.Account").boolean(true));
    let runtime = Runtime::builder()
        .config_source(Arc::new(source))
        .principal(writer_principal())
        .record_store(Arc::new(store))
        .build();

    runtime
        .gate()
        .insert_records(&[Record::new("Account").with_field("name", "Acme")])
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![("insert", Visibility::Restricted)]);
}

#[test]
fn test_object_check_override_disables_existence_check() {
    let (store, calls) = CountingStore::new();
    let source = StaticConfigSource::new()
        .with_property(SystemProperty::new("access.object_check.Account").boolean(false))
        .with_property(SystemProperty::new("access.field_check.Account").boolean(false));
    let runtime = Runtime::builder()
        .config_source(Arc::new(source))
        .principal(Principal::new("nobody"))
        .record_store(Arc::new(store))
        .build();

    let outcomes = runtime
        .gate()
        .insert_records(&[Record::new("Account").with_field("name", "Acme")])
        .unwrap();

    assert!(outcomes[0].success);
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn test_partial_failures_are_logged_in_aggregate() {
    let sink = Arc::new(MemorySink::new());
    let runtime = Runtime::builder().log_sink(sink.clone()).build();
    let gate = runtime.gate();

    gate.insert_records(&[Record::new("Account").with_id("001").with_field("name", "A")])
        .unwrap();
    let outcomes = gate
        .update_records(&[
            Record::new("Account").with_id("999").with_field("name", "X"),
            Record::new("Account").with_id("001").with_field("name", "B"),
            Record::new("Account").with_id("998").with_field("name", "Y"),
        ])
        .unwrap();

    assert!(!outcomes[0].success);
    assert!(outcomes[1].success);
    assert!(!outcomes[2].success);

    let warnings = sink.entries_at(LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("update on Account"));
    assert!(warnings[0].message.contains("0: NOT_FOUND - Record '999' does not exist"));
    assert!(warnings[0].message.contains("2: NOT_FOUND - Record '998' does not exist"));
}

#[test]
fn test_empty_batches_return_empty_results() {
    let (store, calls) = CountingStore::new();
    let runtime = Runtime::builder()
        .principal(Principal::new("nobody"))
        .record_store(Arc::new(store))
        .build();
    let gate = runtime.gate();

    assert!(gate.insert_records(&[]).unwrap().is_empty());
    assert!(gate.update_records(&[]).unwrap().is_empty());
    assert!(gate.delete_records(&[]).unwrap().is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_elevated_principal_bypasses_field_checks() {
    let runtime = Runtime::builder().build();

    let outcomes = runtime
        .gate()
        .insert_records(&[Record::new("Account")
            .with_field("name", "Acme")
            .with_field("anything", "goes")])
        .unwrap();

    assert!(outcomes[0].success);
}
