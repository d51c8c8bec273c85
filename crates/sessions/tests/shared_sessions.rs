//! End-to-end behaviour of the accessor over both store backends, with two
//! accessors standing in for two independently deployed services.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use sb_domain::config::MAX_FILE_ID_LEN;
use sb_domain::error::{Error, Result};
use sb_sessions::{
    CasOutcome, FileStore, MemoryStore, SessionAccessor, SessionId, SessionPolicy, SessionRecord,
    SessionStore,
};

fn obj(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

/// Two accessors over two handles on one store directory.
fn two_services(dir: &std::path::Path) -> (SessionAccessor, SessionAccessor) {
    let legacy = SessionAccessor::new(
        Arc::new(FileStore::open(dir).unwrap()),
        SessionPolicy::default(),
    );
    let framework = SessionAccessor::new(
        Arc::new(FileStore::open(dir).unwrap()),
        SessionPolicy::default(),
    );
    (legacy, framework)
}

/// Backend that is down for every operation.
struct FailingStore;

impl SessionStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }
    fn get(&self, _id: &SessionId) -> Result<SessionRecord> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn put(&self, _record: &SessionRecord) -> Result<()> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn delete(&self, _id: &SessionId) -> Result<()> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn compare_and_swap(&self, _record: &SessionRecord, _expected: Option<u64>) -> Result<CasOutcome> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn purge_expired(&self, _cutoff: DateTime<Utc>) -> Result<usize> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
    fn len(&self) -> Result<usize> {
        Err(Error::StoreUnavailable("backend down".into()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cross-service scenario
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn legacy_session_is_changed_by_framework() {
    let tmp = tempfile::tempdir().unwrap();
    let (legacy, framework) = two_services(tmp.path());

    let s1 = legacy.resolve(None).unwrap();
    assert!(s1.is_new);
    assert_eq!(
        Value::Object(s1.record.attributes.clone()),
        json!({"id": 1, "name": "Legacy User"})
    );

    framework
        .set_attributes(s1.id(), &obj(json!({"id": 666, "name": "CHANGED"})))
        .unwrap();

    let seen = legacy.resolve(Some(s1.id().as_str())).unwrap();
    assert!(!seen.is_new);
    assert_eq!(seen.record.id, s1.record.id);
    assert_eq!(
        Value::Object(seen.record.attributes),
        json!({"id": 666, "name": "CHANGED"})
    );
}

#[test]
fn default_initialization_is_visible_in_store() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(tmp.path()).unwrap());
    let acc = SessionAccessor::new(store.clone(), SessionPolicy::default());

    let resolved = acc.resolve(Some("unknown-id")).unwrap();
    let direct = store.get(resolved.id()).unwrap();
    assert_eq!(direct.attributes, resolved.record.attributes);
    assert_eq!(direct.version, resolved.record.version);
}

#[test]
fn repeated_resolve_is_idempotent_on_attributes() {
    let tmp = tempfile::tempdir().unwrap();
    let (legacy, framework) = two_services(tmp.path());

    let first = legacy.resolve(None).unwrap();
    let a = framework.resolve(Some(first.id().as_str())).unwrap();
    let b = framework.resolve(Some(first.id().as_str())).unwrap();
    assert_eq!(a.record.attributes, b.record.attributes);
    assert_eq!(a.record.created_at, b.record.created_at);
    assert!(b.record.last_accessed_at >= a.record.last_accessed_at);
}

#[test]
fn no_cookie_never_reuses_an_existing_id() {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let acc = SessionAccessor::new(store.clone(), SessionPolicy::default());

    let mut ids = std::collections::HashSet::new();
    for _ in 0..1_000 {
        let resolved = acc.resolve(None).unwrap();
        assert!(resolved.is_new);
        assert!(ids.insert(resolved.record.id));
    }
    assert_eq!(store.len().unwrap(), 1_000);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Failure propagation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn oversized_cookie_on_file_store_starts_fresh_session() {
    let tmp = tempfile::tempdir().unwrap();
    let policy = SessionPolicy {
        max_id_len: 1024,
        ..SessionPolicy::default()
    };
    let acc = SessionAccessor::new(Arc::new(FileStore::open(tmp.path()).unwrap()), policy);
    assert_eq!(acc.policy().max_id_len, MAX_FILE_ID_LEN);

    let long = "a".repeat(300);
    let resolved = acc.resolve(Some(&long)).unwrap();
    assert!(resolved.is_new);
    assert_ne!(resolved.id().as_str(), long);

    let longest = "b".repeat(MAX_FILE_ID_LEN);
    let resolved = acc.resolve(Some(&longest)).unwrap();
    assert_eq!(resolved.id().as_str(), longest);
    assert_eq!(acc.get(resolved.id()).unwrap().unwrap().id, resolved.record.id);
}

#[test]
fn unavailable_store_is_never_masked() {
    let acc = SessionAccessor::new(Arc::new(FailingStore), SessionPolicy::default());
    let id = SessionId::generate();

    assert!(matches!(acc.resolve(None), Err(Error::StoreUnavailable(_))));
    assert!(matches!(acc.resolve(Some("abc")), Err(Error::StoreUnavailable(_))));
    assert!(matches!(
        acc.set_attributes(&id, &obj(json!({"x": 1}))),
        Err(Error::StoreUnavailable(_))
    ));
    assert!(matches!(acc.get(&id), Err(Error::StoreUnavailable(_))));
    assert!(matches!(acc.purge_expired(), Err(Error::StoreUnavailable(_))));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Concurrency
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn patient_policy() -> SessionPolicy {
    SessionPolicy {
        max_cas_retries: 10_000,
        ..SessionPolicy::default()
    }
}

/// Every writer adds its own keys; a lost update would drop some of them.
fn hammer(accessors: Vec<Arc<SessionAccessor>>, id: SessionId, writes_per_thread: usize) {
    let handles: Vec<_> = accessors
        .into_iter()
        .enumerate()
        .map(|(t, acc)| {
            let id = id.clone();
            thread::spawn(move || {
                for i in 0..writes_per_thread {
                    let mut partial = Map::new();
                    partial.insert(format!("t{t}_{i}"), Value::from(i));
                    acc.set_attributes(&id, &partial).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn concurrent_writers_lose_no_updates_in_memory() {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let first = Arc::new(SessionAccessor::new(store.clone(), patient_policy()));
    let id = first.resolve(None).unwrap().record.id;

    let accessors = (0..8)
        .map(|_| Arc::new(SessionAccessor::new(store.clone(), patient_policy())))
        .collect();
    hammer(accessors, id.clone(), 50);

    let record = first.get(&id).unwrap().unwrap();
    // 2 default keys + 8 * 50 writer keys.
    assert_eq!(record.attributes.len(), 2 + 8 * 50);
}

#[test]
fn concurrent_writers_through_separate_file_handles() {
    let tmp = tempfile::tempdir().unwrap();
    let accessors: Vec<_> = (0..4)
        .map(|_| {
            Arc::new(SessionAccessor::new(
                Arc::new(FileStore::open(tmp.path()).unwrap()),
                patient_policy(),
            ))
        })
        .collect();
    let id = accessors[0].resolve(None).unwrap().record.id;
    hammer(accessors.clone(), id.clone(), 10);

    let record = accessors[0].get(&id).unwrap().unwrap();
    assert_eq!(record.attributes.len(), 2 + 4 * 10);
}

#[test]
fn concurrent_first_resolve_creates_exactly_once() {
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                let acc = SessionAccessor::new(store, patient_policy());
                acc.resolve(Some("racing-id")).unwrap().is_new
            })
        })
        .collect();
    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|is_new| *is_new)
        .count();
    assert_eq!(created, 1);
    assert_eq!(store.len().unwrap(), 1);
}
