//! Session lifecycle integration tests.
//!
//! These tests drive the full path a request handler would: manager,
//! storage engine with its background sweeper, and per-request handles
//! writing through to storage.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use session_vault::{
    Config, CookieWriter, MemoryStorage, Session, SessionData, SessionManager, SessionStorage,
};

/// Cookie sink standing in for the response object of a web layer.
#[derive(Default)]
struct CookieJar {
    set: Vec<(String, String, i64)>,
}

impl CookieWriter for CookieJar {
    fn set_cookie(&mut self, name: &str, value: &str, max_age: i64) {
        self.set.push((name.to_string(), value.to_string(), max_age));
    }
}

/// Build a manager whose engine expires and sweeps quickly.
fn fast_expiry_manager(ttl: Duration, sweep: Duration) -> SessionManager {
    let storage = Arc::new(MemoryStorage::new().with_sweep_interval(sweep));
    storage.init(ttl);
    SessionManager::with_storage(&Config::default(), storage)
}

// ============================================================================
// Handle round trips
// ============================================================================

#[tokio::test]
async fn test_state_survives_across_requests() {
    let manager = SessionManager::new(&Config::default());

    // First request: no cookie, session created.
    let mut jar = CookieJar::default();
    let id = {
        let mut session = Session::new(&manager, &mut jar);
        session.set("user", "alice");
        session.set("theme", "dark");
        session.id().expect("bound").to_string()
    };

    assert_eq!(jar.set.len(), 1);
    assert_eq!(jar.set[0].1, id);

    // Second request: cookie comes back, data is there, no new cookie.
    let mut jar = CookieJar::default();
    {
        let mut session = Session::resume(&manager, &mut jar, id.clone());
        assert_eq!(session.get("user"), "alice");
        assert_eq!(session.get("theme"), "dark");
        session.delete("theme");
    }
    assert!(jar.set.is_empty());

    // Third request: the deletion is seen, other keys are untouched.
    let mut jar = CookieJar::default();
    let mut session = Session::resume(&manager, &mut jar, id);
    assert_eq!(session.get("theme"), "");
    assert_eq!(session.get("user"), "alice");
}

#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let manager = Arc::new(SessionManager::new(&Config::default()));
    let mut handles = Vec::new();

    for i in 0..16 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::task::spawn_blocking(move || {
            let id = format!("sess-client-{}", i);
            let mut jar = CookieJar::default();
            let mut session = Session::resume(&manager, &mut jar, id.clone());
            session.set("n", i.to_string());
            (id, i)
        }));
    }

    for handle in handles {
        let (id, i) = handle.await.unwrap();
        assert_eq!(
            manager.get(&id).get("n").map(String::as_str),
            Some(i.to_string().as_str())
        );
    }
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test]
async fn test_idle_session_expires_and_is_swept() {
    let manager = fast_expiry_manager(Duration::from_millis(100), Duration::from_millis(25));
    manager.start_gc();

    let mut jar = CookieJar::default();
    let id = {
        let mut session = Session::new(&manager, &mut jar);
        session.set("user", "alice");
        session.id().expect("bound").to_string()
    };

    // Idle well past the ttl, no access in between.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut jar = CookieJar::default();
    let mut session = Session::resume(&manager, &mut jar, id);
    assert_eq!(session.get("user"), "");

    manager.stop_gc();
}

#[tokio::test]
async fn test_active_session_outlives_ttl() {
    let manager = fast_expiry_manager(Duration::from_millis(200), Duration::from_millis(25));
    manager.start_gc();

    let mut jar = CookieJar::default();
    let id = {
        let mut session = Session::new(&manager, &mut jar);
        session.set("user", "alice");
        session.id().expect("bound").to_string()
    };

    // Keep touching inside the window; total elapsed exceeds the ttl
    // several times over.
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let mut jar = CookieJar::default();
        let mut session = Session::resume(&manager, &mut jar, id.clone());
        assert_eq!(session.get("user"), "alice", "sliding expiry must hold");
    }

    manager.stop_gc();
}

// ============================================================================
// Custom storage backends
// ============================================================================

/// Minimal external backend: never expires anything, counts calls.
#[derive(Default)]
struct CountingStorage {
    init_ttls: Mutex<Vec<Duration>>,
    map: RwLock<std::collections::HashMap<String, SessionData>>,
    ids_issued: Mutex<u64>,
}

#[async_trait]
impl SessionStorage for CountingStorage {
    fn init(&self, ttl: Duration) {
        self.init_ttls.lock().unwrap().push(ttl);
    }

    async fn gc(&self) {
        std::future::pending::<()>().await;
    }

    fn create_session_id(&self) -> String {
        let mut issued = self.ids_issued.lock().unwrap();
        *issued += 1;
        format!("ext-{}", issued)
    }

    fn set(&self, id: &str, data: SessionData) {
        self.map.write().unwrap().insert(id.to_string(), data);
    }

    fn get(&self, id: &str) -> SessionData {
        self.map
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn delete(&self, id: &str) {
        self.map.write().unwrap().remove(id);
    }
}

#[tokio::test]
async fn test_custom_backend_registered_before_activity() {
    let mut config = Config::default();
    config.session.ttl_secs = 42;

    let manager = SessionManager::new(&config);
    let backend = Arc::new(CountingStorage::default());
    manager.register_storage(Arc::clone(&backend) as Arc<dyn SessionStorage>);

    // init received the configured ttl, exactly once for this backend.
    assert_eq!(
        backend.init_ttls.lock().unwrap().as_slice(),
        &[Duration::from_secs(42)]
    );

    // Session traffic lands in the custom backend.
    let mut jar = CookieJar::default();
    let mut session = Session::new(&manager, &mut jar);
    session.set("k", "v");

    assert_eq!(session.id(), Some("ext-1"));
    assert!(backend.map.read().unwrap().contains_key("ext-1"));
}

#[tokio::test]
async fn test_only_last_registered_backend_is_active() {
    let manager = SessionManager::new(&Config::default());
    let first = Arc::new(CountingStorage::default());
    let second = Arc::new(CountingStorage::default());

    manager.register_storage(Arc::clone(&first) as Arc<dyn SessionStorage>);
    manager.register_storage(Arc::clone(&second) as Arc<dyn SessionStorage>);

    let mut jar = CookieJar::default();
    let mut session = Session::new(&manager, &mut jar);
    session.set("k", "v");

    assert_eq!(*first.ids_issued.lock().unwrap(), 0);
    assert_eq!(*second.ids_issued.lock().unwrap(), 1);
}
