//! Session manager: the single owner of the registered storage engine.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::storage::{MemoryStorage, SessionData, SessionStorage};

/// Mediates between per-request [`Session`](crate::Session) handles and
/// the storage engine.
///
/// Exactly one engine is active at a time. Registration hands the
/// engine the configured time-to-live via [`SessionStorage::init`];
/// registering another engine replaces the first entirely, including
/// its background gc task.
pub struct SessionManager {
    cookie_name: String,
    ttl: Duration,
    storage: RwLock<Arc<dyn SessionStorage>>,
    gc_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    /// Create a manager backed by the default in-memory engine, with
    /// the sweep cadence taken from `config`.
    pub fn new(config: &Config) -> Self {
        let storage = MemoryStorage::new().with_sweep_interval(config.gc_interval());
        Self::with_storage(config, Arc::new(storage))
    }

    /// Create a manager backed by a custom engine.
    pub fn with_storage(config: &Config, storage: Arc<dyn SessionStorage>) -> Self {
        storage.init(config.ttl());
        Self {
            cookie_name: config.session.cookie_name.clone(),
            ttl: config.ttl(),
            storage: RwLock::new(storage),
            gc_task: Mutex::new(None),
        }
    }

    /// Replace the active storage engine.
    ///
    /// The new engine is initialized with the configured time-to-live.
    /// If a gc task was running for the previous engine it is stopped
    /// and a fresh one is spawned for the replacement, so re-registering
    /// never leaks a sweeper against a retired engine.
    pub fn register_storage(&self, storage: Arc<dyn SessionStorage>) {
        storage.init(self.ttl);
        {
            let mut active = self.write_storage();
            *active = storage;
        }
        info!("session storage engine replaced");

        let mut slot = self.lock_gc_task();
        if let Some(old) = slot.take() {
            old.abort();
            *slot = Some(self.spawn_gc());
        }
    }

    /// Spawn the background gc loop for the active engine.
    ///
    /// Call once at process bring-up. Calling again replaces the
    /// running task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start_gc(&self) {
        let mut slot = self.lock_gc_task();
        if let Some(old) = slot.replace(self.spawn_gc()) {
            old.abort();
        }
        debug!("session gc started");
    }

    /// Stop the background gc loop, if one is running.
    pub fn stop_gc(&self) {
        if let Some(task) = self.lock_gc_task().take() {
            task.abort();
        }
    }

    /// Ask the active engine for a fresh session id.
    pub fn create_session_id(&self) -> String {
        self.storage().create_session_id()
    }

    /// Persist the full data map for `id`.
    pub fn set(&self, id: &str, data: SessionData) {
        self.storage().set(id, data);
    }

    /// Load the data map for `id`; empty if unknown or expired.
    pub fn get(&self, id: &str) -> SessionData {
        self.storage().get(id)
    }

    /// Drop the entry for `id`.
    pub fn delete(&self, id: &str) {
        self.storage().delete(id);
    }

    /// Name of the cookie carrying the session id.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// The configured session time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn spawn_gc(&self) -> JoinHandle<()> {
        let storage = self.storage();
        tokio::spawn(async move { storage.gc().await })
    }

    fn storage(&self) -> Arc<dyn SessionStorage> {
        Arc::clone(&self.storage.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write_storage(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, Arc<dyn SessionStorage>> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_gc_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.gc_task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop_gc();
    }
}
