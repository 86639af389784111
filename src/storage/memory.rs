//! Default in-memory storage engine.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::{SessionData, SessionStorage};

/// Time-to-live applied if the engine is used without `init`.
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 15);

/// Default pause between expiry sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// One stored session: its data plus the absolute expiry deadline.
#[derive(Debug, Clone)]
struct Entry {
    expires_at: Instant,
    data: SessionData,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-process session storage with sliding TTL expiry.
///
/// Entries live in a single `RwLock`-guarded map, so the
/// read-refresh-write in [`SessionStorage::get`], the full replace in
/// [`SessionStorage::set`], deletion, and the sweep are each atomic
/// with respect to concurrent request handlers.
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: OnceLock<Duration>,
    sweep_interval: Duration,
}

impl MemoryStorage {
    /// Create a new empty engine with the default sweep cadence.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: OnceLock::new(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Set a custom pause between sweeps.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    fn ttl(&self) -> Duration {
        self.ttl.get().copied().unwrap_or(DEFAULT_TTL)
    }

    /// Remove every expired entry, returning how many were evicted.
    ///
    /// This is the single pass the [`SessionStorage::gc`] loop runs on
    /// each tick; it is exposed so eviction can be exercised without
    /// driving the loop.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write_entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the engine holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry for `id` is physically present, expired or not.
    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    // A poisoned lock only means another handler panicked mid-access;
    // the map itself is still usable, so recover rather than raise.
    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    fn init(&self, ttl: Duration) {
        // First call wins; re-registration keeps the original ttl.
        let _ = self.ttl.set(ttl);
    }

    async fn gc(&self) {
        let mut ticker = tokio::time::interval(self.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = self.sweep();
            if evicted > 0 {
                debug!(evicted, "evicted expired sessions");
            }
        }
    }

    /// Tagged concatenation of the current Unix second and nanosecond
    /// component. Collisions are extremely unlikely within one process,
    /// but the id carries no cryptographic unpredictability; supply a
    /// custom backend if ids must be unguessable.
    fn create_session_id(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        format!("sess-{}{}", now.as_secs(), now.subsec_nanos())
    }

    fn set(&self, id: &str, data: SessionData) {
        let expires_at = Instant::now() + self.ttl();
        let mut entries = self.write_entries();
        entries.insert(id.to_string(), Entry { expires_at, data });
    }

    fn get(&self, id: &str) -> SessionData {
        let now = Instant::now();
        let mut entries = self.write_entries();
        match entries.get_mut(id) {
            Some(entry) if !entry.is_expired(now) => {
                // A hit is also a touch: the expiry window slides
                // forward from the access time.
                entry.expires_at = now + self.ttl();
                entry.data.clone()
            }
            _ => {
                trace!(id, "session miss");
                SessionData::new()
            }
        }
    }

    fn delete(&self, id: &str) {
        let mut entries = self.write_entries();
        entries.remove(id);
    }
}
