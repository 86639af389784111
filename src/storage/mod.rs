//! Pluggable session storage.
//!
//! The [`SessionStorage`] trait is the only contract a custom backend
//! must satisfy to replace the built-in [`MemoryStorage`] engine, e.g.
//! to keep session state in a shared external store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

mod memory;

pub use memory::MemoryStorage;

/// Per-session key/value data.
pub type SessionData = HashMap<String, String>;

/// Capability contract for session storage backends.
///
/// A backend owns the authoritative id → data mapping and all expiry
/// bookkeeping. Lookups are non-raising: an unknown or expired id reads
/// as an empty map, never an error.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Idempotent setup with the process-configured time-to-live.
    ///
    /// Must be safe to call multiple times; only the first call takes
    /// effect. The [`SessionManager`](crate::SessionManager) calls this
    /// on registration.
    fn init(&self, ttl: Duration);

    /// Periodically remove expired entries.
    ///
    /// This entry point never returns under normal operation; callers
    /// are expected to drive it from a dedicated background task,
    /// spawned once per registered engine.
    async fn gc(&self);

    /// Produce a fresh, effectively-unique session id.
    fn create_session_id(&self) -> String;

    /// Persist or replace the full data map for `id`, refreshing its
    /// expiry.
    fn set(&self, id: &str, data: SessionData);

    /// Return the data map for `id` if present and not expired,
    /// refreshing its expiry as a side effect (sliding expiry).
    ///
    /// Returns an empty map if the id is unknown or expired.
    fn get(&self, id: &str) -> SessionData;

    /// Remove the entry for `id`. A no-op if absent.
    fn delete(&self, id: &str);
}
