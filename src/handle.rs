//! Per-request session handle.

use tracing::debug;

use crate::manager::SessionManager;
use crate::storage::SessionData;

/// Request-scoped sink for outgoing cookies.
///
/// The session core does not own cookie transport; the surrounding
/// request/response layer implements this to receive the session
/// cookie on first access.
pub trait CookieWriter {
    /// Queue a cookie on the outgoing response.
    ///
    /// `max_age` of `0` means a session-lifetime cookie; the exact
    /// semantics belong to the cookie layer.
    fn set_cookie(&mut self, name: &str, value: &str, max_age: i64);
}

/// A short-lived session handle bound to one request.
///
/// The handle starts unbound: no id, no data. The first
/// [`get`](Session::get), [`set`](Session::set) or
/// [`delete`](Session::delete) binds it, creating an id (and emitting
/// the session cookie) if the request carried none, and loading the
/// stored data. Every mutation writes the full map back through the
/// manager, so the engine's copy stays authoritative; the handle only
/// keeps a transient working copy.
///
/// Handles are created per request and discarded afterward, never
/// reused across requests.
pub struct Session<'a, C: CookieWriter> {
    manager: &'a SessionManager,
    cookies: &'a mut C,
    id: Option<String>,
    data: Option<SessionData>,
}

impl<'a, C: CookieWriter> Session<'a, C> {
    /// Create an unbound handle for a request without a session cookie.
    pub fn new(manager: &'a SessionManager, cookies: &'a mut C) -> Self {
        Self {
            manager,
            cookies,
            id: None,
            data: None,
        }
    }

    /// Create a handle for a request that carried a session id cookie.
    ///
    /// Data is still loaded lazily on first access; an expired or
    /// unknown id simply loads as an empty session.
    pub fn resume(
        manager: &'a SessionManager,
        cookies: &'a mut C,
        id: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            cookies,
            id: Some(id.into()),
            data: None,
        }
    }

    /// The bound session id, if first access has happened (or the
    /// handle was resumed).
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Read a value. Returns an empty string for a missing key; never
    /// an error.
    pub fn get(&mut self, key: &str) -> String {
        self.ensure_init();
        self.data
            .as_ref()
            .and_then(|data| data.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Write a value and persist the full map through the manager.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ensure_init();
        if let (Some(id), Some(data)) = (&self.id, &mut self.data) {
            data.insert(key.into(), value.into());
            self.manager.set(id, data.clone());
        }
    }

    /// Remove a key (other keys are untouched) and persist the full
    /// map through the manager.
    pub fn delete(&mut self, key: &str) {
        self.ensure_init();
        if let (Some(id), Some(data)) = (&self.id, &mut self.data) {
            data.remove(key);
            self.manager.set(id, data.clone());
        }
    }

    /// Bind the handle on first access: obtain an id (emitting the
    /// session cookie for a brand-new session) and load the working
    /// copy.
    fn ensure_init(&mut self) {
        let id = match &self.id {
            Some(id) => id.clone(),
            None => {
                let id = self.manager.create_session_id();
                self.cookies
                    .set_cookie(self.manager.cookie_name(), &id, 0);
                debug!(%id, "session created");
                self.id = Some(id.clone());
                id
            }
        };

        if self.data.is_none() {
            self.data = Some(self.manager.get(&id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    /// Cookie sink that records what the handle emits.
    #[derive(Default)]
    struct RecordedCookies {
        set: Vec<(String, String, i64)>,
    }

    impl CookieWriter for RecordedCookies {
        fn set_cookie(&mut self, name: &str, value: &str, max_age: i64) {
            self.set.push((name.to_string(), value.to_string(), max_age));
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(&Config::default())
    }

    #[test]
    fn test_set_then_get() {
        let manager = manager();
        let mut cookies = RecordedCookies::default();
        let mut session = Session::new(&manager, &mut cookies);

        session.set("user", "alice");
        assert_eq!(session.get("user"), "alice");
    }

    #[test]
    fn test_get_missing_key_is_empty_string() {
        let manager = manager();
        let mut cookies = RecordedCookies::default();
        let mut session = Session::new(&manager, &mut cookies);

        assert_eq!(session.get("never-set"), "");
    }

    #[test]
    fn test_first_access_emits_session_cookie() {
        let manager = manager();
        let mut cookies = RecordedCookies::default();

        let id = {
            let mut session = Session::new(&manager, &mut cookies);
            session.set("a", "1");
            session.get("a");
            session.delete("a");
            session.id().expect("bound after first access").to_string()
        };

        // One cookie, carrying the configured name and the new id.
        assert_eq!(cookies.set.len(), 1);
        let (name, value, max_age) = &cookies.set[0];
        assert_eq!(name, manager.cookie_name());
        assert_eq!(value, &id);
        assert_eq!(*max_age, 0);
    }

    #[test]
    fn test_resume_does_not_emit_cookie() {
        let manager = manager();
        let mut cookies = RecordedCookies::default();
        let mut session = Session::resume(&manager, &mut cookies, "sess-known");

        session.set("a", "1");
        assert_eq!(session.id(), Some("sess-known"));
        assert!(cookies.set.is_empty());
    }

    #[test]
    fn test_delete_removes_only_that_key() {
        let manager = manager();
        let mut cookies = RecordedCookies::default();
        let mut session = Session::new(&manager, &mut cookies);

        session.set("a", "1");
        session.set("b", "2");
        session.delete("a");

        assert_eq!(session.get("a"), "");
        assert_eq!(session.get("b"), "2");
    }

    #[test]
    fn test_write_through_visible_to_next_request() {
        let manager = manager();

        let id = {
            let mut cookies = RecordedCookies::default();
            let mut session = Session::new(&manager, &mut cookies);
            session.set("user", "alice");
            session.id().expect("bound").to_string()
        };

        // A later request resumes from the cookie id and sees the data.
        let mut cookies = RecordedCookies::default();
        let mut next = Session::resume(&manager, &mut cookies, id);
        assert_eq!(next.get("user"), "alice");
    }

    #[test]
    fn test_resume_unknown_id_loads_empty_session() {
        let manager = manager();
        let mut cookies = RecordedCookies::default();
        let mut session = Session::resume(&manager, &mut cookies, "sess-expired");

        assert_eq!(session.get("anything"), "");
    }
}
