//! # session-vault
//!
//! Lightweight server-side session state for request-handling
//! applications.
//!
//! A session is a per-client key/value store addressed by an opaque id
//! carried in a cookie. State lives in a pluggable storage engine; the
//! built-in engine keeps everything in process memory with sliding TTL
//! expiry and a background sweeper.
//!
//! ## Features
//!
//! - **Pluggable storage**: implement [`SessionStorage`] to back
//!   sessions with anything; [`MemoryStorage`] is the default
//! - **Sliding expiry**: every read or write pushes the entry's
//!   deadline forward; a background task evicts what lapses
//! - **Write-through handles**: per-request [`Session`] handles bind
//!   lazily and persist every mutation immediately
//! - **Monotonic ids**: [`Sequence`] hands out process-wide increasing
//!   integers without lock contention
//!
//! ## Quick Start
//!
//! ```no_run
//! use session_vault::{Config, CookieWriter, Session, SessionManager};
//!
//! // The request layer's cookie sink; anything that can queue an
//! // outgoing cookie works.
//! struct ResponseCookies(Vec<(String, String, i64)>);
//!
//! impl CookieWriter for ResponseCookies {
//!     fn set_cookie(&mut self, name: &str, value: &str, max_age: i64) {
//!         self.0.push((name.to_string(), value.to_string(), max_age));
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     session_vault::logging::try_init().ok();
//!
//!     let config = Config::default();
//!     let manager = SessionManager::new(&config);
//!     manager.start_gc();
//!
//!     // Per request: bind a handle to the response's cookie sink.
//!     let mut cookies = ResponseCookies(Vec::new());
//!     let mut session = Session::new(&manager, &mut cookies);
//!     session.set("user", "alice");
//!     assert_eq!(session.get("user"), "alice");
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod logging;
pub mod manager;
pub mod sequence;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SessionVaultError};
pub use handle::{CookieWriter, Session};
pub use manager::SessionManager;
pub use sequence::Sequence;
pub use storage::{MemoryStorage, SessionData, SessionStorage};
