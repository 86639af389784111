//! Error types for session-vault.

use thiserror::Error;

/// Main error type for session-vault operations.
///
/// Session lookups are deliberately non-raising: a missing key reads as
/// an empty string and a missing or expired session loads as an empty
/// map. This type only covers the few operations that can genuinely
/// fail.
#[derive(Error, Debug)]
pub enum SessionVaultError {
    /// The identifier sequence has been closed; no further ids will be
    /// produced.
    #[error("identifier sequence closed")]
    SequenceClosed,
}

/// Convenience Result type for session-vault operations.
pub type Result<T> = std::result::Result<T, SessionVaultError>;
