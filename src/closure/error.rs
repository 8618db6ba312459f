//! Error types for the closure cache
//!
//! The cache performs no I/O, so the only failures it can report are
//! internal inconsistencies. Expected outcomes (unknown identifiers,
//! deleting an edge that was never inserted) are never errors.

use thiserror::Error;

/// Closure cache errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClosureError {
    /// An internal invariant was violated; the structure can no longer be trusted
    #[error("Internal inconsistency: {0}")]
    Inconsistent(String),

    /// A thread panicked while holding the mutation lock
    #[error("Closure cache lock poisoned")]
    LockPoisoned,
}

pub type ClosureResult<T> = Result<T, ClosureError>;

impl<T> From<std::sync::PoisonError<T>> for ClosureError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ClosureError::LockPoisoned
    }
}
