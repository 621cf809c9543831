use std::time::Duration;
use thiserror::Error;

/// Failure at the persistence boundary.
///
/// Backends map their native errors onto these kinds so callers can tell a
/// broken connection from a rejected write without depending on the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The store could not be reached (pool closed, file missing, I/O).
    #[error("storage unavailable: {0}")]
    Connection(String),

    /// A statement failed to execute.
    #[error("query failed: {0}")]
    Query(String),

    /// A constraint rejected the write (foreign key, check, unique).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row could not be mapped back into a domain type.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// The call did not complete in time.
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    /// Whether retrying on the next cycle can reasonably succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}
