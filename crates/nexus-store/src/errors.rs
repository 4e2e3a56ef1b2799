//! Error types for the persistence core.
//!
//! [`StoreError`] is the primary error type returned by all store
//! operations. Low-level per-line and per-file failures (malformed events,
//! missing log files) are absorbed and logged where they are detected;
//! the variants here are what actually propagates to callers.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error on a log or status file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// `SQLite` cache error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Cache schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// A log line could not be parsed as an event.
    ///
    /// Readers skip malformed lines rather than propagating this; it is
    /// what the skip warning logs.
    #[error("malformed event in {path} at line {line}")]
    MalformedEvent {
        /// Log file containing the bad line.
        path: String,
        /// 1-based line number.
        line: usize,
    },

    /// Requested entity was not found in the cache.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind ("workspace", "conversation", ...).
        kind: &'static str,
        /// Entity ID.
        id: String,
    },

    /// Invalid operation on the store (e.g. updating an immutable state).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Internal error (e.g. poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Shorthand for a [`StoreError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
