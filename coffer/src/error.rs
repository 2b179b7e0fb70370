//! Error types for the coffer store

use thiserror::Error;

/// Errors surfaced by store operations.
///
/// Every failure is returned to the immediate caller; nothing is retried
/// internally. Lock timeouts and decode failures are terminal for the call
/// that hit them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// DDL failed while creating a type table or its index, or the type name
    /// is not safe to splice into DDL.
    #[error("schema setup failed: {0}")]
    Schema(String),

    /// The engine rejected the parameter list at bind time.
    #[error("parameter binding failed: {0}")]
    Bind(String),

    /// A dynamically supplied parameter was not text, a 32-bit integer, or
    /// a byte sequence. Never coerced.
    #[error("unsupported parameter kind: {0}")]
    UnsupportedParameter(&'static str),

    /// A `$field` marker token was malformed, or the filter text embedded a
    /// LIMIT keyword.
    #[error("invalid filter expression: {0}")]
    InvalidFilter(String),

    #[error("SQLite error: {0}")]
    Engine(rusqlite::Error),

    /// Stored bytes do not decode into the requested type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A document could not be encoded for storage.
    #[error("encode error: {0}")]
    Encode(serde_json::Error),

    /// A contending write exceeded the busy timeout.
    #[error("database is locked: write contention exceeded the busy timeout")]
    LockTimeout,

    /// begin/commit/rollback called out of sequence.
    #[error("transaction state error: {0}")]
    TransactionState(&'static str),

    /// A migration transform rejected a row; the migration was aborted.
    #[error("migration aborted: {0}")]
    Migration(anyhow::Error),

    /// The blocking task running the statement could not be joined.
    #[error("task join error: {0}")]
    Task(String),

    /// The platform application-data directory could not be resolved.
    #[error("could not resolve the application data directory")]
    DataDir,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(e.code, rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) =>
            {
                StoreError::LockTimeout
            }
            rusqlite::Error::InvalidParameterCount(got, expected) => {
                StoreError::Bind(format!("statement expects {expected} parameters, got {got}"))
            }
            other => StoreError::Engine(other),
        }
    }
}
