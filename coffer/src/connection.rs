//! Single-connection boundary around rusqlite

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Bounded wait before a contending write fails with
/// [`StoreError::LockTimeout`].
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Where the database lives.
#[derive(Clone, Debug)]
pub enum StoreConfig {
    /// File-based database
    File(PathBuf),
    /// In-memory database (for testing)
    Memory,
}

/// The serialized connection owned by a store handle.
///
/// rusqlite connections are not Sync, so the connection lives behind a mutex
/// and every statement runs inside spawn_blocking while the lock is held.
/// Two statements against the same connection can never interleave.
#[derive(Clone)]
pub struct StoreConnection {
    inner: Arc<Mutex<Connection>>,
}

impl StoreConnection {
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = match config {
            StoreConfig::File(path) => Connection::open(path)?,
            StoreConfig::Memory => Connection::open_in_memory()?,
        };

        // WAL lets readers on other connections proceed while a writer holds
        // the lock; the busy timeout bounds how long a contending writer
        // waits before failing. Both are idempotent across reopens.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Self { inner: Arc::new(Mutex::new(conn)) })
    }

    /// Execute a function with the connection
    ///
    /// This acquires the mutex lock and runs the provided closure with the
    /// connection. The closure is executed within spawn_blocking since
    /// rusqlite operations are synchronous.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
