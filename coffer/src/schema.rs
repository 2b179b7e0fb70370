//! Lazy per-type schema management

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use rusqlite::Connection;
use tracing::debug;

use crate::connection::StoreConnection;
use crate::error::StoreError;

/// Tracks which type tables are known to exist, creating them on first use.
///
/// The cache is a coarse invariant: it assumes tables are never dropped
/// out-of-band while the process runs.
#[derive(Clone, Default)]
pub struct SchemaManager {
    known: Arc<RwLock<HashSet<String>>>,
}

impl SchemaManager {
    pub fn new() -> Self { Self::default() }

    /// Check if a type name is safe to splice into DDL
    pub fn sane_name(name: &str) -> bool {
        !name.is_empty()
            && name.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':'))
    }

    /// Make sure the table and uniqueness index for `type_name` exist.
    ///
    /// Idempotent. The guarded DDL means two concurrent callers never race
    /// into a "table already exists" failure.
    pub async fn ensure_table(&self, conn: &StoreConnection, type_name: &str) -> Result<(), StoreError> {
        if !Self::sane_name(type_name) {
            return Err(StoreError::Schema(format!("invalid type name: {type_name:?}")));
        }

        {
            let known = self.known.read().expect("RwLock poisoned");
            if known.contains(type_name) {
                return Ok(());
            }
        }

        let name = type_name.to_owned();
        // DDL run inside an open transaction is undone by a rollback, so the
        // name only enters the cache once the connection is back in
        // autocommit, i.e. the CREATE TABLE has actually committed.
        let committed = conn
            .with_connection(move |c| {
                create_type_table(c, &name)?;
                Ok(c.is_autocommit())
            })
            .await?;

        if committed {
            let mut known = self.known.write().expect("RwLock poisoned");
            known.insert(type_name.to_owned());
        }
        Ok(())
    }
}

fn create_type_table(conn: &Connection, type_name: &str) -> Result<(), StoreError> {
    let query = format!(
        r#"CREATE TABLE IF NOT EXISTS "{0}"(
            "id" TEXT PRIMARY KEY NOT NULL,
            "value" BLOB
        )"#,
        type_name
    );
    debug!("Creating type table: {}", query);
    conn.execute(&query, []).map_err(ddl_error)?;

    // If this fails the bare table is left behind; accepted, not repaired.
    let index_query = format!(r#"CREATE UNIQUE INDEX IF NOT EXISTS "{0}Index" ON "{0}"("id")"#, type_name);
    conn.execute(&index_query, []).map_err(ddl_error)?;

    Ok(())
}

fn ddl_error(err: rusqlite::Error) -> StoreError { StoreError::Schema(err.to_string()) }
