//! The store handle and its public operations

use std::path::{Path, PathBuf};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::debug;

use crate::connection::{StoreConfig, StoreConnection};
use crate::document::{Document, RawDocument};
use crate::error::StoreError;
use crate::schema::SchemaManager;
use crate::sql_builder;
use crate::value::Param;

/// Options for a query-many operation.
///
/// ```rust,ignore
/// let cheap: Vec<Car> = store
///     .objects(Query::new().filter("$kmt < ?").bind(50_000).limit(10))
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    filter: Option<String>,
    params: Vec<Param>,
    order_by: Option<String>,
    limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self { Self::default() }

    /// Filter expression; `$field` tokens reference fields inside the
    /// stored document, `?` placeholders bind positionally.
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    /// Append a positional parameter for the next `?` placeholder.
    pub fn bind(mut self, param: impl Into<Param>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Order-by expression; defaults to the identifier, ascending.
    pub fn order_by(mut self, expr: impl Into<String>) -> Self {
        self.order_by = Some(expr.into());
        self
    }

    /// Maximum number of rows to return.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A typed document store bound to one SQLite database file.
///
/// The handle owns a single connection and serializes every statement
/// through it. Clones share the connection (and therefore its transaction
/// state); open a second handle for an independent connection.
#[derive(Clone)]
pub struct Coffer {
    conn: StoreConnection,
    schema: SchemaManager,
}

impl Coffer {
    /// Open (creating if necessary) the store named `name` in the platform
    /// application-data directory.
    pub fn open(name: &str) -> Result<Self, StoreError> { Self::open_path(Self::db_path(name)?) }

    /// Open a database file at an explicit path.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_config(StoreConfig::File(path.as_ref().to_path_buf()))
    }

    /// Open an in-memory database (for testing). In-memory databases are
    /// private to their connection, so cross-handle contention needs a file.
    pub fn open_in_memory() -> Result<Self, StoreError> { Self::with_config(StoreConfig::Memory) }

    fn with_config(config: StoreConfig) -> Result<Self, StoreError> {
        Ok(Self { conn: StoreConnection::open(&config)?, schema: SchemaManager::new() })
    }

    /// Resolve the database file path for a store name.
    pub fn db_path(name: &str) -> Result<PathBuf, StoreError> {
        let dir = dirs::data_dir().ok_or(StoreError::DataDir)?;
        Ok(dir.join(format!("{name}.sqlite3")))
    }

    /// Upsert a document by its identifier into its type's table.
    ///
    /// A single statement: it either fully replaces the prior value or
    /// fails, never a partial write.
    pub async fn save<T: Document>(&self, object: &T) -> Result<(), StoreError> {
        let type_name = T::type_name();
        self.schema.ensure_table(&self.conn, type_name).await?;

        let id = object.id().to_owned();
        let encoded = serde_json::to_string(object).map_err(StoreError::Encode)?;
        let sql = format!(
            r#"INSERT INTO "{type_name}"("id", "value") VALUES (?, jsonb(?))
               ON CONFLICT("id") DO UPDATE SET "value" = excluded."value""#
        );

        self.conn
            .with_connection(move |c| {
                c.execute(&sql, params![id, encoded])?;
                Ok(())
            })
            .await
    }

    /// Fetch a document by identifier; `Ok(None)` when absent.
    pub async fn object<T: Document>(&self, id: &str) -> Result<Option<T>, StoreError> {
        let type_name = T::type_name();
        self.schema.ensure_table(&self.conn, type_name).await?;

        let sql = format!(r#"SELECT json("value") FROM "{type_name}" WHERE "id" = ?"#);
        let id = id.to_owned();
        let encoded: Option<String> =
            self.conn.with_connection(move |c| Ok(c.query_row(&sql, [&id], |row| row.get(0)).optional()?)).await?;

        match encoded {
            Some(encoded) => Ok(Some(serde_json::from_str(&encoded)?)),
            None => Ok(None),
        }
    }

    /// Fetch every document of a type matching `query`, decoding each row.
    ///
    /// A row that fails to decode aborts the whole call with
    /// [`StoreError::Decode`]; it is never silently skipped.
    pub async fn objects<T: Document>(&self, query: Query) -> Result<Vec<T>, StoreError> {
        let type_name = T::type_name();
        self.schema.ensure_table(&self.conn, type_name).await?;

        let sql = sql_builder::build_select(type_name, query.filter.as_deref(), query.order_by.as_deref(), query.limit)?;
        debug!("objects SQL: {} with {} params", sql, query.params.len());

        let values: Vec<rusqlite::types::Value> = query.params.iter().map(Param::to_sql).collect();
        let rows: Vec<String> = self
            .conn
            .with_connection(move |c| {
                let mut stmt = c.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?;

                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await?;

        rows.iter().map(|encoded| serde_json::from_str(encoded).map_err(StoreError::from)).collect()
    }

    /// Identifier range scan: rows with `start_id <= id < end_id`, in
    /// identifier order. Either bound may be omitted.
    pub async fn objects_between<T: Document>(
        &self,
        start_id: Option<&str>,
        end_id: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<T>, StoreError> {
        let mut query = match (start_id, end_id) {
            (Some(start), Some(end)) => Query::new().filter("id >= ? and id < ?").bind(start).bind(end),
            (Some(start), None) => Query::new().filter("id >= ?").bind(start),
            (None, Some(end)) => Query::new().filter("id < ?").bind(end),
            (None, None) => Query::new(),
        };
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.objects(query).await
    }

    /// Delete a document by identifier. Deleting an absent id is not an
    /// error.
    pub async fn remove<T: Document>(&self, id: &str) -> Result<(), StoreError> {
        let type_name = T::type_name();
        self.schema.ensure_table(&self.conn, type_name).await?;

        let sql = format!(r#"DELETE FROM "{type_name}" WHERE "id" = ?"#);
        let id = id.to_owned();
        self.conn
            .with_connection(move |c| {
                c.execute(&sql, [&id])?;
                Ok(())
            })
            .await
    }

    /// Delete every document of a type. A never-before-seen type gets its
    /// table created empty first, so this never errors on missing tables.
    pub async fn remove_all<T: Document>(&self) -> Result<(), StoreError> {
        let type_name = T::type_name();
        self.schema.ensure_table(&self.conn, type_name).await?;

        let sql = format!(r#"DELETE FROM "{type_name}""#);
        self.conn
            .with_connection(move |c| {
                c.execute(&sql, [])?;
                Ok(())
            })
            .await
    }

    /// Begin an exclusive transaction spanning subsequent calls on this
    /// handle.
    ///
    /// While open, writers on other connections block up to the busy
    /// timeout, then fail with [`StoreError::LockTimeout`]. Nesting is not
    /// supported; a failure inside the transaction does not auto-rollback.
    pub async fn begin_transaction(&self) -> Result<(), StoreError> {
        self.conn
            .with_connection(|c| {
                if !c.is_autocommit() {
                    return Err(StoreError::TransactionState("begin called while a transaction is already open"));
                }
                c.execute_batch("BEGIN EXCLUSIVE TRANSACTION")?;
                Ok(())
            })
            .await
    }

    /// Commit the open transaction. Calling this with no open transaction is
    /// a programming error.
    pub async fn commit_transaction(&self) -> Result<(), StoreError> {
        self.conn
            .with_connection(|c| {
                if c.is_autocommit() {
                    return Err(StoreError::TransactionState("commit called with no open transaction"));
                }
                c.execute_batch("COMMIT TRANSACTION")?;
                Ok(())
            })
            .await
    }

    /// Roll back the open transaction. Calling this with no open transaction
    /// is a programming error.
    pub async fn rollback_transaction(&self) -> Result<(), StoreError> {
        self.conn
            .with_connection(|c| {
                if c.is_autocommit() {
                    return Err(StoreError::TransactionState("rollback called with no open transaction"));
                }
                c.execute_batch("ROLLBACK TRANSACTION")?;
                Ok(())
            })
            .await
    }

    /// Rewrite every stored row of a type through `transform`.
    ///
    /// Rows are processed one at a time (read, decode raw, transform,
    /// encode, write back by id), so the migration neither loads the whole
    /// table nor requires rows to match the type's current Rust shape. The
    /// first failing row aborts the migration. When the caller has no
    /// transaction open the migration runs inside its own exclusive
    /// transaction, so an abort leaves no partial writes; inside a
    /// caller-managed transaction it participates in that transaction.
    pub async fn run_migration<T, F>(&self, transform: F) -> Result<(), StoreError>
    where
        T: Document,
        F: FnMut(RawDocument) -> anyhow::Result<RawDocument> + Send + 'static,
    {
        let type_name = T::type_name();
        self.schema.ensure_table(&self.conn, type_name).await?;
        debug!("Running migration for type {}", type_name);

        let select = format!(r#"SELECT "id", json("value") FROM "{type_name}""#);
        let update = format!(r#"UPDATE "{type_name}" SET "value" = jsonb(?) WHERE "id" = ?"#);

        let mut transform = transform;
        self.conn
            .with_connection(move |c| {
                let own_transaction = c.is_autocommit();
                if own_transaction {
                    c.execute_batch("BEGIN EXCLUSIVE TRANSACTION")?;
                }

                let result = migrate_rows(c, &select, &update, &mut transform);

                if own_transaction {
                    match &result {
                        Ok(()) => c.execute_batch("COMMIT TRANSACTION")?,
                        Err(_) => {
                            let _ = c.execute_batch("ROLLBACK TRANSACTION");
                        }
                    }
                }
                result
            })
            .await
    }
}

fn migrate_rows<F>(c: &Connection, select: &str, update: &str, transform: &mut F) -> Result<(), StoreError>
where
    F: FnMut(RawDocument) -> anyhow::Result<RawDocument>,
{
    let mut read = c.prepare(select)?;
    let mut write = c.prepare(update)?;

    let mut rows = read.query([])?;
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let encoded: String = row.get(1)?;

        let raw: RawDocument = serde_json::from_str(&encoded)?;
        let migrated = transform(raw).map_err(StoreError::Migration)?;

        let encoded = serde_json::to_string(&migrated).map_err(StoreError::Encode)?;
        write.execute(params![encoded, id])?;
    }

    Ok(())
}
