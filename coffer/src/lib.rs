//! Coffer: a typed JSON document store over SQLite
//!
//! Documents are serde types persisted per-type: each type gets its own
//! table of `("id" TEXT PRIMARY KEY, "value" BLOB)` rows, where `value`
//! holds the JSONB encoding of the document. On top of that sit a key/value
//! API (save / fetch / remove by id) and a minimal query language in which
//! `$field` tokens reference fields inside the stored document:
//!
//! ```rust,ignore
//! use coffer::{Coffer, Document, Query};
//!
//! let store = Coffer::open("garage")?;
//! store.save(&Car { id: "42".into(), brand: "Saab".into(), kmt: 900.0 }).await?;
//!
//! let classics: Vec<Car> = store
//!     .objects(Query::new().filter("$brand like ?").bind("Saa%"))
//!     .await?;
//! ```
//!
//! # SQLite version requirements
//!
//! Requires SQLite 3.45.0 or later for JSONB support (`jsonb()` /
//! `json_extract()`). The `rusqlite` crate with the "bundled" feature
//! includes a compatible version.
//!
//! # Concurrency and transactions
//!
//! A handle owns one connection; every statement runs while holding the
//! connection mutex, so statements never interleave at the C-call level.
//! [`Coffer::begin_transaction`] takes SQLite's exclusive write lock until
//! commit or rollback; contending writers on other connections fail with
//! [`StoreError::LockTimeout`] after a bounded wait.

mod connection;
mod document;
mod error;
mod schema;
pub mod sql_builder;
mod store;
mod value;

pub use connection::{StoreConfig, StoreConnection, BUSY_TIMEOUT};
pub use document::{Document, RawDocument};
pub use error::StoreError;
pub use schema::SchemaManager;
pub use store::{Coffer, Query};
pub use value::Param;
