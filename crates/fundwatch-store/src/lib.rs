//! Fundwatch Storage Layer
//!
//! Implements the entity, claim, conflict and task store traits on SQLite.
//!
//! # Architecture
//!
//! - Claims and commit history are append-only tables
//! - The current value of a field is the highest revision in its history
//! - Task transitions are single conditional UPDATEs (compare-and-set)
//! - A partial unique index keeps at most one open conflict per field key
//!
//! # Examples
//!
//! ```no_run
//! use fundwatch_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for reconciliation
//! ```

#![warn(missing_docs)]

mod claim;
mod codec;
mod conflict;
mod entity;
mod task;

use fundwatch_domain::traits::StoreBackend;
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON encoding of a stored value failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Referenced row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Row with the same identifier already exists
    #[error("Duplicate {0}")]
    Duplicate(String),
}

/// SQLite-based implementation of every fundwatch store trait
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share one store behind a mutex
/// or give each thread its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fundwatch_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("fundwatch.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        tracing::debug!("Store schema initialized");
        Ok(())
    }
}

impl StoreBackend for SqliteStore {
    type Error = StoreError;
}
