//! Service layer over [`SesgDb`].
//!
//! All repo methods are implemented as `impl SesgService` in `repos/*.rs`.
//! Multi-statement writes take the write gate so concurrent search workers,
//! which share the single connection, never interleave transactions.

use tokio::sync::{Mutex, MutexGuard};

use crate::SesgDb;
use crate::error::DatabaseError;

pub struct SesgService {
    db: SesgDb,
    write_gate: Mutex<()>,
}

impl SesgService {
    /// Open a service over a local database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = SesgDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create from an existing `SesgDb`.
    #[must_use]
    pub fn from_db(db: SesgDb) -> Self {
        Self {
            db,
            write_gate: Mutex::new(()),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &SesgDb {
        &self.db
    }

    /// Serialize a write section. Hold the guard for the whole transaction.
    pub(crate) async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Begin a transaction on the shared connection. The caller must hold
    /// the write gate until [`finish_transaction`] returns.
    pub(crate) async fn begin(&self) -> Result<libsql::Transaction, DatabaseError> {
        Ok(self.db.conn().transaction().await?)
    }
}

/// Commit on `Ok`, roll back on `Err`.
pub(crate) async fn finish_transaction<T>(
    tx: libsql::Transaction,
    result: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(%rollback, "rollback failed");
            }
            Err(e)
        }
    }
}
