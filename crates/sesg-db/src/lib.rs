//! # sesg-db
//!
//! libSQL store for the search-string experiment runner.
//!
//! Holds reviews and their GS with citation edges, experiments with their
//! frozen QGS, the deduplicated parameter sub-records, parameter sets, search
//! strings with their processing marker, performances, and the similar-word
//! cache. Repositories add methods to [`service::SesgService`].
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) with a single local
//! connection per handle.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;

pub use migrations::TABLES;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
///
/// Wraps a libSQL database and its one connection, and provides ID
/// generation.
pub struct SesgDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl SesgDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let sesg_db = Self { db, conn };
        sesg_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(sesg_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"exp-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Count the rows of a table. Used by maintenance output and tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_rows(&self, table: &str) -> Result<u64, DatabaseError> {
        let mut rows = self
            .conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        helpers::get_u64(&row, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> SesgDb {
        SesgDb::open_local(":memory:").await.unwrap()
    }

    async fn table_exists(db: &SesgDb, table: &str) -> bool {
        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().is_some()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;
        for table in TABLES {
            assert!(table_exists(&db, table).await, "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("exp").await.unwrap();
        assert!(id.starts_with("exp-"), "ID should start with 'exp-': {id}");
        assert_eq!(id.len(), 12, "ID should be 12 chars: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in sesg_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn drop_all_removes_every_table() {
        let db = test_db().await;
        db.drop_all().await.unwrap();
        for table in TABLES {
            assert!(!table_exists(&db, table).await, "table '{table}' should be gone");
        }
        // schema comes back on demand
        db.run_migrations().await.unwrap();
        assert!(table_exists(&db, "performances").await);
    }

    #[tokio::test]
    async fn parameter_set_requires_exactly_one_family() {
        let db = test_db().await;
        let conn = db.conn();
        conn.execute_batch(
            "INSERT INTO reviews (id, name) VALUES ('rev-1', 'r');
             INSERT INTO experiments (id, name, review_id) VALUES ('exp-1', 'e', 'rev-1');
             INSERT INTO formulation_params (id, n_similar_words_per_word, n_words_per_topic) VALUES ('frm-1', 1, 5);
             INSERT INTO lda_params (id, n_topics, min_document_frequency) VALUES ('lda-1', 2, 0.1);
             INSERT INTO bertopic_params (id, kmeans_n_clusters, umap_n_neighbors) VALUES ('btp-1', 2, 15);",
        )
        .await
        .unwrap();

        let neither = conn
            .execute(
                "INSERT INTO parameter_sets (id, experiment_id, formulation_params_id, similar_word_strategy)
                 VALUES ('prm-1', 'exp-1', 'frm-1', 'bert')",
                (),
            )
            .await;
        assert!(neither.is_err(), "a parameter set needs a model sub-record");

        let both = conn
            .execute(
                "INSERT INTO parameter_sets (id, experiment_id, formulation_params_id, lda_params_id, bertopic_params_id, similar_word_strategy)
                 VALUES ('prm-2', 'exp-1', 'frm-1', 'lda-1', 'btp-1', 'bert')",
                (),
            )
            .await;
        assert!(both.is_err(), "a parameter set holds one model sub-record");
    }
}
