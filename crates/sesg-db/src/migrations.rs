//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use crate::SesgDb;
use crate::error::DatabaseError;

const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");

/// Every table created by the migrations, children first so dropping in this
/// order never trips a foreign key.
pub const TABLES: &[&str] = &[
    "similar_words",
    "performance_studies",
    "performances",
    "parameter_sets",
    "search_strings",
    "bertopic_params",
    "lda_params",
    "formulation_params",
    "experiment_qgs",
    "experiments",
    "study_references",
    "studies",
    "reviews",
];

impl SesgDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        Ok(())
    }

    /// Drop every table. The schema is recreated on the next open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Migration` if a `DROP` fails.
    pub async fn drop_all(&self) -> Result<(), DatabaseError> {
        for table in TABLES {
            self.conn
                .execute(&format!("DROP TABLE IF EXISTS {table}"), ())
                .await
                .map_err(|e| DatabaseError::Migration(format!("drop {table}: {e}")))?;
        }
        tracing::info!(tables = TABLES.len(), "dropped all tables");
        Ok(())
    }
}
