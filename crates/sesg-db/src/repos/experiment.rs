//! Experiment repository. The QGS is sampled once, in the transaction that
//! creates the experiment, and never changes afterwards.

use chrono::Utc;

use sesg_core::entities::{Experiment, Study};
use sesg_core::ids::PREFIX_EXPERIMENT;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, to_sql_int};
use crate::repos::review::row_to_study;
use crate::service::{SesgService, finish_transaction};

fn row_to_experiment(row: &libsql::Row) -> Result<Experiment, DatabaseError> {
    Ok(Experiment {
        id: row.get(0)?,
        name: row.get(1)?,
        review_id: row.get(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

const EXPERIMENT_COLS: &str = "id, name, review_id, created_at";

impl SesgService {
    /// Return the experiment called `name`, creating it with a fresh random
    /// QGS of `qgs_size` studies on first use. The flag is `true` on create.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the name already belongs to
    /// an experiment of another review.
    pub async fn get_or_create_experiment(
        &self,
        name: &str,
        review_id: &str,
        qgs_size: usize,
    ) -> Result<(Experiment, bool), DatabaseError> {
        if let Some(existing) = self.find_experiment_by_name(name).await? {
            if existing.review_id != review_id {
                return Err(DatabaseError::InvalidState(format!(
                    "experiment '{name}' belongs to review {}",
                    existing.review_id
                )));
            }
            return Ok((existing, false));
        }

        let id = self.db().generate_id(PREFIX_EXPERIMENT).await?;
        let now = Utc::now();
        let limit = to_sql_int(qgs_size)?;

        let guard = self.write_lock().await;
        let tx = self.begin().await?;
        let result = async {
            tx.execute(
                "INSERT INTO experiments (id, name, review_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                libsql::params![id.as_str(), name, review_id, now.to_rfc3339()],
            )
            .await?;
            tx.execute(
                "INSERT INTO experiment_qgs (experiment_id, study_id)
                 SELECT ?1, id FROM studies WHERE review_id = ?2 ORDER BY random() LIMIT ?3",
                libsql::params![id.as_str(), review_id, limit],
            )
            .await
            .map_err(DatabaseError::from)
        }
        .await;

        match finish_transaction(tx, result).await {
            Ok(n_qgs) => {
                tracing::info!(experiment = name, qgs = n_qgs, "experiment created");
                Ok((
                    Experiment {
                        id,
                        name: name.to_string(),
                        review_id: review_id.to_string(),
                        created_at: now,
                    },
                    true,
                ))
            }
            // Lost a race on the unique name: the other writer's row wins.
            Err(e) => {
                drop(guard);
                match self.find_experiment_by_name(name).await? {
                    Some(existing) if existing.review_id == review_id => Ok((existing, false)),
                    _ => Err(e),
                }
            }
        }
    }

    pub async fn find_experiment_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Experiment>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {EXPERIMENT_COLS} FROM experiments WHERE name = ?1"),
                [name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_experiment(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_experiment_by_name(&self, name: &str) -> Result<Experiment, DatabaseError> {
        self.find_experiment_by_name(name)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "experiment",
                key: name.to_string(),
            })
    }

    /// Experiments of a review, oldest first.
    pub async fn list_experiments(&self, review_id: &str) -> Result<Vec<Experiment>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {EXPERIMENT_COLS} FROM experiments WHERE review_id = ?1 ORDER BY created_at, name"
                ),
                [review_id],
            )
            .await?;
        let mut experiments = Vec::new();
        while let Some(row) = rows.next().await? {
            experiments.push(row_to_experiment(&row)?);
        }
        Ok(experiments)
    }

    /// The frozen QGS of an experiment, ordered by study key.
    pub async fn list_qgs(&self, experiment_id: &str) -> Result<Vec<Study>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT s.id, s.review_id, s.key, s.title, s.abstract, s.keywords
                   FROM experiment_qgs q
                   JOIN studies s ON s.id = q.study_id
                  WHERE q.experiment_id = ?1
                  ORDER BY s.key",
                [experiment_id],
            )
            .await?;
        let mut studies = Vec::new();
        while let Some(row) = rows.next().await? {
            studies.push(row_to_study(&row)?);
        }
        Ok(studies)
    }
}
