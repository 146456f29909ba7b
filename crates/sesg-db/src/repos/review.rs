//! Review repository: import of a review with its GS and citation edges,
//! plus the read paths the metrics need.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;

use sesg_core::entities::{CitationEdge, Review, Study};
use sesg_core::ids::{PREFIX_REVIEW, PREFIX_STUDY};
use sesg_core::responses::ReviewSummary;

use crate::error::DatabaseError;
use crate::helpers::parse_datetime;
use crate::service::{SesgService, finish_transaction};

/// A review as read from an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewImport {
    pub name: String,
    #[serde(default)]
    pub min_publication_year: Option<i32>,
    #[serde(default)]
    pub max_publication_year: Option<i32>,
    pub studies: Vec<StudyImport>,
}

/// One GS study of an import file. `references` lists keys of other studies
/// in the same file.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyImport {
    pub key: String,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub references: Vec<String>,
}

fn row_to_review(row: &libsql::Row) -> Result<Review, DatabaseError> {
    Ok(Review {
        id: row.get(0)?,
        name: row.get(1)?,
        min_publication_year: row
            .get::<Option<i64>>(2)?
            .and_then(|y| i32::try_from(y).ok()),
        max_publication_year: row
            .get::<Option<i64>>(3)?
            .and_then(|y| i32::try_from(y).ok()),
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

pub(crate) fn row_to_study(row: &libsql::Row) -> Result<Study, DatabaseError> {
    Ok(Study {
        id: row.get(0)?,
        review_id: row.get(1)?,
        key: row.get(2)?,
        title: row.get(3)?,
        abstract_text: row.get(4)?,
        keywords: row.get(5)?,
    })
}

const REVIEW_COLS: &str = "id, name, min_publication_year, max_publication_year, created_at";
pub(crate) const STUDY_COLS: &str = "id, review_id, key, title, abstract, keywords";

impl ReviewImport {
    /// Reject files the store would only half-accept.
    fn check(&self) -> Result<(), DatabaseError> {
        if self.name.trim().is_empty() {
            return Err(DatabaseError::InvalidState("review name is empty".into()));
        }
        Review::check_year_window(self.min_publication_year, self.max_publication_year)?;
        let mut seen = std::collections::HashSet::new();
        for study in &self.studies {
            if !seen.insert(study.key.as_str()) {
                return Err(DatabaseError::InvalidState(format!(
                    "duplicate study key '{}'",
                    study.key
                )));
            }
        }
        for study in &self.studies {
            if let Some(missing) = study.references.iter().find(|r| !seen.contains(r.as_str())) {
                return Err(DatabaseError::InvalidState(format!(
                    "study '{}' references unknown key '{missing}'",
                    study.key
                )));
            }
        }
        Ok(())
    }
}

impl SesgService {
    /// Import a review, its studies, and their reference edges in one
    /// transaction. Edges are never touched again afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the name is taken or the file
    /// is inconsistent, and `DatabaseError::Core` for an inverted year
    /// window; nothing is written in either case.
    pub async fn import_review(&self, import: &ReviewImport) -> Result<ReviewSummary, DatabaseError> {
        import.check()?;
        if self.find_review_by_name(&import.name).await?.is_some() {
            return Err(DatabaseError::InvalidState(format!(
                "review '{}' already exists",
                import.name
            )));
        }

        let review_id = self.db().generate_id(PREFIX_REVIEW).await?;
        let mut study_ids = HashMap::with_capacity(import.studies.len());
        for study in &import.studies {
            study_ids.insert(study.key.as_str(), self.db().generate_id(PREFIX_STUDY).await?);
        }
        let now = Utc::now();

        let _guard = self.write_lock().await;
        let tx = self.begin().await?;
        let result = async {
            tx.execute(
                "INSERT INTO reviews (id, name, min_publication_year, max_publication_year, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    review_id.as_str(),
                    import.name.as_str(),
                    import.min_publication_year.map(i64::from),
                    import.max_publication_year.map(i64::from),
                    now.to_rfc3339()
                ],
            )
            .await?;

            for study in &import.studies {
                tx.execute(
                    "INSERT INTO studies (id, review_id, key, title, abstract, keywords)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    libsql::params![
                        study_ids[study.key.as_str()].as_str(),
                        review_id.as_str(),
                        study.key.as_str(),
                        study.title.as_str(),
                        study.abstract_text.as_str(),
                        study.keywords.as_str()
                    ],
                )
                .await?;
            }

            let mut n_edges = 0_u64;
            for study in &import.studies {
                let from = study_ids[study.key.as_str()].as_str();
                for reference in &study.references {
                    n_edges += tx
                        .execute(
                            "INSERT OR IGNORE INTO study_references (from_study_id, to_study_id)
                             VALUES (?1, ?2)",
                            libsql::params![from, study_ids[reference.as_str()].as_str()],
                        )
                        .await?;
                }
            }
            Ok::<_, DatabaseError>(n_edges)
        }
        .await;
        let n_edges = finish_transaction(tx, result).await?;

        tracing::info!(
            review = %import.name,
            studies = import.studies.len(),
            edges = n_edges,
            "review imported"
        );

        Ok(ReviewSummary {
            review: Review {
                id: review_id,
                name: import.name.clone(),
                min_publication_year: import.min_publication_year,
                max_publication_year: import.max_publication_year,
                created_at: now,
            },
            gs_size: import.studies.len() as u64,
            n_edges,
        })
    }

    pub async fn find_review_by_name(&self, name: &str) -> Result<Option<Review>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {REVIEW_COLS} FROM reviews WHERE name = ?1"),
                [name],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_review(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_review_by_name(&self, name: &str) -> Result<Review, DatabaseError> {
        self.find_review_by_name(name)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "review",
                key: name.to_string(),
            })
    }

    pub async fn get_review(&self, id: &str) -> Result<Review, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {REVIEW_COLS} FROM reviews WHERE id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_review(&row)
    }

    /// GS size and edge count of a review.
    pub async fn review_summary(&self, name: &str) -> Result<ReviewSummary, DatabaseError> {
        let review = self.get_review_by_name(name).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT
                    (SELECT COUNT(*) FROM studies WHERE review_id = ?1),
                    (SELECT COUNT(*) FROM study_references r
                       JOIN studies s ON s.id = r.from_study_id
                      WHERE s.review_id = ?1)",
                [review.id.as_str()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(ReviewSummary {
            gs_size: crate::helpers::get_u64(&row, 0)?,
            n_edges: crate::helpers::get_u64(&row, 1)?,
            review,
        })
    }

    /// The GS of a review, ordered by study key.
    pub async fn list_gs(&self, review_id: &str) -> Result<Vec<Study>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {STUDY_COLS} FROM studies WHERE review_id = ?1 ORDER BY key"),
                [review_id],
            )
            .await?;
        let mut studies = Vec::new();
        while let Some(row) = rows.next().await? {
            studies.push(row_to_study(&row)?);
        }
        Ok(studies)
    }

    /// Every reference edge between studies of a review.
    pub async fn list_citation_edges(
        &self,
        review_id: &str,
    ) -> Result<Vec<CitationEdge>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT r.from_study_id, r.to_study_id
                   FROM study_references r
                   JOIN studies s ON s.id = r.from_study_id
                  WHERE s.review_id = ?1
                  ORDER BY r.from_study_id, r.to_study_id",
                [review_id],
            )
            .await?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next().await? {
            edges.push(CitationEdge {
                from_study_id: row.get(0)?,
                to_study_id: row.get(1)?,
            });
        }
        Ok(edges)
    }
}
