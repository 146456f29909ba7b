//! Parameter repository: value-deduplicated sub-records and parameter sets.
//!
//! Sub-records and parameter sets are written through get-or-create by
//! natural key: look the row up, insert it when missing, and look it up again
//! if the insert lost a race against the unique constraint.

use chrono::Utc;

use sesg_core::entities::{
    BertopicParams, FormulationParams, LdaParams, ModelParams, ParameterSet,
};
use sesg_core::enums::{SimilarWordStrategy, TopicFamily};
use sesg_core::ids::{PREFIX_BERTOPIC, PREFIX_FORMULATION, PREFIX_LDA, PREFIX_PARAMETER_SET};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_opt_u32, get_u32, parse_datetime, parse_enum};
use crate::service::SesgService;

/// Columns of the joined parameter-set query, in `row_to_parameter_set` order.
const PARAMETER_SET_SELECT: &str = "SELECT
        p.id, p.experiment_id, p.similar_word_strategy, p.search_string_id, p.created_at,
        f.id, f.n_similar_words_per_word, f.n_words_per_topic,
        l.id, l.n_topics, l.min_document_frequency,
        b.id, b.kmeans_n_clusters, b.umap_n_neighbors
   FROM parameter_sets p
   JOIN formulation_params f ON f.id = p.formulation_params_id
   LEFT JOIN lda_params l ON l.id = p.lda_params_id
   LEFT JOIN bertopic_params b ON b.id = p.bertopic_params_id";

/// `(lda_params_id, bertopic_params_id)` of a model sub-record.
fn model_ids(model: &ModelParams) -> (Option<&str>, Option<&str>) {
    match model {
        ModelParams::Lda(p) => (Some(p.id.as_str()), None),
        ModelParams::Bertopic(p) => (None, Some(p.id.as_str())),
    }
}

fn row_to_parameter_set(row: &libsql::Row) -> Result<ParameterSet, DatabaseError> {
    let model = match (get_opt_string(row, 8)?, get_opt_string(row, 11)?) {
        (Some(lda_id), None) => ModelParams::Lda(LdaParams {
            id: lda_id,
            n_topics: get_u32(row, 9)?,
            min_document_frequency: row.get::<f64>(10)?,
        }),
        (None, Some(bertopic_id)) => ModelParams::Bertopic(BertopicParams {
            id: bertopic_id,
            kmeans_n_clusters: get_u32(row, 12)?,
            umap_n_neighbors: get_u32(row, 13)?,
        }),
        _ => {
            return Err(DatabaseError::InvalidState(format!(
                "parameter set {} does not have exactly one model sub-record",
                row.get::<String>(0)?
            )));
        }
    };

    Ok(ParameterSet {
        id: row.get(0)?,
        experiment_id: row.get(1)?,
        similar_word_strategy: parse_enum(&row.get::<String>(2)?)?,
        search_string_id: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        formulation: FormulationParams {
            id: row.get(5)?,
            n_similar_words_per_word: get_u32(row, 6)?,
            n_words_per_topic: get_u32(row, 7)?,
        },
        model,
    })
}

/// First column of the first row, if any.
async fn first_id(mut rows: libsql::Rows) -> Result<Option<String>, DatabaseError> {
    match rows.next().await? {
        Some(row) => Ok(Some(row.get::<String>(0)?)),
        None => Ok(None),
    }
}

impl SesgService {
    async fn find_formulation_params_id(
        &self,
        n_similar_words_per_word: u32,
        n_words_per_topic: u32,
    ) -> Result<Option<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM formulation_params
                  WHERE n_similar_words_per_word = ?1 AND n_words_per_topic = ?2",
                libsql::params![
                    i64::from(n_similar_words_per_word),
                    i64::from(n_words_per_topic)
                ],
            )
            .await?;
        first_id(rows).await
    }

    pub async fn get_or_create_formulation_params(
        &self,
        n_similar_words_per_word: u32,
        n_words_per_topic: u32,
    ) -> Result<FormulationParams, DatabaseError> {
        let existing = self
            .find_formulation_params_id(n_similar_words_per_word, n_words_per_topic)
            .await?;
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.db().generate_id(PREFIX_FORMULATION).await?;
                let inserted = self
                    .db()
                    .conn()
                    .execute(
                        "INSERT INTO formulation_params (id, n_similar_words_per_word, n_words_per_topic)
                         VALUES (?1, ?2, ?3)",
                        libsql::params![
                            id.as_str(),
                            i64::from(n_similar_words_per_word),
                            i64::from(n_words_per_topic)
                        ],
                    )
                    .await;
                match inserted {
                    Ok(_) => id,
                    Err(e) => self
                        .find_formulation_params_id(n_similar_words_per_word, n_words_per_topic)
                        .await?
                        .ok_or(DatabaseError::LibSql(e))?,
                }
            }
        };

        Ok(FormulationParams {
            id,
            n_similar_words_per_word,
            n_words_per_topic,
        })
    }

    async fn find_lda_params_id(
        &self,
        n_topics: u32,
        min_document_frequency: f64,
    ) -> Result<Option<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM lda_params WHERE n_topics = ?1 AND min_document_frequency = ?2",
                libsql::params![i64::from(n_topics), min_document_frequency],
            )
            .await?;
        first_id(rows).await
    }

    pub async fn get_or_create_lda_params(
        &self,
        n_topics: u32,
        min_document_frequency: f64,
    ) -> Result<LdaParams, DatabaseError> {
        let id = match self.find_lda_params_id(n_topics, min_document_frequency).await? {
            Some(id) => id,
            None => {
                let id = self.db().generate_id(PREFIX_LDA).await?;
                let inserted = self
                    .db()
                    .conn()
                    .execute(
                        "INSERT INTO lda_params (id, n_topics, min_document_frequency) VALUES (?1, ?2, ?3)",
                        libsql::params![id.as_str(), i64::from(n_topics), min_document_frequency],
                    )
                    .await;
                match inserted {
                    Ok(_) => id,
                    Err(e) => self
                        .find_lda_params_id(n_topics, min_document_frequency)
                        .await?
                        .ok_or(DatabaseError::LibSql(e))?,
                }
            }
        };

        Ok(LdaParams {
            id,
            n_topics,
            min_document_frequency,
        })
    }

    async fn find_bertopic_params_id(
        &self,
        kmeans_n_clusters: u32,
        umap_n_neighbors: u32,
    ) -> Result<Option<String>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM bertopic_params WHERE kmeans_n_clusters = ?1 AND umap_n_neighbors = ?2",
                libsql::params![i64::from(kmeans_n_clusters), i64::from(umap_n_neighbors)],
            )
            .await?;
        first_id(rows).await
    }

    pub async fn get_or_create_bertopic_params(
        &self,
        kmeans_n_clusters: u32,
        umap_n_neighbors: u32,
    ) -> Result<BertopicParams, DatabaseError> {
        let existing = self
            .find_bertopic_params_id(kmeans_n_clusters, umap_n_neighbors)
            .await?;
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.db().generate_id(PREFIX_BERTOPIC).await?;
                let inserted = self
                    .db()
                    .conn()
                    .execute(
                        "INSERT INTO bertopic_params (id, kmeans_n_clusters, umap_n_neighbors) VALUES (?1, ?2, ?3)",
                        libsql::params![
                            id.as_str(),
                            i64::from(kmeans_n_clusters),
                            i64::from(umap_n_neighbors)
                        ],
                    )
                    .await;
                match inserted {
                    Ok(_) => id,
                    Err(e) => self
                        .find_bertopic_params_id(kmeans_n_clusters, umap_n_neighbors)
                        .await?
                        .ok_or(DatabaseError::LibSql(e))?,
                }
            }
        };

        Ok(BertopicParams {
            id,
            kmeans_n_clusters,
            umap_n_neighbors,
        })
    }

    async fn find_parameter_set(
        &self,
        experiment_id: &str,
        formulation_id: &str,
        model: &ModelParams,
        strategy: SimilarWordStrategy,
    ) -> Result<Option<ParameterSet>, DatabaseError> {
        let (lda_id, bertopic_id) = model_ids(model);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "{PARAMETER_SET_SELECT}
                      WHERE p.experiment_id = ?1
                        AND p.formulation_params_id = ?2
                        AND p.lda_params_id IS ?3
                        AND p.bertopic_params_id IS ?4
                        AND p.similar_word_strategy = ?5"
                ),
                libsql::params![
                    experiment_id,
                    formulation_id,
                    lda_id,
                    bertopic_id,
                    strategy.as_str()
                ],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_parameter_set(&row)?)),
            None => Ok(None),
        }
    }

    /// Return the parameter set for `(experiment, formulation, model,
    /// strategy)`, creating it when missing. The flag is `true` on create.
    pub async fn get_or_create_parameter_set(
        &self,
        experiment_id: &str,
        formulation: &FormulationParams,
        model: &ModelParams,
        strategy: SimilarWordStrategy,
    ) -> Result<(ParameterSet, bool), DatabaseError> {
        if let Some(existing) = self
            .find_parameter_set(experiment_id, &formulation.id, model, strategy)
            .await?
        {
            return Ok((existing, false));
        }

        let (lda_id, bertopic_id) = model_ids(model);
        let id = self.db().generate_id(PREFIX_PARAMETER_SET).await?;
        let now = Utc::now();
        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO parameter_sets
                    (id, experiment_id, formulation_params_id, lda_params_id, bertopic_params_id,
                     similar_word_strategy, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    experiment_id,
                    formulation.id.as_str(),
                    lda_id,
                    bertopic_id,
                    strategy.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await;

        match inserted {
            Ok(_) => Ok((
                ParameterSet {
                    id,
                    experiment_id: experiment_id.to_string(),
                    formulation: formulation.clone(),
                    model: model.clone(),
                    similar_word_strategy: strategy,
                    search_string_id: None,
                    created_at: now,
                },
                true,
            )),
            Err(e) => self
                .find_parameter_set(experiment_id, &formulation.id, model, strategy)
                .await?
                .map(|existing| (existing, false))
                .ok_or(DatabaseError::LibSql(e)),
        }
    }

    pub async fn get_parameter_set(&self, id: &str) -> Result<ParameterSet, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("{PARAMETER_SET_SELECT} WHERE p.id = ?1"), [id])
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_parameter_set(&row)
    }

    /// Parameter sets of an experiment, optionally narrowed to one family
    /// and strategy.
    pub async fn list_parameter_sets(
        &self,
        experiment_id: &str,
        family: Option<TopicFamily>,
        strategy: Option<SimilarWordStrategy>,
    ) -> Result<Vec<ParameterSet>, DatabaseError> {
        let family_filter = match family {
            None => "",
            Some(TopicFamily::Lda) => " AND p.lda_params_id IS NOT NULL",
            Some(TopicFamily::Bertopic) => " AND p.bertopic_params_id IS NOT NULL",
        };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "{PARAMETER_SET_SELECT}
                      WHERE p.experiment_id = ?1
                        AND (?2 IS NULL OR p.similar_word_strategy = ?2){family_filter}
                      ORDER BY p.created_at, p.id"
                ),
                libsql::params![experiment_id, strategy.map(SimilarWordStrategy::as_str)],
            )
            .await?;
        let mut sets = Vec::new();
        while let Some(row) = rows.next().await? {
            sets.push(row_to_parameter_set(&row)?);
        }
        Ok(sets)
    }

    /// Record which search string a parameter set produced. A set that is
    /// already linked keeps its link.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` if the set is linked to a
    /// different string.
    pub async fn link_search_string(
        &self,
        parameter_set_id: &str,
        search_string_id: &str,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE parameter_sets SET search_string_id = ?2
                  WHERE id = ?1 AND (search_string_id IS NULL OR search_string_id = ?2)",
                libsql::params![parameter_set_id, search_string_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::InvalidState(format!(
                "parameter set {parameter_set_id} is linked to another search string"
            )));
        }
        Ok(())
    }

    /// Parameter sets that produced a search string.
    pub async fn parameter_sets_for_string(
        &self,
        search_string_id: &str,
    ) -> Result<Vec<ParameterSet>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("{PARAMETER_SET_SELECT} WHERE p.search_string_id = ?1 ORDER BY p.id"),
                [search_string_id],
            )
            .await?;
        let mut sets = Vec::new();
        while let Some(row) = rows.next().await? {
            sets.push(row_to_parameter_set(&row)?);
        }
        Ok(sets)
    }
}
