//! Read-only reporting queries.

use sesg_core::enums::{MetricColumn, TopicFamily};
use sesg_core::responses::{QgsRow, ResultRow};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_u32, get_u32, get_u64, parse_enum, to_sql_int};
use crate::service::SesgService;

fn row_to_result(row: &libsql::Row, family: TopicFamily) -> Result<ResultRow, DatabaseError> {
    Ok(ResultRow {
        experiment: row.get(0)?,
        parameter_set_id: row.get(1)?,
        search_string_id: row.get(2)?,
        similar_word_strategy: parse_enum(&row.get::<String>(3)?)?,
        family,
        n_similar_words_per_word: get_u32(row, 4)?,
        n_words_per_topic: get_u32(row, 5)?,
        n_topics: get_opt_u32(row, 6)?,
        min_document_frequency: row.get::<Option<f64>>(7)?,
        kmeans_n_clusters: get_opt_u32(row, 8)?,
        umap_n_neighbors: get_opt_u32(row, 9)?,
        n_results: get_u64(row, 10)?,
        n_qgs_in_results: get_u64(row, 11)?,
        n_gs_in_results: get_u64(row, 12)?,
        n_gs_in_bsb: get_u64(row, 13)?,
        n_gs_in_sb: get_u64(row, 14)?,
        precision: row.get(15)?,
        recall: row.get(16)?,
        f1: row.get(17)?,
        bsb_recall: row.get(18)?,
        sb_recall: row.get(19)?,
    })
}

impl SesgService {
    /// Parameter sets of every experiment of a review that have a valid
    /// performance, joined with their sub-records, best first by `order_by`.
    ///
    /// A string shared by several parameter sets yields one row per set.
    pub async fn results_for_review(
        &self,
        review_name: &str,
        family: TopicFamily,
        order_by: MetricColumn,
        top: Option<usize>,
    ) -> Result<Vec<ResultRow>, DatabaseError> {
        let review = self.get_review_by_name(review_name).await?;
        let family_filter = match family {
            TopicFamily::Lda => "p.lda_params_id IS NOT NULL",
            TopicFamily::Bertopic => "p.bertopic_params_id IS NOT NULL",
        };
        // -1 disables LIMIT in SQLite
        let limit = top.map_or(Ok(-1), to_sql_int)?;
        let sql = format!(
            "SELECT e.name, p.id, s.id, p.similar_word_strategy,
                    fp.n_similar_words_per_word, fp.n_words_per_topic,
                    l.n_topics, l.min_document_frequency,
                    b.kmeans_n_clusters, b.umap_n_neighbors,
                    f.n_results, f.n_qgs_in_results, f.n_gs_in_results,
                    f.n_gs_in_bsb, f.n_gs_in_sb,
                    f.start_set_precision, f.start_set_recall, f.start_set_f1,
                    f.bsb_recall, f.sb_recall
               FROM parameter_sets p
               JOIN experiments e ON e.id = p.experiment_id
               JOIN formulation_params fp ON fp.id = p.formulation_params_id
               LEFT JOIN lda_params l ON l.id = p.lda_params_id
               LEFT JOIN bertopic_params b ON b.id = p.bertopic_params_id
               JOIN search_strings s ON s.id = p.search_string_id
               JOIN performances f ON f.search_string_id = s.id
              WHERE e.review_id = ?1 AND f.invalid = 0 AND {family_filter}
              ORDER BY f.{} DESC, e.name, p.id
              LIMIT ?2",
            order_by.column()
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params![review.id.as_str(), limit])
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_result(&row, family)?);
        }
        Ok(results)
    }

    /// The frozen QGS of every experiment of a review.
    pub async fn qgs_for_review(&self, review_name: &str) -> Result<Vec<QgsRow>, DatabaseError> {
        let review = self.get_review_by_name(review_name).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT e.name, st.id, st.key, st.title
                   FROM experiments e
                   JOIN experiment_qgs q ON q.experiment_id = e.id
                   JOIN studies st ON st.id = q.study_id
                  WHERE e.review_id = ?1
                  ORDER BY e.name, st.key",
                [review.id.as_str()],
            )
            .await?;
        let mut qgs = Vec::new();
        while let Some(row) = rows.next().await? {
            qgs.push(QgsRow {
                experiment: row.get(0)?,
                study_id: row.get(1)?,
                key: row.get(2)?,
                title: row.get(3)?,
            });
        }
        Ok(qgs)
    }
}
