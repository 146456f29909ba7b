//! Similar-word cache, keyed by `(experiment, word, strategy)`.
//!
//! Entries are written through an upsert, so two workers racing on the same
//! key leave exactly one row holding the later write.

use chrono::Utc;

use sesg_core::entities::SimilarWordsEntry;
use sesg_core::enums::SimilarWordStrategy;
use sesg_core::ids::PREFIX_SIMILAR_WORDS;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::SesgService;

fn row_to_entry(row: &libsql::Row) -> Result<SimilarWordsEntry, DatabaseError> {
    let raw: String = row.get(4)?;
    let similar_words: Vec<String> = serde_json::from_str(&raw)
        .map_err(|e| DatabaseError::Query(format!("similar_words is not a JSON list: {e}")))?;
    Ok(SimilarWordsEntry {
        id: row.get(0)?,
        experiment_id: row.get(1)?,
        word: row.get(2)?,
        strategy: parse_enum(&row.get::<String>(3)?)?,
        similar_words,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl SesgService {
    pub async fn find_similar_words(
        &self,
        experiment_id: &str,
        word: &str,
        strategy: SimilarWordStrategy,
    ) -> Result<Option<SimilarWordsEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, experiment_id, word, strategy, similar_words, created_at
                   FROM similar_words
                  WHERE experiment_id = ?1 AND word = ?2 AND strategy = ?3",
                libsql::params![experiment_id, word, strategy.as_str()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// Store the provider output for a key, replacing any earlier entry.
    pub async fn put_similar_words(
        &self,
        experiment_id: &str,
        word: &str,
        strategy: SimilarWordStrategy,
        similar_words: &[String],
    ) -> Result<(), DatabaseError> {
        let id = self.db().generate_id(PREFIX_SIMILAR_WORDS).await?;
        let encoded = serde_json::to_string(similar_words)
            .map_err(|e| DatabaseError::Query(format!("encode similar words: {e}")))?;

        let _guard = self.write_lock().await;
        self.db()
            .conn()
            .execute(
                "INSERT INTO similar_words
                    (id, experiment_id, word, strategy, similar_words, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (experiment_id, word, strategy)
                 DO UPDATE SET similar_words = excluded.similar_words,
                               created_at = excluded.created_at",
                libsql::params![
                    id.as_str(),
                    experiment_id,
                    word,
                    strategy.as_str(),
                    encoded,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        tracing::debug!(word, %strategy, n = similar_words.len(), "similar words cached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::repos::review::fixtures::chain_review;
    use crate::service::test_support::test_service;

    async fn experiment(svc: &SesgService) -> String {
        let review = svc.import_review(&chain_review("slr")).await.unwrap().review;
        svc.get_or_create_experiment("exp", &review.id, 1)
            .await
            .unwrap()
            .0
            .id
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let svc = test_service().await;
        let exp = experiment(&svc).await;
        assert!(
            svc.find_similar_words(&exp, "test", SimilarWordStrategy::Bert)
                .await
                .unwrap()
                .is_none()
        );

        svc.put_similar_words(&exp, "test", SimilarWordStrategy::Bert, &words(&["exam", "trial"]))
            .await
            .unwrap();
        let entry = svc
            .find_similar_words(&exp, "test", SimilarWordStrategy::Bert)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.similar_words, words(&["exam", "trial"]));
    }

    #[tokio::test]
    async fn strategy_is_part_of_the_key() {
        let svc = test_service().await;
        let exp = experiment(&svc).await;
        svc.put_similar_words(&exp, "test", SimilarWordStrategy::Bert, &words(&["exam"]))
            .await
            .unwrap();
        assert!(
            svc.find_similar_words(&exp, "test", SimilarWordStrategy::Llm)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn last_write_wins() {
        let svc = test_service().await;
        let exp = experiment(&svc).await;
        svc.put_similar_words(&exp, "test", SimilarWordStrategy::Llm, &words(&["a"]))
            .await
            .unwrap();
        svc.put_similar_words(&exp, "test", SimilarWordStrategy::Llm, &words(&["b", "c"]))
            .await
            .unwrap();
        assert_eq!(svc.db().count_rows("similar_words").await.unwrap(), 1);
        let entry = svc
            .find_similar_words(&exp, "test", SimilarWordStrategy::Llm)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.similar_words, words(&["b", "c"]));
    }
}
