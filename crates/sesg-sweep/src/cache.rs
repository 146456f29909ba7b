//! Memoizing decorator over a [`SimilarWordProvider`].
//!
//! Keyed by (experiment, word, strategy). A hit returns the stored list
//! without calling the provider; a miss calls it, stores the answer, and
//! returns it. Two concurrent misses may both call the provider; the store
//! keeps the later write.

use sesg_core::enums::SimilarWordStrategy;
use sesg_db::service::SesgService;

use crate::error::ProviderError;
use crate::providers::SimilarWordProvider;

pub struct SimilarWordCache<'a, P> {
    service: &'a SesgService,
    experiment_id: String,
    strategy: SimilarWordStrategy,
    inner: P,
}

impl<'a, P: SimilarWordProvider> SimilarWordCache<'a, P> {
    pub fn new(
        service: &'a SesgService,
        experiment_id: &str,
        strategy: SimilarWordStrategy,
        inner: P,
    ) -> Self {
        Self {
            service,
            experiment_id: experiment_id.to_string(),
            strategy,
            inner,
        }
    }
}

impl<P: SimilarWordProvider> SimilarWordProvider for SimilarWordCache<'_, P> {
    async fn similar_words(&self, word: &str) -> Result<Vec<String>, ProviderError> {
        if let Some(entry) = self
            .service
            .find_similar_words(&self.experiment_id, word, self.strategy)
            .await?
        {
            tracing::trace!(word, "similar-word cache hit");
            return Ok(entry.similar_words);
        }

        let words = self.inner.similar_words(word).await?;
        self.service
            .put_similar_words(&self.experiment_id, word, self.strategy, &words)
            .await?;
        Ok(words)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;
    use sesg_db::repos::review::{ReviewImport, StudyImport};

    use super::test_support::CountingWords;
    use super::*;

    async fn setup() -> (SesgService, String) {
        let svc = SesgService::new_local(":memory:").await.unwrap();
        let review = svc
            .import_review(&ReviewImport {
                name: "slr".into(),
                min_publication_year: None,
                max_publication_year: None,
                studies: vec![StudyImport {
                    key: "A".into(),
                    title: "A".into(),
                    abstract_text: String::new(),
                    keywords: String::new(),
                    references: Vec::new(),
                }],
            })
            .await
            .unwrap()
            .review;
        let exp = svc
            .get_or_create_experiment("exp", &review.id, 1)
            .await
            .unwrap()
            .0
            .id;
        (svc, exp)
    }

    #[tokio::test]
    async fn hit_skips_the_provider() {
        let (svc, exp) = setup().await;
        let cache = SimilarWordCache::new(&svc, &exp, SimilarWordStrategy::Bert, CountingWords::default());

        let first = cache.similar_words("test").await.unwrap();
        let second = cache.similar_words("test").await.unwrap();
        assert_eq!(first, vec!["test-a", "test-b", "test-c"]);
        assert_eq!(first, second);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entries_outlive_the_cache_value() {
        let (svc, exp) = setup().await;
        SimilarWordCache::new(&svc, &exp, SimilarWordStrategy::Llm, CountingWords::default())
            .similar_words("suite")
            .await
            .unwrap();

        let fresh = SimilarWordCache::new(&svc, &exp, SimilarWordStrategy::Llm, CountingWords::default());
        fresh.similar_words("suite").await.unwrap();
        assert_eq!(fresh.inner.calls.load(Ordering::SeqCst), 0);

        // other strategy, other key
        let bert = SimilarWordCache::new(&svc, &exp, SimilarWordStrategy::Bert, CountingWords::default());
        bert.similar_words("suite").await.unwrap();
        assert_eq!(bert.inner.calls.load(Ordering::SeqCst), 1);
    }
}
