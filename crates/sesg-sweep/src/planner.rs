//! Resumable parameter sweep.
//!
//! The configured value lists of one topic family are expanded into their
//! cartesian product and matched against the store: every combination is
//! fetched or created by value, so a repeated run with the same
//! configuration creates nothing and returns the same parameter sets.

use sesg_config::SesgConfig;
use sesg_core::entities::{FormulationParams, ModelParams, ParameterSet};
use sesg_core::enums::{SimilarWordStrategy, TopicFamily};
use sesg_db::service::SesgService;

use crate::error::SweepError;

/// Parameter sets of one (family, strategy) pair, in grid order.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub family: TopicFamily,
    pub strategy: SimilarWordStrategy,
    pub sets: Vec<ParameterSet>,
    /// How many of `sets` this call created.
    pub created: usize,
}

impl SweepPlan {
    /// Sets not yet linked to a search string.
    pub fn unformulated(&self) -> impl Iterator<Item = &ParameterSet> {
        self.sets.iter().filter(|s| s.search_string_id.is_none())
    }
}

/// Formulation grid: every `n_similar_words_per_word` with every
/// `n_words_per_topic`.
async fn formulation_grid(
    service: &SesgService,
    config: &SesgConfig,
) -> Result<Vec<FormulationParams>, SweepError> {
    let mut grid = Vec::new();
    for &n_similar in &config.formulation_params.n_similar_words_per_word {
        for &n_words in &config.formulation_params.n_words_per_topic {
            grid.push(
                service
                    .get_or_create_formulation_params(n_similar, n_words)
                    .await?,
            );
        }
    }
    Ok(grid)
}

async fn model_grid(
    service: &SesgService,
    config: &SesgConfig,
    family: TopicFamily,
) -> Result<Vec<ModelParams>, SweepError> {
    let mut grid = Vec::new();
    match family {
        TopicFamily::Lda => {
            for &n_topics in &config.lda_params.n_topics {
                for &min_df in &config.lda_params.min_document_frequency {
                    let params = service.get_or_create_lda_params(n_topics, min_df).await?;
                    grid.push(ModelParams::Lda(params));
                }
            }
        }
        TopicFamily::Bertopic => {
            for &n_clusters in &config.bertopic_params.kmeans_n_clusters {
                for &n_neighbors in &config.bertopic_params.umap_n_neighbors {
                    let params = service
                        .get_or_create_bertopic_params(n_clusters, n_neighbors)
                        .await?;
                    grid.push(ModelParams::Bertopic(params));
                }
            }
        }
    }
    Ok(grid)
}

/// Expand the grid of `family` for `experiment_id` and `strategy`.
///
/// # Errors
///
/// Returns [`SweepError::Config`] if the configuration is invalid, before
/// anything is written, or [`SweepError::Database`] on store failures.
pub async fn plan(
    service: &SesgService,
    config: &SesgConfig,
    experiment_id: &str,
    family: TopicFamily,
    strategy: SimilarWordStrategy,
) -> Result<SweepPlan, SweepError> {
    config.validate()?;

    let formulations = formulation_grid(service, config).await?;
    let models = model_grid(service, config, family).await?;

    let mut sets = Vec::with_capacity(formulations.len() * models.len());
    let mut created = 0;
    for formulation in &formulations {
        for model in &models {
            let (set, was_created) = service
                .get_or_create_parameter_set(experiment_id, formulation, model, strategy)
                .await?;
            created += usize::from(was_created);
            sets.push(set);
        }
    }

    tracing::info!(
        %family,
        %strategy,
        total = sets.len(),
        created,
        "parameter sweep planned"
    );
    Ok(SweepPlan {
        family,
        strategy,
        sets,
        created,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sesg_db::repos::review::{ReviewImport, StudyImport};

    use super::*;

    async fn experiment(svc: &SesgService) -> String {
        let review = svc
            .import_review(&ReviewImport {
                name: "slr".into(),
                min_publication_year: None,
                max_publication_year: None,
                studies: vec![StudyImport {
                    key: "A".into(),
                    title: "A study".into(),
                    abstract_text: String::new(),
                    keywords: String::new(),
                    references: Vec::new(),
                }],
            })
            .await
            .unwrap()
            .review;
        svc.get_or_create_experiment("exp", &review.id, 1)
            .await
            .unwrap()
            .0
            .id
    }

    /// 2 × 1 formulation values and 2 × 1 LDA values.
    fn small_config() -> SesgConfig {
        let mut config = SesgConfig::default();
        config.formulation_params.n_similar_words_per_word = vec![0, 1];
        config.formulation_params.n_words_per_topic = vec![5];
        config.lda_params.n_topics = vec![1, 2];
        config.lda_params.min_document_frequency = vec![0.1];
        config
    }

    #[tokio::test]
    async fn cartesian_product_is_complete() {
        let svc = SesgService::new_local(":memory:").await.unwrap();
        let exp = experiment(&svc).await;
        let plan = plan(&svc, &small_config(), &exp, TopicFamily::Lda, SimilarWordStrategy::Bert)
            .await
            .unwrap();

        assert_eq!(plan.sets.len(), 4);
        assert_eq!(plan.created, 4);
        let combos: Vec<(u32, u32)> = plan
            .sets
            .iter()
            .map(|s| match &s.model {
                ModelParams::Lda(lda) => (s.formulation.n_similar_words_per_word, lda.n_topics),
                ModelParams::Bertopic(_) => panic!("wrong family"),
            })
            .collect();
        assert_eq!(combos, vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    }

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let svc = SesgService::new_local(":memory:").await.unwrap();
        let exp = experiment(&svc).await;
        let config = small_config();
        let first = plan(&svc, &config, &exp, TopicFamily::Lda, SimilarWordStrategy::Bert)
            .await
            .unwrap();
        let second = plan(&svc, &config, &exp, TopicFamily::Lda, SimilarWordStrategy::Bert)
            .await
            .unwrap();

        assert_eq!(second.created, 0);
        let ids = |p: &SweepPlan| p.sets.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(svc.db().count_rows("parameter_sets").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn strategies_and_families_are_separate_sets() {
        let svc = SesgService::new_local(":memory:").await.unwrap();
        let exp = experiment(&svc).await;
        let mut config = small_config();
        config.bertopic_params.kmeans_n_clusters = vec![2];
        config.bertopic_params.umap_n_neighbors = vec![3];

        plan(&svc, &config, &exp, TopicFamily::Lda, SimilarWordStrategy::Bert)
            .await
            .unwrap();
        let llm = plan(&svc, &config, &exp, TopicFamily::Lda, SimilarWordStrategy::Llm)
            .await
            .unwrap();
        let bertopic = plan(&svc, &config, &exp, TopicFamily::Bertopic, SimilarWordStrategy::Bert)
            .await
            .unwrap();

        assert_eq!(llm.created, 4);
        assert_eq!(bertopic.created, 2);
        assert!(bertopic.sets.iter().all(|s| s.model.family() == TopicFamily::Bertopic));
        assert_eq!(svc.db().count_rows("parameter_sets").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn invalid_config_writes_nothing() {
        let svc = SesgService::new_local(":memory:").await.unwrap();
        let exp = experiment(&svc).await;
        let mut config = small_config();
        config.lda_params.n_topics.clear();

        let err = plan(&svc, &config, &exp, TopicFamily::Lda, SimilarWordStrategy::Bert)
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::Config(_)));
        assert_eq!(svc.db().count_rows("formulation_params").await.unwrap(), 0);
    }
}
