//! Generation phase: parameter sets to search strings.
//!
//! For every (similar-word strategy, topic family) pair the grid is planned,
//! and each parameter set without a string gets one: topics are extracted
//! from the QGS documents, formulated through the cached word provider,
//! scoped to the review, and stored content-addressed.

use sesg_config::SesgConfig;
use sesg_core::entities::{Experiment, Review, Study};
use sesg_core::enums::{SimilarWordStrategy, TopicFamily};
use sesg_core::responses::GenerationSummary;
use sesg_db::service::SesgService;

use crate::cache::SimilarWordCache;
use crate::error::SweepError;
use crate::formulation::{BooleanFormulation, Formulation, scope_to_review};
use crate::planner::plan;
use crate::providers::{Providers, TopicExtractor};

/// What to generate.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub review_name: &'a str,
    pub experiment_name: &'a str,
    pub families: &'a [TopicFamily],
    pub strategies: &'a [SimilarWordStrategy],
}

/// Topic-extraction input: one document per QGS study, doubled when fewer
/// than `min_documents`.
#[must_use]
pub fn qgs_documents(qgs: &[Study], min_documents: usize) -> Vec<String> {
    let mut documents: Vec<String> = qgs.iter().map(Study::document).collect();
    if documents.len() < min_documents {
        tracing::info!(
            documents = documents.len(),
            min_documents,
            "few QGS documents; duplicating them"
        );
        documents.extend_from_within(..);
    }
    documents
}

/// Text word providers use to pick context for a word.
#[must_use]
pub fn enrichment_text(qgs: &[Study]) -> String {
    qgs.iter()
        .map(|s| format!("{}. {}", s.title.trim_end_matches('.'), s.abstract_text))
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Generator<'a, P, F = BooleanFormulation> {
    service: &'a SesgService,
    config: &'a SesgConfig,
    providers: &'a P,
    formulation: F,
}

impl<'a, P: Providers> Generator<'a, P> {
    pub fn new(service: &'a SesgService, config: &'a SesgConfig, providers: &'a P) -> Self {
        Self {
            service,
            config,
            providers,
            formulation: BooleanFormulation,
        }
    }
}

impl<'a, P: Providers, F: Formulation> Generator<'a, P, F> {
    #[must_use]
    pub fn with_formulation<G: Formulation>(self, formulation: G) -> Generator<'a, P, G> {
        Generator {
            service: self.service,
            config: self.config,
            providers: self.providers,
            formulation,
        }
    }

    /// Create the experiment on first use, then formulate a string for every
    /// parameter set that has none.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::Config`] before any write if the configuration
    /// is invalid, and [`SweepError::Provider`] or [`SweepError::Database`]
    /// if a step fails. Strings linked before the failure stay linked.
    pub async fn run(&self, request: &GenerationRequest<'_>) -> Result<GenerationSummary, SweepError> {
        self.config.validate()?;
        let review = self.service.get_review_by_name(request.review_name).await?;
        let gs_size = self.service.review_summary(&review.name).await?.gs_size;
        let qgs_size = self
            .config
            .experiment
            .qgs_size(usize::try_from(gs_size).unwrap_or(usize::MAX));
        let (experiment, created) = self
            .service
            .get_or_create_experiment(request.experiment_name, &review.id, qgs_size)
            .await?;
        let qgs = self.service.list_qgs(&experiment.id).await?;
        if created {
            tracing::info!(experiment = %experiment.name, qgs = qgs.len(), "QGS frozen");
        }

        let min_documents = self.config.experiment.min_documents as usize;
        let documents = qgs_documents(&qgs, min_documents);
        let enrichment = enrichment_text(&qgs);

        let mut summary = GenerationSummary {
            experiment: experiment.clone(),
            qgs_size: qgs.len() as u64,
            parameter_sets: 0,
            already_formulated: 0,
            strings_created: 0,
            strings_reused: 0,
        };

        for &strategy in request.strategies {
            let words = SimilarWordCache::new(
                self.service,
                &experiment.id,
                strategy,
                self.providers.similar_words(strategy, &enrichment)?,
            );
            for &family in request.families {
                self.generate_pair(
                    &review,
                    &experiment,
                    &documents,
                    &words,
                    family,
                    strategy,
                    &mut summary,
                )
                .await?;
            }
        }

        tracing::info!(
            experiment = %experiment.name,
            parameter_sets = summary.parameter_sets,
            created = summary.strings_created,
            reused = summary.strings_reused,
            "generation finished"
        );
        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    async fn generate_pair(
        &self,
        review: &Review,
        experiment: &Experiment,
        documents: &[String],
        words: &SimilarWordCache<'_, P::Words>,
        family: TopicFamily,
        strategy: SimilarWordStrategy,
        summary: &mut GenerationSummary,
    ) -> Result<(), SweepError> {
        let sweep = plan(self.service, self.config, &experiment.id, family, strategy).await?;
        summary.parameter_sets += sweep.sets.len() as u64;

        for set in &sweep.sets {
            if set.search_string_id.is_some() {
                summary.already_formulated += 1;
                continue;
            }

            let topics = self
                .providers
                .topic_extractor()
                .extract_topics(documents, &set.model)
                .await?;
            let formulated = self
                .formulation
                .formulate(&topics, words, &set.formulation)
                .await?;
            let string = scope_to_review(&formulated, review);

            let (search_string, created) =
                self.service.get_or_create_search_string(&string).await?;
            self.service
                .link_search_string(&set.id, &search_string.id)
                .await?;
            if created {
                summary.strings_created += 1;
            } else {
                summary.strings_reused += 1;
            }
            tracing::debug!(
                parameter_set = %set.id,
                search_string = %search_string.id,
                created,
                "parameter set formulated"
            );
        }
        Ok(())
    }
}
