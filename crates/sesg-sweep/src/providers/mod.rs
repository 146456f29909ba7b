//! External collaborators: topic extraction and word expansion.
//!
//! No model runs in-process. Topic extraction and the `bert` expansion are
//! delegated to a bridge executable speaking JSON over stdin/stdout; the
//! `llm` expansion talks to an Ollama-compatible HTTP endpoint.

pub mod ollama;
pub mod subprocess;

use std::time::Duration;

use sesg_config::ProvidersConfig;
use sesg_core::entities::ModelParams;
use sesg_core::enums::SimilarWordStrategy;

use crate::error::ProviderError;

pub use ollama::OllamaSimilarWords;
pub use subprocess::{SubprocessSimilarWords, SubprocessTopicExtractor};

/// Extracts topics (ordered word lists) from documents.
#[allow(async_fn_in_trait)]
pub trait TopicExtractor {
    async fn extract_topics(
        &self,
        documents: &[String],
        params: &ModelParams,
    ) -> Result<Vec<Vec<String>>, ProviderError>;
}

/// Expands a word into an ordered list of similar words.
#[allow(async_fn_in_trait)]
pub trait SimilarWordProvider {
    async fn similar_words(&self, word: &str) -> Result<Vec<String>, ProviderError>;
}

/// Source of the providers a generation run needs.
///
/// Word providers are built per experiment because they are primed with
/// the experiment's enrichment text.
pub trait Providers {
    type Topics: TopicExtractor;
    type Words: SimilarWordProvider;

    fn topic_extractor(&self) -> &Self::Topics;

    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] if `strategy` has no
    /// provider.
    fn similar_words(
        &self,
        strategy: SimilarWordStrategy,
        enrichment_text: &str,
    ) -> Result<Self::Words, ProviderError>;
}

/// The word provider of one strategy.
pub enum ExternalWords {
    Bert(SubprocessSimilarWords),
    Llm(OllamaSimilarWords),
}

impl SimilarWordProvider for ExternalWords {
    async fn similar_words(&self, word: &str) -> Result<Vec<String>, ProviderError> {
        match self {
            Self::Bert(p) => p.similar_words(word).await,
            Self::Llm(p) => p.similar_words(word).await,
        }
    }
}

/// Production providers built from `[providers]` configuration.
pub struct ExternalProviders {
    config: ProvidersConfig,
    topics: SubprocessTopicExtractor,
}

impl ExternalProviders {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] if the topic command is
    /// empty.
    pub fn new(config: ProvidersConfig) -> Result<Self, ProviderError> {
        let topics = SubprocessTopicExtractor::new(config.topic_command.clone())?
            .with_timeout(Duration::from_secs(config.request_timeout_secs));
        Ok(Self { config, topics })
    }
}

impl Providers for ExternalProviders {
    type Topics = SubprocessTopicExtractor;
    type Words = ExternalWords;

    fn topic_extractor(&self) -> &Self::Topics {
        &self.topics
    }

    fn similar_words(
        &self,
        strategy: SimilarWordStrategy,
        enrichment_text: &str,
    ) -> Result<Self::Words, ProviderError> {
        match strategy {
            SimilarWordStrategy::Bert => Ok(ExternalWords::Bert(
                SubprocessSimilarWords::new(self.config.bert_command.clone(), enrichment_text)?
                    .with_timeout(Duration::from_secs(self.config.request_timeout_secs)),
            )),
            SimilarWordStrategy::Llm => Ok(ExternalWords::Llm(OllamaSimilarWords::new(
                &self.config,
                enrichment_text,
            )?)),
        }
    }
}
