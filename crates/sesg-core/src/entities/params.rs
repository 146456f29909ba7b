use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{SimilarWordStrategy, TopicFamily};

/// Formulation hyperparameters. Deduplicated globally by value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FormulationParams {
    pub id: String,
    pub n_similar_words_per_word: u32,
    pub n_words_per_topic: u32,
}

/// LDA topic-model hyperparameters. Deduplicated globally by value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LdaParams {
    pub id: String,
    pub n_topics: u32,
    pub min_document_frequency: f64,
}

/// BERTopic hyperparameters. Deduplicated globally by value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BertopicParams {
    pub id: String,
    pub kmeans_n_clusters: u32,
    pub umap_n_neighbors: u32,
}

/// The model sub-record of a parameter set: exactly one family.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelParams {
    Lda(LdaParams),
    Bertopic(BertopicParams),
}

impl ModelParams {
    #[must_use]
    pub const fn family(&self) -> TopicFamily {
        match self {
            Self::Lda(_) => TopicFamily::Lda,
            Self::Bertopic(_) => TopicFamily::Bertopic,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Lda(p) => &p.id,
            Self::Bertopic(p) => &p.id,
        }
    }
}

/// One point of the sweep for an experiment.
///
/// Unique per `(experiment_id, formulation, model, similar_word_strategy)`.
/// `search_string_id` is set once the generation phase has formulated the
/// string for this point.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ParameterSet {
    pub id: String,
    pub experiment_id: String,
    pub formulation: FormulationParams,
    pub model: ModelParams,
    pub similar_word_strategy: SimilarWordStrategy,
    pub search_string_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
