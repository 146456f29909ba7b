//! Response types returned as JSON by `sesg` commands and the reporting
//! queries.
//!
//! Rows are flat so the table renderer can lay them out as columns.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Experiment, Review};
use crate::enums::{SimilarWordStrategy, TopicFamily};

/// Response from `sesg review show` and `sesg review import`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReviewSummary {
    pub review: Review,
    pub gs_size: u64,
    pub n_edges: u64,
}

/// One parameter set joined with the performance of its search string.
///
/// Only the sub-record columns of `family` are populated.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultRow {
    pub experiment: String,
    pub parameter_set_id: String,
    pub search_string_id: String,
    pub similar_word_strategy: SimilarWordStrategy,
    pub family: TopicFamily,
    pub n_similar_words_per_word: u32,
    pub n_words_per_topic: u32,
    pub n_topics: Option<u32>,
    pub min_document_frequency: Option<f64>,
    pub kmeans_n_clusters: Option<u32>,
    pub umap_n_neighbors: Option<u32>,
    pub n_results: u64,
    pub n_qgs_in_results: u64,
    pub n_gs_in_results: u64,
    pub n_gs_in_bsb: u64,
    pub n_gs_in_sb: u64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub bsb_recall: f64,
    pub sb_recall: f64,
}

/// One study of an experiment's QGS.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QgsRow {
    pub experiment: String,
    pub study_id: String,
    pub key: String,
    pub title: String,
}

/// Response from `sesg experiment start`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GenerationSummary {
    pub experiment: Experiment,
    pub qgs_size: u64,
    pub parameter_sets: u64,
    pub already_formulated: u64,
    pub strings_created: u64,
    pub strings_reused: u64,
}

/// Response from `sesg experiment search`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SearchSummary {
    pub experiment: String,
    pub n_clients: u64,
    pub pending: u64,
    pub completed: u64,
    pub skipped: u64,
    pub termination: String,
}

/// Response from `sesg strings fix-invalid`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FixInvalidSummary {
    pub checked: u64,
    pub flagged: Vec<String>,
}
