//! Hyperparameter lists expanded by the sweep planner.
//!
//! Every list is one axis of the cartesian product. An empty list would
//! produce an empty sweep and is rejected by [`crate::SesgConfig::validate`].

use serde::{Deserialize, Serialize};

fn default_n_similar_words_per_word() -> Vec<u32> {
    vec![0, 1, 2, 3]
}

fn default_n_words_per_topic() -> Vec<u32> {
    vec![5, 7, 10]
}

fn default_n_topics() -> Vec<u32> {
    vec![1, 2, 3, 4, 5]
}

fn default_min_document_frequency() -> Vec<f64> {
    vec![0.1, 0.2, 0.3, 0.4]
}

fn default_kmeans_n_clusters() -> Vec<u32> {
    vec![1, 2, 3, 4, 5]
}

fn default_umap_n_neighbors() -> Vec<u32> {
    vec![3, 6, 9, 12, 15]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormulationParamsConfig {
    #[serde(default = "default_n_similar_words_per_word")]
    pub n_similar_words_per_word: Vec<u32>,

    #[serde(default = "default_n_words_per_topic")]
    pub n_words_per_topic: Vec<u32>,
}

impl Default for FormulationParamsConfig {
    fn default() -> Self {
        Self {
            n_similar_words_per_word: default_n_similar_words_per_word(),
            n_words_per_topic: default_n_words_per_topic(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LdaParamsConfig {
    #[serde(default = "default_n_topics")]
    pub n_topics: Vec<u32>,

    /// Fractions in `(0, 1]`.
    #[serde(default = "default_min_document_frequency")]
    pub min_document_frequency: Vec<f64>,
}

impl Default for LdaParamsConfig {
    fn default() -> Self {
        Self {
            n_topics: default_n_topics(),
            min_document_frequency: default_min_document_frequency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BertopicParamsConfig {
    #[serde(default = "default_kmeans_n_clusters")]
    pub kmeans_n_clusters: Vec<u32>,

    #[serde(default = "default_umap_n_neighbors")]
    pub umap_n_neighbors: Vec<u32>,
}

impl Default for BertopicParamsConfig {
    fn default() -> Self {
        Self {
            kmeans_n_clusters: default_kmeans_n_clusters(),
            umap_n_neighbors: default_umap_n_neighbors(),
        }
    }
}
