//! Experiment creation and metrics settings.

use serde::{Deserialize, Serialize};

const fn default_qgs_size_divisor() -> u32 {
    3
}

const fn default_min_documents() -> u32 {
    10
}

const fn default_similarity_threshold() -> f64 {
    0.85
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExperimentConfig {
    /// The QGS is `⌊|GS| / qgs_size_divisor⌋` studies, at least one.
    #[serde(default = "default_qgs_size_divisor")]
    pub qgs_size_divisor: u32,

    /// Topic extraction input is doubled once when it holds fewer than this
    /// many documents.
    #[serde(default = "default_min_documents")]
    pub min_documents: u32,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            qgs_size_divisor: default_qgs_size_divisor(),
            min_documents: default_min_documents(),
        }
    }
}

impl ExperimentConfig {
    /// QGS size for a GS of `gs_size` studies.
    pub fn qgs_size(&self, gs_size: usize) -> usize {
        let divisor = usize::try_from(self.qgs_size_divisor.max(1)).unwrap_or(1);
        (gs_size / divisor).max(1).min(gs_size)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Minimum normalized title similarity, in `(0, 1]`, for a result to
    /// count as a match.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}
