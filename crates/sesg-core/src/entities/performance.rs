use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The reduced outcome of one remote result set.
///
/// The id lists hold study ids of the review's GS. Ratios are in `[0, 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PerformanceMetrics {
    pub n_results: u64,
    pub qgs_in_results: Vec<String>,
    pub gs_in_results: Vec<String>,
    pub gs_in_bsb: Vec<String>,
    pub gs_in_sb: Vec<String>,
    pub start_set_precision: f64,
    pub start_set_recall: f64,
    pub start_set_f1: f64,
    pub bsb_recall: f64,
    pub sb_recall: f64,
}

/// A persisted performance. One per search string; never overwritten.
/// `invalid` is set only by the correction path.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Performance {
    pub id: String,
    pub search_string_id: String,
    pub metrics: PerformanceMetrics,
    pub invalid: bool,
    pub created_at: DateTime<Utc>,
}
