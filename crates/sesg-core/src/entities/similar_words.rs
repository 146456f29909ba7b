use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::SimilarWordStrategy;

/// Memoized provider output for one `(experiment, word, strategy)` key.
/// Order of `similar_words` is the provider's order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SimilarWordsEntry {
    pub id: String,
    pub experiment_id: String,
    pub word: String,
    pub strategy: SimilarWordStrategy,
    pub similar_words: Vec<String>,
    pub created_at: DateTime<Utc>,
}
