//! Strategy families, statuses, and set kinds.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for the string stored in SQL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TopicFamily
// ---------------------------------------------------------------------------

/// Topic-extraction strategy family. Each family has its own model-parameter
/// sub-record (see [`crate::entities::ModelParams`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TopicFamily {
    Lda,
    Bertopic,
}

impl TopicFamily {
    pub const ALL: [Self; 2] = [Self::Bertopic, Self::Lda];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lda => "lda",
            Self::Bertopic => "bertopic",
        }
    }
}

impl fmt::Display for TopicFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SimilarWordStrategy
// ---------------------------------------------------------------------------

/// Which word-expansion provider produced the similar words of a string.
///
/// Doubles as the provider identity in the similar-word cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SimilarWordStrategy {
    Bert,
    Llm,
}

impl SimilarWordStrategy {
    pub const ALL: [Self; 2] = [Self::Bert, Self::Llm];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bert => "bert",
            Self::Llm => "llm",
        }
    }
}

impl fmt::Display for SimilarWordStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SearchStringStatus
// ---------------------------------------------------------------------------

/// Durable processing marker of a search string.
///
/// ```text
/// pending → processed   (performance committed in the same transaction)
///         → skipped     (remote rejected the string; no performance)
/// skipped → processed   (only via an explicit retry of skipped strings)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchStringStatus {
    Pending,
    Processed,
    Skipped,
}

impl SearchStringStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Processed, Self::Skipped],
            Self::Skipped => &[Self::Processed, Self::Skipped],
            Self::Processed => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for SearchStringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SkipReason
// ---------------------------------------------------------------------------

/// Why the remote refused a single search string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnprocessableQuery,
    PayloadTooLarge,
}

impl SkipReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnprocessableQuery => "unprocessable_query",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StudySet
// ---------------------------------------------------------------------------

/// The four study identity lists recorded on a performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StudySet {
    QgsInResults,
    GsInResults,
    GsInBsb,
    GsInSb,
}

impl StudySet {
    pub const ALL: [Self; 4] = [
        Self::QgsInResults,
        Self::GsInResults,
        Self::GsInBsb,
        Self::GsInSb,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QgsInResults => "qgs_in_results",
            Self::GsInResults => "gs_in_results",
            Self::GsInBsb => "gs_in_bsb",
            Self::GsInSb => "gs_in_sb",
        }
    }
}

impl fmt::Display for StudySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MetricColumn
// ---------------------------------------------------------------------------

/// Metric used to order reporting queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricColumn {
    Precision,
    Recall,
    F1,
    BsbRecall,
    SbRecall,
}

impl MetricColumn {
    /// Column name in the `performances` table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Precision => "start_set_precision",
            Self::Recall => "start_set_recall",
            Self::F1 => "start_set_f1",
            Self::BsbRecall => "bsb_recall",
            Self::SbRecall => "sb_recall",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::F1 => "f1",
            Self::BsbRecall => "bsb_recall",
            Self::SbRecall => "sb_recall",
        }
    }
}

impl fmt::Display for MetricColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
