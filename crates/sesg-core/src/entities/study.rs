use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A study of a review's GS.
///
/// `key` is the identifier the study carried in the imported review file and
/// is unique within the review. Reference edges are stored separately as
/// [`CitationEdge`] rows and never change after import.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Study {
    pub id: String,
    pub review_id: String,
    pub key: String,
    pub title: String,
    pub abstract_text: String,
    pub keywords: String,
}

impl Study {
    /// Text handed to topic extraction: title, abstract, and keywords.
    #[must_use]
    pub fn document(&self) -> String {
        format!("{}\n{}\n{}", self.title, self.abstract_text, self.keywords)
    }
}

/// `from_study_id` references `to_study_id`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct CitationEdge {
    pub from_study_id: String,
    pub to_study_id: String,
}
