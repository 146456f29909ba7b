use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A systematic literature review. Owns the GS (every [`super::Study`] with
/// this `review_id`) and the publication-year window search strings are
/// bounded to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Review {
    pub id: String,
    pub name: String,
    pub min_publication_year: Option<i32>,
    pub max_publication_year: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Reject a publication-year window whose lower bound lies after its
    /// upper bound. Open bounds always pass.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] naming both years.
    pub fn check_year_window(min: Option<i32>, max: Option<i32>) -> Result<(), CoreError> {
        match (min, max) {
            (Some(min), Some(max)) if min > max => Err(CoreError::Validation(format!(
                "min_publication_year {min} is after max_publication_year {max}"
            ))),
            _ => Ok(()),
        }
    }
}
