use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{SearchStringStatus, SkipReason};

/// A formulated query string, deduplicated by its exact text.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SearchString {
    pub id: String,
    pub string: String,
    pub status: SearchStringStatus,
    pub skip_reason: Option<SkipReason>,
    pub created_at: DateTime<Utc>,
}
