use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named run of the sweep against one review. The QGS is frozen at
/// creation and lives in the `experiment_qgs` table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub review_id: String,
    pub created_at: DateTime<Utc>,
}
