//! Entity structs for the experiment domain.
//!
//! Each entity maps to a table in the libSQL database (see
//! `sesg-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod experiment;
mod params;
mod performance;
mod review;
mod search_string;
mod similar_words;
mod study;

pub use experiment::Experiment;
pub use params::{BertopicParams, FormulationParams, LdaParams, ModelParams, ParameterSet};
pub use performance::{Performance, PerformanceMetrics};
pub use review::Review;
pub use search_string::SearchString;
pub use similar_words::SimilarWordsEntry;
pub use study::{CitationEdge, Study};
