//! ID prefix constants.
//!
//! IDs are generated in SQL as `{prefix}-{8 hex chars}` (see
//! `SesgDb::generate_id`).

pub const PREFIX_REVIEW: &str = "rev";
pub const PREFIX_STUDY: &str = "stu";
pub const PREFIX_EXPERIMENT: &str = "exp";
pub const PREFIX_FORMULATION: &str = "frm";
pub const PREFIX_LDA: &str = "lda";
pub const PREFIX_BERTOPIC: &str = "btp";
pub const PREFIX_PARAMETER_SET: &str = "prm";
pub const PREFIX_SEARCH_STRING: &str = "sst";
pub const PREFIX_PERFORMANCE: &str = "prf";
pub const PREFIX_SIMILAR_WORDS: &str = "swc";

/// Every prefix in use, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_REVIEW,
    PREFIX_STUDY,
    PREFIX_EXPERIMENT,
    PREFIX_FORMULATION,
    PREFIX_LDA,
    PREFIX_BERTOPIC,
    PREFIX_PARAMETER_SET,
    PREFIX_SEARCH_STRING,
    PREFIX_PERFORMANCE,
    PREFIX_SIMILAR_WORDS,
];
