/// Errors from building the metrics inputs.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("database error: {0}")]
    Database(#[from] sesg_db::error::DatabaseError),

    /// Similarity threshold outside (0, 1].
    #[error("similarity threshold {0} is outside (0, 1]")]
    InvalidThreshold(f64),

    /// A citation edge names a study that is not part of the GS.
    #[error("citation edge references unknown study '{0}'")]
    UnknownStudy(String),
}
