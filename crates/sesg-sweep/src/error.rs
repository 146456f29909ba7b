//! Sweep error types.

use thiserror::Error;

use crate::coordinator::FatalReason;

/// Errors from an external topic or word provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider process could not be started or talked to.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The provider process exited unsuccessfully.
    #[error("'{command}' exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    /// The provider did not answer in time.
    #[error("'{command}' timed out after {secs}s")]
    TimedOut { command: String, secs: u64 },

    /// HTTP transport error talking to a provider service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something other than the expected JSON.
    #[error("malformed provider output: {0}")]
    Protocol(String),

    /// The similar-word cache could not be read or written.
    #[error("similar-word cache: {0}")]
    Cache(#[from] sesg_db::error::DatabaseError),

    /// No provider is configured for this role.
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Errors from planning, generation, and revalidation.
///
/// Fatal terminations of a coordinator run are not errors; they are
/// reported in [`crate::coordinator::SearchReport`]. A single-client pass
/// such as revalidation returns them as [`SweepError::Aborted`].
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("database error: {0}")]
    Database(#[from] sesg_db::error::DatabaseError),

    #[error("configuration error: {0}")]
    Config(#[from] sesg_config::ConfigError),

    #[error("metrics error: {0}")]
    Metrics(#[from] sesg_metrics::MetricsError),

    #[error("client error: {0}")]
    Client(#[from] sesg_scopus::ClientError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The remote became unreachable for the whole run: the retry budget
    /// or the API keys ran out.
    #[error("aborted: {0}")]
    Aborted(FatalReason),
}
