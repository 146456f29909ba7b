//! Client error types.

use thiserror::Error;

/// Why one page request failed. Each class maps to one coordinator reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageFailure {
    /// Transport timeout or transient server failure. Retry the same page.
    #[error("request timed out")]
    Timeout,

    /// The API key is expired, revoked, or out of quota. Rotate the key.
    #[error("API key expired")]
    KeyExpired,

    /// The remote cannot process this query.
    #[error("query rejected as unprocessable")]
    UnprocessableQuery,

    /// The query is too large for the remote.
    #[error("query payload too large")]
    PayloadTooLarge,
}

/// Errors constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP client could not be built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No API keys were configured.
    #[error("no API keys configured")]
    NoApiKeys,
}
