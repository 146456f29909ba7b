//! Maps HTTP outcomes onto [`PageFailure`] classes.

use reqwest::StatusCode;

use crate::error::PageFailure;

/// Classify a response status. Success passes the response through.
///
/// - 401, 403, 429: the key is invalid or out of quota
/// - 400: the query cannot be processed
/// - 413, 414: the query is too large
/// - anything else non-success: transient, retried as a timeout
pub fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, PageFailure> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let failure = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            PageFailure::KeyExpired
        }
        StatusCode::BAD_REQUEST => PageFailure::UnprocessableQuery,
        StatusCode::PAYLOAD_TOO_LARGE | StatusCode::URI_TOO_LONG => PageFailure::PayloadTooLarge,
        _ => PageFailure::Timeout,
    };
    tracing::debug!(status = status.as_u16(), %failure, "page request failed");
    Err(failure)
}

/// Transport errors are never the query's fault; all of them are retried.
pub fn classify_transport(err: &reqwest::Error) -> PageFailure {
    if err.is_timeout() {
        tracing::debug!("page request timed out");
    } else {
        tracing::debug!(%err, "page request transport error");
    }
    PageFailure::Timeout
}
