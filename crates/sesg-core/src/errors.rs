//! Cross-cutting error types.
//!
//! Domain-specific errors (`DatabaseError`, `SweepError`, ...) live in their
//! respective crates and wrap [`CoreError`] where entity rules are checked.
//! Everything converges into `anyhow` in `sesg-cli`.

use thiserror::Error;

/// Errors that can be raised by any `sesg` crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
