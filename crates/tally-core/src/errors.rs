//! Core error types.

use thiserror::Error;

/// Errors from [`normalize`](crate::normalize::normalize).
///
/// Malformed individual records never produce an error; only the top-level
/// shape of the payload can fail the whole operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The payload was not a JSON array.
    #[error("expected a task collection (JSON array), found {found}")]
    NotACollection {
        /// JSON type name of the value that was supplied.
        found: &'static str,
    },
}

/// A priority string that is not one of `Low`, `Medium`, `High`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown priority '{0}' (expected Low, Medium, or High)")]
pub struct ParsePriorityError(pub String);
