//! Validation errors for the shared data model.

use thiserror::Error;

/// Errors raised constructing or mutating the data model's invariant-bearing
/// types (`ContextItem`, `Record`).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
