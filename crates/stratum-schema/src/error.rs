//! Error types for schema construction and typed parsing.

use crate::validation_error::ValidationError;
use thiserror::Error;

/// Misuse while building a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("an error map cannot be combined with invalid_type_error or required_error")]
    ErrorMapConflict,

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Failure of [`parse_as`](crate::Schema::parse_as): the input was invalid, or
/// the validated output did not deserialize into the target type.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("validation failed:\n{0}")]
    Validation(#[from] ValidationError),

    #[error("output does not match the target type: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ParseError {
    /// The validation issues, when validation itself failed.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ParseError::Validation(e) => Some(e),
            ParseError::Deserialize(_) => None,
        }
    }
}
