//! Entity model error types.

use chrono::NaiveDateTime;
use miette::Diagnostic;
use thiserror::Error;

use super::AttrType;

/// Errors raised while building, reconstructing or mutating entities.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown class: {name}")]
    #[diagnostic(code(hbnb::models::unknown_class))]
    UnknownClass { name: String },

    #[error("{class} has no attribute '{name}'")]
    #[diagnostic(code(hbnb::models::unknown_attribute))]
    UnknownAttribute { class: String, name: String },

    #[error("Attribute '{name}' cannot be assigned")]
    #[diagnostic(code(hbnb::models::read_only_attribute))]
    ReadOnlyAttribute { name: String },

    #[error("Attribute '{name}' expects {expected}")]
    #[diagnostic(code(hbnb::models::type_mismatch))]
    TypeMismatch { name: String, expected: AttrType },

    #[error("updated_at cannot advance past {at}")]
    #[diagnostic(code(hbnb::models::timestamp_overflow))]
    TimestampOverflow { at: NaiveDateTime },

    #[error("Cannot serialize entity: {message}")]
    #[diagnostic(code(hbnb::models::serialize))]
    Serialize { message: String },

    #[error("Cannot reconstruct entity: {message}")]
    #[diagnostic(code(hbnb::models::reconstruct))]
    Reconstruct { message: String },
}

/// Result type for entity model operations.
pub type ModelResult<T> = Result<T, ModelError>;
