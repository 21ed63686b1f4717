//! Storage error types.
//!
//! Backend-agnostic errors shared by the file and database stores. Uses
//! miette for diagnostic output and thiserror for the derives.

use miette::Diagnostic;
use thiserror::Error;

use crate::models::ModelError;

/// Storage operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum StorageError {
    #[error("Entity not found: {class} with id '{id}'")]
    #[diagnostic(code(hbnb::storage::not_found))]
    NotFound { class: String, id: String },

    #[error("Invalid data: {message} (hint: {help})")]
    #[diagnostic(code(hbnb::storage::invalid_data))]
    InvalidData { message: String, help: String },

    #[error("Integrity violation: {message}")]
    #[diagnostic(
        code(hbnb::storage::integrity),
        help("Referenced objects must be saved before the objects that point at them")
    )]
    Integrity { message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(hbnb::storage::database))]
    Database { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(hbnb::storage::connection))]
    Connection { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(hbnb::storage::migration))]
    Migration { message: String },

    #[error("I/O error on {path}: {message}")]
    #[diagnostic(code(hbnb::storage::io))]
    Io { path: String, message: String },

    #[error("Corrupt storage file {path}: {message}")]
    #[diagnostic(
        code(hbnb::storage::corrupt),
        help("Fix or remove the file; it is not valid object storage JSON")
    )]
    Corrupt { path: String, message: String },
}

impl From<ModelError> for StorageError {
    fn from(e: ModelError) -> Self {
        StorageError::InvalidData {
            message: e.to_string(),
            help: "Check the stored attributes against the class definition".to_string(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
