//! Error types for the program model loader.
//!
//! Only fatal conditions are represented here. Missing type references,
//! unresolvable call targets and duplicate functions are reported through
//! `tracing` and loading continues.

use thiserror::Error;

/// Main error type for program model operations.
#[derive(Debug, Error)]
pub enum ProgramDataError {
    /// A required attribute was absent from an export record
    #[error("Attribute {attribute} was not found on {element} record")]
    MissingAttribute {
        element: String,
        attribute: String,
    },

    /// A numeric attribute could not be parsed
    #[error("Attribute {attribute} has non-numeric value {value:?}")]
    InvalidNumber { attribute: String, value: String },

    /// A declaration collides with an existing, incompatible type
    #[error("The type {key} is already defined as {existing}")]
    ConflictingDeclaration { key: String, existing: String },

    /// A type key string could not be parsed
    #[error("Invalid type key: {0}")]
    InvalidTypeKey(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record feed or configuration (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for program model operations
pub type Result<T> = std::result::Result<T, ProgramDataError>;
