//! Error types for the GeoStudio object model.

use thiserror::Error;

/// Main error type for document reading, writing and schedule operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Parallel input sequences differ in length
    #[error("Size mismatch: {left} has {left_len} entries, {right} has {right_len}")]
    SizeMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    /// An aggregate operation needs a collaborator that was never set
    #[error("Missing collaborator: '{0}' is not set")]
    MissingCollaborator(&'static str),

    /// Property was never set and has no default
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// Property name is not declared by the entity schema
    #[error("Unknown property '{name}' for {entity}")]
    UnknownProperty { entity: &'static str, name: String },

    /// Property accessed with a kind other than the declared one
    #[error("Type mismatch for '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// Stored text cannot be coerced to the declared kind
    #[error("Invalid value for '{name}': {value:?} is not a valid {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },

    /// Record in a record list is missing a field or carries garbage
    #[error("Malformed record {index} in '{list}': {reason}")]
    MalformedRecord {
        list: &'static str,
        index: usize,
        reason: String,
    },

    /// Invalid data structure in the document
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// XML syntax or encoding error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Wrap an error raised by the XML codec.
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }
}

/// Result type alias for GeoStudio operations.
pub type Result<T> = std::result::Result<T, Error>;
