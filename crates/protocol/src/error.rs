//! Error types for command encoding.

use thiserror::Error;

/// Result type alias for encoding operations.
pub type Result<T> = std::result::Result<T, EncodeError>;

/// Errors produced while normalizing or encoding a command descriptor.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A well name could not be parsed (expected e.g. "A1".."H12" or a digit string).
    #[error("Invalid well name: '{0}'")]
    InvalidWellName(String),

    /// A per-tip list had a different length than the volume list.
    #[error("{field} has {actual} entries but {expected} volumes were given")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An operation that requires volumes was given none.
    #[error("At least one volume is required for {0}")]
    NoVolumes(&'static str),

    /// A required field was missing for the operation kind.
    #[error("Missing field '{field}' for {operation}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}
