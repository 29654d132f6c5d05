//! Custom error types for the spage crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum SpageError {
    /// An error originating from the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record failed schema validation; nothing was written.
    #[error("Validation failed for `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// The record's size/type fields contradict each other.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Payload compression failed.
    #[error("Compression failed: {0}")]
    CompressionError(String),

    /// Payload decompression failed, usually because the bytes are not zlib data.
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// The rotation threshold could not be parsed.
    #[error("Invalid roll size: {0:?}")]
    InvalidRollSize(String),

    /// The requested page type is not one of `spage`, `offpage` or `s2o`.
    #[error("Unsupported page type: {0:?}. Expected 'spage', 'offpage' or 's2o'.")]
    UnsupportedPageType(String),
}

impl SpageError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SpageError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A convenience `Result` type alias using the crate's `SpageError` type.
pub type Result<T> = std::result::Result<T, SpageError>;
