//! Error types for fixed-width record file operations.

use thiserror::Error;

/// The error type for every fallible operation in this crate.
#[derive(Debug, Error)]
pub enum FlrError {
    /// An error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session is configured in a way that forbids the requested operation,
    /// e.g. assigning ranges to a multi-kind file or before fast mode is enabled.
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// A supplied range is not an integer interval over logical record indices.
    #[error("Invalid range: {0}")]
    InvalidRangeArgument(String),

    /// A line read through the direct accessor matched no record kind.
    #[error("Unknown record type at line {line}")]
    UnknownRecordKind { line: u64 },

    /// A record to be written names a kind with no template.
    #[error("Record type problem in output: {kind} type on record, {known} types of templates")]
    KindMismatchOnWrite { kind: String, known: String },

    /// Layout definition text could not be parsed.
    #[error("Layout definition error: {0}")]
    LayoutDefinition(String),
}

/// Convenience `Result` alias using [`FlrError`].
pub type Result<T> = std::result::Result<T, FlrError>;
