//! Error handling for the migration engine.

pub mod exceptions;

use std::io;
use thiserror::Error;

/// Specialized error type for migration operations
#[derive(Debug, Error)]
pub enum Error {
    /// Error opening or reading a source file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error reading a delimited source file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error parsing a configuration file
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown source format tag
    #[error("unknown source format: {0}")]
    UnknownFormat(String),

    /// A table was requested that the source does not provide
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A precondition of the run failed before any row was processed
    #[error("setup error: {0}")]
    Setup(String),

    /// The target repository rejected an operation
    #[error("repository error: {0}")]
    Repository(String),

    /// A transactional flush was rolled back
    #[error("commit failed for table {table}: {message}")]
    CommitFailed {
        /// Table whose batch was being flushed
        table: String,
        /// Description of the failure, including nested validation messages
        message: String,
    },

    /// Entity validation failed, one message per offending field
    #[error("validation failed for {entity}: {}", messages.join("; "))]
    Validation {
        /// The entity kind that failed validation
        entity: String,
        /// One message per offending field
        messages: Vec<String>,
    },

    /// The run was cancelled cooperatively between rows
    #[error("import cancelled")]
    Cancelled,
}

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, Error>;
