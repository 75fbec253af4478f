//! Error types for the iphone-messages-dump library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the extraction and export pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while dumping messages from a backup.
#[derive(Error, Debug)]
pub enum DumpError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The `message` relation matches neither known schema generation
    #[error("Unrecognized message schema (columns: {})", .columns.join(", "))]
    UnknownSchema {
        /// Column names reported by the source store
        columns: Vec<String>,
    },

    /// The input pattern matched no database file
    #[error("No backup database matches pattern: {0}")]
    NoSourceFiles(String),

    /// Invalid glob pattern
    #[error("Invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Output already exists and the run is not allowed to merge into it
    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Existing output cannot be read back for de-duplication
    #[error("Existing output {} is not compatible: {reason}", .path.display())]
    IncompatibleOutput {
        /// Path of the existing output file
        path: PathBuf,
        /// What made it unreadable
        reason: String,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience type alias for Result with `DumpError`
pub type Result<T> = std::result::Result<T, DumpError>;

impl From<glob::GlobError> for DumpError {
    fn from(err: glob::GlobError) -> Self {
        Self::Io(err.into_error())
    }
}
