//! iPhone Messages Dump - SMS and iMessage export from phone backups
//!
//! A Rust library for pulling message history out of the SMS database in
//! iTunes/Finder iPhone backups and writing it to CSV or JSON.
//!
//! # Features
//!
//! - Reads both the legacy ("madrid") and modern `message` table layouts
//! - Sent-only and calendar-year filters
//! - Privacy redaction of message text, on by default
//! - Incremental runs that only add messages not already in the output

/// Configuration management
pub mod config;
/// Read-only access to backup databases
pub mod db;
/// Locating backup databases
pub mod discovery;
/// Error types
pub mod error;
/// Row extraction and filtering
pub mod extractor;
/// CSV and JSON output
pub mod file_writer;
/// Logging setup and utilities
pub mod logging;
/// De-duplication against existing output
pub mod merge;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
pub mod normalize;
/// Message text redaction
pub mod privacy;
/// Backup database schema definitions
pub mod schema;
/// End-to-end dump runs
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use error::{DumpError, Result};
pub use extractor::{ExtractOptions, Extractor};
pub use models::{Direction, Message, OutputFormat, Service, WriteMode};
pub use service::{DumpConfig, DumpService};
