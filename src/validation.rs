use anyhow::{anyhow, Result};
use std::path::Path;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a year filter
    pub fn validate_year(year: i32) -> Result<()> {
        // Backups store UTC epoch seconds; nothing predates 1970
        if !(1970..=9999).contains(&year) {
            return Err(anyhow!("Year must be between 1970 and 9999, got {year}"));
        }

        Ok(())
    }

    /// Validate the output file path or prefix
    pub fn validate_output_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("Output path cannot be empty"));
        }

        if path_str.contains('\0') {
            return Err(anyhow!("Output path contains invalid characters"));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(anyhow!("Output path too long (max 4096 characters)"));
        }

        if path.is_dir() {
            return Err(anyhow!("Output path is a directory: {path:?}"));
        }

        Ok(())
    }

    /// Validate the input glob pattern
    pub fn validate_input_pattern(pattern: &str) -> Result<()> {
        if pattern.trim().is_empty() {
            return Err(anyhow!("Input pattern cannot be empty"));
        }

        if pattern.contains('\0') {
            return Err(anyhow!("Input pattern contains invalid characters"));
        }

        glob::Pattern::new(pattern).map_err(|e| anyhow!("Invalid input pattern {pattern:?}: {e}"))?;

        Ok(())
    }

    /// Validate the redaction placeholder
    pub fn validate_placeholder(placeholder: &str) -> Result<()> {
        if placeholder.is_empty() {
            return Err(anyhow!("Redaction placeholder cannot be empty"));
        }

        if placeholder.contains('\n') || placeholder.contains('\r') {
            return Err(anyhow!("Redaction placeholder must be a single line"));
        }

        Ok(())
    }
}
