//! Locating backup message databases on disk

use std::path::PathBuf;

use tracing::debug;

use crate::error::{DumpError, Result};
use crate::schema::SMS_DB_BACKUP_NAME;

/// Glob matching the SMS database of every iTunes/Finder backup on this machine.
///
/// Windows keeps backups under the roaming AppData `Apple Computer` folder;
/// macOS (and anything else) under the user data directory.
#[must_use]
pub fn default_input_pattern() -> String {
    let backup_root = dirs::data_dir().map_or_else(
        || PathBuf::from("~/Library/Application Support/MobileSync/Backup"),
        |data| {
            if cfg!(windows) {
                data.join("Apple Computer").join("MobileSync").join("Backup")
            } else {
                data.join("MobileSync").join("Backup")
            }
        },
    );

    backup_root.join("*").join(SMS_DB_BACKUP_NAME).to_string_lossy().into_owned()
}

/// Expand a leading `~` to the user's home directory
#[must_use]
pub fn expand_tilde(pattern: &str) -> String {
    let rest = match pattern.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return pattern.to_string(),
    };

    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.display()),
        None => pattern.to_string(),
    }
}

/// All regular files matching `pattern`, sorted by path.
///
/// A pattern that matches nothing is an error.
pub fn find_sources(pattern: &str) -> Result<Vec<PathBuf>> {
    let expanded = expand_tilde(pattern);
    debug!(pattern = %expanded, "Searching for backup databases");

    let mut paths = Vec::new();
    for entry in glob::glob(&expanded)? {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(DumpError::NoSourceFiles(expanded));
    }
    Ok(paths)
}
