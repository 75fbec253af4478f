//! Incremental merge against a previously written output file
//!
//! Repeated runs against a growing backup must not duplicate messages. The
//! guids already present in the output are read back in that file's own
//! format, and only messages with a guid outside that set are written.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DumpError, Result};
use crate::models::{Message, OutputFormat};

#[derive(Deserialize)]
struct GuidOnly {
    guid: String,
}

/// What a write did to the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No output existed; a new file was written
    Created(usize),
    /// New messages were added to an existing file
    Appended(usize),
    /// Output exists and every message was already in it
    UpToDate,
}

impl MergeOutcome {
    /// Number of messages written
    #[must_use]
    pub const fn written(&self) -> usize {
        match self {
            Self::Created(n) | Self::Appended(n) => *n,
            Self::UpToDate => 0,
        }
    }

    /// Short label for logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Appended(_) => "appended",
            Self::UpToDate => "up_to_date",
        }
    }
}

/// True when `path` holds a previous output worth merging into
pub fn has_existing_output(path: &Path) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() > 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Read the guids recorded in an existing output file
pub fn existing_ids(path: &Path, format: OutputFormat) -> Result<HashSet<String>> {
    let incompatible = |reason: String| DumpError::IncompatibleOutput {
        path: path.to_path_buf(),
        reason,
    };

    match format {
        OutputFormat::Csv => {
            let mut reader = csv::Reader::from_path(path)?;
            if !reader.headers()?.iter().any(|h| h == "guid") {
                return Err(incompatible("no guid column".to_string()));
            }
            reader
                .deserialize::<GuidOnly>()
                .map(|row| row.map(|r| r.guid).map_err(DumpError::from))
                .collect()
        }
        OutputFormat::Json => {
            let reader = BufReader::new(File::open(path)?);
            let rows: Vec<GuidOnly> =
                serde_json::from_reader(reader).map_err(|e| incompatible(e.to_string()))?;
            Ok(rows.into_iter().map(|r| r.guid).collect())
        }
    }
}

/// Keep the messages whose id is not already known.
///
/// Source order is preserved. Ids repeated within `incoming` are kept only
/// on their first occurrence, since overlapping backups of one phone share
/// guids.
#[must_use]
pub fn new_messages(existing: &HashSet<String>, incoming: Vec<Message>) -> Vec<Message> {
    let mut seen: HashSet<String> = HashSet::with_capacity(incoming.len());
    incoming
        .into_iter()
        .filter(|m| !existing.contains(&m.id) && seen.insert(m.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Service};

    fn message(id: &str) -> Message {
        Message {
            id: id.to_string(),
            timestamp: 1,
            service: Service::IMessage,
            direction: Direction::Sent,
            address: "+1555".to_string(),
            subject: String::new(),
            text: "hi".to_string(),
        }
    }

    #[test]
    fn test_set_difference() {
        let existing: HashSet<String> = ["a", "b"].iter().map(ToString::to_string).collect();
        let fresh = new_messages(&existing, vec![message("a"), message("c"), message("b"), message("d")]);
        let ids: Vec<&str> = fresh.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn test_duplicates_within_batch_collapse() {
        let fresh = new_messages(&HashSet::new(), vec![message("a"), message("a"), message("b")]);
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn test_nothing_new() {
        let existing: HashSet<String> = std::iter::once("a".to_string()).collect();
        assert!(new_messages(&existing, vec![message("a")]).is_empty());
    }

    #[test]
    fn test_outcome_counts() {
        assert_eq!(MergeOutcome::Created(3).written(), 3);
        assert_eq!(MergeOutcome::Appended(1).written(), 1);
        assert_eq!(MergeOutcome::UpToDate.written(), 0);
    }
}
