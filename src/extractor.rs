//! Message extraction from backup databases
//!
//! Reads every row of a store's `message` relation, normalizes it through
//! [`SourceRow`] and applies the sent-only and year filters. Each pass returns
//! its messages together with the counters for that pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::{RawTable, SourceDatabase};
use crate::error::Result;
use crate::metrics::DumpMetrics;
use crate::models::{ExtractStats, Extraction, Message};
use crate::normalize::{SchemaVariant, SourceRow};

/// Filters applied to normalized messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Keep only messages the owner sent
    pub sent_only: bool,
    /// Keep only messages from this UTC calendar year
    pub year: Option<i32>,
}

impl ExtractOptions {
    /// Whether a normalized message passes every filter
    #[must_use]
    pub fn accepts(&self, message: &Message) -> bool {
        if self.sent_only && !message.direction.is_sent() {
            return false;
        }
        match self.year {
            Some(year) => message.year() == Some(year),
            None => true,
        }
    }
}

/// Turns backup databases into normalized messages
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    options: ExtractOptions,
}

impl Extractor {
    /// Create an extractor with the given filters
    #[must_use]
    pub const fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Filters this extractor applies
    #[must_use]
    pub const fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every file in order and accumulate the results
    pub fn extract_all(&self, paths: &[PathBuf]) -> Result<Extraction> {
        let mut total = Extraction::default();
        for path in paths {
            let (_, extraction) = self.extract_file(path)?;
            total.extend(extraction);
        }
        Ok(total)
    }

    /// Open one backup database, detect its schema and extract its messages.
    ///
    /// The database is closed before this returns.
    pub fn extract_file(&self, path: &Path) -> Result<(SchemaVariant, Extraction)> {
        info!("reading {}. use --input-pattern to select only this file", path.display());

        let table = SourceDatabase::open(path)?.read_messages()?;
        let schema = SchemaVariant::detect(&table.columns)?;
        debug!(schema = schema.as_str(), "Detected message schema");

        let extraction = self.extract_table(schema, table);
        info!("found {} skipped {}", extraction.stats.found, extraction.stats.skipped());
        DumpMetrics::record_extraction(schema, &extraction.stats);

        Ok((schema, extraction))
    }

    /// Normalize and filter rows that were already read
    #[must_use]
    pub fn extract_table(&self, schema: SchemaVariant, table: RawTable) -> Extraction {
        let mut stats = ExtractStats::default();
        let mut messages = Vec::with_capacity(table.rows.len());

        for raw in &table.rows {
            let Some(message) = SourceRow::from_raw(schema, raw).into_message() else {
                stats.skipped_empty += 1;
                continue;
            };

            if self.options.accepts(&message) {
                stats.found += 1;
                messages.push(message);
            } else {
                stats.skipped_filtered += 1;
            }
        }

        Extraction { messages, stats }
    }
}
