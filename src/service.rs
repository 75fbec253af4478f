use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::db::SourceDatabase;
use crate::discovery::find_sources;
use crate::error::{DumpError, Result};
use crate::extractor::{ExtractOptions, Extractor};
use crate::file_writer;
use crate::logging::OperationTimer;
use crate::merge::{existing_ids, has_existing_output, new_messages, MergeOutcome};
use crate::metrics::DumpMetrics;
use crate::models::{ExtractStats, Message, OutputFormat, WriteMode};
use crate::normalize::SchemaVariant;
use crate::privacy::RedactionPolicy;

/// Everything one dump run needs, resolved from configuration and CLI flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    /// Glob matching backup databases
    pub input_pattern: String,
    /// Output file, extension included
    pub output_path: PathBuf,
    /// Output serialization
    pub format: OutputFormat,
    /// What to do when the output already exists
    pub mode: WriteMode,
    /// Row filters
    pub extract: ExtractOptions,
    /// Text redaction
    pub redaction: RedactionPolicy,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Databases that were read, in order
    pub sources: Vec<PathBuf>,
    /// Counters over all sources
    pub stats: ExtractStats,
    /// What happened to the output file
    pub outcome: MergeOutcome,
}

/// A backup database matched by the input pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Database path
    pub path: PathBuf,
    /// Detected schema, `None` when it could not be determined
    pub schema: Option<SchemaVariant>,
}

/// Runs extraction, redaction and the merge/write step
pub struct DumpService {
    config: DumpConfig,
}

impl DumpService {
    /// Create a service for one configuration
    #[must_use]
    pub const fn new(config: DumpConfig) -> Self {
        Self { config }
    }

    /// Configuration this service runs with
    #[must_use]
    pub const fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Extract every matching backup and write the result.
    ///
    /// In create mode an existing output path fails the run before any
    /// source is read.
    pub fn run(&self) -> Result<RunSummary> {
        let output = &self.config.output_path;
        if self.config.mode == WriteMode::Create && output.exists() {
            return Err(DumpError::OutputExists(output.clone()));
        }

        let sources = find_sources(&self.config.input_pattern)?;

        let timer = OperationTimer::new("extract");
        let mut extraction = Extractor::new(self.config.extract).extract_all(&sources)?;
        timer.finish();
        info!(
            files = sources.len(),
            found = extraction.stats.found,
            skipped = extraction.stats.skipped(),
            "Extraction complete"
        );

        self.config.redaction.apply(&mut extraction.messages);

        let outcome = self.write(extraction.messages)?;
        DumpMetrics::record_write(self.config.format, &outcome);

        Ok(RunSummary {
            sources,
            stats: extraction.stats,
            outcome,
        })
    }

    /// Write messages to the configured output, merging when it already exists
    pub fn write(&self, messages: Vec<Message>) -> Result<MergeOutcome> {
        let path = &self.config.output_path;
        let format = self.config.format;
        let timer = OperationTimer::new("write");

        let outcome = if has_existing_output(path)? {
            if self.config.mode == WriteMode::Create {
                return Err(DumpError::OutputExists(path.clone()));
            }

            let existing = existing_ids(path, format)?;
            let fresh = new_messages(&existing, messages);
            if fresh.is_empty() {
                info!("wrote 0 new messages; {} is up to date", path.display());
                MergeOutcome::UpToDate
            } else {
                info!("appending {} new messages to {}", fresh.len(), path.display());
                file_writer::append(&fresh, format, path)?;
                MergeOutcome::Appended(fresh.len())
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            let fresh = new_messages(&HashSet::new(), messages);
            info!("writing out {} messages to {}", fresh.len(), path.display());
            file_writer::write_new(&fresh, format, path)?;
            MergeOutcome::Created(fresh.len())
        };

        timer.finish();
        Ok(outcome)
    }

    /// List the databases the input pattern matches and their schema
    pub fn list_sources(&self) -> Result<Vec<SourceInfo>> {
        let sources = find_sources(&self.config.input_pattern)?;

        Ok(sources
            .into_iter()
            .map(|path| {
                let schema = SourceDatabase::open(&path)
                    .and_then(|db| db.message_columns())
                    .and_then(|columns| SchemaVariant::detect(&columns));
                match schema {
                    Ok(schema) => SourceInfo {
                        path,
                        schema: Some(schema),
                    },
                    Err(e) => {
                        warn!("Cannot read {}: {}", path.display(), e);
                        SourceInfo { path, schema: None }
                    },
                }
            })
            .collect())
    }
}
