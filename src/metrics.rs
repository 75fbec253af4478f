use metrics::counter;

use crate::merge::MergeOutcome;
use crate::models::{ExtractStats, OutputFormat};
use crate::normalize::SchemaVariant;

/// Rows turned into messages
pub const ROWS_FOUND_TOTAL: &str = "messages_dump_rows_found_total";
/// Rows dropped for empty text
pub const ROWS_SKIPPED_EMPTY_TOTAL: &str = "messages_dump_rows_skipped_empty_total";
/// Rows dropped by a filter
pub const ROWS_SKIPPED_FILTERED_TOTAL: &str = "messages_dump_rows_skipped_filtered_total";
/// Messages written to output
pub const MESSAGES_WRITTEN_TOTAL: &str = "messages_dump_messages_written_total";
/// Backup files read
pub const SOURCES_READ_TOTAL: &str = "messages_dump_sources_read_total";

/// Metrics emitted by a dump run.
///
/// Goes through the `metrics` facade; nothing is recorded unless the
/// embedding application installs a recorder.
#[derive(Debug, Clone, Copy)]
pub struct DumpMetrics;

impl DumpMetrics {
    /// Record the counters of one extraction pass
    pub fn record_extraction(schema: SchemaVariant, stats: &ExtractStats) {
        let schema = schema.as_str();

        counter!(SOURCES_READ_TOTAL, "schema" => schema).increment(1);
        counter!(ROWS_FOUND_TOTAL, "schema" => schema).increment(as_count(stats.found));
        counter!(ROWS_SKIPPED_EMPTY_TOTAL, "schema" => schema).increment(as_count(stats.skipped_empty));
        counter!(ROWS_SKIPPED_FILTERED_TOTAL, "schema" => schema).increment(as_count(stats.skipped_filtered));
    }

    /// Record what the writer did with the output file
    pub fn record_write(format: OutputFormat, outcome: &MergeOutcome) {
        counter!(
            MESSAGES_WRITTEN_TOTAL,
            "format" => format.extension(),
            "outcome" => outcome.label()
        )
        .increment(as_count(outcome.written()));
    }
}

fn as_count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
