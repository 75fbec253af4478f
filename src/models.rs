//! Data models for extracted messages
//!
//! This module contains the canonical message representation produced by the
//! schema normalizer, the flat record it is serialized as, and the counters
//! reported by each extraction pass.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Messaging service a message travelled over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    /// Apple's iMessage ("madrid" in legacy stores)
    #[serde(rename = "iMessage")]
    IMessage,
    /// Carrier SMS
    #[serde(rename = "SMS")]
    Sms,
}

impl Service {
    /// Label written to output files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IMessage => "iMessage",
            Self::Sms => "SMS",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the backup owner sent or received a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sent by the phone's owner
    Sent,
    /// Received by the phone's owner
    Received,
}

impl Direction {
    /// Build a direction from a sent flag
    #[must_use]
    pub const fn from_sent(sent: bool) -> Self {
        if sent {
            Self::Sent
        } else {
            Self::Received
        }
    }

    /// True for [`Direction::Sent`]
    #[must_use]
    pub const fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// A normalized message extracted from a backup database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Stable unique identifier (source guid, or ROWID when no guid exists)
    pub id: String,
    /// Seconds since 1970-01-01 UTC
    pub timestamp: i64,
    /// Service the message used
    pub service: Service,
    /// Sent or received
    pub direction: Direction,
    /// Sender or recipient identifier
    pub address: String,
    /// Subject line, empty if absent
    pub subject: String,
    /// Message body with newlines escaped
    pub text: String,
}

impl Message {
    /// Timestamp as a UTC datetime, if it is representable
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Calendar year of the message in UTC
    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.datetime().map(|dt| dt.year())
    }

    /// Flat record used for CSV rows and JSON objects
    #[must_use]
    pub fn to_record(&self) -> MessageRecord {
        MessageRecord {
            address: self.address.clone(),
            guid: self.id.clone(),
            service: self.service.as_str().to_string(),
            sent: if self.direction.is_sent() { "1" } else { "0" }.to_string(),
            subject: self.subject.clone(),
            text: self.text.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Serialized form of a [`Message`].
///
/// Fields are declared in alphabetical order, which fixes both the CSV column
/// order and the JSON key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Sender or recipient identifier
    pub address: String,
    /// Unique identifier used for de-duplication
    pub guid: String,
    /// `iMessage` or `SMS`
    pub service: String,
    /// `1` when sent, `0` when received
    pub sent: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub text: String,
    /// Seconds since 1970-01-01 UTC
    pub timestamp: i64,
}

/// Column order of the output files
pub const RECORD_COLUMNS: [&str; 7] = ["address", "guid", "service", "sent", "subject", "text", "timestamp"];

/// Output format for exported messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Resolve an output path or prefix to a concrete file path.
    ///
    /// A path without an extension gets this format's extension appended.
    #[must_use]
    pub fn resolve_path(&self, output: &Path) -> PathBuf {
        if output.extension().is_some() {
            output.to_path_buf()
        } else {
            output.with_extension(self.extension())
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

/// How an existing output file is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Merge new messages into an existing file
    Merge,
    /// Refuse to run when the output already exists
    Create,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "create" => Ok(Self::Create),
            other => Err(format!("unsupported write mode: {other}")),
        }
    }
}

/// Row counters for one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Rows turned into messages
    pub found: usize,
    /// Rows dropped because their text was empty or null
    pub skipped_empty: usize,
    /// Rows dropped by the sent-only or year filter
    pub skipped_filtered: usize,
}

impl ExtractStats {
    /// Total rows not emitted
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped_empty + self.skipped_filtered
    }

    /// Fold another pass's counters into this one
    pub fn absorb(&mut self, other: Self) {
        self.found += other.found;
        self.skipped_empty += other.skipped_empty;
        self.skipped_filtered += other.skipped_filtered;
    }
}

/// Messages produced by one extraction pass, with the counters for that pass
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Accepted messages in source order
    pub messages: Vec<Message>,
    /// Accepted/skipped counters
    pub stats: ExtractStats,
}

impl Extraction {
    /// Append another extraction's messages and counters
    pub fn extend(&mut self, other: Self) {
        self.messages.extend(other.messages);
        self.stats.absorb(other.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            id: "guid-1".to_string(),
            timestamp: 1_078_307_200,
            service: Service::IMessage,
            direction: Direction::Sent,
            address: "+1555".to_string(),
            subject: String::new(),
            text: "hi".to_string(),
        }
    }

    #[test]
    fn test_record_fields() {
        let record = sample().to_record();
        assert_eq!(record.guid, "guid-1");
        assert_eq!(record.service, "iMessage");
        assert_eq!(record.sent, "1");
        assert_eq!(record.timestamp, 1_078_307_200);
    }

    #[test]
    fn test_year_is_utc() {
        let mut message = sample();
        // 2012-12-31T23:59:59Z
        message.timestamp = 1_356_998_399;
        assert_eq!(message.year(), Some(2012));
        message.timestamp += 1;
        assert_eq!(message.year(), Some(2013));
    }

    #[test]
    fn test_resolve_path_appends_extension() {
        assert_eq!(OutputFormat::Json.resolve_path(Path::new("out/txt_messages")), PathBuf::from("out/txt_messages.json"));
        assert_eq!(OutputFormat::Csv.resolve_path(Path::new("dump.txt")), PathBuf::from("dump.txt"));
    }

    #[test]
    fn test_json_keys_alphabetical() {
        let json = serde_json::to_string(&sample().to_record()).unwrap();
        let keys: Vec<usize> = RECORD_COLUMNS.iter().map(|c| json.find(&format!("\"{c}\"")).unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }
}
