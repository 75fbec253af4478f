//! Schema normalization for backup message stores
//!
//! Two generations of the `message` table exist in iPhone backups:
//!
//! - **Legacy** ("madrid") stores carry `is_madrid`, encode direction in the
//!   numeric `madrid_flags` (iMessage) or `flags` (SMS) columns and count dates
//!   from 2001-01-01.
//! - **Modern** stores carry an explicit `is_sent` boolean and a `service`
//!   string, with dates already counted from 1970-01-01.
//!
//! The generation is detected once per store from its column set, then every
//! row is parsed into a [`SourceRow`] of that generation and turned into a
//! canonical [`Message`].

use rusqlite::types::Value;
use sha2::{Digest, Sha256};

use crate::db::RawRow;
use crate::error::{DumpError, Result};
use crate::models::{Direction, Message, Service};
use crate::schema::message::{self, legacy, modern};
use crate::schema::MADRID_OFFSET;

/// Prefix of ids derived from row content
pub const CONTENT_KEY_PREFIX: &str = "sms:";

/// Columns hashed into a content key, in order
const CONTENT_KEY_COLUMNS: [&str; 8] = [
    message::DATE,
    message::ADDRESS,
    legacy::FLAGS,
    legacy::MADRID_FLAGS,
    modern::IS_SENT,
    modern::SERVICE,
    message::SUBJECT,
    message::TEXT,
];

/// Schema generation of a backup message store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Flag-based "madrid" layout with a 2001 epoch
    Legacy,
    /// `is_sent`/`service` layout with a 1970 epoch
    Modern,
}

impl SchemaVariant {
    /// Detect the generation from the `message` column set.
    ///
    /// `is_madrid` only exists in legacy stores. A store with neither that
    /// column nor the `is_sent`/`service` pair is rejected rather than guessed.
    pub fn detect(columns: &[String]) -> Result<Self> {
        let has = |name: &str| columns.iter().any(|c| c.eq_ignore_ascii_case(name));

        if has(legacy::IS_MADRID) {
            Ok(Self::Legacy)
        } else if has(modern::IS_SENT) && has(modern::SERVICE) {
            Ok(Self::Modern)
        } else {
            Err(DumpError::UnknownSchema {
                columns: columns.to_vec(),
            })
        }
    }

    /// Short label for logs and metrics
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        }
    }
}

/// Fields shared by both generations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonFields {
    /// guid (`madrid_guid` in legacy stores), or a content key when the row has none
    pub id: String,
    /// Raw `date` value as stored
    pub date: i64,
    /// Raw `text`, `None` when null or empty
    pub text: Option<String>,
    /// Raw `subject`
    pub subject: Option<String>,
    /// Raw `address`
    pub address: Option<String>,
}

/// A row of a legacy store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRow {
    /// Shared fields
    pub common: CommonFields,
    /// `is_madrid` was set
    pub is_madrid: bool,
    /// iMessage status code
    pub madrid_flags: Option<i64>,
    /// SMS status code
    pub flags: Option<i64>,
    /// iMessage counterpart handle
    pub madrid_handle: Option<String>,
}

/// A row of a modern store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModernRow {
    /// Shared fields
    pub common: CommonFields,
    /// `is_sent` was set
    pub is_sent: bool,
    /// Service name
    pub service: Option<String>,
    /// Owner account
    pub account: Option<String>,
}

/// A source row tagged with its schema generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRow {
    /// Row of a legacy store
    Legacy(LegacyRow),
    /// Row of a modern store
    Modern(ModernRow),
}

impl SourceRow {
    /// Parse a raw row according to the detected generation.
    ///
    /// Missing columns read as null; nothing here fails.
    ///
    /// Rows without a guid (legacy SMS) get a [`content_key`], so the same
    /// message read from two backups keeps one id while rowids shared by
    /// different devices do not collide.
    #[must_use]
    pub fn from_raw(schema: SchemaVariant, raw: &RawRow) -> Self {
        let id = text_field(raw, message::GUID)
            .or_else(|| match schema {
                SchemaVariant::Legacy => text_field(raw, legacy::MADRID_GUID),
                SchemaVariant::Modern => None,
            })
            .unwrap_or_else(|| content_key(raw));

        let common = CommonFields {
            id,
            date: int_field(raw, message::DATE).unwrap_or_default(),
            text: text_field(raw, message::TEXT),
            subject: text_field(raw, message::SUBJECT),
            address: text_field(raw, message::ADDRESS),
        };

        match schema {
            SchemaVariant::Legacy => Self::Legacy(LegacyRow {
                common,
                is_madrid: int_field(raw, legacy::IS_MADRID).is_some_and(|v| v != 0),
                madrid_flags: int_field(raw, legacy::MADRID_FLAGS),
                flags: int_field(raw, legacy::FLAGS),
                madrid_handle: text_field(raw, legacy::MADRID_HANDLE),
            }),
            SchemaVariant::Modern => Self::Modern(ModernRow {
                common,
                is_sent: int_field(raw, modern::IS_SENT).is_some_and(|v| v != 0),
                service: text_field(raw, modern::SERVICE),
                account: text_field(raw, modern::ACCOUNT),
            }),
        }
    }

    const fn common(&self) -> &CommonFields {
        match self {
            Self::Legacy(row) => &row.common,
            Self::Modern(row) => &row.common,
        }
    }

    /// Whether the owner sent this message.
    ///
    /// Legacy codes come from a lookup table of observed values; any code not
    /// in it reads as received.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        match self {
            Self::Legacy(row) if row.is_madrid => row
                .madrid_flags
                .is_some_and(|code| legacy::MADRID_FLAGS_SENT.contains(&code)),
            Self::Legacy(row) => row.flags.is_some_and(|code| legacy::SMS_FLAGS_SENT.contains(&code)),
            Self::Modern(row) => row.is_sent,
        }
    }

    /// Service the message used
    #[must_use]
    pub fn service(&self) -> Service {
        match self {
            Self::Legacy(row) if row.is_madrid => Service::IMessage,
            Self::Legacy(_) => Service::Sms,
            Self::Modern(row) if row.service.as_deref() == Some(Service::IMessage.as_str()) => Service::IMessage,
            Self::Modern(_) => Service::Sms,
        }
    }

    /// Seconds since 1970-01-01 UTC
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Legacy(row) => row.common.date.saturating_add(MADRID_OFFSET),
            Self::Modern(row) => row.common.date,
        }
    }

    /// Counterpart identifier, falling back to the generation's alternate column
    #[must_use]
    pub fn address(&self) -> String {
        let fallback = match self {
            Self::Legacy(row) => row.madrid_handle.as_ref(),
            Self::Modern(row) => row.account.as_ref(),
        };
        self.common().address.as_ref().or(fallback).cloned().unwrap_or_default()
    }

    /// True when the row has no text and must not be emitted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.common().text.is_none()
    }

    /// Build the canonical message, or `None` for a row without text
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        let timestamp = self.timestamp();
        let service = self.service();
        let direction = Direction::from_sent(self.is_sent());
        let address = self.address();

        let common = match self {
            Self::Legacy(row) => row.common,
            Self::Modern(row) => row.common,
        };
        let text = common.text?;

        Some(Message {
            id: common.id,
            timestamp,
            service,
            direction,
            address,
            subject: common.subject.unwrap_or_default(),
            text: escape_newlines(&text),
        })
    }
}

/// Replace literal newlines with the two characters `\n`
#[must_use]
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', r"\n")
}

/// Stable id for a row without a guid: `sms:` and the hex SHA-256 of its
/// stored date, counterpart, status and text.
#[must_use]
pub fn content_key(raw: &RawRow) -> String {
    let mut hasher = Sha256::new();
    for column in CONTENT_KEY_COLUMNS {
        if let Some(value) = text_field(raw, column) {
            hasher.update(value.as_bytes());
        }
        hasher.update([0x1f]);
    }
    format!("{CONTENT_KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}

#[allow(clippy::cast_possible_truncation)]
fn int_field(raw: &RawRow, column: &str) -> Option<i64> {
    match raw.get(column)? {
        Value::Integer(v) => Some(*v),
        Value::Real(v) => Some(*v as i64),
        Value::Text(s) => s.trim().parse().ok(),
        Value::Null | Value::Blob(_) => None,
    }
}

fn text_field(raw: &RawRow, column: &str) -> Option<String> {
    let value = match raw.get(column)? {
        Value::Text(s) => s.clone(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Null => return None,
    };
    (!value.is_empty()).then_some(value)
}
