//! File writing utilities for message export.
//!
//! This module writes messages as CSV or JSON, either as a new file or into
//! an existing one. Both formats share the column set of [`MessageRecord`].

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde_json::Value;

use crate::error::{DumpError, Result};
use crate::models::{Message, MessageRecord, OutputFormat, RECORD_COLUMNS};

/// Write messages to a new file in the specified format.
///
/// CSV output starts with a header row, even with no messages; JSON output is
/// a pretty-printed array.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn write_new(messages: &[Message], format: OutputFormat, file_path: &Path) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv_file(messages, file_path),
        OutputFormat::Json => write_json_file(messages, file_path),
    }
}

/// Add messages to an existing output file.
///
/// CSV rows are appended without a second header. JSON is rewritten with the
/// existing objects first, untouched and in order, then the new ones.
pub fn append(messages: &[Message], format: OutputFormat, file_path: &Path) -> Result<()> {
    match format {
        OutputFormat::Csv => append_csv_file(messages, file_path),
        OutputFormat::Json => append_json_file(messages, file_path),
    }
}

fn write_csv_file(messages: &[Message], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(file));
    writer.write_record(RECORD_COLUMNS)?;

    for message in messages {
        writer.serialize(message.to_record())?;
    }

    writer.flush()?;
    Ok(())
}

fn append_csv_file(messages: &[Message], file_path: &Path) -> Result<()> {
    let needs_newline = !ends_with_newline(file_path)?;
    let mut file = OpenOptions::new().append(true).open(file_path)?;
    if needs_newline {
        file.write_all(b"\n")?;
    }
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(file));

    for message in messages {
        writer.serialize(message.to_record())?;
    }

    writer.flush()?;
    Ok(())
}

/// Whether the file is empty or its last byte is a line feed
fn ends_with_newline(file_path: &Path) -> Result<bool> {
    let mut file = File::open(file_path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn write_json_file(messages: &[Message], file_path: &Path) -> Result<()> {
    let records: Vec<MessageRecord> = messages.iter().map(Message::to_record).collect();
    write_json_values(&records, file_path)
}

fn append_json_file(messages: &[Message], file_path: &Path) -> Result<()> {
    let mut values: Vec<Value> = {
        let reader = BufReader::new(File::open(file_path)?);
        serde_json::from_reader(reader).map_err(|e| DumpError::IncompatibleOutput {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?
    };

    for message in messages {
        values.push(serde_json::to_value(message.to_record())?);
    }

    // Rewrite beside the original and swap it in, so a failed write leaves the old file intact.
    let tmp_path = sibling_tmp_path(file_path);
    write_json_values(&values, &tmp_path)?;
    fs::rename(&tmp_path, file_path)?;
    Ok(())
}

fn write_json_values<T: serde::Serialize>(values: &[T], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, values)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn sibling_tmp_path(file_path: &Path) -> PathBuf {
    let mut name: OsString = file_path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
