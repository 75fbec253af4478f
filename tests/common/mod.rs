//! Fixture backup databases shared by the integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use iphone_messages_dump::privacy::RedactionPolicy;
use iphone_messages_dump::{DumpConfig, ExtractOptions, OutputFormat, WriteMode};

/// Backup file name used by the fixtures
pub const DB_NAME: &str = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";

/// Create `<root>/<backup>/<DB_NAME>` with a legacy `message` table
pub fn legacy_db(root: &Path, backup: &str) -> (PathBuf, Connection) {
    let path = backup_path(root, backup);
    let conn = Connection::open(&path).expect("open legacy fixture");
    conn.execute_batch(
        "CREATE TABLE message (
            ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT,
            date INTEGER,
            text TEXT,
            flags INTEGER,
            subject TEXT,
            madrid_handle TEXT,
            madrid_guid TEXT,
            madrid_flags INTEGER,
            is_madrid INTEGER DEFAULT 0
        );",
    )
    .expect("create legacy table");
    (path, conn)
}

/// Create `<root>/<backup>/<DB_NAME>` with a modern `message` table
pub fn modern_db(root: &Path, backup: &str) -> (PathBuf, Connection) {
    let path = backup_path(root, backup);
    let conn = Connection::open(&path).expect("open modern fixture");
    conn.execute_batch(
        "CREATE TABLE message (
            ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
            guid TEXT UNIQUE NOT NULL,
            text TEXT,
            subject TEXT,
            service TEXT,
            account TEXT,
            address TEXT,
            date INTEGER,
            is_sent INTEGER DEFAULT 0
        );",
    )
    .expect("create modern table");
    (path, conn)
}

/// Insert an iMessage row into a legacy table
pub fn insert_madrid(conn: &Connection, guid: &str, date: i64, madrid_flags: i64, handle: &str, text: Option<&str>) {
    conn.execute(
        "INSERT INTO message (date, text, madrid_handle, madrid_guid, madrid_flags, is_madrid)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![date, text, handle, guid, madrid_flags],
    )
    .expect("insert madrid row");
}

/// Insert an SMS row into a legacy table
pub fn insert_legacy_sms(conn: &Connection, date: i64, flags: i64, address: &str, text: Option<&str>) {
    conn.execute(
        "INSERT INTO message (address, date, text, flags, is_madrid) VALUES (?1, ?2, ?3, ?4, 0)",
        params![address, date, text, flags],
    )
    .expect("insert legacy sms row");
}

/// Insert a row into a modern table
pub fn insert_modern(conn: &Connection, guid: &str, date: i64, is_sent: bool, service: &str, text: Option<&str>) {
    conn.execute(
        "INSERT INTO message (guid, text, service, account, address, date, is_sent)
         VALUES (?1, ?2, ?3, 'e:owner@example.com', '+15550001111', ?4, ?5)",
        params![guid, text, service, date, is_sent],
    )
    .expect("insert modern row");
}

/// Pattern matching every fixture backup under `root`
pub fn pattern(root: &Path) -> String {
    root.join("*").join(DB_NAME).to_string_lossy().into_owned()
}

/// Dump configuration over the fixtures under `root`, text not redacted
pub fn dump_config(root: &Path, output: &Path, format: OutputFormat) -> DumpConfig {
    DumpConfig {
        input_pattern: pattern(root),
        output_path: output.to_path_buf(),
        format,
        mode: WriteMode::Merge,
        extract: ExtractOptions::default(),
        redaction: RedactionPolicy::disabled(),
    }
}

fn backup_path(root: &Path, backup: &str) -> PathBuf {
    let dir = root.join(backup);
    fs::create_dir_all(&dir).expect("create backup dir");
    dir.join(DB_NAME)
}
