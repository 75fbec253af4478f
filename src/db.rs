use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::Result;
use crate::schema::message;

/// One source row, keyed by column name
pub type RawRow = HashMap<String, Value>;

/// Every row of the `message` relation together with its column set
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in query order
    pub columns: Vec<String>,
    /// Rows in rowid order
    pub rows: Vec<RawRow>,
}

/// Read-only handle on one backup message store
pub struct SourceDatabase {
    conn: Connection,
    path: PathBuf,
}

impl SourceDatabase {
    /// Open a backup database without write access
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        debug!("Opened source database {}", path.display());

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Path this database was opened from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column names of the `message` relation, without reading any rows
    pub fn message_columns(&self) -> Result<Vec<String>> {
        let stmt = self.conn.prepare(&select_messages_sql())?;
        Ok(stmt.column_names().into_iter().map(String::from).collect())
    }

    /// Read the whole `message` relation.
    ///
    /// The query runs inside a transaction; if anything fails the transaction
    /// is dropped, which rolls it back before the error reaches the caller.
    pub fn read_messages(&mut self) -> Result<RawTable> {
        let tx = self.conn.transaction()?;

        let table = {
            let mut stmt = tx.prepare(&select_messages_sql())?;
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut raw = RawRow::with_capacity(columns.len());
                for (idx, name) in columns.iter().enumerate() {
                    raw.insert(name.clone(), row.get::<_, Value>(idx)?);
                }
                out.push(raw);
            }

            RawTable { columns, rows: out }
        };

        tx.commit()?;
        debug!(rows = table.rows.len(), "Read message table from {}", self.path.display());
        Ok(table)
    }
}

fn select_messages_sql() -> String {
    format!("SELECT * FROM {} ORDER BY rowid", message::TABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_messages_in_rowid_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sms.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE message (guid TEXT, date INTEGER, text TEXT);
             INSERT INTO message (rowid, guid, date, text) VALUES (2, 'b', 2, NULL);
             INSERT INTO message (rowid, guid, date, text) VALUES (1, 'a', 1, 'one');",
        )
        .unwrap();
        drop(conn);

        let mut db = SourceDatabase::open(&path).unwrap();
        let table = db.read_messages().unwrap();
        assert_eq!(table.columns, vec!["guid", "date", "text"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["guid"], Value::Text("a".into()));
        assert_eq!(table.rows[1]["text"], Value::Null);
    }

    #[test]
    fn test_missing_message_table_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path).unwrap().execute_batch("CREATE TABLE other (x INTEGER);").unwrap();

        let mut db = SourceDatabase::open(&path).unwrap();
        assert!(db.read_messages().is_err());
        assert!(db.message_columns().is_err());
    }
}
