use async_trait::async_trait;
use phraselens_core::domain::ExtractionRecord;
use phraselens_core::payload::phrases_from_json_text;
use phraselens_core::ports::{RecordStore, Result};
use phraselens_core::Error;
use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, info};

/// SQLite implementation of the RecordStore trait, for working against a
/// local copy of the extraction history.
///
/// `phrases` is stored as JSON text. The database is opened read-only.
pub struct SqliteRecordStore {
    db_path: String,
}

impl SqliteRecordStore {
    /// Creates a new SqliteRecordStore with the given database path
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn read_records(&self) -> rusqlite::Result<Vec<ExtractionRecord>> {
        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                id,
                COALESCE(input_text, '') AS input_text,
                COALESCE(phrases, '[]') AS phrases,
                COALESCE(created_at, '') AS created_at
            FROM finance_history
            ORDER BY id ASC
            "#,
        )?;

        let records = stmt
            .query_map([], |row: &Row| {
                let raw_phrases: String = row.get(2)?;
                Ok(ExtractionRecord {
                    id: row.get(0)?,
                    input_text: row.get(1)?,
                    phrases: phrases_from_json_text(&raw_phrases),
                    created_at: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn fetch_all_records(&self) -> Result<Vec<ExtractionRecord>> {
        debug!(path = %self.db_path, "reading history from sqlite");
        let records = self.read_records().map_err(|e| Error::Storage(e.to_string()))?;
        info!(count = records.len(), "read history from sqlite");
        Ok(records)
    }
}
