// Database module - record store abstraction, SQLite and in-memory stores

pub mod memory;
pub mod models;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::QuoteError;
pub use memory::MemoryStore;
pub use models::{
    Comment, Field, FieldValue, QuotationRecord, RecordKey, RecordPatch, StoredRecord,
};

/// Persistence boundary used by the import pipeline and the edit surface
pub trait RecordStore {
    /// Store a new record, returning its key
    fn insert(&mut self, record: &QuotationRecord) -> Result<RecordKey>;

    /// Every stored record; callers must not rely on the order
    fn list_all(&self) -> Result<Vec<StoredRecord>>;

    /// Apply a partial update to one record
    fn update(&mut self, key: RecordKey, patch: &RecordPatch) -> Result<()>;

    /// Remove one record
    fn delete(&mut self, key: RecordKey) -> Result<()>;

    fn get(&self, key: RecordKey) -> Result<Option<StoredRecord>> {
        Ok(self.list_all()?.into_iter().find(|s| s.key == key))
    }
}

/// Get the default database path (~/.quotedesk/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".quotedesk").join("data.db"))
}

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        info!("Opening quotation database at: {:?}", path);
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;
        Self::init(conn)
    }

    /// Open an existing database without creating or migrating it
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open database read-only at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Enable foreign keys (comment cascade)
        conn.execute("PRAGMA foreign_keys = ON", [])
            .context("Failed to enable foreign keys")?;

        let schema_sql = include_str!("schema.sql");
        conn.execute_batch(schema_sql)
            .context("Failed to execute schema")?;

        Ok(Self { conn })
    }

    /// Attach a comment to a stored quotation
    pub fn add_comment(&self, key: RecordKey, author: &str, body: &str) -> Result<i64> {
        let created_at = Utc::now();
        self.conn
            .execute(
                "INSERT INTO comments (quotation_id, author, body, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, author, body, created_at],
            )
            .map_err(QuoteError::persistence)
            .with_context(|| format!("Failed to add comment to quotation {}", key))?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Comments of a quotation, oldest first
    pub fn list_comments(&self, key: RecordKey) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, quotation_id, author, body, created_at
             FROM comments
             WHERE quotation_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;

        let comments = stmt
            .query_map([key], |row| {
                Ok(Comment {
                    id: Some(row.get(0)?),
                    quotation_key: row.get(1)?,
                    author: row.get(2)?,
                    body: row.get(3)?,
                    created_at: row.get::<_, DateTime<Utc>>(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    fn load(&self, key: RecordKey) -> Result<Option<QuotationRecord>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM quotations WHERE id = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(QuoteError::persistence)?;

        document
            .map(|doc| {
                serde_json::from_str(&doc)
                    .with_context(|| format!("Corrupt quotation document for key {}", key))
            })
            .transpose()
    }
}

impl RecordStore for SqliteStore {
    fn insert(&mut self, record: &QuotationRecord) -> Result<RecordKey> {
        let document = serde_json::to_string(record).context("Failed to serialize quotation")?;

        self.conn
            .execute(
                "INSERT INTO quotations (referencia, shop_no, document) VALUES (?1, ?2, ?3)",
                params![record.natural_key(), record.shop_no, document],
            )
            .map_err(QuoteError::persistence)
            .with_context(|| format!("Failed to insert quotation {}", record.referencia))?;

        let key = self.conn.last_insert_rowid();
        debug!("Inserted quotation {} as key {}", record.referencia, key);
        Ok(key)
    }

    fn list_all(&self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document FROM quotations ORDER BY id ASC")
            .map_err(QuoteError::persistence)?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .map_err(QuoteError::persistence)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(QuoteError::persistence)?;

        rows.into_iter()
            .map(|(key, doc)| {
                let record = serde_json::from_str(&doc)
                    .with_context(|| format!("Corrupt quotation document for key {}", key))?;
                Ok(StoredRecord { key, record })
            })
            .collect()
    }

    fn update(&mut self, key: RecordKey, patch: &RecordPatch) -> Result<()> {
        let mut record = self.load(key)?.ok_or(QuoteError::RecordNotFound(key))?;
        patch.apply_to(&mut record);
        let document = serde_json::to_string(&record).context("Failed to serialize quotation")?;

        self.conn
            .execute(
                "UPDATE quotations
                 SET referencia = ?1, shop_no = ?2, document = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?4",
                params![record.natural_key(), record.shop_no, document, key],
            )
            .map_err(QuoteError::persistence)
            .with_context(|| format!("Failed to update quotation {}", key))?;

        debug!("Updated quotation {} ({} changes)", key, patch.changes.len());
        Ok(())
    }

    fn delete(&mut self, key: RecordKey) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM quotations WHERE id = ?1", [key])
            .map_err(QuoteError::persistence)
            .with_context(|| format!("Failed to delete quotation {}", key))?;

        if affected == 0 {
            return Err(QuoteError::RecordNotFound(key).into());
        }
        Ok(())
    }

    fn get(&self, key: RecordKey) -> Result<Option<StoredRecord>> {
        Ok(self.load(key)?.map(|record| StoredRecord { key, record }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(referencia: &str) -> QuotationRecord {
        QuotationRecord {
            referencia: referencia.to_string(),
            shop_no: "S1".to_string(),
            description: "Mug".to_string(),
            name: "Mug".to_string(),
            ctns: dec!(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_list_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&sample("A1")).unwrap();

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key, key);
        assert_eq!(all[0].record, sample("A1"));
    }

    #[test]
    fn test_update_applies_patch() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&sample("A1")).unwrap();

        let before = sample("A1");
        let mut after = before.clone();
        after.ctns = dec!(9);
        store
            .update(key, &RecordPatch::between(&before, &after))
            .unwrap();

        let stored = store.get(key).unwrap().unwrap();
        assert_eq!(stored.record.ctns, dec!(9));
    }

    #[test]
    fn test_missing_keys_report_not_found() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store.delete(42).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QuoteError>(),
            Some(QuoteError::RecordNotFound(42))
        ));
        assert!(store.update(42, &RecordPatch::default()).is_err());
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_delete_cascades_to_comments() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&sample("A1")).unwrap();
        store.add_comment(key, "ana", "check carton size").unwrap();
        assert_eq!(store.list_comments(key).unwrap().len(), 1);

        store.delete(key).unwrap();
        assert!(store.list_comments(key).unwrap().is_empty());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_comment_on_missing_quotation_is_persistence_failure() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.add_comment(7, "ana", "hello").unwrap_err();
        assert!(err.downcast_ref::<QuoteError>().is_some());
    }
}
