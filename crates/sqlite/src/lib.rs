//! SQLite-backed `DraftStorage` implementation.
//!
//! The `drafts` table carries a unique index on `(owner_id, month, year)`
//! and saves run as a single `INSERT .. ON CONFLICT DO UPDATE`, so two
//! concurrent saves for the same identity can never leave duplicate rows.
//! Payload columns hold serialized JSON text and round-trip unchanged.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use sitelog_storage::{rfc3339_now, DraftPayload, DraftRecord, DraftStorage, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS drafts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    processed_entries TEXT NOT NULL,
    external_labor_lines TEXT NOT NULL,
    equipment_or_staff_lines TEXT NOT NULL,
    manually_edited_days TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (owner_id, month, year)
);
";

const UPSERT_SQL: &str = "
INSERT INTO drafts (owner_id, month, year, processed_entries, external_labor_lines,
                    equipment_or_staff_lines, manually_edited_days, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT (owner_id, month, year) DO UPDATE SET
    processed_entries = excluded.processed_entries,
    external_labor_lines = excluded.external_labor_lines,
    equipment_or_staff_lines = excluded.equipment_or_staff_lines,
    manually_edited_days = excluded.manually_edited_days,
    updated_at = excluded.updated_at
";

const SELECT_SQL: &str = "
SELECT id, processed_entries, external_labor_lines, equipment_or_staff_lines,
       manually_edited_days, updated_at
FROM drafts
WHERE owner_id = ?1 AND month = ?2 AND year = ?3
";

/// Durable `DraftStorage` backend over a single SQLite connection.
///
/// The handle is constructed explicitly with [`SqliteDraftStore::open`] and
/// released with [`SqliteDraftStore::close`] (dropping the store also closes
/// the connection). The connection sits behind an async mutex; each trait
/// operation is one critical section against it.
pub struct SqliteDraftStore {
    conn: Mutex<Connection>,
}

impl SqliteDraftStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Close the underlying connection explicitly, surfacing any flush error.
    pub fn close(self) -> Result<(), StorageError> {
        let conn = self.conn.into_inner();
        conn.close().map_err(|(_, e)| backend(e))
    }
}

/// Raw column values for one drafts row, decoded outside the rusqlite closure.
struct RawDraftRow {
    id: i64,
    processed_entries: String,
    external_labor_lines: String,
    equipment_or_staff_lines: String,
    manually_edited_days: String,
    updated_at: String,
}

impl RawDraftRow {
    fn decode(self, owner_id: i64, month: i32, year: i32) -> Result<DraftRecord, StorageError> {
        Ok(DraftRecord {
            id: self.id,
            owner_id,
            month,
            year,
            processed_entries: decode_column(&self.processed_entries)?,
            external_labor_lines: decode_column(&self.external_labor_lines)?,
            equipment_or_staff_lines: decode_column(&self.equipment_or_staff_lines)?,
            manually_edited_days: decode_column(&self.manually_edited_days)?,
            updated_at: self.updated_at,
        })
    }
}

fn decode_column(text: &str) -> Result<Vec<serde_json::Value>, StorageError> {
    serde_json::from_str(text).map_err(backend)
}

fn encode_column(values: &[serde_json::Value]) -> Result<String, StorageError> {
    serde_json::to_string(values).map_err(backend)
}

fn backend(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn fetch(
    conn: &Connection,
    owner_id: i64,
    month: i32,
    year: i32,
) -> Result<Option<DraftRecord>, StorageError> {
    let row = conn
        .query_row(SELECT_SQL, params![owner_id, month, year], |row| {
            Ok(RawDraftRow {
                id: row.get(0)?,
                processed_entries: row.get(1)?,
                external_labor_lines: row.get(2)?,
                equipment_or_staff_lines: row.get(3)?,
                manually_edited_days: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })
        .optional()
        .map_err(backend)?;

    match row {
        Some(raw) => Ok(Some(raw.decode(owner_id, month, year)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl DraftStorage for SqliteDraftStore {
    async fn save_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
        payload: DraftPayload,
    ) -> Result<DraftRecord, StorageError> {
        let processed = encode_column(&payload.processed_entries)?;
        let external = encode_column(&payload.external_labor_lines)?;
        let equipment = encode_column(&payload.equipment_or_staff_lines)?;
        let edited = encode_column(&payload.manually_edited_days)?;
        let updated_at = rfc3339_now();

        let conn = self.conn.lock().await;
        conn.execute(
            UPSERT_SQL,
            params![owner_id, month, year, processed, external, equipment, edited, updated_at],
        )
        .map_err(backend)?;

        // Read back to pick up the storage-assigned id.
        fetch(&conn, owner_id, month, year)?
            .ok_or_else(|| StorageError::Backend("draft row missing after upsert".to_string()))
    }

    async fn load_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
    ) -> Result<Option<DraftRecord>, StorageError> {
        let conn = self.conn.lock().await;
        fetch(&conn, owner_id, month, year)
    }

    async fn delete_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
    ) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        let deleted = conn
            .execute(
                "DELETE FROM drafts WHERE owner_id = ?1 AND month = ?2 AND year = ?3",
                params![owner_id, month, year],
            )
            .map_err(backend)?;
        Ok(deleted as u64)
    }
}
