use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::{rfc3339_now, DraftPayload, DraftRecord};
use crate::traits::DraftStorage;

/// In-memory `DraftStorage` backend.
///
/// Used by the test suites and by `serve` when no database path is
/// configured. Drafts do not survive process restart. The whole map sits
/// behind one `RwLock`, so a save is a single critical section and the
/// at-most-one-per-identity invariant holds under concurrent saves.
pub struct MemoryDraftStore {
    drafts: RwLock<HashMap<(i64, i32, i32), DraftRecord>>,
    next_id: AtomicI64,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self {
            drafts: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftStorage for MemoryDraftStore {
    async fn save_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
        payload: DraftPayload,
    ) -> Result<DraftRecord, StorageError> {
        let mut drafts = self.drafts.write().await;
        let key = (owner_id, month, year);

        // Reuse the id of an existing row so the identity is stable across saves.
        let id = match drafts.get(&key) {
            Some(existing) => existing.id,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };

        let record = DraftRecord {
            id,
            owner_id,
            month,
            year,
            processed_entries: payload.processed_entries,
            external_labor_lines: payload.external_labor_lines,
            equipment_or_staff_lines: payload.equipment_or_staff_lines,
            manually_edited_days: payload.manually_edited_days,
            updated_at: rfc3339_now(),
        };
        drafts.insert(key, record.clone());
        Ok(record)
    }

    async fn load_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
    ) -> Result<Option<DraftRecord>, StorageError> {
        let drafts = self.drafts.read().await;
        Ok(drafts.get(&(owner_id, month, year)).cloned())
    }

    async fn delete_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
    ) -> Result<u64, StorageError> {
        let mut drafts = self.drafts.write().await;
        match drafts.remove(&(owner_id, month, year)) {
            Some(_) => Ok(1),
            None => Ok(0),
        }
    }
}
