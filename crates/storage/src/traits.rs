use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{DraftPayload, DraftRecord};

/// The storage trait for draft backends.
///
/// A `DraftStorage` implementation persists at most one draft per
/// `(owner_id, month, year)` identity.
///
/// ## Upsert Semantics
///
/// `save_draft` is an atomic insert-or-replace keyed on the composite
/// identity. Two concurrent saves for the same identity must never produce
/// duplicate rows; backends enforce the uniqueness at the storage layer
/// (unique index plus conditional upsert), not by read-then-write in the
/// application.
///
/// Saves replace the four payload sequences wholesale. A payload field the
/// caller omitted arrives as an empty sequence and overwrites whatever the
/// previous save stored.
///
/// ## Failure Semantics
///
/// Each operation is a single request/response unit: no retries, no partial
/// rollback. Any backend fault surfaces as [`StorageError::Backend`].
/// Absence of a draft is not a fault: `load_draft` returns `Ok(None)` and
/// `delete_draft` returns `Ok(0)`.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` to be used in axum
/// application state and across async task boundaries.
#[async_trait]
pub trait DraftStorage: Send + Sync + 'static {
    /// Insert or replace the draft for `(owner_id, month, year)`.
    ///
    /// Returns the post-write record, including its storage-assigned id and
    /// the refreshed `updated_at` timestamp. The id is stable across
    /// repeated saves for the same identity.
    async fn save_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
        payload: DraftPayload,
    ) -> Result<DraftRecord, StorageError>;

    /// Read the draft for `(owner_id, month, year)`, or `None` when the
    /// owner has no draft for that period.
    async fn load_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
    ) -> Result<Option<DraftRecord>, StorageError>;

    /// Delete the draft for `(owner_id, month, year)`.
    ///
    /// Returns the number of rows removed — 0 when nothing matched, so a
    /// second delete for the same identity succeeds with 0.
    async fn delete_draft(
        &self,
        owner_id: i64,
        month: i32,
        year: i32,
    ) -> Result<u64, StorageError>;
}
