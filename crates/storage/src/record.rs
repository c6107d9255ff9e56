use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// A persisted draft of one worker-period's daily labor sheet.
///
/// Exactly one record exists per `(owner_id, month, year)` at any time;
/// backends enforce this with an atomic upsert keyed on the composite
/// identity. The four payload sequences are caller-defined JSON documents
/// and are stored and returned byte-for-byte without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    /// Storage-assigned row id.
    pub id: i64,
    /// The authenticated principal that owns the draft.
    pub owner_id: i64,
    pub month: i32,
    pub year: i32,
    /// Computed/derived labor-sheet rows.
    pub processed_entries: Vec<serde_json::Value>,
    /// Externally-sourced labor entries.
    pub external_labor_lines: Vec<serde_json::Value>,
    /// Equipment and staff allocations.
    pub equipment_or_staff_lines: Vec<serde_json::Value>,
    /// Day markers the owner has manually overridden.
    pub manually_edited_days: Vec<serde_json::Value>,
    /// ISO 8601 / RFC 3339 timestamp string, refreshed on every save.
    pub updated_at: String,
}

/// The caller-supplied payload for a save.
///
/// Every field is optional on the wire and defaults to an empty sequence,
/// never null. A save replaces all four sequences wholesale; there is no
/// field-level merge with a previously stored draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftPayload {
    #[serde(default)]
    pub processed_entries: Vec<serde_json::Value>,
    #[serde(default)]
    pub external_labor_lines: Vec<serde_json::Value>,
    #[serde(default)]
    pub equipment_or_staff_lines: Vec<serde_json::Value>,
    #[serde(default)]
    pub manually_edited_days: Vec<serde_json::Value>,
}

/// Current UTC time as an RFC 3339 string, the format stored in `updated_at`.
pub fn rfc3339_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}
