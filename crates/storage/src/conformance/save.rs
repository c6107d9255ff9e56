use std::future::Future;

use super::{full_payload, labor_entry, payload_with_entries, TestResult};
use crate::record::DraftPayload;
use crate::DraftStorage;

pub(super) async fn run_save_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "save",
        "save_creates_record_with_supplied_payload",
        save_creates_record_with_supplied_payload(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "save_assigns_row_id",
        save_assigns_row_id(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "second_save_keeps_single_record",
        second_save_keeps_single_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "second_save_keeps_row_id_stable",
        second_save_keeps_row_id_stable(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "save_replaces_instead_of_merging",
        save_replaces_instead_of_merging(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "omitted_fields_stored_as_empty_sequences",
        omitted_fields_stored_as_empty_sequences(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "save_sets_parseable_timestamp",
        save_sets_parseable_timestamp(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "second_save_refreshes_updated_at",
        second_save_refreshes_updated_at(factory).await,
    ));
    results.push(TestResult::from_result(
        "save",
        "nested_payload_round_trips_unchanged",
        nested_payload_round_trips_unchanged(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A first save for an identity creates the record with the given payload.
async fn save_creates_record_with_supplied_payload<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let payload = full_payload();
    let rec = s
        .save_draft(7, 3, 2024, payload.clone())
        .await
        .map_err(|e| e.to_string())?;

    if rec.owner_id != 7 || rec.month != 3 || rec.year != 2024 {
        return Err(format!(
            "identity mismatch: got ({}, {}, {})",
            rec.owner_id, rec.month, rec.year
        ));
    }
    if rec.processed_entries != payload.processed_entries {
        return Err("processed_entries not stored as supplied".to_string());
    }
    if rec.external_labor_lines != payload.external_labor_lines {
        return Err("external_labor_lines not stored as supplied".to_string());
    }
    if rec.equipment_or_staff_lines != payload.equipment_or_staff_lines {
        return Err("equipment_or_staff_lines not stored as supplied".to_string());
    }
    if rec.manually_edited_days != payload.manually_edited_days {
        return Err("manually_edited_days not stored as supplied".to_string());
    }
    Ok(())
}

/// The returned record carries a storage-assigned id.
async fn save_assigns_row_id<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = s
        .save_draft(7, 3, 2024, DraftPayload::default())
        .await
        .map_err(|e| e.to_string())?;
    if rec.id <= 0 {
        return Err(format!("expected positive row id, got {}", rec.id));
    }
    Ok(())
}

/// Two saves for the same identity leave exactly one record, holding the
/// payload of the most recent save.
async fn second_save_keeps_single_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, payload_with_entries(&[labor_entry(1, 8)]))
        .await
        .map_err(|e| e.to_string())?;
    s.save_draft(7, 3, 2024, payload_with_entries(&[labor_entry(2, 6)]))
        .await
        .map_err(|e| e.to_string())?;

    let loaded = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if loaded.processed_entries != vec![labor_entry(2, 6)] {
        return Err(format!(
            "expected payload of second save, got {:?}",
            loaded.processed_entries
        ));
    }

    // A single delete must remove everything the two saves left behind.
    let deleted = s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if deleted != 1 {
        return Err(format!("expected exactly 1 row for identity, got {deleted}"));
    }
    Ok(())
}

/// The row id is stable across repeated saves for the same identity.
async fn second_save_keeps_row_id_stable<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let first = s
        .save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    let second = s
        .save_draft(7, 3, 2024, DraftPayload::default())
        .await
        .map_err(|e| e.to_string())?;
    if first.id != second.id {
        return Err(format!(
            "row id changed across saves: {} then {}",
            first.id, second.id
        ));
    }
    Ok(())
}

/// A save with only one field populated empties the other three, even if a
/// prior save had populated them.
async fn save_replaces_instead_of_merging<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;

    let second = DraftPayload {
        manually_edited_days: vec![serde_json::json!(1)],
        ..DraftPayload::default()
    };
    let rec = s
        .save_draft(7, 3, 2024, second)
        .await
        .map_err(|e| e.to_string())?;

    if rec.manually_edited_days != vec![serde_json::json!(1)] {
        return Err("manually_edited_days not replaced".to_string());
    }
    if !rec.processed_entries.is_empty() {
        return Err("processed_entries merged instead of replaced".to_string());
    }
    if !rec.external_labor_lines.is_empty() {
        return Err("external_labor_lines merged instead of replaced".to_string());
    }
    if !rec.equipment_or_staff_lines.is_empty() {
        return Err("equipment_or_staff_lines merged instead of replaced".to_string());
    }
    Ok(())
}

/// An empty payload stores four empty sequences, never nulls.
async fn omitted_fields_stored_as_empty_sequences<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, DraftPayload::default())
        .await
        .map_err(|e| e.to_string())?;
    let rec = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if !rec.processed_entries.is_empty()
        || !rec.external_labor_lines.is_empty()
        || !rec.equipment_or_staff_lines.is_empty()
        || !rec.manually_edited_days.is_empty()
    {
        return Err("omitted payload fields must store as empty sequences".to_string());
    }
    Ok(())
}

/// `updated_at` is set on save and parses as RFC 3339.
async fn save_sets_parseable_timestamp<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = s
        .save_draft(7, 3, 2024, DraftPayload::default())
        .await
        .map_err(|e| e.to_string())?;
    parse_timestamp(&rec.updated_at)?;
    Ok(())
}

/// Overwriting an existing draft refreshes `updated_at`, and a load returns
/// the refreshed timestamp.
async fn second_save_refreshes_updated_at<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let first = s
        .save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    // Put the second save in a later clock instant so the comparison is strict.
    std::thread::sleep(std::time::Duration::from_millis(10));
    let second = s
        .save_draft(7, 3, 2024, DraftPayload::default())
        .await
        .map_err(|e| e.to_string())?;

    let first_at = parse_timestamp(&first.updated_at)?;
    let second_at = parse_timestamp(&second.updated_at)?;
    if second_at <= first_at {
        return Err(format!(
            "updated_at not refreshed on overwrite: {} then {}",
            first.updated_at, second.updated_at
        ));
    }

    let loaded = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if loaded.updated_at != second.updated_at {
        return Err(format!(
            "load returned stale timestamp {} (expected {})",
            loaded.updated_at, second.updated_at
        ));
    }
    Ok(())
}

fn parse_timestamp(ts: &str) -> Result<time::OffsetDateTime, String> {
    time::OffsetDateTime::parse(ts, &time::format_description::well_known::Rfc3339)
        .map_err(|e| format!("updated_at not RFC 3339 ({ts}): {e}"))
}

/// Deeply nested caller-defined JSON comes back byte-for-byte equal.
async fn nested_payload_round_trips_unchanged<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let entry = serde_json::json!({
        "day": 12,
        "site": { "code": "OB-114", "zone": null },
        "crews": [{ "name": "paving", "workers": [ "a", "b" ], "hours": 7.5 }],
        "notes": "chuva à tarde",
    });
    s.save_draft(7, 3, 2024, payload_with_entries(&[entry.clone()]))
        .await
        .map_err(|e| e.to_string())?;
    let rec = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if rec.processed_entries != vec![entry] {
        return Err(format!(
            "payload altered in round trip: {:?}",
            rec.processed_entries
        ));
    }
    Ok(())
}
