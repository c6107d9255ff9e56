use std::future::Future;

use super::{labor_entry, payload_with_entries, TestResult};
use crate::DraftStorage;

pub(super) async fn run_isolation_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "isolation",
        "owners_with_same_period_are_independent",
        owners_with_same_period_are_independent(factory).await,
    ));
    results.push(TestResult::from_result(
        "isolation",
        "delete_is_scoped_to_the_owner",
        delete_is_scoped_to_the_owner(factory).await,
    ));
    results.push(TestResult::from_result(
        "isolation",
        "periods_of_one_owner_are_independent",
        periods_of_one_owner_are_independent(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Two owners can hold drafts for the same period without interference.
async fn owners_with_same_period_are_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, payload_with_entries(&[labor_entry(1, 8)]))
        .await
        .map_err(|e| e.to_string())?;
    s.save_draft(9, 3, 2024, payload_with_entries(&[labor_entry(1, 4)]))
        .await
        .map_err(|e| e.to_string())?;

    let a = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("owner 7 draft missing")?;
    let b = s
        .load_draft(9, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("owner 9 draft missing")?;

    if a.processed_entries != vec![labor_entry(1, 8)] {
        return Err("owner 7 draft overwritten by owner 9 save".to_string());
    }
    if b.processed_entries != vec![labor_entry(1, 4)] {
        return Err("owner 9 draft holds wrong payload".to_string());
    }
    Ok(())
}

/// Deleting one owner's draft leaves another owner's draft for the same
/// period untouched.
async fn delete_is_scoped_to_the_owner<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, payload_with_entries(&[labor_entry(1, 8)]))
        .await
        .map_err(|e| e.to_string())?;
    s.save_draft(9, 3, 2024, payload_with_entries(&[labor_entry(1, 4)]))
        .await
        .map_err(|e| e.to_string())?;

    let deleted = s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if deleted != 1 {
        return Err(format!("expected deleted count 1, got {deleted}"));
    }
    let b = s.load_draft(9, 3, 2024).await.map_err(|e| e.to_string())?;
    if b.is_none() {
        return Err("owner 9 draft removed by owner 7 delete".to_string());
    }
    Ok(())
}

/// One owner's drafts for different periods are independent records.
async fn periods_of_one_owner_are_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, payload_with_entries(&[labor_entry(1, 8)]))
        .await
        .map_err(|e| e.to_string())?;
    s.save_draft(7, 4, 2024, payload_with_entries(&[labor_entry(2, 6)]))
        .await
        .map_err(|e| e.to_string())?;

    let march = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("march draft missing")?;
    if march.processed_entries != vec![labor_entry(1, 8)] {
        return Err("march draft overwritten by april save".to_string());
    }

    s.delete_draft(7, 4, 2024).await.map_err(|e| e.to_string())?;
    let march = s.load_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if march.is_none() {
        return Err("march draft removed by april delete".to_string());
    }
    Ok(())
}
