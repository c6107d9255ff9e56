use std::future::Future;

use super::{full_payload, TestResult};
use crate::DraftStorage;

pub(super) async fn run_delete_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "delete",
        "delete_reports_one_row_removed",
        delete_reports_one_row_removed(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "deleted_draft_is_gone",
        deleted_draft_is_gone(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "second_delete_reports_zero",
        second_delete_reports_zero(factory).await,
    ));
    results.push(TestResult::from_result(
        "delete",
        "delete_without_prior_save_reports_zero",
        delete_without_prior_save_reports_zero(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Deleting an existing draft reports one row removed.
async fn delete_reports_one_row_removed<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    let deleted = s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if deleted != 1 {
        return Err(format!("expected deleted count 1, got {deleted}"));
    }
    Ok(())
}

/// A load after delete returns `None`.
async fn deleted_draft_is_gone<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    let loaded = s.load_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if loaded.is_some() {
        return Err("draft still present after delete".to_string());
    }
    Ok(())
}

/// Delete is idempotent: the second call succeeds with count 0.
async fn second_delete_reports_zero<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    let first = s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    let second = s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if first < 1 {
        return Err(format!("expected first delete >= 1, got {first}"));
    }
    if second != 0 {
        return Err(format!("expected second delete 0, got {second}"));
    }
    Ok(())
}

/// Deleting an identity that never had a draft succeeds with count 0.
async fn delete_without_prior_save_reports_zero<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let deleted = s.delete_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if deleted != 0 {
        return Err(format!("expected deleted count 0, got {deleted}"));
    }
    Ok(())
}
