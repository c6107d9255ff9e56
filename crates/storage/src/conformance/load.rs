use std::future::Future;

use super::{full_payload, TestResult};
use crate::DraftStorage;

pub(super) async fn run_load_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "load",
        "load_without_prior_save_returns_none",
        load_without_prior_save_returns_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "load",
        "load_returns_last_saved_record",
        load_returns_last_saved_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "load",
        "load_does_not_mutate_the_record",
        load_does_not_mutate_the_record(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Absence of a draft is `Ok(None)`, never an error.
async fn load_without_prior_save_returns_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let loaded = s.load_draft(7, 3, 2024).await.map_err(|e| e.to_string())?;
    if loaded.is_some() {
        return Err("expected None for an identity with no draft".to_string());
    }
    Ok(())
}

/// Load returns exactly what the last save wrote.
async fn load_returns_last_saved_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let saved = s
        .save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    let loaded = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    if loaded != saved {
        return Err(format!("loaded record differs from saved: {loaded:?}"));
    }
    Ok(())
}

/// Loading is read-only: two consecutive loads return equal records.
async fn load_does_not_mutate_the_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.save_draft(7, 3, 2024, full_payload())
        .await
        .map_err(|e| e.to_string())?;
    let first = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing after save")?;
    let second = s
        .load_draft(7, 3, 2024)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("draft missing on second load")?;
    if first != second {
        return Err("consecutive loads returned different records".to_string());
    }
    Ok(())
}
