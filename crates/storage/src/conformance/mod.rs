//! Conformance test suite for `DraftStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any `DraftStorage`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Save**: creation, atomic upsert (at most one row per identity),
//!   replace-not-merge, empty defaults, payload round-trip fidelity
//! - **Load**: absence is `Ok(None)`, loaded record equals the last save
//! - **Delete**: reported count, idempotence
//! - **Isolation**: owners and periods never observe or affect each other
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use sitelog_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn sqlite_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_sqlite_storage()
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod delete;
mod isolation;
mod load;
mod save;

use std::fmt;
use std::future::Future;

use crate::record::DraftPayload;
use crate::DraftStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "save", "load", "delete").
    pub category: String,
    /// Test name (e.g. "second_save_replaces_payload").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                category: category.to_string(),
                name: name.to_string(),
                passed: true,
                message: None,
            },
            Err(msg) => Self {
                category: category.to_string(),
                name: name.to_string(),
                passed: false,
                message: Some(msg),
            },
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: DraftStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(save::run_save_tests(&factory).await);
    results.extend(load::run_load_tests(&factory).await);
    results.extend(delete::run_delete_tests(&factory).await);
    results.extend(isolation::run_isolation_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: payload constructors with sensible defaults ─────────────────────

fn labor_entry(day: u8, hours: u8) -> serde_json::Value {
    serde_json::json!({ "day": day, "hours": hours })
}

fn payload_with_entries(entries: &[serde_json::Value]) -> DraftPayload {
    DraftPayload {
        processed_entries: entries.to_vec(),
        ..DraftPayload::default()
    }
}

fn full_payload() -> DraftPayload {
    DraftPayload {
        processed_entries: vec![labor_entry(1, 8), labor_entry(2, 6)],
        external_labor_lines: vec![serde_json::json!({ "supplier": "acme", "workers": 3 })],
        equipment_or_staff_lines: vec![serde_json::json!({ "equipment": "crane", "hours": 4 })],
        manually_edited_days: vec![serde_json::json!(1), serde_json::json!(15)],
    }
}
