//! Runs the backend-agnostic conformance suite against the in-memory store.

use sitelog_storage::conformance::run_conformance_suite;
use sitelog_storage::MemoryDraftStore;

#[tokio::test]
async fn memory_store_passes_conformance() {
    let report = run_conformance_suite(|| async { MemoryDraftStore::new() }).await;
    assert_eq!(report.failed, 0, "{report}");
}
