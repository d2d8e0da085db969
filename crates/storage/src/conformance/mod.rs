//! Conformance test suite for `LeadStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any `LeadStorage`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Leads**: insertion, duplicate detection, update, hard delete
//! - **Snapshot isolation**: uncommitted writes invisible, aborted writes discarded
//! - **Atomic commit**: a lead update and its activity record land together
//! - **Queries**: filtering, newest-first ordering, per-lead activity and notes
//! - **Error handling**: correct error variants for invalid operations
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use leadbook_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod commit;
mod error;
mod lead;
mod query;
mod snapshot;

use std::fmt;
use std::future::Future;

use crate::record::{ActivityRecord, LeadRecord, NoteRecord};
use crate::LeadStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "lead", "snapshot", "commit").
    pub category: String,
    /// Test name (e.g. "insert_lead_visible_after_commit").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
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
    S: LeadStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(lead::run_lead_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(query::run_query_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

fn make_lead(id: &str, created_at: &str) -> LeadRecord {
    LeadRecord {
        id: id.to_string(),
        name: format!("Lead {}", id),
        email: format!("{}@example.com", id),
        phone: None,
        company: "Test Co".to_string(),
        company_domain: None,
        service: "Consulting".to_string(),
        description: None,
        source: Some("manual".to_string()),
        created_at: created_at.to_string(),
        status: "New".to_string(),
        owner_id: None,
        archived: false,
        expected_value: None,
        probability: None,
        last_activity: None,
    }
}

fn make_activity(id: &str, lead_id: &str, activity_type: &str, created_at: &str) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        lead_id: lead_id.to_string(),
        activity_type: activity_type.to_string(),
        description: format!("{} on {}", activity_type, lead_id),
        created_at: created_at.to_string(),
    }
}

fn make_note(id: &str, lead_id: &str, created_at: &str) -> NoteRecord {
    NoteRecord {
        id: id.to_string(),
        lead_id: lead_id.to_string(),
        note: format!("note {}", id),
        created_at: created_at.to_string(),
    }
}

/// Insert `leads` in one committed snapshot.
async fn seed<S: LeadStorage>(s: &S, leads: Vec<LeadRecord>) -> Result<(), String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    for lead in leads {
        s.insert_lead(&mut snap, lead)
            .await
            .map_err(|e| e.to_string())?;
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())
}
