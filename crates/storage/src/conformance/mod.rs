//! Conformance test suite for `AutomateStorage` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `AutomateStorage` implementation can run to verify correctness. The suite
//! covers:
//!
//! - **Namespaces**: path creation, parent linkage, idempotent ensure
//! - **Classes**: creation with fields, lookup by fqname and identity
//! - **Instances and values**: creation, uniqueness, cascade on destroy
//! - **Snapshot isolation**: uncommitted writes invisible, committed writes visible
//! - **Atomic commit**: all-or-nothing semantics for multi-record snapshots
//! - **Concurrency**: racing check-then-create sequences produce one winner
//! - **Error handling**: correct error variants for invalid operations
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use automate_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_postgres_storage().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod class;
mod commit;
mod concurrent;
mod error;
mod instance;
mod namespace;
mod snapshot;

use std::fmt;
use std::future::Future;

use crate::record::{
    ClassRecord, InstanceRecord, NewClass, NewField, NewInstance, NewValue, ValueContent,
};
use crate::AutomateStorage;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "namespace", "snapshot", "commit").
    pub category: String,
    /// Test name (e.g. "ensure_namespace_creates_parents").
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
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(namespace::run_namespace_tests(&factory).await);
    results.extend(class::run_class_tests(&factory).await);
    results.extend(instance::run_instance_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(commit::run_commit_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

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

fn make_field(name: &str, datatype: &str, priority: i32) -> NewField {
    NewField {
        name: name.to_string(),
        aetype: "attribute".to_string(),
        datatype: datatype.to_string(),
        priority,
        default_value: None,
        description: Some(format!("{} field", name)),
    }
}

fn make_class(namespace: &str, name: &str, fields: &[&str]) -> NewClass {
    NewClass {
        namespace: namespace.to_string(),
        name: name.to_string(),
        description: Some(format!("{} class", name)),
        display_name: None,
        fields: fields
            .iter()
            .enumerate()
            .map(|(i, f)| make_field(f, "string", i as i32 + 1))
            .collect(),
    }
}

fn make_instance(class: &ClassRecord, name: &str) -> NewInstance {
    NewInstance {
        class_id: class.id,
        name: name.to_string(),
        description: Some(format!("{} instance", name)),
        display_name: None,
        inherits: None,
    }
}

/// Commit a namespace plus a class with string fields named `fields`.
async fn seed_class<S: AutomateStorage>(
    s: &S,
    namespace: &str,
    name: &str,
    fields: &[&str],
) -> Result<ClassRecord, String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.ensure_namespace(&mut snap, namespace)
        .await
        .map_err(|e| format!("ensure_namespace: {e}"))?;
    let class = s
        .create_class(&mut snap, make_class(namespace, name, fields))
        .await
        .map_err(|e| format!("create_class: {e}"))?;
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;
    Ok(class)
}

/// Commit an instance of `class` with one value per field, each holding the
/// field's name as its content.
async fn seed_instance<S: AutomateStorage>(
    s: &S,
    class: &ClassRecord,
    name: &str,
) -> Result<InstanceRecord, String> {
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let instance = s
        .create_instance(&mut snap, make_instance(class, name))
        .await
        .map_err(|e| format!("create_instance: {e}"))?;
    for field in &class.fields {
        s.create_value(
            &mut snap,
            instance.id,
            NewValue {
                field_id: field.id,
                content: ValueContent::with_value(field.name.clone()),
            },
        )
        .await
        .map_err(|e| format!("create_value: {e}"))?;
    }
    s.commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))?;
    Ok(instance)
}
