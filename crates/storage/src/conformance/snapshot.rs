//! Snapshot isolation conformance tests.
//!
//! Verifies that uncommitted writes are invisible outside a snapshot,
//! committed writes are visible, and aborted writes are discarded.

use std::future::Future;

use super::{make_class, make_instance, seed_class, TestResult};
use crate::AutomateStorage;

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "snapshot",
        "begin_and_commit_empty_snapshot",
        begin_and_commit_empty_snapshot(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "snapshot_reads_its_own_writes",
        snapshot_reads_its_own_writes(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_class_invisible",
        uncommitted_class_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "uncommitted_instance_invisible",
        uncommitted_instance_invisible(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "abort_discards_writes",
        abort_discards_writes(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "dropped_snapshot_discards_writes",
        dropped_snapshot_discards_writes(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "sequential_snapshots_see_prior_commits",
        sequential_snapshots_see_prior_commits(factory).await,
    ));

    results
}

// ── 1. begin_and_commit_empty_snapshot ──────────────────────────────────────

async fn begin_and_commit_empty_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;
    let snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

// ── 2. snapshot_reads_its_own_writes ────────────────────────────────────────

async fn snapshot_reads_its_own_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.ensure_namespace(&mut snap, "DomainA/NS1")
        .await
        .map_err(|e| e.to_string())?;
    let class = s
        .create_class(&mut snap, make_class("DomainA/NS1", "Approval", &["approved"]))
        .await
        .map_err(|e| e.to_string())?;
    let instance = s
        .create_instance(&mut snap, make_instance(&class, "default"))
        .await
        .map_err(|e| e.to_string())?;

    let found_class = s
        .find_class(&mut snap, "DomainA/NS1/Approval")
        .await
        .map_err(|e| e.to_string())?;
    let found_instance = s
        .find_instance(&mut snap, class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    if found_class.as_ref() != Some(&class) {
        return Err(format!("class not visible in own snapshot: {:?}", found_class));
    }
    if found_instance.as_ref() != Some(&instance) {
        return Err(format!(
            "instance not visible in own snapshot: {:?}",
            found_instance
        ));
    }
    Ok(())
}

// ── 3. uncommitted_class_invisible ──────────────────────────────────────────

async fn uncommitted_class_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.ensure_namespace(&mut snap, "DomainA/NS1")
        .await
        .map_err(|e| e.to_string())?;
    s.create_class(&mut snap, make_class("DomainA/NS1", "Approval", &[]))
        .await
        .map_err(|e| e.to_string())?;

    let visible = s
        .lookup_class("DomainA/NS1/Approval")
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    if visible.is_some() {
        return Err("uncommitted class visible to lookup_class".to_string());
    }
    Ok(())
}

// ── 4. uncommitted_instance_invisible ───────────────────────────────────────

async fn uncommitted_instance_invisible<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.create_instance(&mut snap, make_instance(&class, "default"))
        .await
        .map_err(|e| e.to_string())?;

    let visible = s
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    if visible.is_some() {
        return Err("uncommitted instance visible to lookup_instance".to_string());
    }
    Ok(())
}

// ── 5. abort_discards_writes ────────────────────────────────────────────────

async fn abort_discards_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.create_instance(&mut snap, make_instance(&class, "default"))
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let visible = s
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    if visible.is_some() {
        return Err("aborted instance visible after abort".to_string());
    }
    Ok(())
}

// ── 6. dropped_snapshot_discards_writes ─────────────────────────────────────

async fn dropped_snapshot_discards_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;

    {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.create_instance(&mut snap, make_instance(&class, "default"))
            .await
            .map_err(|e| e.to_string())?;
    }

    let visible = s
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    if visible.is_some() {
        return Err("dropped snapshot's instance visible".to_string());
    }
    Ok(())
}

// ── 7. sequential_snapshots_see_prior_commits ───────────────────────────────

async fn sequential_snapshots_see_prior_commits<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let found = s
        .find_class(&mut snap, "DomainA/NS1/Approval")
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    if found.as_ref() != Some(&class) {
        return Err(format!("later snapshot did not see commit: {:?}", found));
    }
    Ok(())
}
