//! Namespace conformance tests.

use std::future::Future;

use super::TestResult;
use crate::AutomateStorage;

pub(super) async fn run_namespace_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "namespace",
        "ensure_namespace_creates_parents",
        ensure_namespace_creates_parents(factory).await,
    ));
    results.push(TestResult::from_result(
        "namespace",
        "ensure_namespace_is_idempotent",
        ensure_namespace_is_idempotent(factory).await,
    ));
    results.push(TestResult::from_result(
        "namespace",
        "find_namespace_is_case_insensitive",
        find_namespace_is_case_insensitive(factory).await,
    ));
    results.push(TestResult::from_result(
        "namespace",
        "find_namespace_absent_returns_none",
        find_namespace_absent_returns_none(factory).await,
    ));

    results
}

async fn ensure_namespace_creates_parents<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let leaf = s
        .ensure_namespace(&mut snap, "DomainA/NS1/Sub")
        .await
        .map_err(|e| e.to_string())?;
    if leaf.fqname != "DomainA/NS1/Sub" || leaf.name != "Sub" {
        return Err(format!("unexpected leaf namespace {:?}", leaf));
    }
    if leaf.domain() != "DomainA" {
        return Err(format!("expected domain DomainA, got {}", leaf.domain()));
    }
    let parent = s
        .find_namespace(&mut snap, "DomainA/NS1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("parent namespace DomainA/NS1 was not created")?;
    if leaf.parent_id != Some(parent.id) {
        return Err(format!(
            "leaf parent_id {:?} does not point at {:?}",
            leaf.parent_id, parent.id
        ));
    }
    let root = s
        .find_namespace(&mut snap, "DomainA")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("domain namespace DomainA was not created")?;
    if root.parent_id.is_some() {
        return Err("domain namespace must not have a parent".to_string());
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

async fn ensure_namespace_is_idempotent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let first = s
        .ensure_namespace(&mut snap, "DomainA/NS1")
        .await
        .map_err(|e| e.to_string())?;
    let second = s
        .ensure_namespace(&mut snap, "DomainA/NS1")
        .await
        .map_err(|e| e.to_string())?;
    if first.id != second.id {
        return Err(format!(
            "ensure_namespace created a second record: {} vs {}",
            first.id, second.id
        ));
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

async fn find_namespace_is_case_insensitive<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let created = s
        .ensure_namespace(&mut snap, "DomainA/NS1")
        .await
        .map_err(|e| e.to_string())?;
    let found = s
        .find_namespace(&mut snap, "domaina/ns1")
        .await
        .map_err(|e| e.to_string())?;
    match found {
        Some(ns) if ns.id == created.id => {}
        other => return Err(format!("expected {:?}, got {:?}", created, other)),
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}

async fn find_namespace_absent_returns_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let found = s
        .find_namespace(&mut snap, "Nowhere/At/All")
        .await
        .map_err(|e| e.to_string())?;
    if found.is_some() {
        return Err(format!("expected None, got {:?}", found));
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    Ok(())
}
