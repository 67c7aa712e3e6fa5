//! Class conformance tests.

use std::future::Future;

use super::{make_class, seed_class, TestResult};
use crate::{AutomateStorage, StorageError};

pub(super) async fn run_class_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "class",
        "create_class_assigns_field_identities",
        create_class_assigns_field_identities(factory).await,
    ));
    results.push(TestResult::from_result(
        "class",
        "find_class_by_fqname_loads_fields",
        find_class_by_fqname_loads_fields(factory).await,
    ));
    results.push(TestResult::from_result(
        "class",
        "get_class_by_id",
        get_class_by_id(factory).await,
    ));
    results.push(TestResult::from_result(
        "class",
        "same_class_name_in_two_domains_is_distinct",
        same_class_name_in_two_domains_is_distinct(factory).await,
    ));
    results.push(TestResult::from_result(
        "class",
        "duplicate_class_rejected",
        duplicate_class_rejected(factory).await,
    ));

    results
}

async fn create_class_assigns_field_identities<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved", "reason"]).await?;
    if class.fqname() != "DomainA/NS1/Approval" {
        return Err(format!("unexpected fqname {}", class.fqname()));
    }
    let names: Vec<&str> = class.fields.iter().map(|f| f.name.as_str()).collect();
    if names != ["approved", "reason"] {
        return Err(format!("fields out of order or missing: {:?}", names));
    }
    if class.fields[0].id == class.fields[1].id {
        return Err("two fields share an identity".to_string());
    }
    if class.fields.iter().any(|f| f.class_id != class.id) {
        return Err("field class_id does not point at its class".to_string());
    }
    Ok(())
}

async fn find_class_by_fqname_loads_fields<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let found = s
        .find_class(&mut snap, "domaina/ns1/APPROVAL")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("class not found by case-insensitive fqname")?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    if found != class {
        return Err(format!("expected {:?}, got {:?}", class, found));
    }
    let committed = s
        .lookup_class("DomainA/NS1/Approval")
        .await
        .map_err(|e| e.to_string())?;
    if committed.as_ref() != Some(&class) {
        return Err(format!("lookup_class returned {:?}", committed));
    }
    Ok(())
}

async fn get_class_by_id<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let found = s
        .get_class(&mut snap, class.id)
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    if found != class {
        return Err(format!("expected {:?}, got {:?}", class, found));
    }
    Ok(())
}

async fn same_class_name_in_two_domains_is_distinct<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let b = seed_class(&s, "DomainB/NS1", "Approval", &["approved", "extra"]).await?;
    if a.id == b.id {
        return Err("classes in different domains share an identity".to_string());
    }
    let found = s
        .lookup_class("DomainB/NS1/Approval")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("DomainB class missing")?;
    if found.fields.len() != 2 {
        return Err(format!("expected 2 fields, got {}", found.fields.len()));
    }
    Ok(())
}

async fn duplicate_class_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_class(&mut snap, make_class("DomainA/NS1", "approval", &[]))
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::AlreadyExists { kind: "class", .. }) => Ok(()),
        other => Err(format!("expected AlreadyExists, got {:?}", other)),
    }
}
