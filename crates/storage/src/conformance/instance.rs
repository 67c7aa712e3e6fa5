//! Instance and value conformance tests.

use std::future::Future;

use super::{make_instance, seed_class, seed_instance, TestResult};
use crate::{AutomateStorage, StorageError};

pub(super) async fn run_instance_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "instance",
        "create_instance_assigns_stamps",
        create_instance_assigns_stamps(factory).await,
    ));
    results.push(TestResult::from_result(
        "instance",
        "find_instance_is_case_insensitive",
        find_instance_is_case_insensitive(factory).await,
    ));
    results.push(TestResult::from_result(
        "instance",
        "duplicate_instance_name_rejected",
        duplicate_instance_name_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "instance",
        "values_listed_in_creation_order",
        values_listed_in_creation_order(factory).await,
    ));
    results.push(TestResult::from_result(
        "instance",
        "destroy_instance_removes_values",
        destroy_instance_removes_values(factory).await,
    ));
    results.push(TestResult::from_result(
        "instance",
        "destroyed_name_can_be_reused",
        destroyed_name_can_be_reused(factory).await,
    ));

    results
}

async fn create_instance_assigns_stamps<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let instance = seed_instance(&s, &class, "default").await?;
    if instance.class_id != class.id || instance.name != "default" {
        return Err(format!("unexpected instance {:?}", instance));
    }
    if instance.created_on.is_empty() || instance.updated_on.is_empty() {
        return Err("timestamps were not assigned".to_string());
    }
    let values = s
        .lookup_values(instance.id)
        .await
        .map_err(|e| e.to_string())?;
    if values.len() != 1 || values[0].created_on.is_empty() {
        return Err(format!("unexpected values {:?}", values));
    }
    Ok(())
}

async fn find_instance_is_case_insensitive<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let instance = seed_instance(&s, &class, "Default").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let found = s
        .find_instance(&mut snap, class.id, "DEFAULT")
        .await
        .map_err(|e| e.to_string())?;
    let by_id = s
        .get_instance(&mut snap, instance.id)
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    if found.as_ref() != Some(&instance) {
        return Err(format!("find_instance returned {:?}", found));
    }
    if by_id != instance {
        return Err(format!("get_instance returned {:?}", by_id));
    }
    let committed = s
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    if committed.as_ref() != Some(&instance) {
        return Err(format!("lookup_instance returned {:?}", committed));
    }
    Ok(())
}

async fn duplicate_instance_name_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    seed_instance(&s, &class, "default").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_instance(&mut snap, make_instance(&class, "DEFAULT"))
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::AlreadyExists {
            kind: "instance", ..
        }) => Ok(()),
        other => Err(format!("expected AlreadyExists, got {:?}", other)),
    }
}

async fn values_listed_in_creation_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["a", "b", "c"]).await?;
    let instance = seed_instance(&s, &class, "default").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let values = s
        .list_values(&mut snap, instance.id)
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let contents: Vec<Option<&str>> = values.iter().map(|v| v.content.value.as_deref()).collect();
    if contents != [Some("a"), Some("b"), Some("c")] {
        return Err(format!("unexpected value order {:?}", contents));
    }
    for (value, field) in values.iter().zip(&class.fields) {
        if value.field_id != field.id || value.instance_id != instance.id {
            return Err(format!("value {:?} not linked to field {:?}", value, field));
        }
    }
    Ok(())
}

async fn destroy_instance_removes_values<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["a", "b"]).await?;
    let instance = seed_instance(&s, &class, "default").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.destroy_instance(&mut snap, instance.id)
        .await
        .map_err(|e| e.to_string())?;
    let remaining = s
        .list_values(&mut snap, instance.id)
        .await
        .map_err(|e| e.to_string())?;
    if !remaining.is_empty() {
        return Err(format!("values survived destroy: {:?}", remaining));
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let committed = s
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    if committed.is_some() {
        return Err("destroyed instance still visible after commit".to_string());
    }
    let values = s
        .lookup_values(instance.id)
        .await
        .map_err(|e| e.to_string())?;
    if !values.is_empty() {
        return Err(format!("values survived commit of destroy: {:?}", values));
    }
    Ok(())
}

async fn destroyed_name_can_be_reused<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["a"]).await?;
    let instance = seed_instance(&s, &class, "default").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.destroy_instance(&mut snap, instance.id)
        .await
        .map_err(|e| e.to_string())?;
    let replacement = s
        .create_instance(&mut snap, make_instance(&class, "default"))
        .await
        .map_err(|e| format!("create after destroy: {e}"))?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    if replacement.id == instance.id {
        return Err("replacement reused the destroyed identity".to_string());
    }
    Ok(())
}
