use std::future::Future;

use super::{make_class, make_instance, seed_class, seed_instance, TestResult};
use crate::record::{ClassId, InstanceId, NewValue, ValueContent};
use crate::{AutomateStorage, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "error",
        "get_class_nonexistent",
        get_class_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "get_instance_nonexistent",
        get_instance_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "destroy_instance_nonexistent",
        destroy_instance_nonexistent(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "create_class_in_missing_namespace",
        create_class_in_missing_namespace(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "create_instance_for_missing_class",
        create_instance_for_missing_class(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "create_value_with_foreign_field",
        create_value_with_foreign_field(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "create_value_for_missing_instance",
        create_value_for_missing_instance(factory).await,
    ));
    results.push(TestResult::from_result(
        "error",
        "lookups_empty_for_nonexistent",
        lookups_empty_for_nonexistent(factory).await,
    ));

    results
}

// ── 1. get_class on empty store returns ClassNotFound ────────────────────────

async fn get_class_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_class(&mut snap, ClassId(999)).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::ClassNotFound { class_id }) if class_id == ClassId(999) => Ok(()),
        other => Err(format!("expected ClassNotFound(999), got {:?}", other)),
    }
}

// ── 2. get_instance on empty store returns InstanceNotFound ──────────────────

async fn get_instance_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_instance(&mut snap, InstanceId(999)).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::InstanceNotFound { instance_id }) if instance_id == InstanceId(999) => {
            Ok(())
        }
        other => Err(format!("expected InstanceNotFound(999), got {:?}", other)),
    }
}

// ── 3. destroy_instance on empty store returns InstanceNotFound ──────────────

async fn destroy_instance_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.destroy_instance(&mut snap, InstanceId(999)).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::InstanceNotFound { .. }) => Ok(()),
        other => Err(format!("expected InstanceNotFound, got {:?}", other)),
    }
}

// ── 4. create_class requires its namespace ───────────────────────────────────

async fn create_class_in_missing_namespace<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_class(&mut snap, make_class("Missing/NS", "Approval", &["approved"]))
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::NamespaceNotFound { fqname }) if fqname == "Missing/NS" => Ok(()),
        other => Err(format!("expected NamespaceNotFound, got {:?}", other)),
    }
}

// ── 5. create_instance requires its class ────────────────────────────────────

async fn create_instance_for_missing_class<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &[]).await?;
    let mut orphan = make_instance(&class, "default");
    orphan.class_id = ClassId(999);

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.create_instance(&mut snap, orphan).await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::ClassNotFound { .. }) => Ok(()),
        other => Err(format!("expected ClassNotFound, got {:?}", other)),
    }
}

// ── 6. create_value rejects a field from another class ───────────────────────

async fn create_value_with_foreign_field<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let foreign = seed_class(&s, "DomainA/NS1", "Other", &["approved"]).await?;
    let instance = seed_instance(&s, &class, "default").await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_value(
            &mut snap,
            instance.id,
            NewValue {
                field_id: foreign.fields[0].id,
                content: ValueContent::with_value("true"),
            },
        )
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::FieldNotFound { field_id, class_id })
            if field_id == foreign.fields[0].id && class_id == class.id =>
        {
            Ok(())
        }
        other => Err(format!("expected FieldNotFound, got {:?}", other)),
    }
}

// ── 7. create_value requires its instance ────────────────────────────────────

async fn create_value_for_missing_instance<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .create_value(
            &mut snap,
            InstanceId(999),
            NewValue {
                field_id: class.fields[0].id,
                content: ValueContent::default(),
            },
        )
        .await;
    let _ = s.abort_snapshot(snap).await;
    match result {
        Err(StorageError::InstanceNotFound { .. }) => Ok(()),
        other => Err(format!("expected InstanceNotFound, got {:?}", other)),
    }
}

// ── 8. committed lookups on an empty store return nothing ────────────────────

async fn lookups_empty_for_nonexistent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = s
        .lookup_class("DomainA/NS1/Approval")
        .await
        .map_err(|e| e.to_string())?;
    if class.is_some() {
        return Err(format!("expected None, got {:?}", class));
    }
    let instance = s
        .lookup_instance(ClassId(1), "default")
        .await
        .map_err(|e| e.to_string())?;
    if instance.is_some() {
        return Err(format!("expected None, got {:?}", instance));
    }
    let values = s
        .lookup_values(InstanceId(1))
        .await
        .map_err(|e| e.to_string())?;
    if !values.is_empty() {
        return Err(format!("expected no values, got {:?}", values));
    }
    Ok(())
}
