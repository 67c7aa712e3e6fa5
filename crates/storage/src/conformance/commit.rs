//! Atomic commit conformance tests.
//!
//! A snapshot that creates, destroys and re-creates records must publish all
//! of it on commit, or none of it on abort.

use std::future::Future;

use super::{make_instance, seed_class, seed_instance, TestResult};
use crate::record::{NewValue, ValueContent};
use crate::AutomateStorage;

pub(super) async fn run_commit_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "commit",
        "multi_record_snapshot_all_visible_after_commit",
        multi_record_snapshot_all_visible_after_commit(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "multi_record_snapshot_none_visible_after_abort",
        multi_record_snapshot_none_visible_after_abort(factory).await,
    ));
    results.push(TestResult::from_result(
        "commit",
        "replace_instance_is_atomic",
        replace_instance_is_atomic(factory).await,
    ));

    results
}

async fn multi_record_snapshot_all_visible_after_commit<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved", "reason"]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let mut created = Vec::new();
    for name in ["one", "two", "three"] {
        let instance = s
            .create_instance(&mut snap, make_instance(&class, name))
            .await
            .map_err(|e| e.to_string())?;
        for field in &class.fields {
            s.create_value(
                &mut snap,
                instance.id,
                NewValue {
                    field_id: field.id,
                    content: ValueContent::with_value(name),
                },
            )
            .await
            .map_err(|e| e.to_string())?;
        }
        created.push(instance);
    }
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    for instance in &created {
        let found = s
            .lookup_instance(class.id, &instance.name)
            .await
            .map_err(|e| e.to_string())?;
        if found.as_ref() != Some(instance) {
            return Err(format!("{} missing after commit", instance.name));
        }
        let values = s
            .lookup_values(instance.id)
            .await
            .map_err(|e| e.to_string())?;
        if values.len() != 2 {
            return Err(format!(
                "{}: expected 2 values, got {}",
                instance.name,
                values.len()
            ));
        }
    }
    Ok(())
}

async fn multi_record_snapshot_none_visible_after_abort<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.ensure_namespace(&mut snap, "DomainB/NS2")
        .await
        .map_err(|e| e.to_string())?;
    for name in ["one", "two"] {
        s.create_instance(&mut snap, make_instance(&class, name))
            .await
            .map_err(|e| e.to_string())?;
    }
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    for name in ["one", "two"] {
        let found = s
            .lookup_instance(class.id, name)
            .await
            .map_err(|e| e.to_string())?;
        if found.is_some() {
            return Err(format!("{} visible after abort", name));
        }
    }
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let ns = s
        .find_namespace(&mut snap, "DomainB/NS2")
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    if ns.is_some() {
        return Err("namespace visible after abort".to_string());
    }
    Ok(())
}

async fn replace_instance_is_atomic<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let class = seed_class(&s, "DomainA/NS1", "Approval", &["approved"]).await?;
    let original = seed_instance(&s, &class, "default").await?;

    // Destroy and re-create, then abort: the original must survive intact.
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.destroy_instance(&mut snap, original.id)
        .await
        .map_err(|e| e.to_string())?;
    s.create_instance(&mut snap, make_instance(&class, "default"))
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    let found = s
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    if found.as_ref() != Some(&original) {
        return Err(format!("original not restored after abort: {:?}", found));
    }
    let values = s
        .lookup_values(original.id)
        .await
        .map_err(|e| e.to_string())?;
    if values.len() != 1 {
        return Err(format!("original lost values after abort: {:?}", values));
    }
    Ok(())
}
