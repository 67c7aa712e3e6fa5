use std::future::Future;
use std::sync::Arc;

use super::{make_instance, seed_class, TestResult};
use crate::{AutomateStorage, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_create_same_instance_exactly_one_wins",
        concurrent_create_same_instance_exactly_one_wins(factory).await,
    ));

    results
}

// ── Concurrent check-then-create: exactly one wins ──────────────────────────

/// N tasks each open a snapshot, check that no instance named `default`
/// exists, and create it. Exactly one commit succeeds; every other task must
/// observe the winner, get `AlreadyExists`, or get `ConcurrentConflict` at
/// commit. Afterwards exactly one `default` instance is committed.
async fn concurrent_create_same_instance_exactly_one_wins<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: AutomateStorage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let class = seed_class(storage.as_ref(), "DomainA/NS1", "Approval", &["approved"]).await?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let mut new_instance = make_instance(&class, "default");
        new_instance.description = Some(format!("writer-{i}"));
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            let existing = s
                .find_instance(&mut snap, new_instance.class_id, &new_instance.name)
                .await?;
            if existing.is_some() {
                s.abort_snapshot(snap).await?;
                return Ok(false);
            }
            match s.create_instance(&mut snap, new_instance).await {
                Ok(_) => {}
                Err(StorageError::AlreadyExists { .. }) => {
                    s.abort_snapshot(snap).await?;
                    return Ok(false);
                }
                Err(e) => {
                    let _ = s.abort_snapshot(snap).await;
                    return Err(e);
                }
            }
            match s.commit_snapshot(snap).await {
                Ok(()) => Ok(true),
                Err(StorageError::ConcurrentConflict { .. })
                | Err(StorageError::AlreadyExists { .. }) => Ok(false),
                Err(e) => Err(e),
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }

    if winners != 1 {
        return Err(format!("expected exactly 1 winner, got {winners}"));
    }
    let committed = storage
        .lookup_instance(class.id, "default")
        .await
        .map_err(|e| e.to_string())?;
    if committed.is_none() {
        return Err("winning instance not committed".to_string());
    }
    Ok(())
}
