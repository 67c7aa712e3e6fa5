//! Single-instance copy integration tests.
//!
//! Runs `InstanceCopier::copy_instance` against `MemoryStorage`:
//!
//! 1. Congruent copy into a new domain re-creates the class and every value
//! 2. Rename into another namespace of the same domain
//! 3. Subset destination: lossy copy under compatible, refused under congruent-only
//! 4. Field types, disjoint classes and validation bypass
//! 5. Self-copy guard
//! 6. Duplicate destination with and without overwrite
//! 7. Missing source class / instance, malformed paths
//! 8. Storage-assigned attributes are never carried over

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use automate_copy::{
    ClassCopier, CopyConfig, CopyError, CopyRequest, InstanceCopier, SchemaFlags,
    StorageClassCopier,
};
use automate_storage::{AutomateStorage, ClassRecord, MemoryStorage};

use common::{committed_values, instance_exists, pairs, seed_class, seed_instance};

const SOURCE: &str = "DomainA/NS1/Approval/default";

/// DomainA/NS1/Approval with `approved` and `reason`, plus a `default`
/// instance holding both.
async fn approval_store() -> (MemoryStorage, ClassRecord) {
    let storage = MemoryStorage::with_actor("alice");
    let class = seed_class(
        &storage,
        "DomainA/NS1",
        "Approval",
        &[("approved", "boolean"), ("reason", "string")],
    )
    .await;
    seed_instance(
        &storage,
        &class,
        "default",
        &[("approved", "true"), ("reason", "auto")],
    )
    .await;
    (storage, class)
}

/// Counts how often the destination class had to be materialized.
#[derive(Default)]
struct CountingClassCopier {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ClassCopier<MemoryStorage> for CountingClassCopier {
    async fn copy_class(
        &self,
        storage: &MemoryStorage,
        snapshot: &mut <MemoryStorage as AutomateStorage>::Snapshot,
        source: &ClassRecord,
        domain: &str,
        namespace: &str,
    ) -> Result<ClassRecord, CopyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StorageClassCopier
            .copy_class(storage, snapshot, source, domain, namespace)
            .await
    }
}

// ──────────────────────────────────────────────
// 1. Congruent copy
// ──────────────────────────────────────────────

#[tokio::test]
async fn copy_to_new_domain_recreates_class_and_values() {
    let (storage, source_class) = approval_store().await;

    let copier = InstanceCopier::new(&storage);
    let copied = copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();

    assert_eq!(copied.fqname, "DomainB/NS1/Approval/default");
    assert!(copied.class_created);
    assert_eq!(copied.schema, Some(SchemaFlags::ALL));
    assert_eq!(copied.source_class, source_class.id);
    assert!(copied.dropped_fields.is_empty());
    assert_eq!(copied.values.len(), 2);

    let dest_class = storage
        .lookup_class("DomainB/NS1/Approval")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(dest_class.id, source_class.id);
    assert_eq!(dest_class.fields.len(), 2);
    // Values point at the destination's own field identities.
    for value in &copied.values {
        assert!(dest_class.field_by_id(value.field_id).is_some());
        assert!(source_class.field_by_id(value.field_id).is_none());
    }

    let expected = pairs(&[("approved", "true"), ("reason", "auto")]);
    assert_eq!(
        committed_values(&storage, "DomainB/NS1/Approval/default").await,
        expected
    );
    assert_eq!(committed_values(&storage, SOURCE).await, expected);
}

#[tokio::test]
async fn copy_carries_every_value_attribute() {
    let (storage, _) = approval_store().await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();

    for value in &copied.values {
        let on_entry = value.content.on_entry.as_deref().unwrap();
        assert!(on_entry.starts_with("enter_"), "on_entry was {}", on_entry);
    }
    assert_eq!(copied.instance.description.as_deref(), Some("default instance"));
    assert_eq!(copied.instance.display_name.as_deref(), Some("DEFAULT"));
}

#[tokio::test]
async fn existing_congruent_class_is_reused() {
    let (storage, _) = approval_store().await;
    seed_class(
        &storage,
        "DomainB/NS1",
        "Approval",
        &[("reason", "string"), ("approved", "boolean")],
    )
    .await;

    let class_copier = CountingClassCopier::default();
    let calls = Arc::clone(&class_copier.calls);
    let copier = InstanceCopier::new(&storage).with_class_copier(class_copier);
    let copied = copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();

    assert!(!copied.class_created);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(copied.schema, Some(SchemaFlags::ALL));
}

#[tokio::test]
async fn class_copier_runs_only_when_destination_class_is_missing() {
    let (storage, _) = approval_store().await;
    let class_copier = CountingClassCopier::default();
    let calls = Arc::clone(&class_copier.calls);
    let copier = InstanceCopier::new(&storage).with_class_copier(class_copier);

    copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();
    copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").overwrite(true))
        .await
        .unwrap();
    copier
        .copy_instance(&CopyRequest::rename(SOURCE, "second").in_namespace("NS1"))
        .await
        .unwrap();

    let copied = copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainC"))
        .await
        .unwrap();
    assert!(copied.class_created);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ──────────────────────────────────────────────
// 2. Rename into another namespace
// ──────────────────────────────────────────────

#[tokio::test]
async fn rename_into_other_namespace_of_same_domain() {
    let (storage, _) = approval_store().await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::rename(SOURCE, "backup").in_namespace("NS2"))
        .await
        .unwrap();

    assert_eq!(copied.fqname, "DomainA/NS2/Approval/backup");
    assert_eq!(copied.instance.name, "backup");
    assert_eq!(
        committed_values(&storage, "DomainA/NS2/Approval/backup").await,
        pairs(&[("approved", "true"), ("reason", "auto")])
    );
    assert!(instance_exists(&storage, SOURCE).await);
    assert!(!instance_exists(&storage, "DomainA/NS1/Approval/backup").await);
}

#[tokio::test]
async fn rename_within_same_namespace() {
    let (storage, _) = approval_store().await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::rename(SOURCE, "backup"))
        .await
        .unwrap();

    assert_eq!(copied.fqname, "DomainA/NS1/Approval/backup");
    assert!(!copied.class_created);
}

// ──────────────────────────────────────────────
// 3. Subset destination
// ──────────────────────────────────────────────

#[tokio::test]
async fn subset_destination_drops_missing_fields() {
    let (storage, _) = approval_store().await;
    seed_class(&storage, "DomainB/NS1", "Approval", &[("approved", "boolean")]).await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();

    assert_eq!(copied.schema, Some(SchemaFlags::COMPATIBLE));
    assert_eq!(copied.dropped_fields, vec!["reason".to_string()]);
    assert_eq!(
        committed_values(&storage, "DomainB/NS1/Approval/default").await,
        pairs(&[("approved", "true")])
    );
}

#[tokio::test]
async fn subset_destination_refused_when_only_congruent_accepted() {
    let (storage, _) = approval_store().await;
    seed_class(&storage, "DomainB/NS1", "Approval", &[("approved", "boolean")]).await;
    let version = storage.version().unwrap();

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").accepting(SchemaFlags::CONGRUENT))
        .await
        .unwrap_err();

    match err {
        CopyError::SchemaMismatch {
            source_class,
            dest_class,
            computed,
            accepted,
        } => {
            assert_eq!(source_class, "DomainA/NS1/Approval");
            assert_eq!(dest_class, "DomainB/NS1/Approval");
            assert_eq!(computed, SchemaFlags::COMPATIBLE);
            assert_eq!(accepted, SchemaFlags::CONGRUENT);
        }
        other => panic!("expected SchemaMismatch, got: {}", other),
    }
    assert_eq!(storage.version().unwrap(), version);
    assert!(!instance_exists(&storage, "DomainB/NS1/Approval/default").await);
}

#[tokio::test]
async fn accepted_flags_default_from_config() {
    let (storage, _) = approval_store().await;
    seed_class(&storage, "DomainB/NS1", "Approval", &[("approved", "boolean")]).await;

    let config = CopyConfig::from_toml_str("[copy]\naccepted_flags = [\"congruent\"]\n").unwrap();
    let copier = InstanceCopier::new(&storage).with_config(config);
    assert_eq!(copier.config().accepted_flags, SchemaFlags::CONGRUENT);

    let err = copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap_err();
    assert!(matches!(err, CopyError::SchemaMismatch { .. }));

    // A per-request set overrides the configured one.
    copier
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").accepting(SchemaFlags::ALL))
        .await
        .unwrap();
}

// ──────────────────────────────────────────────
// 4. Field types, disjoint classes and validation bypass
// ──────────────────────────────────────────────

#[tokio::test]
async fn differing_field_type_does_not_block_congruent_copy() {
    let (storage, _) = approval_store().await;
    seed_class(
        &storage,
        "DomainB/NS1",
        "Approval",
        &[("approved", "string"), ("reason", "string")],
    )
    .await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").accepting(SchemaFlags::CONGRUENT))
        .await
        .unwrap();

    assert_eq!(copied.schema, Some(SchemaFlags::ALL));
    assert!(copied.dropped_fields.is_empty());
    assert_eq!(
        committed_values(&storage, "DomainB/NS1/Approval/default").await,
        pairs(&[("approved", "true"), ("reason", "auto")])
    );
}

#[tokio::test]
async fn disjoint_destination_is_incompatible() {
    let (storage, _) = approval_store().await;
    seed_class(&storage, "DomainB/NS1", "Approval", &[("approver", "string")]).await;
    let version = storage.version().unwrap();

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap_err();
    match err {
        CopyError::SchemaMismatch { computed, .. } => assert!(computed.is_empty()),
        other => panic!("expected SchemaMismatch, got: {}", other),
    }
    assert_eq!(storage.version().unwrap(), version);
}

#[tokio::test]
async fn skipped_validation_treats_missing_field_as_mismatch() {
    let (storage, _) = approval_store().await;
    seed_class(&storage, "DomainB/NS1", "Approval", &[("approved", "boolean")]).await;
    let version = storage.version().unwrap();

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").validate_schema(false))
        .await
        .unwrap_err();

    match err {
        CopyError::FieldMismatch { field, dest_class } => {
            assert_eq!(field, "reason");
            assert_eq!(dest_class, "DomainB/NS1/Approval");
        }
        other => panic!("expected FieldMismatch, got: {}", other),
    }
    // The instance record was created before the failing value; none of it
    // may survive.
    assert_eq!(storage.version().unwrap(), version);
    assert!(!instance_exists(&storage, "DomainB/NS1/Approval/default").await);
}

#[tokio::test]
async fn skipped_validation_copies_into_superset_class() {
    let (storage, _) = approval_store().await;
    seed_class(
        &storage,
        "DomainB/NS1",
        "Approval",
        &[("approved", "boolean"), ("reason", "string"), ("approver", "string")],
    )
    .await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").validate_schema(false))
        .await
        .unwrap();
    assert_eq!(copied.schema, None);
    assert_eq!(copied.values.len(), 2);
}

// ──────────────────────────────────────────────
// 5. Self-copy guard
// ──────────────────────────────────────────────

#[tokio::test]
async fn copy_onto_itself_is_refused() {
    let (storage, _) = approval_store().await;
    let copier = InstanceCopier::new(&storage);

    for request in [
        CopyRequest::to_domain(SOURCE, "DomainA"),
        CopyRequest::to_domain(SOURCE, "domaina"),
        CopyRequest::rename(SOURCE, "DEFAULT"),
        CopyRequest::to_domain(SOURCE, "DomainA").in_namespace("NS1"),
    ] {
        let err = copier.copy_instance(&request).await.unwrap_err();
        match err {
            CopyError::SelfCopy { fqname } => assert_eq!(fqname, SOURCE),
            other => panic!("expected SelfCopy for {:?}, got: {}", request.target, other),
        }
    }
}

#[tokio::test]
async fn same_domain_other_namespace_is_not_self_copy() {
    let (storage, _) = approval_store().await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainA").in_namespace("NS2"))
        .await
        .unwrap();
    assert_eq!(copied.fqname, "DomainA/NS2/Approval/default");
}

// ──────────────────────────────────────────────
// 6. Duplicate destination
// ──────────────────────────────────────────────

#[tokio::test]
async fn duplicate_without_overwrite_leaves_destination_untouched() {
    let (storage, _) = approval_store().await;
    let dest_class = seed_class(
        &storage,
        "DomainB/NS1",
        "Approval",
        &[("approved", "boolean"), ("reason", "string")],
    )
    .await;
    let existing = seed_instance(
        &storage,
        &dest_class,
        "default",
        &[("approved", "false"), ("reason", "manual")],
    )
    .await;
    let version = storage.version().unwrap();

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap_err();

    match err {
        CopyError::DuplicateTarget {
            instance,
            class_fqname,
        } => {
            assert_eq!(instance, "default");
            assert_eq!(class_fqname, "DomainB/NS1/Approval");
        }
        other => panic!("expected DuplicateTarget, got: {}", other),
    }
    assert_eq!(storage.version().unwrap(), version);
    let still = storage
        .lookup_instance(dest_class.id, "default")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still.id, existing.id);
    assert_eq!(
        committed_values(&storage, "DomainB/NS1/Approval/default").await,
        pairs(&[("approved", "false"), ("reason", "manual")])
    );
}

#[tokio::test]
async fn overwrite_replaces_destination_and_its_values() {
    let (storage, _) = approval_store().await;
    let dest_class = seed_class(
        &storage,
        "DomainB/NS1",
        "Approval",
        &[("approved", "boolean"), ("reason", "string")],
    )
    .await;
    let existing = seed_instance(&storage, &dest_class, "default", &[("approved", "false")]).await;
    let old_values = storage.lookup_values(existing.id).await.unwrap();
    assert_eq!(old_values.len(), 1);

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB").overwrite(true))
        .await
        .unwrap();

    assert_ne!(copied.instance.id, existing.id);
    assert!(storage.lookup_values(existing.id).await.unwrap().is_empty());
    assert_eq!(
        committed_values(&storage, "DomainB/NS1/Approval/default").await,
        pairs(&[("approved", "true"), ("reason", "auto")])
    );
}

// ──────────────────────────────────────────────
// 7. Lookup failures
// ──────────────────────────────────────────────

#[tokio::test]
async fn missing_source_class() {
    let (storage, _) = approval_store().await;

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain("DomainA/NS1/Missing/default", "DomainB"))
        .await
        .unwrap_err();
    match err {
        CopyError::SourceNotFound { class_fqname } => {
            assert_eq!(class_fqname, "DomainA/NS1/Missing")
        }
        other => panic!("expected SourceNotFound, got: {}", other),
    }
}

#[tokio::test]
async fn missing_source_instance() {
    let (storage, _) = approval_store().await;

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain("DomainA/NS1/Approval/nope", "DomainB"))
        .await
        .unwrap_err();
    match err {
        CopyError::InstanceNotFound {
            instance,
            class_fqname,
        } => {
            assert_eq!(instance, "nope");
            assert_eq!(class_fqname, "DomainA/NS1/Approval");
        }
        other => panic!("expected InstanceNotFound, got: {}", other),
    }
}

#[tokio::test]
async fn lookup_failure_precedes_self_copy_check() {
    let (storage, _) = approval_store().await;

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain("DomainA/NS1/Approval/nope", "DomainA"))
        .await
        .unwrap_err();
    assert!(matches!(err, CopyError::InstanceNotFound { .. }));
}

#[tokio::test]
async fn malformed_source_path() {
    let storage = MemoryStorage::new();

    let err = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain("DomainA/default", "DomainB"))
        .await
        .unwrap_err();
    assert!(matches!(err, CopyError::InvalidPath { .. }));
}

// ──────────────────────────────────────────────
// 8. Storage-assigned attributes
// ──────────────────────────────────────────────

#[tokio::test]
async fn storage_assigned_attributes_are_not_copied() {
    let (storage, _) = approval_store().await;
    let source_class = storage
        .lookup_class("DomainA/NS1/Approval")
        .await
        .unwrap()
        .unwrap();
    let source = storage
        .lookup_instance(source_class.id, "default")
        .await
        .unwrap()
        .unwrap();
    let source_values = storage.lookup_values(source.id).await.unwrap();

    let bob = storage.acting_as("bob");
    let copied = InstanceCopier::new(&bob)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();

    assert_eq!(source.updated_by.as_deref(), Some("alice"));
    assert_eq!(copied.instance.updated_by.as_deref(), Some("bob"));
    assert_ne!(copied.instance.id, source.id);
    for value in &copied.values {
        assert_eq!(value.updated_by.as_deref(), Some("bob"));
        assert_eq!(value.instance_id, copied.instance.id);
        assert!(source_values.iter().all(|v| v.id != value.id));
    }
}

#[tokio::test]
async fn copy_report_serializes_to_json() {
    let (storage, _) = approval_store().await;

    let copied = InstanceCopier::new(&storage)
        .copy_instance(&CopyRequest::to_domain(SOURCE, "DomainB"))
        .await
        .unwrap();
    let json = copied.to_json().unwrap();

    assert_eq!(json["fqname"], "DomainB/NS1/Approval/default");
    assert_eq!(json["schema"], serde_json::json!(["congruent", "compatible"]));
    assert_eq!(json["class_created"], true);
    assert_eq!(json["values"].as_array().unwrap().len(), 2);
}
