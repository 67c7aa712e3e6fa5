#![allow(dead_code)]

use automate_storage::{
    AutomateStorage, ClassRecord, InstanceRecord, MemoryStorage, NewClass, NewField, NewInstance,
    NewValue, ValueContent,
};

// ──────────────────────────────────────────────
// Test fixtures
// ──────────────────────────────────────────────

pub fn field(name: &str, datatype: &str, priority: i32) -> NewField {
    NewField {
        name: name.to_string(),
        aetype: "attribute".to_string(),
        datatype: datatype.to_string(),
        priority,
        default_value: None,
        description: None,
    }
}

/// Commit a class under `namespace` (created if needed) with `fields` given
/// as `(name, datatype)` pairs.
pub async fn seed_class(
    storage: &MemoryStorage,
    namespace: &str,
    name: &str,
    fields: &[(&str, &str)],
) -> ClassRecord {
    let mut snap = storage.begin_snapshot().await.unwrap();
    storage.ensure_namespace(&mut snap, namespace).await.unwrap();
    let class = storage
        .create_class(
            &mut snap,
            NewClass {
                namespace: namespace.to_string(),
                name: name.to_string(),
                description: Some(format!("{} class", name)),
                display_name: None,
                fields: fields
                    .iter()
                    .enumerate()
                    .map(|(i, (f, t))| field(f, t, i as i32 + 1))
                    .collect(),
            },
        )
        .await
        .unwrap();
    storage.commit_snapshot(snap).await.unwrap();
    class
}

/// Commit an instance of `class` holding `values` as `(field name, value)`.
pub async fn seed_instance(
    storage: &MemoryStorage,
    class: &ClassRecord,
    name: &str,
    values: &[(&str, &str)],
) -> InstanceRecord {
    let mut snap = storage.begin_snapshot().await.unwrap();
    let instance = storage
        .create_instance(
            &mut snap,
            NewInstance {
                class_id: class.id,
                name: name.to_string(),
                description: Some(format!("{} instance", name)),
                display_name: Some(name.to_uppercase()),
                inherits: None,
            },
        )
        .await
        .unwrap();
    for (field_name, value) in values {
        let field = class.field_by_name(field_name).unwrap();
        storage
            .create_value(
                &mut snap,
                instance.id,
                NewValue {
                    field_id: field.id,
                    content: ValueContent {
                        on_entry: Some(format!("enter_{}", field_name)),
                        ..ValueContent::with_value(*value)
                    },
                },
            )
            .await
            .unwrap();
    }
    storage.commit_snapshot(snap).await.unwrap();
    instance
}

/// Committed values of `fqname` (`class fqname/instance`) as
/// `(field name, value)` pairs in field order.
pub async fn committed_values(storage: &MemoryStorage, fqname: &str) -> Vec<(String, String)> {
    let (class_fqname, instance_name) = fqname.rsplit_once('/').unwrap();
    let class = storage
        .lookup_class(class_fqname)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("class {} not committed", class_fqname));
    let instance = storage
        .lookup_instance(class.id, instance_name)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("instance {} not committed", fqname));
    let mut values: Vec<(String, String)> = storage
        .lookup_values(instance.id)
        .await
        .unwrap()
        .into_iter()
        .map(|v| {
            let field = class.field_by_id(v.field_id).unwrap();
            (field.name.clone(), v.content.value.unwrap_or_default())
        })
        .collect();
    values.sort();
    values
}

pub async fn instance_exists(storage: &MemoryStorage, fqname: &str) -> bool {
    let (class_fqname, instance_name) = fqname.rsplit_once('/').unwrap();
    match storage.lookup_class(class_fqname).await.unwrap() {
        Some(class) => storage
            .lookup_instance(class.id, instance_name)
            .await
            .unwrap()
            .is_some(),
        None => false,
    }
}

pub fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    out.sort();
    out
}
