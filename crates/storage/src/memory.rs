//! In-memory `AutomateStorage` backend.
//!
//! Each snapshot works on a private copy of the committed store. Commit
//! publishes the copy if no other snapshot committed since this one began,
//! otherwise it fails with `ConcurrentConflict` and nothing is applied.
//! Aborting or dropping a snapshot discards its copy.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::StorageError;
use crate::record::{
    ClassId, ClassRecord, FieldId, FieldRecord, InstanceId, InstanceRecord, NamespaceId,
    NamespaceRecord, NewClass, NewInstance, NewValue, ValueId, ValueRecord,
};
use crate::traits::AutomateStorage;

#[derive(Debug, Clone, Default)]
struct StoreState {
    next_id: u64,
    namespaces: BTreeMap<NamespaceId, NamespaceRecord>,
    classes: BTreeMap<ClassId, ClassRecord>,
    instances: BTreeMap<InstanceId, InstanceRecord>,
    values: BTreeMap<ValueId, ValueRecord>,
}

impl StoreState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn namespace_by_fqname(&self, fqname: &str) -> Option<&NamespaceRecord> {
        self.namespaces
            .values()
            .find(|ns| ns.fqname.eq_ignore_ascii_case(fqname))
    }

    fn class_by_fqname(&self, fqname: &str) -> Option<&ClassRecord> {
        let (namespace, name) = fqname.rsplit_once('/')?;
        self.classes.values().find(|c| {
            c.namespace.eq_ignore_ascii_case(namespace) && c.name.eq_ignore_ascii_case(name)
        })
    }

    fn instance_by_name(&self, class_id: ClassId, name: &str) -> Option<&InstanceRecord> {
        self.instances
            .values()
            .find(|i| i.class_id == class_id && i.name.eq_ignore_ascii_case(name))
    }

    fn values_of(&self, instance_id: InstanceId) -> Vec<ValueRecord> {
        self.values
            .values()
            .filter(|v| v.instance_id == instance_id)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct Committed {
    version: u64,
    state: StoreState,
}

/// Snapshot type for [`MemoryStorage`]: a private working copy of the store.
#[derive(Debug)]
pub struct MemorySnapshot {
    base_version: u64,
    dirty: bool,
    state: StoreState,
}

/// Reference in-memory backend. Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<Committed>>,
    actor: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records created through this handle carry `actor` as `updated_by`.
    pub fn with_actor(actor: impl Into<String>) -> Self {
        Self {
            inner: Arc::default(),
            actor: Some(actor.into()),
        }
    }

    /// A handle onto the same store that stamps records with a different actor.
    pub fn acting_as(&self, actor: impl Into<String>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            actor: Some(actor.into()),
        }
    }

    /// Number of committed snapshots that changed the store.
    pub fn version(&self) -> Result<u64, StorageError> {
        Ok(self.lock()?.version)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Committed>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }

    fn committed_state(&self) -> Result<StoreState, StorageError> {
        Ok(self.lock()?.state.clone())
    }
}

fn now_rfc3339() -> Result<String, StorageError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StorageError::Backend(format!("timestamp formatting failed: {}", e)))
}

#[async_trait]
impl AutomateStorage for MemoryStorage {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        let committed = self.lock()?;
        Ok(MemorySnapshot {
            base_version: committed.version,
            dirty: false,
            state: committed.state.clone(),
        })
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        if !snapshot.dirty {
            return Ok(());
        }
        let mut committed = self.lock()?;
        if committed.version != snapshot.base_version {
            return Err(StorageError::ConcurrentConflict {
                expected_version: snapshot.base_version,
            });
        }
        committed.state = snapshot.state;
        committed.version += 1;
        Ok(())
    }

    async fn abort_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        drop(snapshot);
        Ok(())
    }

    async fn find_namespace(
        &self,
        snapshot: &mut MemorySnapshot,
        fqname: &str,
    ) -> Result<Option<NamespaceRecord>, StorageError> {
        Ok(snapshot.state.namespace_by_fqname(fqname).cloned())
    }

    async fn ensure_namespace(
        &self,
        snapshot: &mut MemorySnapshot,
        fqname: &str,
    ) -> Result<NamespaceRecord, StorageError> {
        let segments: Vec<&str> = fqname.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(StorageError::Backend(format!(
                "invalid namespace path '{}'",
                fqname
            )));
        }

        let mut parent: Option<NamespaceRecord> = None;
        for depth in 1..=segments.len() {
            let path = segments[..depth].join("/");
            let record = match snapshot.state.namespace_by_fqname(&path) {
                Some(existing) => existing.clone(),
                None => {
                    let record = NamespaceRecord {
                        id: NamespaceId(snapshot.state.allocate()),
                        parent_id: parent.as_ref().map(|p| p.id),
                        fqname: path,
                        name: segments[depth - 1].to_string(),
                    };
                    snapshot.state.namespaces.insert(record.id, record.clone());
                    snapshot.dirty = true;
                    record
                }
            };
            parent = Some(record);
        }
        parent.ok_or_else(|| StorageError::NamespaceNotFound {
            fqname: fqname.to_string(),
        })
    }

    async fn find_class(
        &self,
        snapshot: &mut MemorySnapshot,
        fqname: &str,
    ) -> Result<Option<ClassRecord>, StorageError> {
        Ok(snapshot.state.class_by_fqname(fqname).cloned())
    }

    async fn get_class(
        &self,
        snapshot: &mut MemorySnapshot,
        class_id: ClassId,
    ) -> Result<ClassRecord, StorageError> {
        snapshot
            .state
            .classes
            .get(&class_id)
            .cloned()
            .ok_or(StorageError::ClassNotFound { class_id })
    }

    async fn create_class(
        &self,
        snapshot: &mut MemorySnapshot,
        class: NewClass,
    ) -> Result<ClassRecord, StorageError> {
        let state = &mut snapshot.state;
        let namespace = state
            .namespace_by_fqname(&class.namespace)
            .cloned()
            .ok_or_else(|| StorageError::NamespaceNotFound {
                fqname: class.namespace.clone(),
            })?;
        let fqname = format!("{}/{}", namespace.fqname, class.name);
        if state.class_by_fqname(&fqname).is_some() {
            return Err(StorageError::AlreadyExists {
                kind: "class",
                name: fqname,
            });
        }

        let class_id = ClassId(state.allocate());
        let mut fields = Vec::with_capacity(class.fields.len());
        for field in class.fields {
            fields.push(FieldRecord {
                id: FieldId(state.allocate()),
                class_id,
                name: field.name,
                aetype: field.aetype,
                datatype: field.datatype,
                priority: field.priority,
                default_value: field.default_value,
                description: field.description,
            });
        }
        fields.sort_by_key(|f| f.priority);

        let record = ClassRecord {
            id: class_id,
            namespace_id: namespace.id,
            namespace: namespace.fqname,
            name: class.name,
            description: class.description,
            display_name: class.display_name,
            fields,
        };
        state.classes.insert(class_id, record.clone());
        snapshot.dirty = true;
        Ok(record)
    }

    async fn find_instance(
        &self,
        snapshot: &mut MemorySnapshot,
        class_id: ClassId,
        name: &str,
    ) -> Result<Option<InstanceRecord>, StorageError> {
        Ok(snapshot.state.instance_by_name(class_id, name).cloned())
    }

    async fn get_instance(
        &self,
        snapshot: &mut MemorySnapshot,
        instance_id: InstanceId,
    ) -> Result<InstanceRecord, StorageError> {
        snapshot
            .state
            .instances
            .get(&instance_id)
            .cloned()
            .ok_or(StorageError::InstanceNotFound { instance_id })
    }

    async fn create_instance(
        &self,
        snapshot: &mut MemorySnapshot,
        instance: NewInstance,
    ) -> Result<InstanceRecord, StorageError> {
        let state = &mut snapshot.state;
        let class = state
            .classes
            .get(&instance.class_id)
            .ok_or(StorageError::ClassNotFound {
                class_id: instance.class_id,
            })?;
        if state
            .instance_by_name(instance.class_id, &instance.name)
            .is_some()
        {
            return Err(StorageError::AlreadyExists {
                kind: "instance",
                name: format!("{}/{}", class.fqname(), instance.name),
            });
        }

        let now = now_rfc3339()?;
        let record = InstanceRecord {
            id: InstanceId(state.allocate()),
            class_id: instance.class_id,
            name: instance.name,
            description: instance.description,
            display_name: instance.display_name,
            inherits: instance.inherits,
            created_on: now.clone(),
            updated_on: now,
            updated_by: self.actor.clone(),
        };
        state.instances.insert(record.id, record.clone());
        snapshot.dirty = true;
        Ok(record)
    }

    async fn destroy_instance(
        &self,
        snapshot: &mut MemorySnapshot,
        instance_id: InstanceId,
    ) -> Result<(), StorageError> {
        let state = &mut snapshot.state;
        if state.instances.remove(&instance_id).is_none() {
            return Err(StorageError::InstanceNotFound { instance_id });
        }
        state.values.retain(|_, v| v.instance_id != instance_id);
        snapshot.dirty = true;
        Ok(())
    }

    async fn create_value(
        &self,
        snapshot: &mut MemorySnapshot,
        instance_id: InstanceId,
        value: NewValue,
    ) -> Result<ValueRecord, StorageError> {
        let state = &mut snapshot.state;
        let class_id = state
            .instances
            .get(&instance_id)
            .map(|i| i.class_id)
            .ok_or(StorageError::InstanceNotFound { instance_id })?;
        let owns_field = state
            .classes
            .get(&class_id)
            .is_some_and(|c| c.field_by_id(value.field_id).is_some());
        if !owns_field {
            return Err(StorageError::FieldNotFound {
                field_id: value.field_id,
                class_id,
            });
        }

        let now = now_rfc3339()?;
        let record = ValueRecord {
            id: ValueId(state.allocate()),
            instance_id,
            field_id: value.field_id,
            content: value.content,
            created_on: now.clone(),
            updated_on: now,
            updated_by: self.actor.clone(),
        };
        state.values.insert(record.id, record.clone());
        snapshot.dirty = true;
        Ok(record)
    }

    async fn list_values(
        &self,
        snapshot: &mut MemorySnapshot,
        instance_id: InstanceId,
    ) -> Result<Vec<ValueRecord>, StorageError> {
        Ok(snapshot.state.values_of(instance_id))
    }

    async fn lookup_class(&self, fqname: &str) -> Result<Option<ClassRecord>, StorageError> {
        Ok(self.lock()?.state.class_by_fqname(fqname).cloned())
    }

    async fn lookup_instance(
        &self,
        class_id: ClassId,
        name: &str,
    ) -> Result<Option<InstanceRecord>, StorageError> {
        Ok(self.lock()?.state.instance_by_name(class_id, name).cloned())
    }

    async fn lookup_values(
        &self,
        instance_id: InstanceId,
    ) -> Result<Vec<ValueRecord>, StorageError> {
        Ok(self.committed_state()?.values_of(instance_id))
    }
}
