use crate::record::{ClassId, FieldId, InstanceId};

/// All errors that can be returned by an AutomateStorage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No namespace with the given fully-qualified name.
    #[error("namespace not found: {fqname}")]
    NamespaceNotFound { fqname: String },

    /// No class with the given identity.
    #[error("class not found: {class_id}")]
    ClassNotFound { class_id: ClassId },

    /// No instance with the given identity.
    #[error("instance not found: {instance_id}")]
    InstanceNotFound { instance_id: InstanceId },

    /// A value referenced a field that its instance's class does not own.
    #[error("field {field_id} does not belong to class {class_id}")]
    FieldNotFound { field_id: FieldId, class_id: ClassId },

    /// A record with this name already exists in its scope (a class in a
    /// namespace, an instance in a class).
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: &'static str, name: String },

    /// Another snapshot committed after this one began; the commit was refused
    /// and none of this snapshot's writes were applied.
    #[error("concurrent conflict: store changed since snapshot began (version {expected_version})")]
    ConcurrentConflict { expected_version: u64 },

    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
