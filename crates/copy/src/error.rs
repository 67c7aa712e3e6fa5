use automate_storage::{FieldId, StorageError};

use crate::schema::SchemaFlags;

/// Errors that can occur while copying instances.
///
/// Every variant aborts the enclosing snapshot; none is retried.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// The fully-qualified instance name could not be split into
    /// domain, namespace, class and instance.
    #[error("invalid instance path '{fqname}': {reason}")]
    InvalidPath { fqname: String, reason: String },

    /// The class implied by the source path does not exist.
    #[error("source class not found: {class_fqname}")]
    SourceNotFound { class_fqname: String },

    /// The named instance does not exist under the source class.
    #[error("source instance '{instance}' not found in {class_fqname}")]
    InstanceNotFound {
        instance: String,
        class_fqname: String,
    },

    /// The destination resolves to the source location.
    #[error("cannot copy instance {fqname} onto itself")]
    SelfCopy { fqname: String },

    /// The computed classification shares no flag with the accepted set.
    #[error(
        "instance cannot be copied, class schema mismatch between {source_class} and {dest_class} (computed {computed}, accepted {accepted})"
    )]
    SchemaMismatch {
        source_class: String,
        dest_class: String,
        computed: SchemaFlags,
        accepted: SchemaFlags,
    },

    /// A value's field has no same-named counterpart in the destination class
    /// and dropping it is not sanctioned.
    #[error("field '{field}' not found in target class {dest_class}")]
    FieldMismatch { field: String, dest_class: String },

    /// A value references a field its own class does not have. Signals
    /// corrupted data rather than a caller mistake.
    #[error("field id {field_id} not found in source class {source_class}")]
    FieldNotFound {
        field_id: FieldId,
        source_class: String,
    },

    /// The destination instance exists and overwrite was not requested.
    #[error("instance '{instance}' already exists in class {class_fqname}")]
    DuplicateTarget {
        instance: String,
        class_fqname: String,
    },

    /// A batch mixed source classes while uniform classes were required.
    #[error("batch source class mismatch: expected {expected}, found {found} (instance {instance})")]
    MixedSourceClasses {
        expected: String,
        found: String,
        instance: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
