//! Persistence contract for the automate datastore.
//!
//! Record types for namespaces, classes, fields, instances and values, the
//! [`AutomateStorage`] snapshot trait that copy operations run against, a
//! reference [`MemoryStorage`] backend, and a conformance suite any backend
//! can run.

pub mod conformance;
mod error;
mod memory;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemorySnapshot, MemoryStorage};
pub use record::{
    ClassId, ClassRecord, FieldId, FieldRecord, InstanceId, InstanceRecord, NamespaceId,
    NamespaceRecord, NewClass, NewField, NewInstance, NewValue, ValueContent, ValueId,
    ValueRecord,
};
pub use traits::AutomateStorage;
