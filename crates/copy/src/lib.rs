//! Instance copy engine for the automate datastore.
//!
//! Copies an instance, with its values, from one domain/namespace/name to
//! another while keeping the copied values valid against the destination
//! class. The destination class is created from the source class when it
//! does not exist yet. When it does exist, the two field sets are compared
//! ([`compare_fields`]) and the copy proceeds only if the computed
//! classification intersects the accepted one.
//!
//! Every copy, single or batch, runs in one [`AutomateStorage`] snapshot and
//! is committed only when all of its records were written.
//!
//! ```ignore
//! use automate_copy::{CopyRequest, InstanceCopier};
//! use automate_storage::MemoryStorage;
//!
//! let storage = MemoryStorage::new();
//! let copier = InstanceCopier::new(&storage);
//! let copied = copier
//!     .copy_instance(&CopyRequest::rename("DomainA/NS1/Approval/default", "backup").in_namespace("NS2"))
//!     .await?;
//! assert_eq!(copied.fqname, "DomainA/NS2/Approval/backup");
//! ```
//!
//! [`AutomateStorage`]: automate_storage::AutomateStorage

mod batch;
mod class_copy;
mod config;
mod error;
mod instance;
mod path;
mod remap;
mod resolve;
mod schema;

pub use batch::BatchTarget;
pub use class_copy::{ClassCopier, StorageClassCopier};
pub use config::{read_copy_config, ConfigError, CopyConfig};
pub use error::CopyError;
pub use instance::{CopiedInstance, CopyRequest, InstanceCopier};
pub use path::{namespace_fqname, CopyTarget, InstancePath, ResolvedTarget};
pub use remap::{remap_field, FieldRemap};
pub use resolve::{resolve_or_create_class, ResolvedClass};
pub use schema::{compare_classes, compare_fields, FieldConflict, SchemaComparison, SchemaFlag, SchemaFlags};
