//! Class-copy collaborator.
//!
//! Materializes a copy of a source class, fields included, at a target
//! domain/namespace. Only invoked when the destination class is absent.

use async_trait::async_trait;
use automate_storage::{AutomateStorage, ClassRecord, NewClass, NewField};

use crate::error::CopyError;
use crate::path::namespace_fqname;

/// Copies a class into another domain/namespace inside a caller's snapshot.
#[async_trait]
pub trait ClassCopier<S: AutomateStorage>: Send + Sync {
    /// Create a copy of `source` under `domain`/`namespace` (domain-relative)
    /// and return it with its new field identities.
    async fn copy_class(
        &self,
        storage: &S,
        snapshot: &mut S::Snapshot,
        source: &ClassRecord,
        domain: &str,
        namespace: &str,
    ) -> Result<ClassRecord, CopyError>;
}

/// Default [`ClassCopier`]: creates any missing namespace segments, then the
/// class with the source's descriptive attributes and every field re-created
/// in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageClassCopier;

#[async_trait]
impl<S: AutomateStorage> ClassCopier<S> for StorageClassCopier {
    async fn copy_class(
        &self,
        storage: &S,
        snapshot: &mut S::Snapshot,
        source: &ClassRecord,
        domain: &str,
        namespace: &str,
    ) -> Result<ClassRecord, CopyError> {
        let target_ns = storage
            .ensure_namespace(snapshot, &namespace_fqname(domain, namespace))
            .await?;

        let class = storage
            .create_class(
                snapshot,
                NewClass {
                    namespace: target_ns.fqname,
                    name: source.name.clone(),
                    description: source.description.clone(),
                    display_name: source.display_name.clone(),
                    fields: source.fields.iter().map(NewField::from).collect(),
                },
            )
            .await?;

        tracing::debug!(
            source = %source.fqname(),
            target = %class.fqname(),
            fields = class.fields.len(),
            "copied class"
        );
        Ok(class)
    }
}
