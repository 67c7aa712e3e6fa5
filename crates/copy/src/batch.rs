//! Batch copy.
//!
//! Copies several instances inside one snapshot. The first instance's schema
//! classification is computed once and reused for the rest of the batch.

use automate_storage::{AutomateStorage, ClassId, InstanceId};

use crate::class_copy::ClassCopier;
use crate::error::CopyError;
use crate::instance::{CopyRequest, InstanceCopier, SchemaCheck};
use crate::path::CopyTarget;

/// Destination of a batch copy. Instance names are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTarget {
    pub domain: String,
    /// Domain-relative namespace; `None` keeps each source namespace.
    pub namespace: Option<String>,
}

impl BatchTarget {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            namespace: None,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl<'a, S, C> InstanceCopier<'a, S, C>
where
    S: AutomateStorage,
    C: ClassCopier<S>,
{
    /// Copy every instance in `ids` to `target` as one atomic unit.
    ///
    /// Returns the new instance identities in input order. On any failure the
    /// snapshot is aborted, nothing is written, and the error propagates.
    pub async fn copy_many(
        &self,
        ids: &[InstanceId],
        target: &BatchTarget,
        overwrite: bool,
    ) -> Result<Vec<InstanceId>, CopyError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut snapshot = self.storage.begin_snapshot().await?;
        let copied = match self.copy_many_within(&mut snapshot, ids, target, overwrite).await {
            Ok(copied) => copied,
            Err(e) => {
                tracing::warn!(
                    batch_size = ids.len(),
                    error = %e,
                    "batch copy aborted"
                );
                let _ = self.storage.abort_snapshot(snapshot).await;
                return Err(e);
            }
        };
        self.storage.commit_snapshot(snapshot).await?;

        tracing::info!(
            count = copied.len(),
            domain = %target.domain,
            "batch copy committed"
        );
        Ok(copied)
    }

    async fn copy_many_within(
        &self,
        snapshot: &mut S::Snapshot,
        ids: &[InstanceId],
        target: &BatchTarget,
        overwrite: bool,
    ) -> Result<Vec<InstanceId>, CopyError> {
        let mut check = if self.config.validate_schema {
            SchemaCheck::Validate
        } else {
            SchemaCheck::Skip
        };
        let mut first_class: Option<(ClassId, String)> = None;
        let mut new_ids = Vec::with_capacity(ids.len());

        for &id in ids {
            let instance = self.storage.get_instance(snapshot, id).await?;
            let class = self.storage.get_class(snapshot, instance.class_id).await?;
            let source = format!("{}/{}", class.fqname(), instance.name);

            let (first_id, first_fqname) =
                first_class.get_or_insert_with(|| (class.id, class.fqname()));
            if *first_id != class.id {
                if self.config.require_uniform_batch_class {
                    return Err(CopyError::MixedSourceClasses {
                        expected: first_fqname.clone(),
                        found: class.fqname(),
                        instance: source,
                    });
                }
                tracing::warn!(
                    expected = %first_fqname,
                    found = %class.fqname(),
                    instance = %source,
                    "batch mixes source classes, reusing first schema classification"
                );
            }

            let request = CopyRequest {
                source,
                target: CopyTarget {
                    domain: Some(target.domain.clone()),
                    namespace: target.namespace.clone(),
                    name: None,
                },
                overwrite,
                validate_schema: None,
                accepted: None,
            };
            let copied = self.copy_within(snapshot, &request, check).await?;
            if let (SchemaCheck::Validate, Some(flags)) = (check, copied.schema) {
                check = SchemaCheck::Reuse(flags);
            }
            new_ids.push(copied.instance.id);
        }

        Ok(new_ids)
    }
}
