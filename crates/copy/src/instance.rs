//! Single-instance copy.
//!
//! Copies one instance, with its values, to another domain, namespace or
//! name inside one storage snapshot. Either the destination instance and all
//! of its values are committed, or nothing is.

use automate_storage::{
    AutomateStorage, ClassId, InstanceRecord, NewInstance, NewValue, ValueRecord,
};
use serde::Serialize;

use crate::class_copy::{ClassCopier, StorageClassCopier};
use crate::config::CopyConfig;
use crate::error::CopyError;
use crate::path::{CopyTarget, InstancePath};
use crate::remap::{remap_field, FieldRemap};
use crate::resolve::resolve_or_create_class;
use crate::schema::{compare_fields, SchemaFlags};

/// A request to copy one instance.
///
/// `validate_schema` and `accepted` fall back to the copier's [`CopyConfig`]
/// when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    /// Fully-qualified source instance name, `domain/ns.../class/instance`.
    pub source: String,
    pub target: CopyTarget,
    /// Replace an existing destination instance instead of failing.
    pub overwrite: bool,
    pub validate_schema: Option<bool>,
    pub accepted: Option<SchemaFlags>,
}

impl CopyRequest {
    fn new(source: String, target: CopyTarget) -> Self {
        Self {
            source,
            target,
            overwrite: false,
            validate_schema: None,
            accepted: None,
        }
    }

    /// Copy into `domain`, keeping the instance name and (unless overridden
    /// with [`in_namespace`](Self::in_namespace)) the namespace.
    pub fn to_domain(source: impl Into<String>, domain: impl Into<String>) -> Self {
        Self::new(
            source.into(),
            CopyTarget {
                domain: Some(domain.into()),
                namespace: None,
                name: None,
            },
        )
    }

    /// Copy under `new_name` in the source domain, keeping (unless
    /// overridden) the namespace.
    pub fn rename(source: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::new(
            source.into(),
            CopyTarget {
                domain: None,
                namespace: None,
                name: Some(new_name.into()),
            },
        )
    }

    /// Domain-relative target namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target.namespace = Some(namespace.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn validate_schema(mut self, validate: bool) -> Self {
        self.validate_schema = Some(validate);
        self
    }

    pub fn accepting(mut self, flags: SchemaFlags) -> Self {
        self.accepted = Some(flags);
        self
    }
}

/// How the schema classification for a copy is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchemaCheck {
    /// Compare the classes and refuse the copy if no accepted flag matches.
    Validate,
    /// Use a classification computed earlier for the same class pair.
    Reuse(SchemaFlags),
    /// No classification; missing destination fields are mismatches.
    Skip,
}

/// Result of a successful copy.
#[derive(Debug, Clone, Serialize)]
pub struct CopiedInstance {
    /// Fully-qualified name of the new instance.
    pub fqname: String,
    pub instance: InstanceRecord,
    pub values: Vec<ValueRecord>,
    /// Names of source fields whose values were omitted.
    pub dropped_fields: Vec<String>,
    /// Classification used for this copy, if one was computed or reused.
    pub schema: Option<SchemaFlags>,
    pub source_class: ClassId,
    /// True when the destination class was created by this copy.
    pub class_created: bool,
}

impl CopiedInstance {
    /// Serialize the copy report to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Copies instances through an [`AutomateStorage`] backend.
pub struct InstanceCopier<'a, S, C = StorageClassCopier> {
    pub(crate) storage: &'a S,
    pub(crate) class_copier: C,
    pub(crate) config: CopyConfig,
}

impl<'a, S: AutomateStorage> InstanceCopier<'a, S, StorageClassCopier> {
    pub fn new(storage: &'a S) -> Self {
        Self {
            storage,
            class_copier: StorageClassCopier,
            config: CopyConfig::default(),
        }
    }
}

impl<'a, S, C> InstanceCopier<'a, S, C>
where
    S: AutomateStorage,
    C: ClassCopier<S>,
{
    pub fn with_config(mut self, config: CopyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_class_copier<C2: ClassCopier<S>>(self, class_copier: C2) -> InstanceCopier<'a, S, C2> {
        InstanceCopier {
            storage: self.storage,
            class_copier,
            config: self.config,
        }
    }

    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    /// Copy one instance in its own snapshot.
    ///
    /// 1. Resolve the source class and instance
    /// 2. Refuse a copy onto the source location
    /// 3. Find or create the destination class
    /// 4. Validate the schema pair (if requested)
    /// 5. Fail on, or replace, an existing destination instance
    /// 6. Create the instance and its remapped values
    ///
    /// Any failure aborts the snapshot; the store is left unchanged.
    pub async fn copy_instance(&self, request: &CopyRequest) -> Result<CopiedInstance, CopyError> {
        let check = if request
            .validate_schema
            .unwrap_or(self.config.validate_schema)
        {
            SchemaCheck::Validate
        } else {
            SchemaCheck::Skip
        };

        let mut snapshot = self.storage.begin_snapshot().await?;
        let copied = match self.copy_within(&mut snapshot, request, check).await {
            Ok(copied) => copied,
            Err(e) => {
                let _ = self.storage.abort_snapshot(snapshot).await;
                return Err(e);
            }
        };
        self.storage.commit_snapshot(snapshot).await?;
        Ok(copied)
    }

    /// The copy steps of [`copy_instance`](Self::copy_instance), run inside a
    /// caller-owned snapshot. The caller commits or aborts.
    pub(crate) async fn copy_within(
        &self,
        snapshot: &mut S::Snapshot,
        request: &CopyRequest,
        check: SchemaCheck,
    ) -> Result<CopiedInstance, CopyError> {
        let path = InstancePath::parse(&request.source)?;
        let accepted = request.accepted.unwrap_or(self.config.accepted_flags);

        let class_fqname = path.class_fqname();
        let source_class = self
            .storage
            .find_class(snapshot, &class_fqname)
            .await?
            .ok_or_else(|| CopyError::SourceNotFound {
                class_fqname: class_fqname.clone(),
            })?;
        let source_instance = self
            .storage
            .find_instance(snapshot, source_class.id, &path.instance)
            .await?
            .ok_or_else(|| CopyError::InstanceNotFound {
                instance: path.instance.clone(),
                class_fqname: class_fqname.clone(),
            })?;

        if request.target.is_source(&path) {
            return Err(CopyError::SelfCopy {
                fqname: path.to_string(),
            });
        }
        let target = request.target.resolve(&path);

        let resolved = resolve_or_create_class(
            self.storage,
            snapshot,
            &self.class_copier,
            &source_class,
            &target.domain,
            &target.namespace,
        )
        .await?;
        let dest_class = resolved.class;

        let schema = match check {
            SchemaCheck::Validate => {
                let computed = compare_fields(&source_class, &dest_class);
                if !accepted.intersects(computed) {
                    return Err(CopyError::SchemaMismatch {
                        source_class: source_class.fqname(),
                        dest_class: dest_class.fqname(),
                        computed,
                        accepted,
                    });
                }
                Some(computed)
            }
            SchemaCheck::Reuse(flags) => Some(flags),
            SchemaCheck::Skip => None,
        };
        let computed = schema.unwrap_or(SchemaFlags::EMPTY);

        if let Some(existing) = self
            .storage
            .find_instance(snapshot, dest_class.id, &target.name)
            .await?
        {
            if !request.overwrite {
                return Err(CopyError::DuplicateTarget {
                    instance: existing.name,
                    class_fqname: dest_class.fqname(),
                });
            }
            self.storage.destroy_instance(snapshot, existing.id).await?;
            tracing::debug!(
                target_class = %dest_class.fqname(),
                instance = %existing.name,
                "overwriting existing instance"
            );
        }

        let instance = self
            .storage
            .create_instance(
                snapshot,
                NewInstance {
                    class_id: dest_class.id,
                    name: target.name.clone(),
                    description: source_instance.description.clone(),
                    display_name: source_instance.display_name.clone(),
                    inherits: source_instance.inherits.clone(),
                },
            )
            .await?;

        let source_values = self
            .storage
            .list_values(snapshot, source_instance.id)
            .await?;
        let mut values = Vec::with_capacity(source_values.len());
        let mut dropped_fields = Vec::new();
        for value in source_values {
            match remap_field(value.field_id, &source_class, &dest_class, accepted, computed)? {
                FieldRemap::Mapped(field_id) => {
                    let created = self
                        .storage
                        .create_value(
                            snapshot,
                            instance.id,
                            NewValue {
                                field_id,
                                content: value.content,
                            },
                        )
                        .await?;
                    values.push(created);
                }
                FieldRemap::Drop { field } => {
                    tracing::debug!(
                        field = %field,
                        target_class = %dest_class.fqname(),
                        "dropping value with no destination field"
                    );
                    dropped_fields.push(field);
                }
            }
        }

        let fqname = format!("{}/{}", dest_class.fqname(), instance.name);
        tracing::info!(
            source = %path,
            target = %fqname,
            values = values.len(),
            dropped = dropped_fields.len(),
            class_created = resolved.created,
            "copied instance"
        );

        Ok(CopiedInstance {
            fqname,
            instance,
            values,
            dropped_fields,
            schema,
            source_class: source_class.id,
            class_created: resolved.created,
        })
    }
}
