//! Destination class resolution.

use automate_storage::{AutomateStorage, ClassRecord};

use crate::class_copy::ClassCopier;
use crate::error::CopyError;
use crate::path::namespace_fqname;

/// The destination class and whether this copy created it.
#[derive(Debug, Clone)]
pub struct ResolvedClass {
    pub class: ClassRecord,
    pub created: bool,
}

/// Find the class named like `source` under `domain`/`namespace`, or have
/// `copier` materialize it from `source`.
///
/// An existing class is returned as-is, even when its fields have diverged
/// from the source's.
pub async fn resolve_or_create_class<S, C>(
    storage: &S,
    snapshot: &mut S::Snapshot,
    copier: &C,
    source: &ClassRecord,
    domain: &str,
    namespace: &str,
) -> Result<ResolvedClass, CopyError>
where
    S: AutomateStorage,
    C: ClassCopier<S>,
{
    let fqname = format!("{}/{}", namespace_fqname(domain, namespace), source.name);
    if let Some(class) = storage.find_class(snapshot, &fqname).await? {
        return Ok(ResolvedClass {
            class,
            created: false,
        });
    }

    let class = copier
        .copy_class(storage, snapshot, source, domain, namespace)
        .await?;
    Ok(ResolvedClass {
        class,
        created: true,
    })
}
