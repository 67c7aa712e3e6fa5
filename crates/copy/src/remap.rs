//! Field remapping between a source class and a destination class.
//!
//! Values point at fields by identity, and identities are private to one
//! class. The source field is therefore resolved by identity, and its
//! destination counterpart by name.

use automate_storage::{ClassRecord, FieldId};
use serde::Serialize;

use crate::error::CopyError;
use crate::schema::SchemaFlags;

/// Outcome of remapping one value's field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldRemap {
    /// Re-create the value against this destination field.
    Mapped(FieldId),
    /// Omit the value; the destination has no field with this name.
    Drop { field: String },
}

/// Map `field_id` of `source` onto `dest`.
///
/// A missing destination field is dropped only when the caller accepts at
/// least one computed flag and the classification is not congruent;
/// otherwise it is a `FieldMismatch`.
pub fn remap_field(
    field_id: FieldId,
    source: &ClassRecord,
    dest: &ClassRecord,
    accepted: SchemaFlags,
    computed: SchemaFlags,
) -> Result<FieldRemap, CopyError> {
    let source_field = source
        .field_by_id(field_id)
        .ok_or_else(|| CopyError::FieldNotFound {
            field_id,
            source_class: source.fqname(),
        })?;

    if let Some(dest_field) = dest.field_by_name(&source_field.name) {
        return Ok(FieldRemap::Mapped(dest_field.id));
    }

    if accepted.intersects(computed) && !computed.is_congruent() {
        return Ok(FieldRemap::Drop {
            field: source_field.name.clone(),
        });
    }

    Err(CopyError::FieldMismatch {
        field: source_field.name.clone(),
        dest_class: dest.fqname(),
    })
}
