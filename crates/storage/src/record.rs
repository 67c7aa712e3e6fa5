use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Storage-assigned identity of a namespace.
    NamespaceId
);
record_id!(
    /// Storage-assigned identity of a class.
    ClassId
);
record_id!(
    /// Storage-assigned identity of a field. Only meaningful within the
    /// class that owns it; use the field name to match across classes.
    FieldId
);
record_id!(
    /// Storage-assigned identity of an instance.
    InstanceId
);
record_id!(
    /// Storage-assigned identity of a value.
    ValueId
);

/// A node in the namespace tree. The first segment of `fqname` is the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub id: NamespaceId,
    pub parent_id: Option<NamespaceId>,
    /// Slash-delimited path, e.g. `"DomainA/NS1/Sub"`.
    pub fqname: String,
    pub name: String,
}

impl NamespaceRecord {
    pub fn domain(&self) -> &str {
        domain_of(&self.fqname)
    }
}

/// A field definition owned by exactly one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub id: FieldId,
    pub class_id: ClassId,
    pub name: String,
    /// Field role, e.g. `"attribute"`, `"method"`, `"relationship"`.
    pub aetype: String,
    /// Stored value type, e.g. `"string"`, `"boolean"`, `"integer"`.
    pub datatype: String,
    pub priority: i32,
    pub default_value: Option<String>,
    pub description: Option<String>,
}

/// A class with its fields loaded, ordered by `priority`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: ClassId,
    pub namespace_id: NamespaceId,
    /// Fully-qualified name of the owning namespace.
    pub namespace: String,
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub fields: Vec<FieldRecord>,
}

impl ClassRecord {
    pub fn fqname(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    pub fn domain(&self) -> &str {
        domain_of(&self.namespace)
    }

    pub fn field_by_id(&self, id: FieldId) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Field names are unique within a class; the comparison is case-insensitive.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// A named configuration record attached to a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: InstanceId,
    pub class_id: ClassId,
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    /// Fully-qualified name of the instance this one inherits from.
    pub inherits: Option<String>,
    /// RFC 3339 timestamp string.
    pub created_on: String,
    /// RFC 3339 timestamp string.
    pub updated_on: String,
    pub updated_by: Option<String>,
}

/// The carried-over payload of a value. Everything here survives a copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueContent {
    pub value: Option<String>,
    pub display_name: Option<String>,
    pub collect: Option<String>,
    pub on_entry: Option<String>,
    pub on_exit: Option<String>,
    pub on_error: Option<String>,
    pub max_retries: Option<String>,
    pub max_time: Option<String>,
}

impl ValueContent {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

/// A stored value of one field on one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub id: ValueId,
    pub instance_id: InstanceId,
    pub field_id: FieldId,
    pub content: ValueContent,
    /// RFC 3339 timestamp string.
    pub created_on: String,
    /// RFC 3339 timestamp string.
    pub updated_on: String,
    pub updated_by: Option<String>,
}

// ── Inputs for record creation ───────────────────────────────────────────────
//
// These carry only caller-controlled attributes. Identity, timestamps and
// authorship are assigned by the backend.

/// Field definition for [`NewClass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    pub aetype: String,
    pub datatype: String,
    pub priority: i32,
    pub default_value: Option<String>,
    pub description: Option<String>,
}

impl From<&FieldRecord> for NewField {
    fn from(field: &FieldRecord) -> Self {
        Self {
            name: field.name.clone(),
            aetype: field.aetype.clone(),
            datatype: field.datatype.clone(),
            priority: field.priority,
            default_value: field.default_value.clone(),
            description: field.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClass {
    /// Fully-qualified name of an existing namespace.
    pub namespace: String,
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub fields: Vec<NewField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstance {
    pub class_id: ClassId,
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub inherits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewValue {
    pub field_id: FieldId,
    pub content: ValueContent,
}

fn domain_of(fqname: &str) -> &str {
    fqname.split('/').next().unwrap_or(fqname)
}
