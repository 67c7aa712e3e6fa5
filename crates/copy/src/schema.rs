//! Class schema comparison.
//!
//! Compares the field sets of two classes by field name and classifies the
//! pair as congruent, compatible, or incompatible (no flag). The result is
//! only meaningful for the exact (source, destination) pair it was computed
//! for.

use std::fmt;
use std::ops::BitOr;

use automate_storage::{ClassRecord, FieldRecord};
use serde::{Deserialize, Serialize};

/// One level of schema compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaFlag {
    /// Field sets match exactly by name.
    Congruent,
    /// At least one field name is shared; fields may be added or missing.
    Compatible,
}

impl SchemaFlag {
    const ALL: [SchemaFlag; 2] = [SchemaFlag::Congruent, SchemaFlag::Compatible];

    const fn bit(self) -> u8 {
        match self {
            SchemaFlag::Congruent => 0b01,
            SchemaFlag::Compatible => 0b10,
        }
    }
}

impl fmt::Display for SchemaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaFlag::Congruent => write!(f, "congruent"),
            SchemaFlag::Compatible => write!(f, "compatible"),
        }
    }
}

/// A set of [`SchemaFlag`]s.
///
/// Used both for a computed classification and for the set of levels a
/// caller accepts. A copy is permitted when the two sets intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<SchemaFlag>", into = "Vec<SchemaFlag>")]
pub struct SchemaFlags(u8);

impl SchemaFlags {
    /// No flag: the incompatible classification.
    pub const EMPTY: SchemaFlags = SchemaFlags(0);
    pub const CONGRUENT: SchemaFlags = SchemaFlags(SchemaFlag::Congruent.bit());
    pub const COMPATIBLE: SchemaFlags = SchemaFlags(SchemaFlag::Compatible.bit());
    pub const ALL: SchemaFlags =
        SchemaFlags(SchemaFlag::Congruent.bit() | SchemaFlag::Compatible.bit());

    pub fn contains(self, flag: SchemaFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: SchemaFlag) {
        self.0 |= flag.bit();
    }

    pub fn intersection(self, other: SchemaFlags) -> SchemaFlags {
        SchemaFlags(self.0 & other.0)
    }

    /// True when at least one flag is in both sets.
    pub fn intersects(self, other: SchemaFlags) -> bool {
        !self.intersection(other).is_empty()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_congruent(self) -> bool {
        self.contains(SchemaFlag::Congruent)
    }

    pub fn iter(self) -> impl Iterator<Item = SchemaFlag> {
        SchemaFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<SchemaFlag> for SchemaFlags {
    fn from(flag: SchemaFlag) -> Self {
        SchemaFlags(flag.bit())
    }
}

impl FromIterator<SchemaFlag> for SchemaFlags {
    fn from_iter<I: IntoIterator<Item = SchemaFlag>>(iter: I) -> Self {
        let mut flags = SchemaFlags::EMPTY;
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl From<Vec<SchemaFlag>> for SchemaFlags {
    fn from(flags: Vec<SchemaFlag>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<SchemaFlags> for Vec<SchemaFlag> {
    fn from(flags: SchemaFlags) -> Self {
        flags.iter().collect()
    }
}

impl BitOr for SchemaFlags {
    type Output = SchemaFlags;

    fn bitor(self, rhs: SchemaFlags) -> SchemaFlags {
        SchemaFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for SchemaFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "incompatible");
        }
        let names: Vec<String> = self.iter().map(|flag| flag.to_string()).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// A same-named field whose type attributes differ between the two classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldConflict {
    pub name: String,
    pub source_aetype: String,
    pub dest_aetype: String,
    pub source_datatype: String,
    pub dest_datatype: String,
}

/// Detailed result of comparing two classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaComparison {
    pub source_class: String,
    pub dest_class: String,
    /// Field names present only in the source class.
    pub source_only: Vec<String>,
    /// Field names present only in the destination class.
    pub dest_only: Vec<String>,
    pub conflicts: Vec<FieldConflict>,
    pub flags: SchemaFlags,
}

impl SchemaComparison {
    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!(
            "{} -> {}: {}",
            self.source_class, self.dest_class, self.flags
        )];
        for name in &self.source_only {
            lines.push(format!("  - {}", name));
        }
        for name in &self.dest_only {
            lines.push(format!("  + {}", name));
        }
        for c in &self.conflicts {
            lines.push(format!(
                "  ~ {}: {}/{} -> {}/{}",
                c.name, c.source_aetype, c.source_datatype, c.dest_aetype, c.dest_datatype
            ));
        }
        lines.join("\n")
    }
}

fn same_type(a: &FieldRecord, b: &FieldRecord) -> bool {
    a.aetype.eq_ignore_ascii_case(&b.aetype) && a.datatype.eq_ignore_ascii_case(&b.datatype)
}

/// Compare two classes field by field.
///
/// Classification looks at field names only:
///
/// - A non-empty source sharing no field name with the destination → no flag.
/// - Identical name sets → `CONGRUENT | COMPATIBLE`.
/// - Otherwise → `COMPATIBLE`.
///
/// Same-named fields whose `aetype`/`datatype` differ are listed in
/// `conflicts` but do not affect the flags.
pub fn compare_classes(source: &ClassRecord, dest: &ClassRecord) -> SchemaComparison {
    let mut source_only = Vec::new();
    let mut conflicts = Vec::new();

    for field in &source.fields {
        match dest.field_by_name(&field.name) {
            None => source_only.push(field.name.clone()),
            Some(other) if !same_type(field, other) => conflicts.push(FieldConflict {
                name: field.name.clone(),
                source_aetype: field.aetype.clone(),
                dest_aetype: other.aetype.clone(),
                source_datatype: field.datatype.clone(),
                dest_datatype: other.datatype.clone(),
            }),
            Some(_) => {}
        }
    }

    let dest_only: Vec<String> = dest
        .fields
        .iter()
        .filter(|f| source.field_by_name(&f.name).is_none())
        .map(|f| f.name.clone())
        .collect();

    let shared = source.fields.len() - source_only.len();
    let flags = if shared == 0 && !source.fields.is_empty() {
        SchemaFlags::EMPTY
    } else if source_only.is_empty() && dest_only.is_empty() {
        SchemaFlags::CONGRUENT | SchemaFlags::COMPATIBLE
    } else {
        SchemaFlags::COMPATIBLE
    };

    SchemaComparison {
        source_class: source.fqname(),
        dest_class: dest.fqname(),
        source_only,
        dest_only,
        conflicts,
        flags,
    }
}

/// Classification only; see [`compare_classes`].
pub fn compare_fields(source: &ClassRecord, dest: &ClassRecord) -> SchemaFlags {
    compare_classes(source, dest).flags
}
