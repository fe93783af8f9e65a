//! Artifact specifications produced by the compiler.

use cfgen_schema::{ScalarType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One generated accessor class, corresponding to one nested schema node.
///
/// Specs are immutable once compiled. Regenerating a subject produces new
/// specs under the same canonical names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Globally unique name: `<namespace>::<name>`.
    pub canonical_name: String,
    /// Namespace the artifact lives in.
    pub namespace: String,
    /// Short name: the subject's short name plus `_n` for nested nodes.
    pub name: String,
    /// Pre-order nesting index; `0` for the subject's root.
    pub index: u32,
    /// Canonical name of the owning subject.
    pub subject: String,
    /// Canonical name of the enclosing artifact, if nested.
    pub parent: Option<String>,
    /// Entries in declaration order.
    pub entries: Vec<EntrySpec>,
}

impl ArtifactSpec {
    /// Looks up an entry by key.
    pub fn entry(&self, key: &str) -> Option<&EntrySpec> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Canonical names of the nested artifacts this one references, in
    /// declaration order.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| match &e.kind {
            EntryKind::Config { artifact } => Some(artifact.as_str()),
            _ => None,
        })
    }
}

/// One entry of an artifact and the accessors generated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySpec {
    /// The entry key as declared in the schema.
    pub key: String,
    /// What kind of storage the entry needs.
    pub kind: EntryKind,
    /// Generated accessors, in generation order.
    pub accessors: Vec<Accessor>,
}

/// Storage shape of a compiled entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A single value.
    Scalar {
        /// Value type.
        ty: ScalarType,
        /// Default value.
        default: Option<Value>,
    },
    /// An ordered sequence.
    List {
        /// Element type.
        element: ScalarType,
        /// Default sequence.
        default: Option<Vec<Value>>,
    },
    /// A string-keyed mapping.
    Map {
        /// Element type.
        element: ScalarType,
        /// Default mapping.
        default: Option<IndexMap<String, Value>>,
    },
    /// A nested configuration, read-only from the parent.
    Config {
        /// Canonical name of the nested artifact.
        artifact: String,
    },
}

impl EntryKind {
    /// The accessor operations generated for this kind.
    pub fn ops(&self) -> &'static [AccessorOp] {
        use AccessorOp::*;
        match self {
            EntryKind::Scalar { .. } => &[Get, Set, Isset, Unset],
            EntryKind::List { .. } => &[
                Get, Set, GetAt, SetAt, Clear, Push, Unshift, Pop, Shift, Isset, Unset,
            ],
            EntryKind::Map { .. } => &[Get, Set, GetAt, SetAt, RemoveAt, Clear, Isset, Unset],
            EntryKind::Config { .. } => &[Get, Set, Isset, Unset],
        }
    }

    /// Short kind name used in diagnostics and rendered comments.
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Scalar { .. } => "scalar",
            EntryKind::List { .. } => "list",
            EntryKind::Map { .. } => "map",
            EntryKind::Config { .. } => "config",
        }
    }
}

/// A generated accessor method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessor {
    /// Method name, e.g. `get_count` or `push_tags`.
    pub name: String,
    /// The operation the method performs.
    pub op: AccessorOp,
}

/// Operations an accessor can perform on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessorOp {
    /// Read the value (explicit, else default).
    Get,
    /// Replace the value.
    Set,
    /// Whether an explicit value is present.
    Isset,
    /// Drop the explicit value.
    Unset,
    /// Read one element by index or key.
    GetAt,
    /// Write one element by index or key.
    SetAt,
    /// Remove one element by key.
    RemoveAt,
    /// Drop all elements.
    Clear,
    /// Append an element.
    Push,
    /// Prepend an element.
    Unshift,
    /// Remove and return the last element.
    Pop,
    /// Remove and return the first element.
    Shift,
}

impl AccessorOp {
    /// Method name for this operation on the entry `key`.
    pub fn method_name(self, key: &str) -> String {
        let key = method_ident(key);
        match self {
            AccessorOp::Get => format!("get_{key}"),
            AccessorOp::Set => format!("set_{key}"),
            AccessorOp::Isset => format!("isset_{key}"),
            AccessorOp::Unset => format!("unset_{key}"),
            AccessorOp::GetAt => format!("get_{key}_at"),
            AccessorOp::SetAt => format!("set_{key}_at"),
            AccessorOp::RemoveAt => format!("remove_{key}_at"),
            AccessorOp::Clear => format!("clear_{key}"),
            AccessorOp::Push => format!("push_{key}"),
            AccessorOp::Unshift => format!("unshift_{key}"),
            AccessorOp::Pop => format!("pop_{key}"),
            AccessorOp::Shift => format!("shift_{key}"),
        }
    }
}

/// Lowercases a key and replaces everything that cannot appear in an
/// identifier with `_`.
fn method_ident(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
