//! Schema tree types: entries, scalar types and nested schemas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::value::Value;

/// The base type of a scalar entry or of a list/map element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// UTF-8 string.
    String,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float. Integers are widened on write.
    Float,
    /// Boolean.
    Bool,
    /// Reference to an external object type, by canonical class name.
    Object(String),
    /// Untyped; accepts any value.
    Mixed,
}

impl ScalarType {
    /// Type name as written in schema declarations and generated code.
    pub fn name(&self) -> &str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
            ScalarType::Object(class) => class,
            ScalarType::Mixed => "mixed",
        }
    }

    /// Checks a value against this type, widening where allowed.
    ///
    /// Returns the (possibly converted) value, or gives the value back
    /// unchanged in `Err` when it does not fit.
    pub fn coerce(&self, value: Value) -> Result<Value, Value> {
        match (self, value) {
            (ScalarType::Mixed, v) => Ok(v),
            (ScalarType::String, v @ Value::String(_)) => Ok(v),
            (ScalarType::Int, v @ Value::Int(_)) => Ok(v),
            (ScalarType::Float, v @ Value::Float(_)) => Ok(v),
            (ScalarType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (ScalarType::Bool, v @ Value::Bool(_)) => Ok(v),
            (ScalarType::Object(class), Value::Object(obj))
                if class_matches(class, &obj.class) =>
            {
                Ok(Value::Object(obj))
            }
            (_, v) => Err(v),
        }
    }
}

fn class_matches(declared: &str, actual: &str) -> bool {
    declared.trim_start_matches("::") == actual.trim_start_matches("::")
}

/// One named field in a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A single typed value with an optional default.
    Scalar {
        /// Value type.
        ty: ScalarType,
        /// Value returned when nothing was set explicitly.
        default: Option<Value>,
    },
    /// An ordered sequence of elements.
    List {
        /// Element declaration. Only a scalar is compilable; its default is ignored.
        element: Box<Entry>,
        /// Sequence returned when nothing was set explicitly.
        default: Option<Vec<Value>>,
    },
    /// A string-keyed mapping of elements.
    Map {
        /// Element declaration. Only a scalar is compilable; its default is ignored.
        element: Box<Entry>,
        /// Mapping returned when nothing was set explicitly.
        default: Option<IndexMap<String, Value>>,
    },
    /// A nested sub-schema.
    Nested(Schema),
}

impl Entry {
    /// A scalar entry without a default.
    pub fn scalar(ty: ScalarType) -> Self {
        Entry::Scalar { ty, default: None }
    }

    /// A scalar entry with a default value.
    pub fn scalar_with_default(ty: ScalarType, default: impl Into<Value>) -> Self {
        Entry::Scalar {
            ty,
            default: Some(default.into()),
        }
    }

    /// A list of scalar elements without a default.
    pub fn list(element: ScalarType) -> Self {
        Entry::List {
            element: Box::new(Entry::scalar(element)),
            default: None,
        }
    }

    /// A map of scalar elements without a default.
    pub fn map(element: ScalarType) -> Self {
        Entry::Map {
            element: Box::new(Entry::scalar(element)),
            default: None,
        }
    }

    /// A nested sub-schema entry.
    pub fn nested(schema: Schema) -> Self {
        Entry::Nested(schema)
    }

    /// Attaches a default to a list or map entry; other kinds are returned
    /// unchanged.
    pub fn with_default(self, default: impl Into<Value>) -> Self {
        match (self, default.into()) {
            (Entry::Scalar { ty, .. }, value) => Entry::Scalar {
                ty,
                default: Some(value),
            },
            (Entry::List { element, .. }, Value::List(items)) => Entry::List {
                element,
                default: Some(items),
            },
            (Entry::Map { element, .. }, Value::Map(map)) => Entry::Map {
                element,
                default: Some(map),
            },
            (other, _) => other,
        }
    }

    /// Short variant name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entry::Scalar { .. } => "scalar",
            Entry::List { .. } => "list",
            Entry::Map { .. } => "map",
            Entry::Nested(_) => "config",
        }
    }

    /// Element declaration of a list or map entry.
    pub fn element(&self) -> Option<&Entry> {
        match self {
            Entry::List { element, .. } | Entry::Map { element, .. } => Some(element),
            _ => None,
        }
    }

    /// The nested schema, if this is a nested entry.
    pub fn as_nested(&self) -> Option<&Schema> {
        match self {
            Entry::Nested(schema) => Some(schema),
            _ => None,
        }
    }
}

/// A nested node of the schema tree: an ordered mapping of unique keys to
/// entries. A subject's root schema is itself a `Schema`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    entries: IndexMap<String, Entry>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder style.
    ///
    /// A repeated key replaces the earlier entry in place; use
    /// [`insert`](Self::insert) to reject duplicates instead.
    pub fn with(mut self, key: impl Into<String>, entry: Entry) -> Self {
        self.entries.insert(key.into(), entry);
        self
    }

    /// Appends an entry, rejecting a key that is already declared.
    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) -> Result<(), SchemaError> {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(SchemaError::DuplicateKey { key });
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Iterates entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if this level declares no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ObjectValue;

    #[test]
    fn entries_keep_declaration_order() {
        let schema = Schema::new()
            .with("zeta", Entry::scalar(ScalarType::Int))
            .with("alpha", Entry::scalar(ScalarType::String))
            .with("mid", Entry::nested(Schema::new()));
        let keys: Vec<&str> = schema.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut schema = Schema::new();
        schema.insert("a", Entry::scalar(ScalarType::Int)).unwrap();
        let err = schema.insert("a", Entry::scalar(ScalarType::Bool)).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateKey { ref key } if key == "a"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn coerce_widens_int_to_float() {
        assert_eq!(ScalarType::Float.coerce(Value::Int(2)), Ok(Value::Float(2.0)));
        assert_eq!(ScalarType::Int.coerce(Value::Float(2.0)), Err(Value::Float(2.0)));
    }

    #[test]
    fn coerce_objects_by_class() {
        let ty = ScalarType::Object("::chrono::NaiveDate".to_string());
        let ok = Value::Object(ObjectValue::new("chrono::NaiveDate"));
        let wrong = Value::Object(ObjectValue::new("std::time::Instant"));
        assert!(ty.coerce(ok).is_ok());
        assert!(ty.coerce(wrong).is_err());
    }

    #[test]
    fn mixed_accepts_anything() {
        assert!(ScalarType::Mixed.coerce(Value::List(vec![])).is_ok());
        assert!(ScalarType::Mixed.coerce(Value::Bool(false)).is_ok());
    }

    #[test]
    fn with_default_on_list_and_map() {
        let list = Entry::list(ScalarType::String).with_default(vec![Value::from("a")]);
        assert!(matches!(list, Entry::List { default: Some(ref d), .. } if d.len() == 1));

        let mut defaults = IndexMap::new();
        defaults.insert("k".to_string(), Value::from(1));
        let map = Entry::map(ScalarType::Int).with_default(defaults);
        assert!(matches!(map, Entry::Map { default: Some(ref d), .. } if d["k"] == Value::Int(1)));
    }

    #[test]
    fn element_and_kind() {
        let list = Entry::list(ScalarType::Bool);
        assert_eq!(list.kind_name(), "list");
        assert_eq!(list.element(), Some(&Entry::scalar(ScalarType::Bool)));
        assert!(Entry::scalar(ScalarType::Int).element().is_none());
        assert!(Entry::nested(Schema::new()).as_nested().is_some());
    }
}
