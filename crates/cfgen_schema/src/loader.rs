//! Declarative TOML schema reader.
//!
//! A schema document declares entries under `[entries]`. Each entry is
//! either a bare type name or a table with a `type` key:
//!
//! ```toml
//! [entries]
//! name = "string"
//!
//! [entries.count]
//! type = "int"
//! default = 0
//!
//! [entries.tags]
//! type = "list"
//! element = "string"
//!
//! [entries.inner]
//! type = "config"
//! entries.flag = { type = "bool", default = true }
//! ```
//!
//! Declaration order is preserved. Element declarations are read as full
//! entries and handed to the compiler unchecked, which decides whether the
//! element kind is supported.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::types::{Entry, ScalarType, Schema};
use crate::value::Value;

/// Reads and parses a schema file.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_schema_str(&content).map_err(|e| match e {
        SchemaError::Parse { reason } => SchemaError::Parse {
            reason: format!("{}: {reason}", path.display()),
        },
        other => other,
    })
}

/// Parses a schema document from a string.
pub fn parse_schema_str(content: &str) -> Result<Schema, SchemaError> {
    let doc: toml::Table = content.parse().map_err(|e: toml::de::Error| SchemaError::Parse {
        reason: e.to_string(),
    })?;
    match doc.get("entries") {
        None => Ok(Schema::new()),
        Some(toml::Value::Table(entries)) => parse_entries(entries, ""),
        Some(_) => Err(SchemaError::Parse {
            reason: "'entries' must be a table".to_string(),
        }),
    }
}

fn parse_entries(table: &toml::Table, prefix: &str) -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();
    for (key, decl) in table {
        let path = join_path(prefix, key);
        let entry = parse_entry(&path, decl)?;
        schema.insert(key.clone(), entry)?;
    }
    Ok(schema)
}

fn parse_entry(path: &str, decl: &toml::Value) -> Result<Entry, SchemaError> {
    let table = match decl {
        toml::Value::String(ty) => return entry_without_options(path, ty),
        toml::Value::Table(table) => table,
        other => {
            return Err(invalid(
                path,
                format!("expected a type name or table, found {}", other.type_str()),
            ))
        }
    };

    let ty = match table.get("type") {
        Some(toml::Value::String(ty)) => ty.as_str(),
        Some(_) => return Err(invalid(path, "'type' must be a string")),
        None => return Err(invalid(path, "missing 'type'")),
    };
    let default = table.get("default");

    match ty {
        "config" => {
            if default.is_some() {
                return Err(invalid(path, "config entries cannot have a default"));
            }
            match table.get("entries") {
                None => Ok(Entry::Nested(Schema::new())),
                Some(toml::Value::Table(entries)) => Ok(Entry::Nested(parse_entries(entries, path)?)),
                Some(_) => Err(invalid(path, "'entries' must be a table")),
            }
        }
        "list" | "map" => {
            let element = match table.get("element") {
                None => Entry::scalar(ScalarType::Mixed),
                Some(decl) => parse_entry(&format!("{path}[]"), decl)?,
            };
            let element_ty = match &element {
                Entry::Scalar { ty, .. } => Some(ty),
                _ => None,
            };
            if ty == "list" {
                let default = default
                    .map(|d| list_default(path, d, element_ty))
                    .transpose()?;
                Ok(Entry::List {
                    element: Box::new(element),
                    default,
                })
            } else {
                let default = default
                    .map(|d| map_default(path, d, element_ty))
                    .transpose()?;
                Ok(Entry::Map {
                    element: Box::new(element),
                    default,
                })
            }
        }
        _ => {
            let scalar = scalar_type(path, ty, table.get("class"))?;
            let default = match default {
                None => None,
                Some(_) if matches!(scalar, ScalarType::Object(_)) => {
                    return Err(invalid(path, "object entries cannot have a default"))
                }
                Some(d) => Some(typed(path, &scalar, toml_to_value(d))?),
            };
            Ok(Entry::Scalar { ty: scalar, default })
        }
    }
}

fn entry_without_options(path: &str, ty: &str) -> Result<Entry, SchemaError> {
    match ty {
        "config" => Ok(Entry::Nested(Schema::new())),
        "list" => Ok(Entry::list(ScalarType::Mixed)),
        "map" => Ok(Entry::map(ScalarType::Mixed)),
        _ => Ok(Entry::scalar(scalar_type(path, ty, None)?)),
    }
}

fn scalar_type(path: &str, ty: &str, class: Option<&toml::Value>) -> Result<ScalarType, SchemaError> {
    match ty {
        "string" => Ok(ScalarType::String),
        "int" => Ok(ScalarType::Int),
        "float" => Ok(ScalarType::Float),
        "bool" => Ok(ScalarType::Bool),
        "mixed" => Ok(ScalarType::Mixed),
        "object" => match class {
            Some(toml::Value::String(class)) if !class.is_empty() => {
                Ok(ScalarType::Object(class.clone()))
            }
            _ => Err(invalid(path, "object entries need a non-empty 'class'")),
        },
        other => Err(invalid(path, format!("unknown type '{other}'"))),
    }
}

fn list_default(
    path: &str,
    decl: &toml::Value,
    element: Option<&ScalarType>,
) -> Result<Vec<Value>, SchemaError> {
    let toml::Value::Array(items) = decl else {
        return Err(invalid(path, "list default must be an array"));
    };
    items
        .iter()
        .map(|item| typed_element(path, element, toml_to_value(item)))
        .collect()
}

fn map_default(
    path: &str,
    decl: &toml::Value,
    element: Option<&ScalarType>,
) -> Result<IndexMap<String, Value>, SchemaError> {
    let toml::Value::Table(items) = decl else {
        return Err(invalid(path, "map default must be a table"));
    };
    items
        .iter()
        .map(|(k, v)| Ok((k.clone(), typed_element(path, element, toml_to_value(v))?)))
        .collect()
}

fn typed_element(path: &str, element: Option<&ScalarType>, value: Value) -> Result<Value, SchemaError> {
    match element {
        Some(ty) => typed(path, ty, value),
        None => Ok(value),
    }
}

fn typed(path: &str, ty: &ScalarType, value: Value) -> Result<Value, SchemaError> {
    ty.coerce(value).map_err(|v| {
        invalid(
            path,
            format!("default of kind {} does not match type {}", v.kind_name(), ty.name()),
        )
    })
}

fn toml_to_value(v: &toml::Value) -> Value {
    match v {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_value(v)))
                .collect(),
        ),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidEntry {
        key: path.to_string(),
        reason: reason.into(),
    }
}
