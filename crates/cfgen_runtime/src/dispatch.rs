//! Per-kind accessor tables used for name-driven entry access.
//!
//! Each entry of a layout points at one of the static tables below; the
//! table's functions receive the instance and the entry's slot index.

use cfgen_compiler::EntryKind;
use cfgen_schema::{ScalarType, Value};
use indexmap::IndexMap;

use crate::error::InstanceError;
use crate::instance::{ConfigInstance, Field};

/// Accessor functions for one entry kind.
#[derive(Clone, Copy)]
pub(crate) struct EntryAccessors {
    /// Kind name for diagnostics.
    pub kind: &'static str,
    /// Reads the entry: its value, or the nested config.
    pub get: for<'a> fn(&'a mut ConfigInstance, usize) -> Option<Field<'a>>,
    /// Writes the entry after type checking.
    pub set: fn(&mut ConfigInstance, usize, Value) -> Result<(), InstanceError>,
    /// Whether the entry holds an explicit value.
    pub isset: fn(&ConfigInstance, usize) -> bool,
    /// Drops the explicit value.
    pub unset: fn(&mut ConfigInstance, usize),
}

impl std::fmt::Debug for EntryAccessors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryAccessors")
            .field("kind", &self.kind)
            .finish()
    }
}

pub(crate) static SCALAR: EntryAccessors = EntryAccessors {
    kind: "scalar",
    get: get_value,
    set: set_checked,
    isset: isset_value,
    unset: unset_value,
};

pub(crate) static LIST: EntryAccessors = EntryAccessors {
    kind: "list",
    get: get_value,
    set: set_collection,
    isset: isset_value,
    unset: unset_value,
};

pub(crate) static MAP: EntryAccessors = EntryAccessors {
    kind: "map",
    get: get_value,
    set: set_collection,
    isset: isset_value,
    unset: unset_value,
};

// Nested configs are owned by their parent: writes are accepted and ignored.
pub(crate) static CONFIG: EntryAccessors = EntryAccessors {
    kind: "config",
    get: get_config,
    set: |_, _, _| Ok(()),
    isset: |_, _| true,
    unset: |_, _| {},
};

pub(crate) fn for_kind(kind: &EntryKind) -> &'static EntryAccessors {
    match kind {
        EntryKind::Scalar { .. } => &SCALAR,
        EntryKind::List { .. } => &LIST,
        EntryKind::Map { .. } => &MAP,
        EntryKind::Config { .. } => &CONFIG,
    }
}

fn get_value(inst: &mut ConfigInstance, slot: usize) -> Option<Field<'_>> {
    let inst: &ConfigInstance = inst;
    inst.value_at(slot).map(Field::Value)
}

fn get_config(inst: &mut ConfigInstance, slot: usize) -> Option<Field<'_>> {
    inst.nested_at(slot).map(Field::Config)
}

fn isset_value(inst: &ConfigInstance, slot: usize) -> bool {
    inst.values[slot].is_some()
}

fn unset_value(inst: &mut ConfigInstance, slot: usize) {
    inst.values[slot] = None;
}

fn set_checked(inst: &mut ConfigInstance, slot: usize, value: Value) -> Result<(), InstanceError> {
    let value = check(inst, slot, value)?;
    inst.values[slot] = Some(value);
    Ok(())
}

/// Whole-collection writes replace the contents; an empty collection leaves
/// the entry unset.
fn set_collection(
    inst: &mut ConfigInstance,
    slot: usize,
    value: Value,
) -> Result<(), InstanceError> {
    let value = check(inst, slot, value)?;
    let empty = match &value {
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    };
    inst.values[slot] = (!empty).then_some(value);
    Ok(())
}

/// Type-checks a value against the entry in `slot`.
pub(crate) fn check(
    inst: &ConfigInstance,
    slot: usize,
    value: Value,
) -> Result<Value, InstanceError> {
    let layout = inst.layout();
    let key = layout.key_at(slot);
    match layout.kind_at(slot) {
        EntryKind::Scalar { ty, .. } => coerce(key, ty, value),
        EntryKind::List { element, .. } => match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| coerce(key, element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(mismatch(key, format!("list<{}>", element.name()), &other)),
        },
        EntryKind::Map { element, .. } => match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| coerce(key, element, v).map(|v| (k, v)))
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(Value::Map),
            other => Err(mismatch(key, format!("map<{}>", element.name()), &other)),
        },
        EntryKind::Config { .. } => Ok(value),
    }
}

/// Type-checks a single scalar or element value.
pub(crate) fn coerce(key: &str, ty: &ScalarType, value: Value) -> Result<Value, InstanceError> {
    ty.coerce(value)
        .map_err(|rejected| mismatch(key, ty.name().to_string(), &rejected))
}

fn mismatch(key: &str, expected: String, found: &Value) -> InstanceError {
    InstanceError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind_name(),
    }
}
