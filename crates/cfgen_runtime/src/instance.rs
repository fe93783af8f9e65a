//! Runtime configuration instances.

use std::any::Any;
use std::sync::{Arc, Weak};

use cfgen_compiler::EntryKind;
use cfgen_schema::{ScalarType, Value};
use indexmap::IndexMap;

use crate::dispatch;
use crate::error::InstanceError;
use crate::layout::Layout;

/// What a name-driven read returns.
#[derive(Debug)]
pub enum Field<'a> {
    /// A value entry: its explicit value, else its default.
    Value(&'a Value),
    /// A nested configuration, created on first access.
    Config(&'a mut ConfigInstance),
}

impl<'a> Field<'a> {
    /// The value, if this is a value entry.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Value(v) => Some(v),
            Field::Config(_) => None,
        }
    }

    /// The nested configuration, if this is a config entry.
    pub fn into_config(self) -> Option<&'a mut ConfigInstance> {
        match self {
            Field::Config(c) => Some(c),
            Field::Value(_) => None,
        }
    }
}

/// A configuration store shaped by a [`Layout`].
///
/// Each entry holds an optional explicit value; reads fall back to the
/// entry's default. Nested configurations are created lazily, share this
/// instance's owner and record the key trail leading to them. They cannot
/// be replaced or unset through their parent.
#[derive(Debug)]
pub struct ConfigInstance {
    layout: Arc<Layout>,
    owner: Option<Weak<dyn Any + Send + Sync>>,
    /// Keys from the root configuration down to this one.
    path: Vec<String>,
    pub(crate) values: Vec<Option<Value>>,
    nested: Vec<Option<Box<ConfigInstance>>>,
}

impl ConfigInstance {
    /// Creates a root instance without an owner.
    pub fn new(layout: Arc<Layout>) -> Self {
        Self::with_parts(layout, None, Vec::new())
    }

    /// Creates a root instance owned by `owner`.
    ///
    /// The instance holds a non-owning handle; [`owner`](Self::owner)
    /// returns `None` once the owner is dropped.
    pub fn owned_by<T: Any + Send + Sync>(layout: Arc<Layout>, owner: &Arc<T>) -> Self {
        let weak: Weak<dyn Any + Send + Sync> = Arc::downgrade(owner) as Weak<dyn Any + Send + Sync>;
        Self::with_parts(layout, Some(weak), Vec::new())
    }

    fn with_parts(
        layout: Arc<Layout>,
        owner: Option<Weak<dyn Any + Send + Sync>>,
        path: Vec<String>,
    ) -> Self {
        let len = layout.len();
        Self {
            layout,
            owner,
            path,
            values: vec![None; len],
            nested: (0..len).map(|_| None).collect(),
        }
    }

    /// The layout this instance was created from.
    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Canonical name of the instance's artifact.
    pub fn canonical_name(&self) -> &str {
        self.layout.canonical_name()
    }

    /// Key under which this instance hangs in its parent; `None` for roots.
    pub fn key(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// Keys from the root configuration down to this one.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The owner, if one was given and it is still alive.
    pub fn owner<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.owner.as_ref()?.upgrade()?.downcast::<T>().ok()
    }

    /// Whether `key` is a declared entry, regardless of its value.
    pub fn exists(&self, key: &str) -> bool {
        self.layout.slot(key).is_some()
    }

    /// Requires `key` to be declared and to have a value or a default.
    ///
    /// Nested configurations always satisfy the requirement.
    pub fn depend(&self, key: &str) -> Result<&Self, InstanceError> {
        let satisfied = match self.layout.slot(key) {
            Some(slot) => {
                matches!(self.layout.kind_at(slot), EntryKind::Config { .. })
                    || self.value_at(slot).is_some()
            }
            None => false,
        };
        if satisfied {
            Ok(self)
        } else {
            let mut trail = self.path.clone();
            trail.push(key.to_string());
            Err(InstanceError::MissingConfigEntry {
                key: key.to_string(),
                trail,
            })
        }
    }

    /// Reads an entry by name. Unknown keys read as `None`.
    pub fn get(&mut self, key: &str) -> Option<Field<'_>> {
        let (slot, accessors) = self.layout.accessors(key)?;
        (accessors.get)(self, slot)
    }

    /// Reads a value entry: its explicit value, else its default.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.layout.slot(key).and_then(|slot| self.value_at(slot))
    }

    /// The nested configuration under `key`, created on first access.
    pub fn config(&mut self, key: &str) -> Option<&mut ConfigInstance> {
        let slot = self.layout.slot(key)?;
        self.nested_at(slot)
    }

    /// Writes an entry by name.
    ///
    /// The value is type-checked against the entry (ints widen into float
    /// slots). Writes to unknown keys and to nested configurations are
    /// ignored.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self, InstanceError> {
        if let Some((slot, accessors)) = self.layout.accessors(key) {
            (accessors.set)(self, slot, value.into())?;
        }
        Ok(self)
    }

    /// Whether an entry holds an explicit value. Nested configurations
    /// always report `true`; unknown keys report `false`.
    pub fn isset(&self, key: &str) -> bool {
        self.layout
            .accessors(key)
            .is_some_and(|(slot, accessors)| (accessors.isset)(self, slot))
    }

    /// Drops an entry's explicit value so reads fall back to the default.
    pub fn unset(&mut self, key: &str) -> &mut Self {
        if let Some((slot, accessors)) = self.layout.accessors(key) {
            (accessors.unset)(self, slot);
        }
        self
    }

    /// Drops all elements of a list or map entry.
    pub fn clear(&mut self, key: &str) -> Result<&mut Self, InstanceError> {
        if let Some(slot) = self.collection_slot(key, "clear", |k| {
            matches!(k, EntryKind::List { .. } | EntryKind::Map { .. })
        })? {
            self.values[slot] = None;
        }
        Ok(self)
    }

    /// Reads one element of a list's explicit value.
    pub fn get_at(&self, key: &str, index: usize) -> Option<&Value> {
        let slot = self.list_slot(key, "get_at").ok()??;
        match &self.values[slot] {
            Some(Value::List(items)) => items.get(index),
            _ => None,
        }
    }

    /// Writes one element of a list.
    ///
    /// `index == len` appends. The write is ignored when `index` is
    /// negative, past the end, or non-zero on an unset or empty list.
    pub fn set_at(
        &mut self,
        key: &str,
        index: i64,
        value: impl Into<Value>,
    ) -> Result<&mut Self, InstanceError> {
        let Some((slot, element)) = self.list_element(key, "set_at")? else {
            return Ok(self);
        };
        let len = match &self.values[slot] {
            Some(Value::List(items)) => items.len(),
            _ => 0,
        };
        let Ok(index) = usize::try_from(index) else {
            return Ok(self);
        };
        if index > len {
            return Ok(self);
        }
        let value = dispatch::coerce(self.layout.key_at(slot), &element, value.into())?;
        self.with_list(slot, |items| {
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
        });
        Ok(self)
    }

    /// Appends to a list. An unset list starts empty, not from its default.
    pub fn push(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self, InstanceError> {
        if let Some((slot, element)) = self.list_element(key, "push")? {
            let value = dispatch::coerce(self.layout.key_at(slot), &element, value.into())?;
            self.with_list(slot, |items| items.push(value));
        }
        Ok(self)
    }

    /// Prepends to a list. An unset list starts empty, not from its default.
    pub fn unshift(
        &mut self,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, InstanceError> {
        if let Some((slot, element)) = self.list_element(key, "unshift")? {
            let value = dispatch::coerce(self.layout.key_at(slot), &element, value.into())?;
            self.with_list(slot, |items| items.insert(0, value));
        }
        Ok(self)
    }

    /// Removes and returns the last element; `None` on an unset list.
    pub fn pop(&mut self, key: &str) -> Option<Value> {
        let slot = self.list_slot(key, "pop").ok()??;
        match &mut self.values[slot] {
            Some(Value::List(items)) => items.pop(),
            _ => None,
        }
    }

    /// Removes and returns the first element; `None` on an unset list.
    pub fn shift(&mut self, key: &str) -> Option<Value> {
        let slot = self.list_slot(key, "shift").ok()??;
        match &mut self.values[slot] {
            Some(Value::List(items)) if !items.is_empty() => Some(items.remove(0)),
            _ => None,
        }
    }

    /// Reads one element of a map's explicit value.
    pub fn get_key(&self, key: &str, name: &str) -> Option<&Value> {
        let slot = self.map_slot(key, "get_key").ok()??;
        match &self.values[slot] {
            Some(Value::Map(map)) => map.get(name),
            _ => None,
        }
    }

    /// Writes one element of a map, creating the map if unset.
    pub fn set_key(
        &mut self,
        key: &str,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, InstanceError> {
        let Some(slot) = self.map_slot(key, "set_key")? else {
            return Ok(self);
        };
        let element = match self.layout.kind_at(slot) {
            EntryKind::Map { element, .. } => element.clone(),
            _ => ScalarType::Mixed,
        };
        let value = dispatch::coerce(self.layout.key_at(slot), &element, value.into())?;
        match &mut self.values[slot] {
            Some(Value::Map(map)) => {
                map.insert(name.into(), value);
            }
            stored => *stored = Some(Value::Map(IndexMap::from([(name.into(), value)]))),
        }
        Ok(self)
    }

    /// Removes and returns one element of a map.
    pub fn remove_key(&mut self, key: &str, name: &str) -> Option<Value> {
        let slot = self.map_slot(key, "remove_key").ok()??;
        match &mut self.values[slot] {
            Some(Value::Map(map)) => map.shift_remove(name),
            _ => None,
        }
    }

    /// Current values as JSON: explicit values, else defaults, else `null`.
    /// Nested configurations are included whether or not they were touched.
    pub fn snapshot(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (slot, key) in self.layout.keys().enumerate() {
            let value = match (&self.nested[slot], self.layout.child_at(slot)) {
                (Some(child), _) => child.snapshot(),
                (None, Some(layout)) => ConfigInstance::new(Arc::clone(layout)).snapshot(),
                (None, None) => self
                    .value_at(slot)
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null),
            };
            out.insert(key.to_string(), value);
        }
        serde_json::Value::Object(out)
    }

    pub(crate) fn value_at(&self, slot: usize) -> Option<&Value> {
        self.values[slot]
            .as_ref()
            .or_else(|| self.layout.default_at(slot))
    }

    pub(crate) fn nested_at(&mut self, slot: usize) -> Option<&mut ConfigInstance> {
        if self.nested[slot].is_none() {
            let layout = Arc::clone(self.layout.child_at(slot)?);
            let mut path = self.path.clone();
            path.push(self.layout.key_at(slot).to_string());
            tracing::trace!(artifact = layout.canonical_name(), path = %path.join("."), "creating nested config");
            self.nested[slot] = Some(Box::new(Self::with_parts(layout, self.owner.clone(), path)));
        }
        self.nested[slot].as_deref_mut()
    }

    /// Resolves a collection operation's slot: `Ok(None)` for unknown keys,
    /// an error when the entry is of another kind.
    fn collection_slot(
        &self,
        key: &str,
        op: &'static str,
        accepts: impl Fn(&EntryKind) -> bool,
    ) -> Result<Option<usize>, InstanceError> {
        let Some(slot) = self.layout.slot(key) else {
            return Ok(None);
        };
        let kind = self.layout.kind_at(slot);
        if accepts(kind) {
            Ok(Some(slot))
        } else {
            Err(InstanceError::UnsupportedOperation {
                key: key.to_string(),
                op,
                kind: kind.name(),
            })
        }
    }

    fn list_slot(&self, key: &str, op: &'static str) -> Result<Option<usize>, InstanceError> {
        self.collection_slot(key, op, |k| matches!(k, EntryKind::List { .. }))
    }

    fn map_slot(&self, key: &str, op: &'static str) -> Result<Option<usize>, InstanceError> {
        self.collection_slot(key, op, |k| matches!(k, EntryKind::Map { .. }))
    }

    fn list_element(
        &self,
        key: &str,
        op: &'static str,
    ) -> Result<Option<(usize, ScalarType)>, InstanceError> {
        Ok(self.list_slot(key, op)?.map(|slot| {
            let element = match self.layout.kind_at(slot) {
                EntryKind::List { element, .. } => element.clone(),
                _ => ScalarType::Mixed,
            };
            (slot, element)
        }))
    }

    /// Runs `f` on the explicit list in `slot`, starting from an empty list
    /// when unset.
    fn with_list<R>(&mut self, slot: usize, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        let mut items = match self.values[slot].take() {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        };
        let result = f(&mut items);
        self.values[slot] = Some(Value::List(items));
        result
    }
}
