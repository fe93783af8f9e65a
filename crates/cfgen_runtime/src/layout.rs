//! Linked artifact layouts.

use std::collections::HashMap;
use std::sync::Arc;

use cfgen_compiler::{ArtifactSpec, EntryKind};
use cfgen_schema::Value;

use crate::dispatch::{self, EntryAccessors};
use crate::error::InstanceError;

/// An artifact spec linked with its nested layouts and dispatch table.
///
/// Layouts are immutable and shared between instances through `Arc`.
#[derive(Debug)]
pub struct Layout {
    spec: ArtifactSpec,
    /// Per slot: default value, with list/map defaults already wrapped.
    defaults: Vec<Option<Value>>,
    /// Per slot: the nested layout for config entries.
    children: Vec<Option<Arc<Layout>>>,
    dispatch: HashMap<String, (usize, &'static EntryAccessors)>,
}

impl Layout {
    /// Links a spec against already linked layouts, keyed by canonical name.
    ///
    /// Every nested artifact `spec` references must be present in `linked`.
    pub fn new(
        spec: ArtifactSpec,
        linked: &HashMap<String, Arc<Layout>>,
    ) -> Result<Self, InstanceError> {
        let mut defaults = Vec::with_capacity(spec.entries.len());
        let mut children = Vec::with_capacity(spec.entries.len());
        let mut dispatch = HashMap::with_capacity(spec.entries.len());

        for (slot, entry) in spec.entries.iter().enumerate() {
            let (default, child) = match &entry.kind {
                EntryKind::Scalar { default, .. } => (default.clone(), None),
                EntryKind::List { default, .. } => (default.clone().map(Value::List), None),
                EntryKind::Map { default, .. } => (default.clone().map(Value::Map), None),
                EntryKind::Config { artifact } => {
                    let child = linked.get(artifact).cloned().ok_or_else(|| {
                        InstanceError::UnresolvedArtifact {
                            artifact: artifact.clone(),
                            parent: Some(spec.canonical_name.clone()),
                        }
                    })?;
                    (None, Some(child))
                }
            };
            defaults.push(default);
            children.push(child);
            dispatch.insert(entry.key.clone(), (slot, dispatch::for_kind(&entry.kind)));
        }

        Ok(Self {
            spec,
            defaults,
            children,
            dispatch,
        })
    }

    /// Links a complete set of specs and returns the layout named `root`.
    ///
    /// Specs must be in compiler order (parents before children), which is
    /// what [`cfgen_compiler::compile`] produces.
    pub fn link(
        root: &str,
        specs: impl IntoIterator<Item = ArtifactSpec>,
    ) -> Result<Arc<Layout>, InstanceError> {
        let specs: Vec<ArtifactSpec> = specs.into_iter().collect();
        let mut linked: HashMap<String, Arc<Layout>> = HashMap::with_capacity(specs.len());
        for spec in specs.into_iter().rev() {
            let name = spec.canonical_name.clone();
            let layout = Layout::new(spec, &linked)?;
            linked.insert(name, Arc::new(layout));
        }
        linked
            .remove(root)
            .ok_or_else(|| InstanceError::UnresolvedArtifact {
                artifact: root.to_string(),
                parent: None,
            })
    }

    /// The underlying artifact spec.
    pub fn spec(&self) -> &ArtifactSpec {
        &self.spec
    }

    /// Canonical name of the artifact.
    pub fn canonical_name(&self) -> &str {
        &self.spec.canonical_name
    }

    /// Declared entry keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.spec.entries.iter().map(|e| e.key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.spec.entries.len()
    }

    /// Whether the artifact declares no entries.
    pub fn is_empty(&self) -> bool {
        self.spec.entries.is_empty()
    }

    /// Slot index of a declared entry.
    pub fn slot(&self, key: &str) -> Option<usize> {
        self.dispatch.get(key).map(|(slot, _)| *slot)
    }

    /// Nested layout referenced by a config entry.
    pub fn child(&self, key: &str) -> Option<&Arc<Layout>> {
        self.slot(key).and_then(|slot| self.child_at(slot))
    }

    pub(crate) fn accessors(&self, key: &str) -> Option<(usize, &'static EntryAccessors)> {
        self.dispatch.get(key).copied()
    }

    pub(crate) fn kind_at(&self, slot: usize) -> &EntryKind {
        &self.spec.entries[slot].kind
    }

    pub(crate) fn key_at(&self, slot: usize) -> &str {
        &self.spec.entries[slot].key
    }

    pub(crate) fn default_at(&self, slot: usize) -> Option<&Value> {
        self.defaults[slot].as_ref()
    }

    pub(crate) fn child_at(&self, slot: usize) -> Option<&Arc<Layout>> {
        self.children[slot].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgen_compiler::compile;
    use cfgen_schema::{Entry, ScalarType, Schema, SubjectName};

    fn specs() -> Vec<ArtifactSpec> {
        let schema = Schema::new()
            .with("count", Entry::scalar_with_default(ScalarType::Int, 0))
            .with(
                "tags",
                Entry::list(ScalarType::String).with_default(vec![Value::from("x")]),
            )
            .with(
                "inner",
                Entry::nested(Schema::new().with("flag", Entry::scalar(ScalarType::Bool))),
            );
        compile(&schema, &SubjectName::parse("app::Settings").unwrap(), "ns").unwrap()
    }

    #[test]
    fn link_resolves_children() {
        let layout = Layout::link("ns::Settings", specs()).unwrap();
        assert_eq!(layout.canonical_name(), "ns::Settings");
        assert_eq!(layout.keys().collect::<Vec<_>>(), vec!["count", "tags", "inner"]);
        assert_eq!(layout.slot("tags"), Some(1));
        let child = layout.child("inner").unwrap();
        assert_eq!(child.canonical_name(), "ns::Settings_1");
        assert!(layout.child("count").is_none());
    }

    #[test]
    fn list_defaults_are_wrapped() {
        let layout = Layout::link("ns::Settings", specs()).unwrap();
        assert_eq!(layout.default_at(0), Some(&Value::Int(0)));
        assert_eq!(
            layout.default_at(1),
            Some(&Value::List(vec![Value::from("x")]))
        );
        assert_eq!(layout.default_at(2), None);
    }

    #[test]
    fn missing_child_is_unresolved() {
        let root = specs().remove(0);
        let err = Layout::new(root, &HashMap::new()).unwrap_err();
        assert!(matches!(
            err,
            InstanceError::UnresolvedArtifact { ref artifact, parent: Some(ref p) }
                if artifact == "ns::Settings_1" && p == "ns::Settings"
        ));
    }

    #[test]
    fn unknown_root_is_unresolved() {
        let err = Layout::link("ns::Other", specs()).unwrap_err();
        assert!(matches!(err, InstanceError::UnresolvedArtifact { parent: None, .. }));
    }
}
