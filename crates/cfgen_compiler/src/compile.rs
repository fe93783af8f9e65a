//! The compile pass: schema tree in, pre-order artifact specs out.

use std::collections::HashSet;

use cfgen_schema::{Entry, ScalarType, Schema, SubjectName};

use crate::artifact::{Accessor, ArtifactSpec, EntryKind, EntrySpec};
use crate::error::CompileError;

/// Deepest nesting the compiler accepts below a subject's root.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Namespace generated artifacts of `subject` live in: the registered base
/// namespace followed by the subject's own namespace.
pub fn target_namespace(base: &str, subject: &SubjectName) -> String {
    let base = base.trim_matches(':');
    let own = subject.namespace();
    match (base.is_empty(), own.is_empty()) {
        (true, _) => own,
        (false, true) => base.to_string(),
        (false, false) => format!("{base}::{own}"),
    }
}

/// Short artifact name for the node with pre-order index `index`.
pub fn artifact_name(short_name: &str, index: u32) -> String {
    if index == 0 {
        short_name.to_string()
    } else {
        format!("{short_name}_{index}")
    }
}

/// Joins a namespace and a short name.
pub fn canonical_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}::{name}")
    }
}

/// Compiles a subject's root schema into artifact specs.
///
/// The result is in pre-order: the root artifact first, then each nested
/// artifact before its later siblings. The same schema always compiles to the
/// same specs.
pub fn compile(
    root: &Schema,
    subject: &SubjectName,
    target_namespace: &str,
) -> Result<Vec<ArtifactSpec>, CompileError> {
    let mut pass = CompilePass {
        subject,
        subject_name: subject.to_string(),
        namespace: target_namespace,
        counter: 0,
        artifacts: Vec::new(),
    };
    pass.node(root, None, "", 0)?;
    tracing::debug!(
        subject = %pass.subject_name,
        artifacts = pass.artifacts.len(),
        "compiled schema"
    );
    Ok(pass.artifacts)
}

struct CompilePass<'a> {
    subject: &'a SubjectName,
    subject_name: String,
    namespace: &'a str,
    /// Shared pre-order counter; the current node owns its value on entry.
    counter: u32,
    artifacts: Vec<ArtifactSpec>,
}

impl CompilePass<'_> {
    fn node(
        &mut self,
        schema: &Schema,
        parent: Option<&str>,
        path: &str,
        depth: usize,
    ) -> Result<String, CompileError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(CompileError::NestingTooDeep {
                subject: self.subject_name.clone(),
                key: path.to_string(),
                limit: MAX_NESTING_DEPTH,
            });
        }

        let index = self.counter;
        let name = artifact_name(self.subject.name(), index);
        let canonical = canonical_name(self.namespace, &name);
        let slot = self.artifacts.len();

        let mut entries = Vec::with_capacity(schema.len());
        let mut methods = HashSet::new();

        for (key, entry) in schema.entries() {
            let entry_path = if path.is_empty() {
                key.to_string()
            } else {
                format!("{path}.{key}")
            };

            let kind = match entry {
                Entry::Scalar { ty, default } => EntryKind::Scalar {
                    ty: ty.clone(),
                    default: default.clone(),
                },
                Entry::List { element, default } => EntryKind::List {
                    element: self.element_type(&entry_path, element)?,
                    default: default.clone(),
                },
                Entry::Map { element, default } => EntryKind::Map {
                    element: self.element_type(&entry_path, element)?,
                    default: default.clone(),
                },
                Entry::Nested(child) => {
                    self.counter += 1;
                    let artifact = self.node(child, Some(&canonical), &entry_path, depth + 1)?;
                    EntryKind::Config { artifact }
                }
            };

            let accessors: Vec<Accessor> = kind
                .ops()
                .iter()
                .map(|op| Accessor {
                    name: op.method_name(key),
                    op: *op,
                })
                .collect();
            for accessor in &accessors {
                if !methods.insert(accessor.name.clone()) {
                    return Err(CompileError::AccessorCollision {
                        artifact: canonical.clone(),
                        method: accessor.name.clone(),
                    });
                }
            }

            entries.push(EntrySpec {
                key: key.to_string(),
                kind,
                accessors,
            });
        }

        tracing::trace!(artifact = %canonical, index, entries = entries.len(), "generated artifact");

        // Children were appended while walking; the node itself goes first.
        self.artifacts.insert(
            slot,
            ArtifactSpec {
                canonical_name: canonical.clone(),
                namespace: self.namespace.to_string(),
                name,
                index,
                subject: self.subject_name.clone(),
                parent: parent.map(str::to_string),
                entries,
            },
        );
        Ok(canonical)
    }

    fn element_type(&self, path: &str, element: &Entry) -> Result<ScalarType, CompileError> {
        match element {
            Entry::Scalar { ty, .. } => Ok(ty.clone()),
            other => Err(CompileError::UnsupportedEntryKind {
                subject: self.subject_name.clone(),
                key: format!("{path}[]"),
                kind: other.kind_name(),
            }),
        }
    }
}
