//! Canonical subject names.

use std::fmt;
use std::path::PathBuf;

use crate::error::SchemaError;

/// The canonical name of a subject, a `::`-separated path such as
/// `app::db::Settings`.
///
/// The last segment is the short name that generated artifacts are named
/// after; the preceding segments form the subject's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectName {
    namespace: Vec<String>,
    name: String,
}

impl SubjectName {
    /// Parses a canonical subject name. A leading `::` is ignored.
    pub fn parse(path: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidSubjectName {
            name: path.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = path.strip_prefix("::").unwrap_or(path);
        if trimmed.is_empty() {
            return Err(invalid("name is empty"));
        }

        let mut segments = Vec::new();
        for segment in trimmed.split("::") {
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }
            if !is_identifier(segment) {
                return Err(invalid(&format!("'{segment}' is not an identifier")));
            }
            segments.push(segment.to_string());
        }

        // split always yields at least one segment for non-empty input
        let name = segments.pop().ok_or_else(|| invalid("name is empty"))?;
        Ok(Self {
            namespace: segments,
            name,
        })
    }

    /// The short (last-segment) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace segments, outermost first.
    pub fn namespace_segments(&self) -> &[String] {
        &self.namespace
    }

    /// Namespace joined with `::`; empty for a top-level subject.
    pub fn namespace(&self) -> String {
        self.namespace.join("::")
    }

    /// Relative directory mirroring the namespace, used to lay out files.
    pub fn namespace_dir(&self) -> PathBuf {
        self.namespace.iter().collect()
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.namespace {
            write!(f, "{segment}::")?;
        }
        f.write_str(&self.name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
