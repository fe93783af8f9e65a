//! Schema sources: where a subject's schema and fingerprint come from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use cfgen_common::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::loader::load_schema;
use crate::subject::SubjectName;
use crate::types::Schema;

/// Resolves subjects to their declared schema and current fingerprint.
///
/// Implementations must be deterministic: the same subject and fingerprint
/// always yield the same schema.
pub trait SchemaSource: Send + Sync {
    /// Returns the root schema declared for the subject.
    fn schema(&self, subject: &SubjectName) -> Result<Schema, SchemaError>;

    /// Returns the subject's current change fingerprint.
    fn fingerprint(&self, subject: &SubjectName) -> Result<Fingerprint, SchemaError>;
}

/// In-memory catalog of subject schemas.
///
/// Schemas are registered programmatically; the fingerprint of a subject
/// can be bumped to simulate a changed declaration.
#[derive(Default)]
pub struct StaticSchemas {
    subjects: RwLock<HashMap<String, (Schema, Fingerprint)>>,
}

impl StaticSchemas {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or redeclares) a subject's schema and fingerprint.
    pub fn insert(
        &self,
        subject: &str,
        schema: Schema,
        fingerprint: Fingerprint,
    ) -> Result<(), SchemaError> {
        let key = SubjectName::parse(subject)?.to_string();
        self.subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (schema, fingerprint));
        Ok(())
    }

    /// Replaces the fingerprint of a declared subject, returning `false` if
    /// the subject is unknown.
    pub fn set_fingerprint(&self, subject: &str, fingerprint: Fingerprint) -> bool {
        let Ok(name) = SubjectName::parse(subject) else {
            return false;
        };
        let mut subjects = self.subjects.write().unwrap_or_else(PoisonError::into_inner);
        match subjects.get_mut(&name.to_string()) {
            Some(slot) => {
                slot.1 = fingerprint;
                true
            }
            None => false,
        }
    }

    fn lookup<T>(
        &self,
        subject: &SubjectName,
        f: impl FnOnce(&(Schema, Fingerprint)) -> T,
    ) -> Result<T, SchemaError> {
        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        subjects
            .get(&subject.to_string())
            .map(f)
            .ok_or_else(|| SchemaError::UnknownSubject {
                subject: subject.to_string(),
            })
    }
}

impl SchemaSource for StaticSchemas {
    fn schema(&self, subject: &SubjectName) -> Result<Schema, SchemaError> {
        self.lookup(subject, |(schema, _)| schema.clone())
    }

    fn fingerprint(&self, subject: &SubjectName) -> Result<Fingerprint, SchemaError> {
        self.lookup(subject, |(_, fingerprint)| *fingerprint)
    }
}

/// How a [`SchemaDirectory`] fingerprints schema files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// File modification time, in whole seconds.
    #[default]
    Mtime,
    /// XXH3 hash of the file content.
    Content,
}

/// Reads subject schemas from a directory of TOML files.
///
/// Subject `a::b::Name` is declared in `<root>/a/b/Name.toml`.
#[derive(Debug, Clone)]
pub struct SchemaDirectory {
    root: PathBuf,
    mode: FingerprintMode,
}

impl SchemaDirectory {
    /// Creates a reader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, mode: FingerprintMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    /// Path of the file declaring the subject.
    pub fn path_for(&self, subject: &SubjectName) -> PathBuf {
        self.root
            .join(subject.namespace_dir())
            .join(format!("{}.toml", subject.name()))
    }

    /// Root directory of the schema tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(subject: &SubjectName, path: PathBuf, e: std::io::Error) -> SchemaError {
        if e.kind() == std::io::ErrorKind::NotFound {
            SchemaError::UnknownSubject {
                subject: subject.to_string(),
            }
        } else {
            SchemaError::Io { path, source: e }
        }
    }
}

impl SchemaSource for SchemaDirectory {
    fn schema(&self, subject: &SubjectName) -> Result<Schema, SchemaError> {
        let path = self.path_for(subject);
        if !path.is_file() {
            return Err(SchemaError::UnknownSubject {
                subject: subject.to_string(),
            });
        }
        load_schema(&path)
    }

    fn fingerprint(&self, subject: &SubjectName) -> Result<Fingerprint, SchemaError> {
        let path = self.path_for(subject);
        match self.mode {
            FingerprintMode::Mtime => {
                let modified = std::fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .map_err(|e| Self::io_error(subject, path.clone(), e))?;
                Ok(Fingerprint::from_system_time(modified))
            }
            FingerprintMode::Content => {
                let bytes =
                    std::fs::read(&path).map_err(|e| Self::io_error(subject, path.clone(), e))?;
                Ok(Fingerprint::of_content(&bytes))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entry, ScalarType};

    fn settings() -> Schema {
        Schema::new().with("port", Entry::scalar_with_default(ScalarType::Int, 8080))
    }

    #[test]
    fn static_lookup_and_fingerprint_bump() {
        let schemas = StaticSchemas::new();
        schemas
            .insert("app::Settings", settings(), Fingerprint::Timestamp(1))
            .unwrap();

        let subject = SubjectName::parse("app::Settings").unwrap();
        assert_eq!(schemas.schema(&subject).unwrap(), settings());
        assert_eq!(schemas.fingerprint(&subject).unwrap(), Fingerprint::Timestamp(1));

        assert!(schemas.set_fingerprint("::app::Settings", Fingerprint::Timestamp(2)));
        assert_eq!(schemas.fingerprint(&subject).unwrap(), Fingerprint::Timestamp(2));
        assert!(!schemas.set_fingerprint("app::Other", Fingerprint::Timestamp(3)));
    }

    #[test]
    fn static_unknown_subject() {
        let schemas = StaticSchemas::new();
        let subject = SubjectName::parse("app::Missing").unwrap();
        assert!(matches!(
            schemas.schema(&subject),
            Err(SchemaError::UnknownSubject { .. })
        ));
    }

    #[test]
    fn directory_maps_namespace_to_path() {
        let dir = SchemaDirectory::new("/schemas", FingerprintMode::Mtime);
        let subject = SubjectName::parse("app::db::Settings").unwrap();
        assert_eq!(
            dir.path_for(&subject),
            PathBuf::from("/schemas/app/db/Settings.toml")
        );
    }

    #[test]
    fn directory_reads_schema_and_content_fingerprint() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("app")).unwrap();
        let file = tmp.path().join("app").join("Settings.toml");
        std::fs::write(&file, "[entries]\nport = \"int\"\n").unwrap();

        let dir = SchemaDirectory::new(tmp.path(), FingerprintMode::Content);
        let subject = SubjectName::parse("app::Settings").unwrap();
        let schema = dir.schema(&subject).unwrap();
        assert_eq!(schema.get("port"), Some(&Entry::scalar(ScalarType::Int)));

        let before = dir.fingerprint(&subject).unwrap();
        std::fs::write(&file, "[entries]\nport = \"string\"\n").unwrap();
        let after = dir.fingerprint(&subject).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn directory_mtime_fingerprint_is_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("Top.toml"), "").unwrap();
        let dir = SchemaDirectory::new(tmp.path(), FingerprintMode::Mtime);
        let subject = SubjectName::parse("Top").unwrap();
        assert!(matches!(
            dir.fingerprint(&subject).unwrap(),
            Fingerprint::Timestamp(_)
        ));
    }

    #[test]
    fn directory_missing_file_is_unknown_subject() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = SchemaDirectory::new(tmp.path(), FingerprintMode::Content);
        let subject = SubjectName::parse("app::Nope").unwrap();
        assert!(matches!(
            dir.fingerprint(&subject),
            Err(SchemaError::UnknownSubject { .. })
        ));
        assert!(matches!(
            dir.schema(&subject),
            Err(SchemaError::UnknownSubject { .. })
        ));
    }

    #[test]
    fn fingerprint_mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: FingerprintMode,
        }
        let w: Wrapper = toml::from_str("mode = \"content\"").unwrap();
        assert_eq!(w.mode, FingerprintMode::Content);
    }
}
