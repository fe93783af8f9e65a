//! Persistent registry of generated artifacts.
//!
//! The registry is stored as `registry.json` in the storage root. It maps
//! each artifact's canonical name to the artifact file (relative to the
//! root), the fingerprint the artifact was generated against, and the
//! subject it belongs to.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cfgen_common::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::fs::atomic_write;

/// Name of the registry file within the storage root.
pub const REGISTRY_FILE: &str = "registry.json";

/// Canonical artifact name to location and fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    /// cfgen version that wrote this registry. Discarded on version change.
    pub version: String,

    /// Entries keyed by canonical artifact name.
    pub entries: BTreeMap<String, RegistryEntry>,
}

/// Where an artifact lives and what it was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Artifact file path, relative to the storage root.
    pub path: PathBuf,

    /// Fingerprint the artifact was stamped with.
    pub fingerprint: Fingerprint,

    /// Canonical name of the subject the artifact was compiled from.
    pub subject: String,
}

impl Registry {
    /// Creates an empty registry for the given cfgen version.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            entries: BTreeMap::new(),
        }
    }

    /// Loads the registry from the storage root, returning `None` if the
    /// file doesn't exist or can't be parsed.
    pub fn load(root: &Path) -> Option<Self> {
        let path = root.join(REGISTRY_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(registry) => Some(registry),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable registry");
                None
            }
        }
    }

    /// Loads the registry if it was written by a compatible version, else
    /// starts a fresh one.
    pub fn load_or_new(root: &Path, version: &str) -> Self {
        Self::load(root)
            .filter(|r| r.is_compatible(version))
            .unwrap_or_else(|| Self::new(version))
    }

    /// Writes the registry atomically to the storage root.
    pub fn save(&self, root: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        atomic_write(&root.join(REGISTRY_FILE), json.as_bytes())
    }

    /// Returns `true` if this registry was written by a compatible version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.version == current_version
    }

    /// Looks up an artifact.
    pub fn get(&self, canonical_name: &str) -> Option<&RegistryEntry> {
        self.entries.get(canonical_name)
    }

    /// Records an artifact, replacing any previous entry.
    pub fn insert(&mut self, canonical_name: impl Into<String>, entry: RegistryEntry) {
        self.entries.insert(canonical_name.into(), entry);
    }

    /// Drops every entry belonging to `subject`, returning how many went.
    pub fn remove_subject(&mut self, subject: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.subject != subject);
        before - self.entries.len()
    }

    /// Entries belonging to `subject`.
    pub fn artifacts_of<'a>(
        &'a self,
        subject: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a RegistryEntry)> + 'a {
        self.entries
            .iter()
            .filter(move |(_, e)| e.subject == subject)
            .map(|(name, e)| (name.as_str(), e))
    }

    /// Adds entries from `other` that this registry does not have, skipping
    /// subjects for which `skip` returns `true`. Existing entries win.
    pub fn merge_missing(&mut self, other: Registry, skip: impl Fn(&str) -> bool) {
        for (name, entry) in other.entries {
            if skip(&entry.subject) {
                continue;
            }
            self.entries.entry(name).or_insert(entry);
        }
    }

    /// Number of registered artifacts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, fp: u64, subject: &str) -> RegistryEntry {
        RegistryEntry {
            path: PathBuf::from(path),
            fingerprint: Fingerprint::Timestamp(fp),
            subject: subject.to_string(),
        }
    }

    #[test]
    fn new_registry_is_empty() {
        let r = Registry::new("0.1.0");
        assert_eq!(r.version, "0.1.0");
        assert!(r.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Registry::new("0.1.0");
        r.insert("ns::app::S", entry("app/S.cfga", 10, "app::S"));
        r.save(dir.path()).unwrap();

        let loaded = Registry::load(dir.path()).unwrap();
        assert_eq!(loaded, r);
        assert_eq!(
            loaded.get("ns::app::S").map(|e| e.fingerprint),
            Some(Fingerprint::Timestamp(10))
        );
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Registry::load(dir.path()).is_none());
    }

    #[test]
    fn load_corrupt_json_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(REGISTRY_FILE), "not valid json {{{").unwrap();
        assert!(Registry::load(dir.path()).is_none());
    }

    #[test]
    fn version_mismatch_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = Registry::new("0.1.0");
        r.insert("ns::S", entry("S.cfga", 1, "S"));
        r.save(dir.path()).unwrap();

        assert_eq!(Registry::load_or_new(dir.path(), "0.1.0").len(), 1);
        let fresh = Registry::load_or_new(dir.path(), "0.2.0");
        assert!(fresh.is_empty());
        assert_eq!(fresh.version, "0.2.0");
    }

    #[test]
    fn remove_subject_drops_all_of_its_artifacts() {
        let mut r = Registry::new("0.1.0");
        r.insert("ns::S", entry("S.cfga", 1, "S"));
        r.insert("ns::S_1", entry("S_1.cfga", 1, "S"));
        r.insert("ns::T", entry("T.cfga", 1, "T"));
        assert_eq!(r.artifacts_of("S").count(), 2);
        assert_eq!(r.remove_subject("S"), 2);
        assert_eq!(r.entries.keys().collect::<Vec<_>>(), vec!["ns::T"]);
    }

    #[test]
    fn merge_keeps_ours_and_adds_theirs() {
        let mut ours = Registry::new("0.1.0");
        ours.insert("ns::S", entry("S.cfga", 2, "S"));

        let mut theirs = Registry::new("0.1.0");
        theirs.insert("ns::S", entry("S.cfga", 1, "S"));
        theirs.insert("ns::T", entry("T.cfga", 1, "T"));
        theirs.insert("ns::U", entry("U.cfga", 1, "U"));

        ours.merge_missing(theirs, |subject| subject == "U");
        assert_eq!(ours.len(), 2);
        assert_eq!(ours.get("ns::S").unwrap().fingerprint, Fingerprint::Timestamp(2));
        assert!(ours.get("ns::T").is_some());
        assert!(ours.get("ns::U").is_none());
    }

    #[test]
    fn save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deeply").join("nested");
        Registry::new("0.1.0").save(&nested).unwrap();
        assert!(nested.join(REGISTRY_FILE).exists());
    }
}
