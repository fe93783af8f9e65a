//! Binary artifact storage.
//!
//! Each artifact lives at `<root>/<namespace dirs>/<Name>.cfga`. The file is
//! a little-endian `u32` header length, a bincode [`ArtifactHeader`], then
//! the emitter's payload. Reads validate the header and payload checksum and
//! treat any problem as a miss.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use cfgen_common::{ContentHash, Fingerprint};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::fs::atomic_write;

/// Magic bytes identifying a cfgen artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"CFGN";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File extension of artifact files.
pub const ARTIFACT_EXT: &str = "cfga";

/// Header prepended to every artifact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"CFGN"`.
    pub magic: [u8; 4],

    /// Artifact format version.
    pub format_version: u32,

    /// cfgen version that produced this artifact.
    pub tool_version: String,

    /// Canonical name of the artifact.
    pub canonical_name: String,

    /// Fingerprint the artifact was generated against.
    pub fingerprint: Fingerprint,

    /// Content hash of the payload.
    pub checksum: ContentHash,
}

/// Reads and writes artifact files under a storage root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    tool_version: String,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: &Path, tool_version: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            tool_version: tool_version.to_string(),
        }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an artifact file relative to the root: one directory per
    /// namespace segment, then `<Name>.cfga`.
    pub fn relative_path(canonical_name: &str) -> PathBuf {
        let mut path: PathBuf = canonical_name
            .trim_start_matches("::")
            .split("::")
            .collect();
        path.set_extension(ARTIFACT_EXT);
        path
    }

    /// Absolute path of a relative artifact path.
    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes an artifact atomically and returns its relative path.
    pub fn write_artifact(
        &self,
        canonical_name: &str,
        fingerprint: Fingerprint,
        payload: &[u8],
    ) -> Result<PathBuf, CacheError> {
        let relative = Self::relative_path(canonical_name);
        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: self.tool_version.clone(),
            canonical_name: canonical_name.to_string(),
            fingerprint,
            checksum: ContentHash::of(payload),
        };

        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = u32::try_from(header_bytes.len()).map_err(|_| CacheError::Serialization {
            reason: format!("artifact header for {canonical_name} too large"),
        })?;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(payload);

        atomic_write(&self.absolute(&relative), &output)?;
        Ok(relative)
    }

    /// Reads only the header of an artifact, validating magic and format
    /// version.
    pub fn read_header(&self, relative: &Path) -> Option<ArtifactHeader> {
        let raw = std::fs::read(self.absolute(relative)).ok()?;
        split(&raw).map(|(header, _)| header)
    }

    /// Reads an artifact, validating its header and payload checksum.
    ///
    /// Returns `None` if the file doesn't exist or any check fails.
    pub fn read_artifact(&self, relative: &Path) -> Option<(ArtifactHeader, Vec<u8>)> {
        let raw = std::fs::read(self.absolute(relative)).ok()?;
        let (header, payload) = split(&raw)?;
        if ContentHash::of(payload) != header.checksum {
            tracing::debug!(path = %relative.display(), "artifact checksum mismatch");
            return None;
        }
        Some((header, payload.to_vec()))
    }

    /// Removes artifact files not listed in `live`, returning how many were
    /// removed. Paths in `live` are relative to the root.
    pub fn gc(&self, live: &HashSet<PathBuf>) -> Result<usize, CacheError> {
        if !self.root.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        self.gc_dir(&self.root, live, &mut removed)?;
        Ok(removed)
    }

    fn gc_dir(
        &self,
        dir: &Path,
        live: &HashSet<PathBuf>,
        removed: &mut usize,
    ) -> Result<(), CacheError> {
        let entries = std::fs::read_dir(dir).map_err(|e| CacheError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| CacheError::io(&path, e))?;
            if file_type.is_dir() {
                self.gc_dir(&path, live, removed)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT) {
                let relative = path.strip_prefix(&self.root).unwrap_or(&path);
                if !live.contains(relative) {
                    std::fs::remove_file(&path).map_err(|e| CacheError::io(&path, e))?;
                    tracing::debug!(path = %relative.display(), "removed unreferenced artifact");
                    *removed += 1;
                }
            }
        }
        Ok(())
    }
}

/// Splits raw file bytes into a validated header and the payload.
fn split(raw: &[u8]) -> Option<(ArtifactHeader, &[u8])> {
    let len_bytes: [u8; 4] = raw.get(..4)?.try_into().ok()?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw.get(4..4 + header_len)?;

    let (header, _): (ArtifactHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard()).ok()?;

    if header.magic != ARTIFACT_MAGIC || header.format_version != ARTIFACT_FORMAT_VERSION {
        return None;
    }
    Some((header, &raw[4 + header_len..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), "0.1.0");
        (dir, store)
    }

    fn write_raw(store: &ArtifactStore, relative: &Path, header: &ArtifactHeader, payload: &[u8]) {
        let header_bytes =
            bincode::serde::encode_to_vec(header, bincode::config::standard()).unwrap();
        let mut out = (header_bytes.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&header_bytes);
        out.extend_from_slice(payload);
        let path = store.absolute(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, out).unwrap();
    }

    #[test]
    fn relative_path_follows_namespace() {
        assert_eq!(
            ArtifactStore::relative_path("cfgen::cache::app::Settings_2"),
            PathBuf::from("cfgen/cache/app/Settings_2.cfga")
        );
        assert_eq!(ArtifactStore::relative_path("::Top"), PathBuf::from("Top.cfga"));
    }

    #[test]
    fn write_and_read_roundtrip() {
        let (_dir, store) = make_store();
        let fp = Fingerprint::Timestamp(42);
        let rel = store.write_artifact("ns::app::S", fp, b"payload").unwrap();
        assert_eq!(rel, PathBuf::from("ns/app/S.cfga"));

        let (header, payload) = store.read_artifact(&rel).unwrap();
        assert_eq!(payload, b"payload");
        assert_eq!(header.canonical_name, "ns::app::S");
        assert_eq!(header.fingerprint, fp);
        assert_eq!(header.tool_version, "0.1.0");
        assert_eq!(store.read_header(&rel), Some(header));
    }

    #[test]
    fn read_missing_returns_none() {
        let (_dir, store) = make_store();
        assert!(store.read_artifact(Path::new("nope.cfga")).is_none());
        assert!(store.read_header(Path::new("nope.cfga")).is_none());
    }

    #[test]
    fn read_corrupt_data_returns_none() {
        let (_dir, store) = make_store();
        std::fs::write(store.absolute(Path::new("bad.cfga")), b"garbage").unwrap();
        assert!(store.read_artifact(Path::new("bad.cfga")).is_none());
    }

    #[test]
    fn read_wrong_magic_returns_none() {
        let (_dir, store) = make_store();
        let header = ArtifactHeader {
            magic: *b"BAAD",
            format_version: ARTIFACT_FORMAT_VERSION,
            tool_version: "0.1.0".to_string(),
            canonical_name: "S".to_string(),
            fingerprint: Fingerprint::Timestamp(1),
            checksum: ContentHash::of(b"data"),
        };
        write_raw(&store, Path::new("S.cfga"), &header, b"data");
        assert!(store.read_artifact(Path::new("S.cfga")).is_none());
    }

    #[test]
    fn read_wrong_version_returns_none() {
        let (_dir, store) = make_store();
        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: 999,
            tool_version: "0.1.0".to_string(),
            canonical_name: "S".to_string(),
            fingerprint: Fingerprint::Timestamp(1),
            checksum: ContentHash::of(b"data"),
        };
        write_raw(&store, Path::new("S.cfga"), &header, b"data");
        assert!(store.read_header(Path::new("S.cfga")).is_none());
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let (_dir, store) = make_store();
        let rel = store
            .write_artifact("S", Fingerprint::Timestamp(1), b"original")
            .unwrap();
        let path = store.absolute(&rel);
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, raw).unwrap();

        assert!(store.read_artifact(&rel).is_none());
        // The header alone is still readable.
        assert!(store.read_header(&rel).is_some());
    }

    #[test]
    fn gc_removes_unreferenced() {
        let (_dir, store) = make_store();
        let fp = Fingerprint::Timestamp(1);
        let keep = store.write_artifact("ns::app::Keep", fp, b"a").unwrap();
        store.write_artifact("ns::app::Drop", fp, b"b").unwrap();
        store.write_artifact("ns::other::Gone", fp, b"c").unwrap();
        std::fs::write(store.absolute(Path::new("registry.json")), "{}").unwrap();

        let live: HashSet<PathBuf> = [keep.clone()].into_iter().collect();
        assert_eq!(store.gc(&live).unwrap(), 2);
        assert!(store.read_artifact(&keep).is_some());
        assert!(store.absolute(Path::new("registry.json")).exists());
        assert_eq!(store.gc(&live).unwrap(), 0);
    }

    #[test]
    fn gc_missing_root_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(&dir.path().join("absent"), "0.1.0");
        assert_eq!(store.gc(&HashSet::new()).unwrap(), 0);
    }
}
