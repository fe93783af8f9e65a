//! Change fingerprints used to decide whether a cached artifact is stale,
//! and the content digest shared by fingerprints and artifact checksums.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// XXH3-128 digest of a byte string, stored little-endian.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Digests `data`.
    pub fn of(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    fn value(self) -> u128 {
        u128::from_le_bytes(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.value())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:08x}..)", self.value() >> 96)
    }
}

/// Identifies one version of a subject's schema.
///
/// Two fingerprints compare equal only when they were taken in the same mode
/// and observed the same value. Artifacts are stamped with the fingerprint
/// they were generated against so later validations compare by equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Fingerprint {
    /// Seconds since the Unix epoch (modification time or generation time).
    Timestamp(u64),
    /// XXH3-128 hash of the schema declaration bytes.
    Content(ContentHash),
}

impl Fingerprint {
    /// Stamps the current wall-clock time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Converts a file modification time into a timestamp fingerprint.
    ///
    /// Times before the epoch clamp to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::Timestamp(secs)
    }

    /// Hashes the given bytes into a content fingerprint.
    pub fn of_content(data: &[u8]) -> Self {
        Self::Content(ContentHash::of(data))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(secs) => write!(f, "mtime:{secs}"),
            Self::Content(hash) => write!(f, "xxh3:{hash}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn system_time_to_seconds() {
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(
            Fingerprint::from_system_time(t),
            Fingerprint::Timestamp(1_700_000_000)
        );
    }

    #[test]
    fn pre_epoch_clamps_to_zero() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(Fingerprint::from_system_time(t), Fingerprint::Timestamp(0));
    }

    #[test]
    fn content_mode_never_equals_timestamp_mode() {
        let content = Fingerprint::of_content(b"0");
        assert_ne!(content, Fingerprint::Timestamp(0));
        assert_eq!(content, Fingerprint::of_content(b"0"));
    }

    #[test]
    fn display_names_the_mode() {
        assert_eq!(Fingerprint::Timestamp(42).to_string(), "mtime:42");
        assert!(Fingerprint::of_content(b"x").to_string().starts_with("xxh3:"));
    }

    #[test]
    fn digest_tracks_bytes() {
        let int = ContentHash::of(b"type = \"int\"");
        assert_eq!(int, ContentHash::of(b"type = \"int\""));
        assert_ne!(int, ContentHash::of(b"type = \"float\""));
    }

    #[test]
    fn digest_formatting() {
        let h = ContentHash::of(b"schema");
        let full = h.to_string();
        assert_eq!(full.len(), 32);
        assert_eq!(format!("{h:?}"), format!("ContentHash({}..)", &full[..8]));
    }

    #[test]
    fn serde_roundtrip() {
        let fp = Fingerprint::of_content(b"serde test");
        let json = serde_json::to_string(&fp).unwrap();
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(fp, back);
    }
}
