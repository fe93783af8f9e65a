//! Turning artifact specs into storable units and back.

use cfgen_compiler::ArtifactSpec;

use crate::error::CacheError;

/// Produces the stored form of an artifact and loads it back.
///
/// Emission must be deterministic: the same spec always yields the same
/// bytes, so concurrent regenerations of one artifact write equal files.
pub trait CodeEmitter: Send + Sync {
    /// Encodes an artifact spec into a payload.
    fn emit(&self, spec: &ArtifactSpec) -> Result<Vec<u8>, CacheError>;

    /// Decodes a payload previously produced by [`emit`](Self::emit).
    fn load(&self, payload: &[u8]) -> Result<ArtifactSpec, CacheError>;
}

/// Stores the artifact spec itself, bincode-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecEmitter;

impl CodeEmitter for SpecEmitter {
    fn emit(&self, spec: &ArtifactSpec) -> Result<Vec<u8>, CacheError> {
        bincode::serde::encode_to_vec(spec, bincode::config::standard()).map_err(|e| {
            CacheError::Emit {
                artifact: spec.canonical_name.clone(),
                reason: e.to_string(),
            }
        })
    }

    fn load(&self, payload: &[u8]) -> Result<ArtifactSpec, CacheError> {
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map(|(spec, _)| spec)
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })
    }
}
