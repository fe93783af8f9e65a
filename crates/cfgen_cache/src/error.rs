//! Error types for cache operations.

use std::path::PathBuf;

use cfgen_compiler::CompileError;
use cfgen_runtime::InstanceError;
use cfgen_schema::SchemaError;

/// Errors that can occur during cache operations.
///
/// Reads of cached state are fail-safe: an unreadable registry or artifact
/// is treated as a cache miss. These variants cover the failures that
/// cannot be recovered by regenerating.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The code emitter rejected an artifact or a stored unit.
    #[error("emitter failed for {artifact}: {reason}")]
    Emit {
        /// Canonical name of the artifact.
        artifact: String,
        /// Description of the failure.
        reason: String,
    },

    /// A registered artifact could not be read back from the store.
    #[error("artifact '{name}' is missing or unreadable")]
    MissingArtifact {
        /// Canonical name of the artifact.
        name: String,
    },

    /// An artifact name is already registered to another subject.
    #[error("artifact '{name}' of subject '{subject}' is already registered to subject '{owner}'")]
    NameCollision {
        /// Canonical name of the artifact.
        name: String,
        /// Subject being compiled.
        subject: String,
        /// Subject the registered artifact belongs to.
        owner: String,
    },

    /// The schema reader failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The compiler rejected the schema.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Linking or instantiating a layout failed.
    #[error(transparent)]
    Instance(#[from] InstanceError),

    /// The process-wide cache was used before `register`.
    #[error("cfgen environment is not registered, did you forget to call register?")]
    NotRegistered,

    /// The process-wide cache was registered twice.
    #[error("cfgen environment is already registered")]
    AlreadyRegistered,
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
