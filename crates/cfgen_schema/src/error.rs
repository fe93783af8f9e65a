//! Error types for schema reading and subject resolution.

use std::path::PathBuf;

/// Errors raised while reading schemas or resolving subjects.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// An I/O error occurred while reading a schema file.
    #[error("schema I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A schema document could not be parsed.
    #[error("failed to parse schema: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// An entry declaration is malformed.
    #[error("invalid entry '{key}': {reason}")]
    InvalidEntry {
        /// Dotted path of the offending entry.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The same key was declared twice in one nested schema.
    #[error("duplicate entry key '{key}'")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },

    /// No schema is known for the subject.
    #[error("no schema declared for subject '{subject}'")]
    UnknownSubject {
        /// The canonical subject name.
        subject: String,
    },

    /// A subject name is not a valid `::`-separated path.
    #[error("invalid subject name '{name}': {reason}")]
    InvalidSubjectName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = SchemaError::Io {
            path: PathBuf::from("schemas/app/Settings.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("schema I/O error"));
        assert!(msg.contains("Settings.toml"));
    }

    #[test]
    fn invalid_entry_display() {
        let err = SchemaError::InvalidEntry {
            key: "db.port".to_string(),
            reason: "unknown type 'port'".to_string(),
        };
        assert_eq!(err.to_string(), "invalid entry 'db.port': unknown type 'port'");
    }

    #[test]
    fn unknown_subject_display() {
        let err = SchemaError::UnknownSubject {
            subject: "app::Missing".to_string(),
        };
        assert!(err.to_string().contains("app::Missing"));
    }
}
