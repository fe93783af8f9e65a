//! Error types for runtime instances and layout linking.

/// Errors raised by [`ConfigInstance`](crate::ConfigInstance) operations and
/// by [`Layout`](crate::Layout) linking.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// A required entry is undeclared or has neither a value nor a default.
    #[error("Missing required config entry: \"{key}\" ({}).", .trail.join("."))]
    MissingConfigEntry {
        /// The entry key that was required.
        key: String,
        /// Keys from the root configuration down to the missing entry.
        trail: Vec<String>,
    },

    /// A written value does not fit the entry's declared type.
    #[error("type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        /// The entry key.
        key: String,
        /// The declared type.
        expected: String,
        /// Kind of the value that was offered.
        found: &'static str,
    },

    /// A collection operation was applied to an entry of another kind.
    #[error("'{op}' is not supported on {kind} entry '{key}'")]
    UnsupportedOperation {
        /// The entry key.
        key: String,
        /// The operation attempted.
        op: &'static str,
        /// The entry's kind.
        kind: &'static str,
    },

    /// A nested artifact referenced by a layout was not supplied for linking.
    #[error("artifact '{artifact}' is not available{}", .parent.as_ref().map(|p| format!(" (referenced by {p})")).unwrap_or_default())]
    UnresolvedArtifact {
        /// Canonical name of the missing artifact.
        artifact: String,
        /// Canonical name of the artifact referencing it, if any.
        parent: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_message_carries_trail() {
        let err = InstanceError::MissingConfigEntry {
            key: "port".to_string(),
            trail: vec!["db".to_string(), "primary".to_string(), "port".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required config entry: \"port\" (db.primary.port)."
        );
    }

    #[test]
    fn unresolved_display() {
        let err = InstanceError::UnresolvedArtifact {
            artifact: "ns::S_1".to_string(),
            parent: Some("ns::S".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "artifact 'ns::S_1' is not available (referenced by ns::S)"
        );
        let err = InstanceError::UnresolvedArtifact {
            artifact: "ns::S".to_string(),
            parent: None,
        };
        assert_eq!(err.to_string(), "artifact 'ns::S' is not available");
    }

    #[test]
    fn type_mismatch_display() {
        let err = InstanceError::TypeMismatch {
            key: "count".to_string(),
            expected: "int".to_string(),
            found: "string",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch for 'count': expected int, found string"
        );
    }
}
