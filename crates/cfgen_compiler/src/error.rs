//! Error types for schema compilation.

/// Errors that abort a compile pass.
///
/// All of them indicate a malformed schema; none are recoverable by retrying.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// An entry (or list/map element) has a kind the compiler cannot lay out.
    #[error("invalid or unsupported configuration entry type '{kind}' at '{key}' in {subject}")]
    UnsupportedEntryKind {
        /// Canonical name of the subject being compiled.
        subject: String,
        /// Dotted path of the offending entry.
        key: String,
        /// The entry kind that was found.
        kind: &'static str,
    },

    /// The schema nests deeper than the compiler allows.
    #[error("configuration nested deeper than {limit} levels at '{key}' in {subject}")]
    NestingTooDeep {
        /// Canonical name of the subject being compiled.
        subject: String,
        /// Dotted path of the entry that crossed the limit.
        key: String,
        /// The nesting limit.
        limit: usize,
    },

    /// Two entries of one artifact map to the same accessor method name.
    #[error("accessor '{method}' generated twice in {artifact}")]
    AccessorCollision {
        /// Canonical name of the artifact.
        artifact: String,
        /// The colliding method name.
        method: String,
    },
}
