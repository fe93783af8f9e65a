//! In-memory configuration schema model and schema readers.
//!
//! A schema is an ordered tree of typed entries ([`Entry`]). Leaves are
//! scalars, lists and maps; interior nodes are nested schemas. Subjects
//! ([`SubjectName`]) own schemas and are resolved through a [`SchemaSource`],
//! either an in-memory [`StaticSchemas`] catalog or a [`SchemaDirectory`] of
//! declarative TOML files.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod source;
pub mod subject;
pub mod types;
pub mod value;

pub use error::SchemaError;
pub use loader::{load_schema, parse_schema_str};
pub use source::{FingerprintMode, SchemaDirectory, SchemaSource, StaticSchemas};
pub use subject::SubjectName;
pub use types::{Entry, ScalarType, Schema};
pub use value::{ObjectValue, Value};
