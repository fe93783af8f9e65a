//! Schema-to-artifact compiler.
//!
//! [`compile`] walks a subject's schema tree in pre-order and produces one
//! [`ArtifactSpec`] per nested node. Nested nodes are named after the subject
//! with a `_n` suffix taken from a single counter shared by the whole pass,
//! so names are stable and collision-free regardless of depth. Each spec
//! lists the accessors its entries expose; [`render_rust`] turns a spec into
//! Rust source for inspection.

#![warn(missing_docs)]

pub mod artifact;
pub mod compile;
pub mod error;
pub mod render;

pub use artifact::{Accessor, AccessorOp, ArtifactSpec, EntryKind, EntrySpec};
pub use compile::{artifact_name, canonical_name, compile, target_namespace, MAX_NESTING_DEPTH};
pub use error::CompileError;
pub use render::{render_rust, GENERATED_BANNER};
