//! Artifact cache and registry for compiled configurations.
//!
//! [`ConfigCache`] decides, per subject and according to its
//! [`CacheStrategy`], whether the artifacts on disk can be reused or must be
//! regenerated. Generated artifacts are written atomically to an
//! [`ArtifactStore`] and recorded in a persistent [`Registry`] mapping each
//! canonical name to its file and fingerprint. The [`global`] module offers
//! a process-wide register-once facade over a single cache.

#![warn(missing_docs)]

pub mod cache;
pub mod emitter;
pub mod error;
pub mod global;
pub mod registry;
pub mod store;
pub mod strategy;

mod fs;

pub use cache::{CacheOptions, ConfigCache, DEFAULT_NAMESPACE};
pub use emitter::{CodeEmitter, SpecEmitter};
pub use error::CacheError;
pub use registry::{Registry, RegistryEntry};
pub use store::{ArtifactHeader, ArtifactStore};
pub use strategy::CacheStrategy;
