//! Shared foundational types used across the cfgen workspace.
//!
//! This crate provides the change fingerprints that drive artifact cache
//! validation, along with the content digest they and the store share.

#![warn(missing_docs)]

pub mod fingerprint;

pub use fingerprint::{ContentHash, Fingerprint};
