//! Runtime side of compiled configurations.
//!
//! A [`Layout`] is an artifact spec linked with the layouts of its nested
//! artifacts and a per-entry dispatch table. A [`ConfigInstance`] is a
//! value store shaped by a layout: it answers `exists`/`depend`, reads and
//! writes entries by name, and creates nested configurations on first
//! access.

#![warn(missing_docs)]

mod dispatch;
pub mod error;
pub mod instance;
pub mod layout;

pub use error::InstanceError;
pub use instance::{ConfigInstance, Field};
pub use layout::Layout;
