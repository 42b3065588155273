//! Reader for `addon.xml` package descriptors.
//!
//! [`Addon::load`] parses the manifest found in an addon directory into its
//! identity, dependencies, extensions and metadata, and classifies the addon
//! by its extension points. [`AddonVersion`] is the restricted
//! `major.minor[.patch]` version number used by those manifests.

pub mod addon;
pub mod config;
pub mod error;
pub mod repository;

pub use addon::{Addon, AddonType, AddonVersion};
pub use config::ParserConfig;
pub use error::{AddonError, Result};
