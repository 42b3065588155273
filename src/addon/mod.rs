pub mod descriptor;
pub mod metadata;
pub mod version;
pub mod xml;

pub use descriptor::{Addon, AddonType, Dependency, Extension};
pub use metadata::{Metadata, MetadataValue};
pub use version::AddonVersion;
