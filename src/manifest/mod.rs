//! Dependency manifest model and loader.

mod loading;
mod model;

pub use loading::{ManifestSource, load_manifest, normalize_manifest};
pub use model::{DEPS_KEY, DependencyRecord, DepsContainer, INFO_KEY, Manifest, ManifestEntry, ManifestInfo};
