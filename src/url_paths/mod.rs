//! URL classification and path normalisation for manifest entries.
//!
//! `filters` decides whether a URL is precached or handled at runtime, while `normalize`
//! turns public URLs back into absolute paths inside the build output directory.

mod filters;
mod normalize;

pub use filters::{is_cache_static_file, is_http_or_https};
pub use normalize::{PathNormalizer, lexical_normalize, normalize_public_path};
