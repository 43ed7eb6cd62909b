//! Filters deciding which dependency entries receive a dedicated worker.

use regex::Regex;

/// Trait describing which manifest entries get their own worker script.
pub trait WorkerInclusion {
  /// Returns `true` when the entry should receive a worker.
  fn is_included(&self, entry_name: &str) -> bool;
}

/// Entry names the bundler uses for shared and common chunks.
pub const SHARED_CHUNK_PATTERN: &str = r"^(js/chunk|common\.js|vendor\.js)";

fn shared_chunk_regex() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(SHARED_CHUNK_PATTERN).expect("invalid shared chunk regex"))
}

/// Excludes shared chunks, which are covered by the workers of the entries that use them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedChunkFilter;

impl SharedChunkFilter {
  /// Returns `true` when `entry_name` names a shared or common chunk.
  pub fn is_shared_chunk(entry_name: &str) -> bool {
    shared_chunk_regex().is_match(entry_name)
  }
}

impl WorkerInclusion for SharedChunkFilter {
  fn is_included(&self, entry_name: &str) -> bool {
    !Self::is_shared_chunk(entry_name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn excludes_shared_chunks() {
    let filter = SharedChunkFilter;

    assert!(!filter.is_included("js/chunk-1.js"));
    assert!(!filter.is_included("js/chunk.vendors.js"));
    assert!(!filter.is_included("common.js"));
    assert!(!filter.is_included("vendor.js"));
  }

  #[test]
  fn keeps_regular_entries() {
    let filter = SharedChunkFilter;

    assert!(filter.is_included("foo.js"));
    assert!(filter.is_included("pages/home.js"));
    assert!(filter.is_included("my-vendor.js"));
    assert!(filter.is_included("commonXjs"));
  }

  #[test]
  fn anchors_at_the_start_only() {
    assert!(SharedChunkFilter::is_shared_chunk("vendor.js.map"));
    assert!(!SharedChunkFilter::is_shared_chunk("app/js/chunk-2.js"));
  }
}
