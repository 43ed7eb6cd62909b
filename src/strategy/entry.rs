//! Partition one dependency record into precached paths and runtime URLs.

use std::collections::BTreeSet;
use std::path::PathBuf;

use regex::Regex;

use crate::error::DeriveError;
use crate::manifest::DependencyRecord;
use crate::models::RuntimeCachingRule;
use crate::url_paths::{PathNormalizer, is_cache_static_file, is_http_or_https};

/// Static paths and raw runtime URLs produced for one dependency record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryOptions {
  /// Absolute paths of local files to precache, in input order.
  pub static_file_globs: Vec<PathBuf>,
  /// Remote URLs to cache at runtime, in input order and not yet compiled.
  pub runtime_caching: Vec<String>,
}

/// Walk `record.css` then `record.js`, routing each URL to runtime caching or precaching.
///
/// URLs rejected by an ignore pattern are dropped. No deduplication happens here.
pub fn build_entry_options(
  record: &DependencyRecord,
  normalizer: &PathNormalizer,
  ignore_patterns: &[Regex],
) -> EntryOptions {
  let mut options = EntryOptions::default();

  for url in record.urls() {
    if is_http_or_https(url) {
      options.runtime_caching.push(url.to_string());
    } else if is_cache_static_file(url, ignore_patterns) {
      options.static_file_globs.push(normalizer.normalize_path(url));
    }
  }

  options
}

/// Insertion-ordered collection that ignores values it has already seen.
#[derive(Debug, Clone)]
pub struct UniqueList<T> {
  seen: BTreeSet<T>,
  items: Vec<T>,
}

impl<T: Ord + Clone> UniqueList<T> {
  /// Empty list.
  pub fn new() -> Self {
    Self {
      seen: BTreeSet::new(),
      items: Vec::new(),
    }
  }

  /// Append `item` unless it is already present. Returns `true` when it was added.
  pub fn push(&mut self, item: T) -> bool {
    if self.seen.insert(item.clone()) {
      self.items.push(item);
      true
    } else {
      false
    }
  }

  /// Items in first-seen order.
  pub fn as_slice(&self) -> &[T] {
    &self.items
  }

  /// Consume the list, returning items in first-seen order.
  pub fn into_vec(self) -> Vec<T> {
    self.items
  }
}

impl<T: Ord + Clone> Default for UniqueList<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Ord + Clone> Extend<T> for UniqueList<T> {
  fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
    for item in iter {
      self.push(item);
    }
  }
}

/// Entry options accumulated across one or more records, deduplicated.
#[derive(Debug, Clone, Default)]
pub struct CollectedEntries {
  static_file_globs: UniqueList<PathBuf>,
  runtime_urls: UniqueList<String>,
}

impl CollectedEntries {
  /// Add the lists produced for one record.
  pub fn add(&mut self, options: EntryOptions) {
    self.static_file_globs.extend(options.static_file_globs);
    self.runtime_urls.extend(options.runtime_caching);
  }

  /// Add a single static path.
  pub fn add_static(&mut self, path: PathBuf) {
    self.static_file_globs.push(path);
  }

  /// Add a single runtime URL.
  pub fn add_runtime(&mut self, url: impl Into<String>) {
    self.runtime_urls.push(url.into());
  }

  /// Deduplicated static paths and runtime rules compiled from the deduplicated URLs.
  pub fn finish(self) -> Result<(Vec<PathBuf>, Vec<RuntimeCachingRule>), DeriveError> {
    let rules = compile_runtime_rules(self.runtime_urls.as_slice())?;
    Ok((self.static_file_globs.into_vec(), rules))
  }
}

/// Compile raw URLs into `fastest` runtime caching rules.
pub fn compile_runtime_rules(urls: &[String]) -> Result<Vec<RuntimeCachingRule>, DeriveError> {
  urls
    .iter()
    .map(|url| {
      RuntimeCachingRule::fastest(url).map_err(|source| DeriveError::InvalidPattern {
        url: url.clone(),
        source,
      })
    })
    .collect()
}
