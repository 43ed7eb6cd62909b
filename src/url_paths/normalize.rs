use std::collections::BTreeMap;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

use regex::Regex;

fn url_origin_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^(?:https?:)?//[^/]*").expect("invalid URL origin regex"))
}

/// Reduce an absolute public URL to its path component.
///
/// `https://cdn.example.com/static/` becomes `/static/`, a bare origin becomes `/`, and any
/// value that is not an absolute URL is returned unchanged.
pub fn normalize_public_path(public_path: &str) -> String {
  let Some(origin) = url_origin_pattern().find(public_path) else {
    return public_path.to_string();
  };

  let path = &public_path[origin.end()..];
  if path.starts_with('/') {
    path.to_string()
  } else {
    format!("/{path}")
  }
}

/// Rewrites manifest URLs into absolute paths inside the build output directory.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
  output_path: PathBuf,
  public_path: String,
  public_path_only: Option<String>,
}

impl PathNormalizer {
  /// Create a normaliser for the given output directory and public path.
  pub fn new(output_path: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
    let output_path = output_path.into();
    let output_path = std::path::absolute(&output_path).unwrap_or(output_path);
    let public_path = public_path.into();
    let path_only = normalize_public_path(&public_path);
    let public_path_only = (path_only != public_path).then_some(path_only);

    Self {
      output_path: lexical_normalize(&output_path),
      public_path,
      public_path_only,
    }
  }

  /// Absolute build output directory.
  pub fn output_path(&self) -> &Path {
    &self.output_path
  }

  /// Public path exactly as configured.
  pub fn public_path(&self) -> &str {
    &self.public_path
  }

  /// Strip the public path from `url` and resolve the remainder against the output directory.
  pub fn normalize_path(&self, url: &str) -> PathBuf {
    self.resolve(self.strip_public_path(url))
  }

  /// Sequence form of [`PathNormalizer::normalize_path`].
  pub fn normalize_paths<'a, I>(&self, urls: I) -> Vec<PathBuf>
  where
    I: IntoIterator<Item = &'a str>,
  {
    urls.into_iter().map(|url| self.normalize_path(url)).collect()
  }

  /// Resolve a value against the output directory without touching the public path.
  pub fn resolve(&self, value: impl AsRef<Path>) -> PathBuf {
    lexical_normalize(&self.output_path.join(value))
  }

  /// Mapping from the output directory (with a trailing separator) to the public path.
  pub fn strip_prefix_multi(&self) -> BTreeMap<String, String> {
    let mut dir = self.output_path.to_string_lossy().into_owned();
    if !dir.ends_with(MAIN_SEPARATOR) {
      dir.push(MAIN_SEPARATOR);
    }

    BTreeMap::from([(dir, self.public_path.clone())])
  }

  fn strip_public_path<'u>(&self, url: &'u str) -> &'u str {
    if !self.public_path.is_empty() {
      if let Some(rest) = url.strip_prefix(self.public_path.as_str()) {
        return rest;
      }
    }

    if let Some(path_only) = self.public_path_only.as_deref() {
      if let Some(rest) = url.strip_prefix(path_only) {
        return rest;
      }
    }

    url
  }
}

/// Fold `.` and `..` components without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();

  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        normalized.pop();
      }
      other => normalized.push(other.as_os_str()),
    }
  }

  normalized
}
