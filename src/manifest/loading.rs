//! Resolve the configured manifest into a parsed [`Manifest`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::ManifestError;
use crate::manifest::model::Manifest;

/// Where the dependency manifest comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestSource {
  /// Absolute path, or path relative to the project directory.
  Path(PathBuf),
  /// Manifest already present in the options.
  Inline(Manifest),
}

/// Load the manifest described by `source`.
///
/// A path that does not exist yields `Ok(None)`, which callers treat as "manifest mode
/// disabled" so projects without a manifest keep building a single worker.
pub fn normalize_manifest(
  source: &ManifestSource,
  base_dir: &Path,
) -> Result<Option<Manifest>, ManifestError> {
  match source {
    ManifestSource::Inline(manifest) => Ok(Some(manifest.clone())),
    ManifestSource::Path(path) => {
      let resolved = if path.is_absolute() {
        path.clone()
      } else {
        base_dir.join(path)
      };
      load_manifest(&resolved)
    }
  }
}

/// Read and parse a manifest file. JSON is expected unless the extension says YAML.
pub fn load_manifest(path: &Path) -> Result<Option<Manifest>, ManifestError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(err) if err.kind() == ErrorKind::NotFound => {
      tracing::debug!("manifest {} not found, manifest mode disabled", path.display());
      return Ok(None);
    }
    Err(err) => {
      return Err(ManifestError::Read {
        path: path.to_path_buf(),
        source: err,
      });
    }
  };

  let value = parse_document(path, &content)?;
  let manifest = Manifest::from_value(value)?;
  tracing::debug!(
    "loaded manifest {} with {} entries",
    path.display(),
    manifest.entries().count()
  );
  Ok(Some(manifest))
}

fn parse_document(path: &Path, content: &str) -> Result<Value, ManifestError> {
  let is_yaml = path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

  let parsed = if is_yaml {
    serde_yaml::from_str::<Value>(content).map_err(|err| err.to_string())
  } else {
    serde_json::from_str::<Value>(content).map_err(|err| err.to_string())
  };

  parsed.map_err(|message| ManifestError::Parse {
    path: path.to_path_buf(),
    message,
  })
}
