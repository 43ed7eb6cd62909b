//! What the bundler reports about a finished build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Output of one bundler run: where files went and which chunks produced them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Compilation {
  /// Directory the bundler emitted into.
  pub output_path: PathBuf,
  /// URL prefix the output directory is served under.
  pub public_path: String,
  /// Compilation hash substituted for `[hash]` in import script filenames.
  pub hash: Option<String>,
  /// Emitted asset names relative to the output directory.
  pub assets: Vec<String>,
  /// Chunk name to the files it produced.
  pub chunks: BTreeMap<String, Vec<String>>,
}

impl Compilation {
  /// Empty compilation rooted at `output_path`.
  pub fn new(output_path: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
    Self {
      output_path: output_path.into(),
      public_path: public_path.into(),
      ..Self::default()
    }
  }

  /// Build a compilation by listing every file already present in `output_path`.
  pub fn scan(output_path: &Path, public_path: &str) -> Result<Self> {
    let pattern = format!(
      "{}/**/*",
      glob::Pattern::escape(&output_path.to_string_lossy())
    );
    let mut assets = Vec::new();

    for entry in glob::glob(&pattern).with_context(|| format!("invalid scan pattern {pattern}"))? {
      let path = entry.with_context(|| format!("failed to scan {}", output_path.display()))?;
      if !path.is_file() {
        continue;
      }
      if let Ok(relative) = path.strip_prefix(output_path) {
        assets.push(relative.to_string_lossy().replace('\\', "/"));
      }
    }

    assets.sort();
    tracing::debug!("found {} emitted assets in {}", assets.len(), output_path.display());

    Ok(Self {
      assets,
      ..Self::new(output_path, public_path)
    })
  }

  /// Read a compilation description from a JSON stats file.
  pub fn from_stats_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
      .with_context(|| format!("failed to parse compilation stats {}", path.display()))
  }

  /// Files produced by `chunk_name`.
  pub fn chunk_files(&self, chunk_name: &str) -> Option<&[String]> {
    self.chunks.get(chunk_name).map(Vec::as_slice)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  #[test]
  fn scan_lists_nested_files_relative_to_output() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("js")).unwrap();
    fs::write(dir.path().join("index.html"), "<html>").unwrap();
    fs::write(dir.path().join("js/app.js"), "app").unwrap();

    let compilation = Compilation::scan(dir.path(), "/").unwrap();
    assert_eq!(compilation.assets, vec!["index.html", "js/app.js"]);
    assert_eq!(compilation.public_path, "/");
  }

  #[test]
  fn reads_stats_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.json");
    fs::write(
      &path,
      r#"{ "outputPath": "/out", "publicPath": "/", "hash": "abc", "chunks": { "runtime": ["runtime.abc.js"] } }"#,
    )
    .unwrap();

    let compilation = Compilation::from_stats_file(&path).unwrap();
    assert_eq!(compilation.hash.as_deref(), Some("abc"));
    assert_eq!(compilation.chunk_files("runtime"), Some(&["runtime.abc.js".to_string()][..]));
    assert!(compilation.assets.is_empty());
  }
}
