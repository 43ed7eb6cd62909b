//! Output filesystem used to persist generated scripts.

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Directory creation and file writes on the build output.
pub trait OutputFileSystem {
  /// Create `path` and all of its parents.
  fn create_dir_all(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

  /// Write `contents` to `path`, replacing any existing file.
  fn write_file(&self, path: &Path, contents: &[u8]) -> impl Future<Output = io::Result<()>> + Send;
}

/// Writes to the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl OutputFileSystem for TokioFileSystem {
  async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await
  }

  async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    tokio::fs::write(path, contents).await
  }
}

/// Keeps written files in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
  files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileSystem {
  /// Empty filesystem.
  pub fn new() -> Self {
    Self::default()
  }

  /// Contents written to `path`, if any.
  pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
    self
      .files
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(path)
      .cloned()
  }

  /// Contents written to `path` as UTF-8.
  pub fn read_to_string(&self, path: &Path) -> Option<String> {
    self
      .read(path)
      .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
  }

  /// Every written path, sorted.
  pub fn paths(&self) -> Vec<PathBuf> {
    self
      .files
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .keys()
      .cloned()
      .collect()
  }
}

impl OutputFileSystem for MemoryFileSystem {
  async fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
    Ok(())
  }

  async fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    self
      .files
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(path.to_path_buf(), contents.to_vec());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[tokio::test]
  async fn tokio_filesystem_creates_nested_files() -> io::Result<()> {
    let dir = tempdir()?;
    let target = dir.path().join("nested/dir/sw.js");

    let fs = TokioFileSystem;
    fs.create_dir_all(target.parent().unwrap()).await?;
    fs.write_file(&target, b"self;").await?;

    assert_eq!(std::fs::read_to_string(&target)?, "self;");
    Ok(())
  }

  #[tokio::test]
  async fn memory_filesystem_records_writes() -> io::Result<()> {
    let fs = MemoryFileSystem::new();
    fs.write_file(Path::new("/out/a.js"), b"a").await?;
    fs.write_file(Path::new("/out/a.js"), b"b").await?;

    assert_eq!(fs.read_to_string(Path::new("/out/a.js")).as_deref(), Some("b"));
    assert_eq!(fs.paths(), vec![PathBuf::from("/out/a.js")]);
    Ok(())
  }
}
