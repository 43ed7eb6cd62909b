//! Generate and write worker scripts, then persist the aggregate worker manifest.
//!
//! Every worker is generated and written concurrently. The aggregate manifest is written
//! once, after all workers succeed; the first failure aborts the step.

mod fs;
mod generator;

use std::path::{Path, PathBuf};

use futures::future::try_join_all;

use crate::error::EmitError;
use crate::models::{ServiceWorkerManifest, WorkerConfig};

pub use fs::{MemoryFileSystem, OutputFileSystem, TokioFileSystem};
pub use generator::{DEFAULT_CACHE_NAME, PrecacheScriptGenerator, ScriptGenerator, public_url};

/// Where the worker scripts of a build are published.
#[derive(Debug, Clone)]
pub struct EmitTarget<'a> {
  /// Absolute output directory.
  pub output_path: &'a Path,
  /// Prefix used in the aggregate manifest name.
  pub prefix: &'a str,
  /// Public path recorded for every worker.
  pub public_path: &'a str,
}

/// Result of a successful emit step.
#[derive(Debug, Clone)]
pub struct EmitReport {
  /// Aggregate manifest that was written.
  pub manifest: ServiceWorkerManifest,
  /// Path of the aggregate manifest.
  pub manifest_path: PathBuf,
  /// Worker scripts written, in configuration order.
  pub written: Vec<PathBuf>,
}

/// Generate every worker, write them, then write `<prefix>-manifest.json`.
pub async fn emit_workers<G, F>(
  configs: &[WorkerConfig],
  target: &EmitTarget<'_>,
  generator: &G,
  fs: &F,
) -> Result<EmitReport, EmitError>
where
  G: ScriptGenerator,
  F: OutputFileSystem,
{
  let jobs = configs.iter().map(|config| write_worker(config, generator, fs));
  let written = try_join_all(jobs).await?;

  let mut manifest = ServiceWorkerManifest::new(target.prefix, target.public_path);
  for config in configs {
    manifest.insert(config.source_name.as_str(), &config.target_filename(target.output_path));
  }

  let manifest_path = target
    .output_path
    .join(ServiceWorkerManifest::file_name(target.prefix));
  let json = serde_json::to_string_pretty(&manifest)?;

  fs.create_dir_all(target.output_path)
    .await
    .map_err(|source| EmitError::CreateDir {
      path: target.output_path.to_path_buf(),
      source,
    })?;
  fs.write_file(&manifest_path, json.as_bytes())
    .await
    .map_err(|source| EmitError::Write {
      path: manifest_path.clone(),
      source,
    })?;
  tracing::info!("wrote worker manifest {}", manifest_path.display());

  Ok(EmitReport {
    manifest,
    manifest_path,
    written,
  })
}

async fn write_worker<G, F>(config: &WorkerConfig, generator: &G, fs: &F) -> Result<PathBuf, EmitError>
where
  G: ScriptGenerator,
  F: OutputFileSystem,
{
  let script = generator
    .generate(config)
    .await
    .map_err(|source| EmitError::Generate {
      filepath: config.filepath.clone(),
      source,
    })?;

  if let Some(parent) = config.filepath.parent() {
    fs.create_dir_all(parent)
      .await
      .map_err(|source| EmitError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
  }

  fs.write_file(&config.filepath, script.as_bytes())
    .await
    .map_err(|source| EmitError::Write {
      path: config.filepath.clone(),
      source,
    })?;

  tracing::info!(
    "wrote worker {} ({} static globs, {} runtime rules)",
    config.filepath.display(),
    config.static_file_globs.len(),
    config.runtime_caching.len()
  );
  Ok(config.filepath.clone())
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::{Result, anyhow};
  use serde_json::json;

  struct EchoGenerator;

  impl ScriptGenerator for EchoGenerator {
    async fn generate(&self, config: &WorkerConfig) -> Result<String> {
      Ok(format!("// {}", config.source_name))
    }
  }

  struct FailingGenerator;

  impl ScriptGenerator for FailingGenerator {
    async fn generate(&self, config: &WorkerConfig) -> Result<String> {
      if config.source_name == "bad.js" {
        Err(anyhow!("unreadable asset"))
      } else {
        Ok(String::new())
      }
    }
  }

  fn config(source_name: &str, filepath: &str) -> WorkerConfig {
    let mut config: WorkerConfig = serde_json::from_value(json!({ "filepath": filepath })).unwrap();
    config.source_name = source_name.to_string();
    config
  }

  fn target() -> EmitTarget<'static> {
    EmitTarget {
      output_path: Path::new("/out"),
      prefix: "sw",
      public_path: "/static/",
    }
  }

  #[tokio::test]
  async fn writes_workers_and_aggregate_manifest() {
    let fs = MemoryFileSystem::new();
    let configs = vec![config("foo.js", "/out/sw-foo.js"), config("bar.js", "/out/sw-bar.js")];

    let report = emit_workers(&configs, &target(), &EchoGenerator, &fs).await.unwrap();

    assert_eq!(report.written, vec![
      PathBuf::from("/out/sw-foo.js"),
      PathBuf::from("/out/sw-bar.js")
    ]);
    assert_eq!(fs.read_to_string(Path::new("/out/sw-foo.js")).as_deref(), Some("// foo.js"));
    assert_eq!(report.manifest_path, PathBuf::from("/out/sw-manifest.json"));

    let written: serde_json::Value =
      serde_json::from_str(&fs.read_to_string(&report.manifest_path).unwrap()).unwrap();
    assert_eq!(
      written,
      json!({
        "config": { "prefix": "sw", "publicPath": "/static/" },
        "foo.js": "/static/sw-foo.js",
        "bar.js": "/static/sw-bar.js"
      })
    );
  }

  #[tokio::test]
  async fn first_failure_aborts_without_manifest() {
    let fs = MemoryFileSystem::new();
    let configs = vec![config("good.js", "/out/sw-good.js"), config("bad.js", "/out/sw-bad.js")];

    let error = emit_workers(&configs, &target(), &FailingGenerator, &fs)
      .await
      .unwrap_err();

    assert!(matches!(error, EmitError::Generate { ref filepath, .. } if filepath == Path::new("/out/sw-bad.js")));
    assert!(fs.read(Path::new("/out/sw-manifest.json")).is_none());
  }

  #[tokio::test]
  async fn empty_builds_still_write_the_manifest() {
    let fs = MemoryFileSystem::new();
    let report = emit_workers(&[], &target(), &EchoGenerator, &fs).await.unwrap();

    assert!(report.written.is_empty());
    assert!(report.manifest.workers.is_empty());
    assert!(fs.read(&report.manifest_path).is_some());
  }
}
