//! Build orchestrator: load the manifest, derive worker configurations and emit them.

use std::path::{Path, PathBuf};

use crate::compilation::Compilation;
use crate::config::PluginOptions;
use crate::emit::{EmitReport, EmitTarget, OutputFileSystem, ScriptGenerator, emit_workers};
use crate::error::{BuildError, DeriveError};
use crate::import_scripts::resolve_import_scripts;
use crate::manifest::normalize_manifest;
use crate::models::Diagnostic;
use crate::strategy::{Derivation, derive_workers};
use crate::url_paths::lexical_normalize;

/// Worker configurations ready to emit, with the settings they were derived under.
#[derive(Debug, Clone)]
pub struct WorkerPlan {
  /// Derived configurations and diagnostics.
  pub derivation: Derivation,
  /// Public path the workers are served from.
  pub public_path: String,
  /// Absolute output directory.
  pub output_path: PathBuf,
}

/// Outcome of a full build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
  /// What was written.
  pub report: EmitReport,
  /// Diagnostics raised while deriving.
  pub diagnostics: Vec<Diagnostic>,
}

/// High-level helper deriving and emitting the worker scripts of one build.
pub struct OfflineWorkerBuilder<'a> {
  options: &'a PluginOptions,
  compilation: &'a Compilation,
  project_dir: &'a Path,
}

impl<'a> OfflineWorkerBuilder<'a> {
  /// Create a builder. Relative manifest paths resolve against `project_dir`.
  pub fn new(options: &'a PluginOptions, compilation: &'a Compilation, project_dir: &'a Path) -> Self {
    Self {
      options,
      compilation,
      project_dir,
    }
  }

  /// Load the manifest and derive every worker configuration.
  pub fn plan(&self) -> Result<WorkerPlan, DeriveError> {
    let manifest = match &self.options.manifest {
      Some(source) => normalize_manifest(source, self.project_dir)?,
      None => None,
    };

    let public_path = manifest
      .as_ref()
      .map(|manifest| manifest.public_path().to_string())
      .unwrap_or_else(|| self.compilation.public_path.clone());

    let imports = resolve_import_scripts(&self.options.import_scripts, self.compilation, &public_path);
    let derived = derive_workers(self.options, manifest.as_ref(), self.compilation, &imports.urls)?;

    let mut diagnostics = self.options.deprecations();
    diagnostics.extend(imports.diagnostics);
    diagnostics.extend(derived.diagnostics);
    report_diagnostics(&diagnostics);

    let output_path = std::path::absolute(&self.compilation.output_path)
      .unwrap_or_else(|_| self.compilation.output_path.clone());

    Ok(WorkerPlan {
      derivation: Derivation {
        configs: derived.configs,
        diagnostics,
      },
      public_path,
      output_path: lexical_normalize(&output_path),
    })
  }

  /// Derive, generate and write every worker, then the aggregate manifest.
  pub async fn build<G, F>(&self, generator: &G, fs: &F) -> Result<BuildOutcome, BuildError>
  where
    G: ScriptGenerator,
    F: OutputFileSystem,
  {
    let plan = self.plan()?;
    let target = EmitTarget {
      output_path: &plan.output_path,
      prefix: &self.options.prefix,
      public_path: &plan.public_path,
    };

    let report = emit_workers(&plan.derivation.configs, &target, generator, fs).await?;

    Ok(BuildOutcome {
      report,
      diagnostics: plan.derivation.diagnostics,
    })
  }
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
  for diagnostic in diagnostics {
    if diagnostic.is_error() {
      tracing::error!("{}", diagnostic);
    } else {
      tracing::warn!("{}", diagnostic);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::emit::{MemoryFileSystem, PrecacheScriptGenerator, TokioFileSystem};
  use crate::test_utils::init_test_logging;
  use serde_json::json;
  use std::fs;
  use tempfile::tempdir;

  fn options(value: serde_json::Value) -> PluginOptions {
    init_test_logging();
    serde_json::from_value(value).unwrap()
  }

  #[tokio::test]
  async fn multiple_strategy_end_to_end() {
    let project = tempdir().unwrap();
    let output = project.path().join("dist");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("foo.abc123.js"), "foo").unwrap();
    fs::write(
      project.path().join("manifest.json"),
      r#"{ "info": { "publicPath": "/" }, "deps": { "foo.js": { "css": [], "js": ["/foo.abc123.js"] } } }"#,
    )
    .unwrap();

    let options = options(json!({ "manifest": "manifest.json", "strategy": "multiple", "prefix": "sw" }));
    let compilation = Compilation::new(&output, "/");
    let builder = OfflineWorkerBuilder::new(&options, &compilation, project.path());

    let plan = builder.plan().unwrap();
    assert_eq!(plan.derivation.configs.len(), 1);
    assert_eq!(plan.derivation.configs[0].static_file_globs, vec![
      plan.output_path.join("foo.abc123.js")
    ]);

    let outcome = builder
      .build(&PrecacheScriptGenerator, &TokioFileSystem)
      .await
      .unwrap();

    assert!(output.join("sw-foo.js").exists());
    let script = fs::read_to_string(output.join("sw-foo.js")).unwrap();
    assert!(script.contains(r#""/foo.abc123.js""#));

    let manifest: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(output.join("sw-manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["foo.js"], "/sw-foo.js");
    assert_eq!(manifest["config"]["prefix"], "sw");
    assert!(outcome.diagnostics.is_empty());
  }

  #[tokio::test]
  async fn missing_manifest_file_builds_single_worker() {
    let project = tempdir().unwrap();
    let options = options(json!({ "manifest": "absent.json", "strategy": "multiple" }));
    let compilation = Compilation {
      assets: vec!["app.js".into()],
      ..Compilation::new(project.path(), "/assets/")
    };
    let fs = MemoryFileSystem::new();

    let outcome = OfflineWorkerBuilder::new(&options, &compilation, project.path())
      .build(&crate::emit::PrecacheScriptGenerator, &fs)
      .await
      .unwrap();

    assert_eq!(outcome.report.written.len(), 1);
    assert!(outcome.report.written[0].ends_with("service-worker.js"));
    assert_eq!(
      outcome.report.manifest.workers["service-worker.js"],
      "/assets/service-worker.js"
    );
  }

  #[test]
  fn plan_collects_all_diagnostics() {
    let project = tempdir().unwrap();
    let options = options(json!({
      "debug": true,
      "stripPrefix": "/old/",
      "importScripts": [{ "chunkName": "runtime" }],
      "manifest": {
        "info": { "publicPath": "/" },
        "deps": { "main.js": { "js": ["/main.js"] } }
      },
      "strategy": [{ "name": "app", "entry": ["main", "missing"] }]
    }));
    let compilation = Compilation::new(project.path(), "/");

    let plan = OfflineWorkerBuilder::new(&options, &compilation, project.path())
      .plan()
      .unwrap();

    assert_eq!(plan.derivation.configs.len(), 1);
    assert_eq!(plan.derivation.diagnostics, vec![
      Diagnostic::deprecated("stripPrefix", "stripPrefixMulti"),
      Diagnostic::chunk_not_found("runtime", "importScripts"),
      Diagnostic::chunk_not_found("missing.js", "sw-app.js"),
    ]);
  }

  #[test]
  fn malformed_manifest_is_an_error() {
    let project = tempdir().unwrap();
    fs::write(project.path().join("manifest.json"), r#"{ "deps": {} }"#).unwrap();
    let options = options(json!({ "manifest": "manifest.json" }));
    let compilation = Compilation::new(project.path(), "/");

    let result = OfflineWorkerBuilder::new(&options, &compilation, project.path()).plan();
    assert!(matches!(result, Err(DeriveError::Manifest(_))));
  }
}
