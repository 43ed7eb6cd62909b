//! Strategy engines turning a manifest into one or many worker configurations.
//!
//! Each engine is a pure function from its inputs to a [`Derivation`]; diagnostics are
//! returned rather than accumulated in shared state.

mod entry;
mod groups;
mod multiple;
mod single;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::compilation::Compilation;
use crate::config::PluginOptions;
use crate::error::DeriveError;
use crate::manifest::Manifest;
use crate::merge::merge_layers;
use crate::models::{Diagnostic, RuntimeCachingRule, WorkerConfig};
use crate::url_paths::PathNormalizer;

pub use entry::{CollectedEntries, EntryOptions, UniqueList, build_entry_options, compile_runtime_rules};
pub use groups::derive_groups;
pub use multiple::{derive_multiple, derive_multiple_with, worker_filename};
pub use single::{
  derive_single, derive_single_from_assets, single_entries_from_compilation, single_entries_from_manifest,
};

/// How manifest entries map onto generated worker scripts.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Strategy {
  /// One worker for the whole build.
  #[default]
  Single,
  /// One worker per dependency entry, shared chunks excluded.
  Multiple,
  /// One worker per declared group.
  Groups(Vec<GroupDescriptor>),
}

impl<'de> Deserialize<'de> for Strategy {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawStrategy {
      Keyword(String),
      Groups(Vec<GroupDescriptor>),
    }

    match RawStrategy::deserialize(deserializer)? {
      RawStrategy::Keyword(keyword) => match keyword.as_str() {
        "single" => Ok(Self::Single),
        "multiple" => Ok(Self::Multiple),
        other => Err(serde::de::Error::custom(format!(
          "unknown strategy '{other}', expected 'single', 'multiple' or a list of groups"
        ))),
      },
      RawStrategy::Groups(groups) => Ok(Self::Groups(groups)),
    }
  }
}

/// A named worker aggregating one or more dependency entries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupDescriptor {
  /// Worker name; `.js` is appended when missing.
  pub name: String,
  /// Dependency entry names; `.js` is appended when missing.
  pub entry: EntryList,
  /// Options applied to this worker only, below the derived fields.
  #[serde(default)]
  pub options: Option<Map<String, Value>>,
}

/// One entry name or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EntryList {
  /// A single entry name.
  One(String),
  /// Several entry names.
  Many(Vec<String>),
}

impl EntryList {
  /// Entry names in declaration order.
  pub fn names(&self) -> Vec<&str> {
    match self {
      Self::One(name) => vec![name.as_str()],
      Self::Many(names) => names.iter().map(String::as_str).collect(),
    }
  }
}

/// Worker configurations derived for a build, with any diagnostics raised on the way.
#[derive(Debug, Clone, Default)]
pub struct Derivation {
  /// One configuration per worker script.
  pub configs: Vec<WorkerConfig>,
  /// Non-fatal findings.
  pub diagnostics: Vec<Diagnostic>,
}

impl Derivation {
  /// Returns `true` when any diagnostic is an error.
  pub fn has_errors(&self) -> bool {
    self.diagnostics.iter().any(Diagnostic::is_error)
  }
}

/// Inputs shared by every strategy engine.
#[derive(Debug)]
pub struct StrategyContext<'a> {
  /// Plugin options.
  pub options: &'a PluginOptions,
  /// Normaliser bound to the output directory and the effective public path.
  pub normalizer: PathNormalizer,
  /// Base option layer shared by all workers.
  pub defaults: Value,
}

impl<'a> StrategyContext<'a> {
  /// Context for the given options and normaliser.
  pub fn new(options: &'a PluginOptions, normalizer: PathNormalizer, import_scripts: &[String]) -> Self {
    let defaults = options.worker_defaults(import_scripts);
    Self {
      options,
      normalizer,
      defaults,
    }
  }

  /// Absolute worker path for a filename inside the output directory.
  pub fn worker_path(&self, filename: &str) -> PathBuf {
    self.normalizer.resolve(filename)
  }
}

/// Fields every strategy derives for a worker. Serialised as the last merge layer.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct DerivedFields {
  #[serde(skip_serializing_if = "Option::is_none")]
  filepath: Option<PathBuf>,
  static_file_globs: Vec<PathBuf>,
  runtime_caching: Vec<RuntimeCachingRule>,
  strip_prefix_multi: BTreeMap<String, String>,
}

fn filepath_layer(filepath: PathBuf) -> Value {
  let mut layer = Map::new();
  layer.insert(
    "filepath".into(),
    Value::String(filepath.to_string_lossy().into_owned()),
  );
  Value::Object(layer)
}

fn assemble_worker(source_name: &str, layers: &[&Value]) -> Result<WorkerConfig, DeriveError> {
  let merged = merge_layers(layers.iter().copied());
  let mut config: WorkerConfig = serde_json::from_value(merged)?;
  config.source_name = source_name.to_string();
  Ok(config)
}

/// Derive worker configurations for a build.
///
/// With a manifest, its public path wins and the configured strategy is used; a manifest
/// without a `deps` container falls back to the single strategy. Without a manifest, a
/// single worker covering the compilation's emitted assets is derived.
pub fn derive_workers(
  options: &PluginOptions,
  manifest: Option<&Manifest>,
  compilation: &Compilation,
  import_scripts: &[String],
) -> Result<Derivation, DeriveError> {
  let Some(manifest) = manifest else {
    let normalizer = PathNormalizer::new(&compilation.output_path, compilation.public_path.as_str());
    let context = StrategyContext::new(options, normalizer, import_scripts);
    let entries = single_entries_from_compilation(options, compilation);
    return derive_single_from_assets(&context, &entries);
  };

  let normalizer = PathNormalizer::new(&compilation.output_path, manifest.public_path());
  let context = StrategyContext::new(options, normalizer, import_scripts);

  match (&options.strategy, manifest.deps()) {
    (Strategy::Single, _) => derive_single(&context, &single_entries_from_manifest(manifest)),
    (Strategy::Multiple, Some(deps)) => derive_multiple(&context, deps),
    (Strategy::Groups(groups), Some(deps)) => derive_groups(&context, deps, groups),
    (_, None) => {
      tracing::debug!("manifest has no deps container, deriving a single worker");
      let mut derivation = derive_single(&context, &single_entries_from_manifest(manifest))?;
      derivation.diagnostics.push(Diagnostic::missing_deps());
      Ok(derivation)
    }
  }
}
