//! Plugin options loader describing how worker scripts are derived.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::import_scripts::ImportScript;
use crate::manifest::ManifestSource;
use crate::models::{Diagnostic, RuntimeCachingRule};
use crate::strategy::Strategy;

/// File searched for by [`PluginOptions::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "offline-sw.config.json";

/// Prefix used for worker filenames and cache identifiers when none is configured.
pub const DEFAULT_PREFIX: &str = "sw";

/// Worker filename used by the single strategy when none is configured.
pub const DEFAULT_FILENAME: &str = "service-worker.js";

/// Deprecated pass-through options and their replacements.
const DEPRECATED_OPTIONS: &[(&str, &str)] = &[
  ("stripPrefix", "stripPrefixMulti"),
  ("replacePrefix", "stripPrefixMulti"),
];

/// Options controlling worker derivation. Unknown keys are forwarded to the script generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginOptions {
  /// Prefix for generated filenames and the default cache identifier.
  pub prefix: String,
  /// Dependency manifest; enables manifest mode when it resolves.
  pub manifest: Option<ManifestSource>,
  /// How manifest entries map onto worker scripts.
  pub strategy: Strategy,
  /// Local URLs matching any of these patterns are never precached.
  #[serde(deserialize_with = "deserialize_patterns")]
  pub static_file_globs_ignore_patterns: Vec<Regex>,
  /// Worker filename for the single strategy.
  pub filename: String,
  /// Explicit worker path for the single strategy.
  pub filepath: Option<PathBuf>,
  /// Extra static globs, relative to the output directory unless absolute.
  pub static_file_globs: Vec<String>,
  /// Extra runtime caching rules for the single strategy.
  pub runtime_caching: Vec<RuntimeCachingRule>,
  /// Without a manifest, keep emitted assets alongside explicit `staticFileGlobs`.
  pub merge_statics_config: bool,
  /// Scripts imported by every generated worker.
  pub import_scripts: Vec<ImportScript>,
  /// Additional directory prefixes rewritten to public URLs.
  pub strip_prefix_multi: BTreeMap<String, String>,
  /// Surface deprecation warnings.
  pub debug: bool,
  /// Options forwarded untouched to the script generator.
  #[serde(flatten)]
  pub passthrough: Map<String, Value>,
}

impl Default for PluginOptions {
  fn default() -> Self {
    Self {
      prefix: DEFAULT_PREFIX.into(),
      manifest: None,
      strategy: Strategy::default(),
      static_file_globs_ignore_patterns: Vec::new(),
      filename: DEFAULT_FILENAME.into(),
      filepath: None,
      static_file_globs: Vec::new(),
      runtime_caching: Vec::new(),
      merge_statics_config: false,
      import_scripts: Vec::new(),
      strip_prefix_multi: BTreeMap::new(),
      debug: false,
      passthrough: Map::new(),
    }
  }
}

impl PluginOptions {
  /// Load options from the default file in `project_dir`, falling back to defaults when absent.
  pub fn discover(project_dir: &Path) -> Result<Self, ConfigError> {
    let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
        tracing::debug!("no {} in {}, using defaults", DEFAULT_CONFIG_FILE, project_dir.display());
        Ok(Self::default())
      }
      other => other,
    }
  }

  /// Read options from a JSON (or YAML, by extension) file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let parsed = if is_yaml {
      serde_yaml::from_str::<Self>(&content).map_err(|err| err.to_string())
    } else {
      serde_json::from_str::<Self>(&content).map_err(|err| err.to_string())
    };

    parsed.map_err(|message| ConfigError::Parse {
      path: path.to_path_buf(),
      message,
    })
  }

  /// Compiled ignore patterns.
  pub fn ignore_patterns(&self) -> &[Regex] {
    &self.static_file_globs_ignore_patterns
  }

  /// Base option layer shared by every worker.
  ///
  /// Contains the pass-through options, `cacheId` (defaulting to the prefix), the resolved
  /// import scripts and any configured strip prefixes.
  pub fn worker_defaults(&self, import_scripts: &[String]) -> Value {
    let mut defaults = self.passthrough.clone();

    if !defaults.contains_key("cacheId") {
      defaults.insert("cacheId".into(), Value::String(self.prefix.clone()));
    }
    if !import_scripts.is_empty() {
      defaults.insert(
        "importScripts".into(),
        Value::Array(import_scripts.iter().cloned().map(Value::String).collect()),
      );
    }
    if !self.strip_prefix_multi.is_empty() {
      let prefixes = self
        .strip_prefix_multi
        .iter()
        .map(|(dir, url)| (dir.clone(), Value::String(url.clone())))
        .collect();
      defaults.insert("stripPrefixMulti".into(), Value::Object(prefixes));
    }

    Value::Object(defaults)
  }

  /// Deprecation warnings, only reported when `debug` is enabled.
  pub fn deprecations(&self) -> Vec<Diagnostic> {
    if !self.debug {
      return Vec::new();
    }

    DEPRECATED_OPTIONS
      .iter()
      .filter(|(option, _)| self.passthrough.contains_key(*option))
      .map(|(option, replacement)| Diagnostic::deprecated(*option, *replacement))
      .collect()
  }
}

fn deserialize_patterns<'de, D>(deserializer: D) -> Result<Vec<Regex>, D::Error>
where
  D: Deserializer<'de>,
{
  Vec::<String>::deserialize(deserializer)?
    .iter()
    .map(|source| Regex::new(source).map_err(serde::de::Error::custom))
    .collect()
}
