//! Data structures produced while deriving and emitting worker scripts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request strategy applied by a runtime caching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheHandler {
  /// Try the network, fall back to the cache.
  NetworkFirst,
  /// Serve from cache, fall back to the network.
  CacheFirst,
  /// Race cache and network, answering with whichever is first.
  Fastest,
  /// Only ever answer from the cache.
  CacheOnly,
  /// Never use the cache.
  NetworkOnly,
}

/// Pattern-based rule for requests that are cached when they happen rather than precached.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeCachingRule {
  /// Request URL pattern.
  #[serde(with = "pattern_serde")]
  pub url_pattern: Regex,
  /// Strategy applied to matching requests.
  pub handler: CacheHandler,
  /// Handler options forwarded untouched to the generator.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Value>,
}

impl RuntimeCachingRule {
  /// Rule answering requests for a remote URL with the `fastest` handler.
  pub fn fastest(url: &str) -> Result<Self, regex::Error> {
    Ok(Self {
      url_pattern: Regex::new(url)?,
      handler: CacheHandler::Fastest,
      options: None,
    })
  }
}

impl PartialEq for RuntimeCachingRule {
  fn eq(&self, other: &Self) -> bool {
    self.url_pattern.as_str() == other.url_pattern.as_str()
      && self.handler == other.handler
      && self.options == other.options
  }
}

mod pattern_serde {
  use regex::Regex;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(pattern: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(pattern.as_str())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
    let source = String::deserialize(deserializer)?;
    Regex::new(&source).map_err(serde::de::Error::custom)
  }
}

/// Final options for one generated worker script.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerConfig {
  /// Name the worker is recorded under in the aggregate manifest.
  #[serde(skip)]
  pub source_name: String,
  /// Absolute path the generated script is written to.
  pub filepath: PathBuf,
  /// Absolute paths (or globs) of files to precache.
  #[serde(default)]
  pub static_file_globs: Vec<PathBuf>,
  /// Runtime caching rules for remote URLs.
  #[serde(default)]
  pub runtime_caching: Vec<RuntimeCachingRule>,
  /// Directory prefixes rewritten into public URLs.
  #[serde(default)]
  pub strip_prefix_multi: BTreeMap<String, String>,
  /// Remaining options passed through to the script generator.
  #[serde(flatten)]
  pub options: Map<String, Value>,
}

impl WorkerConfig {
  /// Script filename relative to the output directory, using forward slashes.
  pub fn target_filename(&self, output_path: &Path) -> String {
    let relative = self
      .filepath
      .strip_prefix(output_path)
      .unwrap_or(self.filepath.as_path());
    relative.to_string_lossy().replace('\\', "/")
  }

  /// Cache identifier forwarded to the generator, if any.
  pub fn cache_id(&self) -> Option<&str> {
    self.options.get("cacheId").and_then(Value::as_str)
  }

  /// Scripts the worker imports at startup.
  pub fn import_scripts(&self) -> Vec<String> {
    self
      .options
      .get("importScripts")
      .and_then(Value::as_array)
      .map(|scripts| {
        scripts
          .iter()
          .filter_map(Value::as_str)
          .map(str::to_string)
          .collect()
      })
      .unwrap_or_default()
  }
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
  /// Reported, does not affect the build.
  Warning,
  /// Reported as a build error; other workers still derive.
  Error,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagnosticKind {
  /// A group entry or import script names a chunk that does not exist.
  #[serde(rename_all = "camelCase")]
  ChunkNotFound {
    /// Name that was looked up.
    reference: String,
    /// Worker or option that referenced it.
    referenced_by: String,
  },
  /// An import script names both a filename and a chunk.
  #[serde(rename_all = "camelCase")]
  ConflictingReference {
    /// Filename that was overridden.
    filename: String,
    /// Chunk name used instead.
    chunk_name: String,
  },
  /// A deprecated option is still configured.
  #[serde(rename_all = "camelCase")]
  Deprecated {
    /// Deprecated option key.
    option: String,
    /// Suggested replacement.
    replacement: String,
  },
  /// The group strategy was selected but the manifest has no `deps` container.
  MissingDeps,
}

/// Non-fatal finding returned alongside derived configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
  /// Severity of the finding.
  pub severity: Severity,
  /// Details of the finding.
  #[serde(flatten)]
  pub kind: DiagnosticKind,
}

impl Diagnostic {
  /// Error for a reference to a chunk that is not in the manifest or compilation.
  pub fn chunk_not_found(reference: impl Into<String>, referenced_by: impl Into<String>) -> Self {
    Self {
      severity: Severity::Error,
      kind: DiagnosticKind::ChunkNotFound {
        reference: reference.into(),
        referenced_by: referenced_by.into(),
      },
    }
  }

  /// Warning for an import script carrying both a filename and a chunk name.
  pub fn conflicting_reference(filename: impl Into<String>, chunk_name: impl Into<String>) -> Self {
    Self {
      severity: Severity::Warning,
      kind: DiagnosticKind::ConflictingReference {
        filename: filename.into(),
        chunk_name: chunk_name.into(),
      },
    }
  }

  /// Warning for a deprecated option.
  pub fn deprecated(option: impl Into<String>, replacement: impl Into<String>) -> Self {
    Self {
      severity: Severity::Warning,
      kind: DiagnosticKind::Deprecated {
        option: option.into(),
        replacement: replacement.into(),
      },
    }
  }

  /// Warning for a group strategy without dependency records.
  pub fn missing_deps() -> Self {
    Self {
      severity: Severity::Warning,
      kind: DiagnosticKind::MissingDeps,
    }
  }

  /// Returns `true` for error diagnostics.
  pub fn is_error(&self) -> bool {
    self.severity == Severity::Error
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      DiagnosticKind::ChunkNotFound {
        reference,
        referenced_by,
      } => write!(f, "chunk '{reference}' referenced by '{referenced_by}' was not found"),
      DiagnosticKind::ConflictingReference {
        filename,
        chunk_name,
      } => write!(
        f,
        "import script '{filename}' also names chunk '{chunk_name}'; using the chunk"
      ),
      DiagnosticKind::Deprecated {
        option,
        replacement,
      } => write!(f, "option '{option}' is deprecated, use '{replacement}' instead"),
      DiagnosticKind::MissingDeps => write!(
        f,
        "manifest has no deps container; falling back to a single worker"
      ),
    }
  }
}

/// Prefix and public path recorded in the aggregate manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerManifestConfig {
  /// Prefix used for worker filenames.
  pub prefix: String,
  /// Public path the workers are served from.
  pub public_path: String,
}

/// Aggregate manifest mapping each source entry to the public URL of its worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceWorkerManifest {
  /// Build level settings.
  pub config: WorkerManifestConfig,
  /// Source name to worker URL.
  #[serde(flatten)]
  pub workers: BTreeMap<String, String>,
}

impl ServiceWorkerManifest {
  /// Empty manifest for a build.
  pub fn new(prefix: impl Into<String>, public_path: impl Into<String>) -> Self {
    Self {
      config: WorkerManifestConfig {
        prefix: prefix.into(),
        public_path: public_path.into(),
      },
      workers: BTreeMap::new(),
    }
  }

  /// Record a written worker.
  pub fn insert(&mut self, source_name: impl Into<String>, target_filename: &str) {
    let url = format!("{}{}", self.config.public_path, target_filename);
    self.workers.insert(source_name.into(), url);
  }

  /// File name of the aggregate manifest for `prefix`.
  pub fn file_name(prefix: &str) -> String {
    format!("{prefix}-manifest.json")
  }
}
