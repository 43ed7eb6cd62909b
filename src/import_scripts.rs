//! Resolve `importScripts` options into public URLs.

use serde::Deserialize;

use crate::compilation::Compilation;
use crate::models::Diagnostic;
use crate::url_paths::is_http_or_https;

/// Placeholder replaced by the compilation hash in import script filenames.
pub const HASH_PLACEHOLDER: &str = "[hash]";

/// A script imported by every generated worker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImportScript {
  /// Plain filename or URL.
  Filename(String),
  /// Reference by filename and/or chunk name.
  #[serde(rename_all = "camelCase")]
  Reference {
    /// Filename or URL, may contain `[hash]`.
    #[serde(default)]
    filename: Option<String>,
    /// Bundler chunk whose first script is imported.
    #[serde(default)]
    chunk_name: Option<String>,
  },
}

/// Resolved import script URLs and the diagnostics raised while resolving them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedImports {
  /// Public URLs in configuration order.
  pub urls: Vec<String>,
  /// Missing chunks and conflicting references.
  pub diagnostics: Vec<Diagnostic>,
}

/// Resolve every import script against the compilation.
pub fn resolve_import_scripts(
  scripts: &[ImportScript],
  compilation: &Compilation,
  public_path: &str,
) -> ResolvedImports {
  let mut resolved = ResolvedImports::default();

  for script in scripts {
    let (filename, chunk_name) = match script {
      ImportScript::Filename(filename) => (Some(filename.as_str()), None),
      ImportScript::Reference {
        filename,
        chunk_name,
      } => (filename.as_deref(), chunk_name.as_deref()),
    };

    match (filename, chunk_name) {
      (_, Some(chunk_name)) => {
        if let Some(filename) = filename {
          resolved
            .diagnostics
            .push(Diagnostic::conflicting_reference(filename, chunk_name));
        }

        match chunk_script(compilation, chunk_name) {
          Some(file) => resolved.urls.push(public_url(public_path, file)),
          None => resolved
            .diagnostics
            .push(Diagnostic::chunk_not_found(chunk_name, "importScripts")),
        }
      }
      (Some(filename), None) => {
        let filename = match compilation.hash.as_deref() {
          Some(hash) => filename.replace(HASH_PLACEHOLDER, hash),
          None => filename.to_string(),
        };
        resolved.urls.push(public_url(public_path, &filename));
      }
      (None, None) => {
        tracing::debug!("skipping import script without filename or chunk name");
      }
    }
  }

  resolved
}

fn chunk_script<'a>(compilation: &'a Compilation, chunk_name: &str) -> Option<&'a str> {
  compilation
    .chunk_files(chunk_name)?
    .iter()
    .find(|file| file.ends_with(".js"))
    .map(String::as_str)
}

fn public_url(public_path: &str, file: &str) -> String {
  if is_http_or_https(file) || (!public_path.is_empty() && file.starts_with(public_path)) {
    file.to_string()
  } else {
    format!("{public_path}{}", file.trim_start_matches('/'))
  }
}
