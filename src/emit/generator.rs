//! Script generators turning a worker configuration into script text.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{RuntimeCachingRule, WorkerConfig};

/// Produces the worker script for one configuration.
pub trait ScriptGenerator {
  /// Generate the script text, or fail with a generation error.
  fn generate(&self, config: &WorkerConfig) -> impl Future<Output = Result<String>> + Send;
}

/// Cache name used when a configuration has no `cacheId`.
pub const DEFAULT_CACHE_NAME: &str = "offline-sw";

/// Renders the precache list of a worker: every file matched by its static globs with a
/// SHA-256 revision, its runtime rules and its imported scripts.
///
/// Request handling is not emitted; it lives in the runtime imported through `importScripts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecacheScriptGenerator;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeRuleLiteral<'a> {
  url_pattern: &'a str,
  handler: crate::models::CacheHandler,
  #[serde(skip_serializing_if = "Option::is_none")]
  options: Option<&'a serde_json::Value>,
}

impl ScriptGenerator for PrecacheScriptGenerator {
  async fn generate(&self, config: &WorkerConfig) -> Result<String> {
    let mut precache = BTreeMap::new();

    for pattern in &config.static_file_globs {
      let pattern_str = pattern.to_string_lossy();
      let mut matched = 0usize;

      for entry in glob::glob(&pattern_str).with_context(|| format!("invalid glob {pattern_str}"))? {
        let path = entry.with_context(|| format!("failed to expand {pattern_str}"))?;
        if !path.is_file() {
          continue;
        }

        let contents = tokio::fs::read(&path)
          .await
          .with_context(|| format!("failed to read {}", path.display()))?;
        let url = public_url(&path, config);
        precache.insert(url, hex::encode(Sha256::digest(&contents)));
        matched += 1;
      }

      if matched == 0 {
        tracing::warn!("static glob {} matched no files", pattern_str);
      }
    }

    render_script(config, &precache)
  }
}

/// Public URL for a precached file, using the first matching `stripPrefixMulti` entry.
pub fn public_url(path: &Path, config: &WorkerConfig) -> String {
  let path_str = path.to_string_lossy();

  config
    .strip_prefix_multi
    .iter()
    .find_map(|(dir, public_path)| {
      path_str
        .strip_prefix(dir.as_str())
        .map(|rest| format!("{public_path}{}", rest.replace('\\', "/")))
    })
    .unwrap_or_else(|| path_str.replace('\\', "/"))
}

fn render_script(config: &WorkerConfig, precache: &BTreeMap<String, String>) -> Result<String> {
  let cache_name = config.cache_id().unwrap_or(DEFAULT_CACHE_NAME);
  let precache_entries: Vec<(&str, &str)> = precache
    .iter()
    .map(|(url, revision)| (url.as_str(), revision.as_str()))
    .collect();
  let runtime_rules: Vec<RuntimeRuleLiteral<'_>> = config
    .runtime_caching
    .iter()
    .map(|rule: &RuntimeCachingRule| RuntimeRuleLiteral {
      url_pattern: rule.url_pattern.as_str(),
      handler: rule.handler,
      options: rule.options.as_ref(),
    })
    .collect();
  let import_scripts = config.import_scripts();

  let mut script = format!(
    r#"// Generated at build time by offline-sw. Do not edit.
'use strict';

var cacheName = {cache_name};
var precacheConfig = {precache};
var runtimeCaching = {runtime};

self.__offlineSw = {{
  cacheName: cacheName,
  precacheConfig: precacheConfig,
  runtimeCaching: runtimeCaching
}};
"#,
    cache_name = serde_json::to_string(cache_name)?,
    precache = serde_json::to_string(&precache_entries)?,
    runtime = serde_json::to_string(&runtime_rules)?,
  );

  if !import_scripts.is_empty() {
    let literals = import_scripts
      .iter()
      .map(serde_json::to_string)
      .collect::<Result<Vec<_>, _>>()?;
    script.push_str(&format!("\nimportScripts({});\n", literals.join(", ")));
  }

  Ok(script)
}
