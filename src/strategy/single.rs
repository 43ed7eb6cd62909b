//! One worker covering every top-level entry of the build.

use crate::compilation::Compilation;
use crate::config::PluginOptions;
use crate::error::DeriveError;
use crate::manifest::Manifest;
use crate::strategy::{CollectedEntries, DerivedFields, Derivation, StrategyContext, assemble_worker};
use crate::url_paths::{is_cache_static_file, is_http_or_https, normalize_public_path};

/// URLs of every top-level manifest entry, in manifest order.
pub fn single_entries_from_manifest(manifest: &Manifest) -> Vec<String> {
  manifest
    .top_level_urls()
    .flat_map(|(_, urls)| urls.iter().cloned())
    .collect()
}

/// Names of the compilation's emitted assets, relative to the output directory.
///
/// Explicit `staticFileGlobs` replace the emitted assets unless `mergeStaticsConfig` is set.
pub fn single_entries_from_compilation(options: &PluginOptions, compilation: &Compilation) -> Vec<String> {
  if !options.static_file_globs.is_empty() && !options.merge_statics_config {
    return Vec::new();
  }

  compilation.assets.clone()
}

/// Derive the single worker configuration from manifest URLs.
pub fn derive_single(context: &StrategyContext<'_>, entries: &[String]) -> Result<Derivation, DeriveError> {
  let options = context.options;
  let normalizer = &context.normalizer;
  let mut collected = explicit_statics(context);

  for url in entries {
    if is_http_or_https(url) {
      collected.add_runtime(url.as_str());
    } else if is_cache_static_file(url, options.ignore_patterns()) {
      collected.add_static(normalizer.normalize_path(url));
    }
  }

  finish_single(context, collected)
}

/// Derive the single worker configuration from emitted asset names.
///
/// Assets are local files, so they are always precached. Ignore patterns are matched against
/// the asset's path-only public URL.
pub fn derive_single_from_assets(
  context: &StrategyContext<'_>,
  assets: &[String],
) -> Result<Derivation, DeriveError> {
  let options = context.options;
  let normalizer = &context.normalizer;
  let public_path = normalize_public_path(normalizer.public_path());
  let mut collected = explicit_statics(context);

  for asset in assets {
    let asset = asset.trim_start_matches('/');
    let url = format!("{public_path}{asset}");
    if is_cache_static_file(&url, options.ignore_patterns()) {
      collected.add_static(normalizer.resolve(asset));
    }
  }

  finish_single(context, collected)
}

fn explicit_statics(context: &StrategyContext<'_>) -> CollectedEntries {
  let mut collected = CollectedEntries::default();
  for glob in &context.options.static_file_globs {
    collected.add_static(context.normalizer.resolve(glob));
  }
  collected
}

fn finish_single(context: &StrategyContext<'_>, collected: CollectedEntries) -> Result<Derivation, DeriveError> {
  let options = context.options;
  let normalizer = &context.normalizer;

  let (static_file_globs, rules) = collected.finish()?;
  let mut runtime_caching = options.runtime_caching.clone();
  for rule in rules {
    if !runtime_caching.contains(&rule) {
      runtime_caching.push(rule);
    }
  }

  let filepath = match &options.filepath {
    Some(filepath) => normalizer.resolve(filepath),
    None => context.worker_path(&options.filename),
  };

  let derived = serde_json::to_value(DerivedFields {
    filepath: Some(filepath),
    static_file_globs,
    runtime_caching,
    strip_prefix_multi: normalizer.strip_prefix_multi(),
  })?;

  let config = assemble_worker(&options.filename, &[&context.defaults, &derived])?;
  tracing::debug!(
    "single worker {} precaches {} files",
    config.filepath.display(),
    config.static_file_globs.len()
  );

  Ok(Derivation {
    configs: vec![config],
    diagnostics: Vec::new(),
  })
}
