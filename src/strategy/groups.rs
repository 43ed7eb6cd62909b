//! One worker per declared group of dependency entries.

use serde_json::{Map, Value};

use crate::error::DeriveError;
use crate::manifest::DepsContainer;
use crate::models::Diagnostic;
use crate::strategy::{
  CollectedEntries, DerivedFields, Derivation, GroupDescriptor, StrategyContext, assemble_worker,
  build_entry_options,
};

const SCRIPT_EXTENSION: &str = ".js";

fn with_script_extension(name: &str) -> String {
  if name.ends_with(SCRIPT_EXTENSION) {
    name.to_string()
  } else {
    format!("{name}{SCRIPT_EXTENSION}")
  }
}

/// Derive one worker per group, in declaration order.
///
/// Entries missing from `deps` are reported as `ChunkNotFound` errors and skipped; the rest
/// of the group and every other group still derive.
pub fn derive_groups(
  context: &StrategyContext<'_>,
  deps: &DepsContainer,
  groups: &[GroupDescriptor],
) -> Result<Derivation, DeriveError> {
  let mut derivation = Derivation::default();

  for group in groups {
    let source_name = with_script_extension(&group.name);
    let filename = format!("{}-{}", context.options.prefix, source_name);
    let mut collected = CollectedEntries::default();

    for entry in group.entry.names() {
      let entry_name = with_script_extension(entry);
      let Some(record) = deps.get(&entry_name) else {
        tracing::debug!("group '{}' references missing entry '{}'", group.name, entry_name);
        derivation
          .diagnostics
          .push(Diagnostic::chunk_not_found(entry_name, filename.as_str()));
        continue;
      };

      collected.add(build_entry_options(
        record,
        &context.normalizer,
        context.options.ignore_patterns(),
      ));
    }

    let (static_file_globs, runtime_caching) = collected.finish()?;
    let derived = serde_json::to_value(DerivedFields {
      filepath: Some(context.worker_path(&filename)),
      static_file_globs,
      runtime_caching,
      strip_prefix_multi: context.normalizer.strip_prefix_multi(),
    })?;
    let overrides = Value::Object(group.options.clone().unwrap_or_else(Map::new));

    derivation.configs.push(assemble_worker(
      &source_name,
      &[&context.defaults, &overrides, &derived],
    )?);
  }

  Ok(derivation)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PluginOptions;
  use crate::manifest::Manifest;
  use crate::strategy::Strategy;
  use crate::url_paths::PathNormalizer;
  use serde_json::json;
  use std::path::PathBuf;

  fn output_dir() -> PathBuf {
    std::env::temp_dir().join("groups-out")
  }

  fn derive(manifest: serde_json::Value, options: serde_json::Value) -> Derivation {
    let manifest = Manifest::from_value(manifest).unwrap();
    let options: PluginOptions = serde_json::from_value(options).unwrap();
    let Strategy::Groups(groups) = &options.strategy else {
      panic!("expected group strategy");
    };
    let context = StrategyContext::new(
      &options,
      PathNormalizer::new(output_dir(), manifest.public_path()),
      &[],
    );
    derive_groups(&context, manifest.deps().unwrap(), groups).unwrap()
  }

  #[test]
  fn remote_only_group_has_one_runtime_rule() {
    let derivation = derive(
      json!({
        "info": { "publicPath": "/" },
        "deps": { "main.js": { "css": [], "js": ["http://cdn/a.js"] } }
      }),
      json!({ "strategy": [{ "name": "app", "entry": ["main"] }] }),
    );

    let config = &derivation.configs[0];
    assert_eq!(config.runtime_caching.len(), 1);
    assert!(config.runtime_caching[0].url_pattern.is_match("http://cdn/a.js"));
    assert!(config.static_file_globs.is_empty());
    assert_eq!(config.filepath, output_dir().join("sw-app.js"));
    assert_eq!(config.source_name, "app.js");
  }

  #[test]
  fn aggregates_and_deduplicates_entries_across_a_group() {
    let derivation = derive(
      json!({
        "info": { "publicPath": "/assets/" },
        "deps": {
          "main.js": { "css": ["/assets/shared.css"], "js": ["/assets/main.js", "https://cdn/x.js"] },
          "admin.js": { "css": ["/assets/shared.css"], "js": ["/assets/admin.js", "https://cdn/x.js"] }
        }
      }),
      json!({ "prefix": "pwa", "strategy": [{ "name": "app.js", "entry": ["main", "admin.js"] }] }),
    );

    let config = &derivation.configs[0];
    assert_eq!(config.filepath, output_dir().join("pwa-app.js"));
    assert_eq!(config.static_file_globs, vec![
      output_dir().join("shared.css"),
      output_dir().join("main.js"),
      output_dir().join("admin.js"),
    ]);
    assert_eq!(config.runtime_caching.len(), 1);
  }

  #[test]
  fn missing_entries_raise_chunk_not_found_without_aborting() {
    let derivation = derive(
      json!({
        "info": { "publicPath": "/" },
        "deps": { "main.js": { "js": ["/main.js"] } }
      }),
      json!({ "strategy": [
        { "name": "broken", "entry": ["main", "ghost"] },
        { "name": "ok", "entry": "main" }
      ] }),
    );

    assert_eq!(derivation.configs.len(), 2);
    assert_eq!(derivation.configs[0].static_file_globs, vec![output_dir().join("main.js")]);
    assert_eq!(derivation.diagnostics, vec![Diagnostic::chunk_not_found(
      "ghost.js",
      "sw-broken.js"
    )]);
    assert!(derivation.has_errors());
  }

  #[test]
  fn group_options_sit_between_defaults_and_derived_fields() {
    let derivation = derive(
      json!({
        "info": { "publicPath": "/" },
        "deps": { "main.js": { "js": ["/main.js"] } }
      }),
      json!({
        "navigateFallback": "/index.html",
        "strategy": [{
          "name": "app",
          "entry": "main",
          "options": {
            "navigateFallback": "/app.html",
            "filepath": "/elsewhere/app.js",
            "staticFileGlobs": ["/never.js"]
          }
        }]
      }),
    );

    let config = &derivation.configs[0];
    assert_eq!(config.options["navigateFallback"], "/app.html");
    assert_eq!(config.filepath, output_dir().join("sw-app.js"));
    assert_eq!(config.static_file_globs, vec![output_dir().join("main.js")]);
  }
}
