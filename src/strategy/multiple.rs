//! One worker per dependency entry.

use crate::error::DeriveError;
use crate::manifest::DepsContainer;
use crate::selection::{SharedChunkFilter, WorkerInclusion};
use crate::strategy::{
  CollectedEntries, DerivedFields, Derivation, StrategyContext, assemble_worker, build_entry_options,
  filepath_layer,
};

/// Worker filename for a dependency entry: `<prefix>-<entry with '/' replaced by '-'>`.
pub fn worker_filename(prefix: &str, entry_name: &str) -> String {
  format!("{prefix}-{}", entry_name.replace('/', "-"))
}

/// Derive one worker for every dependency entry that is not a shared chunk.
pub fn derive_multiple(context: &StrategyContext<'_>, deps: &DepsContainer) -> Result<Derivation, DeriveError> {
  derive_multiple_with(context, deps, &SharedChunkFilter)
}

/// Like [`derive_multiple`], with a custom inclusion filter.
pub fn derive_multiple_with<S: WorkerInclusion>(
  context: &StrategyContext<'_>,
  deps: &DepsContainer,
  selection: &S,
) -> Result<Derivation, DeriveError> {
  let mut configs = Vec::new();

  for (entry_name, record) in deps.iter() {
    if !selection.is_included(entry_name) {
      tracing::debug!("skipping shared chunk '{}'", entry_name);
      continue;
    }

    let filename = worker_filename(&context.options.prefix, entry_name);
    let filepath = filepath_layer(context.worker_path(&filename));

    let mut collected = CollectedEntries::default();
    collected.add(build_entry_options(
      record,
      &context.normalizer,
      context.options.ignore_patterns(),
    ));
    let (static_file_globs, runtime_caching) = collected.finish()?;

    let derived = serde_json::to_value(DerivedFields {
      filepath: None,
      static_file_globs,
      runtime_caching,
      strip_prefix_multi: context.normalizer.strip_prefix_multi(),
    })?;

    configs.push(assemble_worker(entry_name, &[&context.defaults, &filepath, &derived])?);
  }

  tracing::debug!("derived {} workers from {} entries", configs.len(), deps.len());

  Ok(Derivation {
    configs,
    diagnostics: Vec::new(),
  })
}
