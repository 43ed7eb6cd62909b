#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod compilation;
pub mod config;
pub mod emit;
pub mod error;
pub mod import_scripts;
pub mod manifest;
pub mod merge;
pub mod models;
pub mod selection;
pub mod strategy;
pub mod url_paths;

#[cfg(test)]
mod test_utils;

pub use builder::{BuildOutcome, OfflineWorkerBuilder, WorkerPlan};
pub use compilation::Compilation;
pub use config::PluginOptions;
pub use error::{BuildError, ConfigError, DeriveError, EmitError, ManifestError};
pub use manifest::{Manifest, ManifestSource};
pub use models::{Diagnostic, ServiceWorkerManifest, WorkerConfig};
pub use strategy::{Derivation, Strategy};
