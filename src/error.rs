//! Error types surfaced while loading options, deriving worker configurations and emitting scripts.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading plugin options from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the options file.
  #[error("failed to read {}: {source}", path.display())]
  Read {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// Failed to parse the options file.
  #[error("failed to parse {}: {message}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Parser message.
    message: String,
  },
}

/// Failure while loading a dependency manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// The manifest exists but could not be read.
  #[error("failed to read manifest {}: {source}", path.display())]
  Read {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// The manifest could not be parsed.
  #[error("failed to parse manifest {}: {message}", path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Parser message.
    message: String,
  },
  /// The manifest document is not shaped like a manifest.
  #[error("invalid manifest: {0}")]
  Invalid(String),
  /// The manifest has no `info.publicPath`.
  #[error("manifest is missing info.publicPath")]
  MissingPublicPath,
}

/// Failure while deriving worker configurations.
#[derive(Debug, Error)]
pub enum DeriveError {
  /// The manifest could not be loaded.
  #[error(transparent)]
  Manifest(#[from] ManifestError),
  /// A runtime URL could not be compiled into a pattern.
  #[error("runtime URL {url:?} is not a valid pattern: {source}")]
  InvalidPattern {
    /// URL that failed to compile.
    url: String,
    /// Regex compilation error.
    #[source]
    source: regex::Error,
  },
  /// Merged options could not be turned into a worker configuration.
  #[error("failed to assemble worker options: {0}")]
  Options(#[from] serde_json::Error),
}

/// Failure while generating or writing worker scripts.
#[derive(Debug, Error)]
pub enum EmitError {
  /// The script generator rejected a worker configuration.
  #[error("failed to generate worker {}: {source}", filepath.display())]
  Generate {
    /// Target path of the worker that failed.
    filepath: PathBuf,
    /// Generator error.
    #[source]
    source: anyhow::Error,
  },
  /// The parent directory of an output file could not be created.
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir {
    /// Directory that could not be created.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// An output file could not be written.
  #[error("failed to write {}: {source}", path.display())]
  Write {
    /// File that could not be written.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// The aggregate manifest could not be serialised.
  #[error("failed to serialise worker manifest: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Error returned by a full build.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Derivation failed.
  #[error(transparent)]
  Derive(#[from] DeriveError),
  /// Emission failed.
  #[error(transparent)]
  Emit(#[from] EmitError),
}
