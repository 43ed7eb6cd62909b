//! `offline-sw` command line entry point.
//!
//! - `derive` prints the worker configurations derived for a build as JSON
//! - `build` generates the worker scripts and the aggregate manifest

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use offline_sw_bundler::emit::{PrecacheScriptGenerator, TokioFileSystem};
use offline_sw_bundler::{Compilation, OfflineWorkerBuilder, PluginOptions};

#[derive(Debug, Parser)]
#[command(name = "offline-sw", version, about = "Derive and write offline precache workers")]
struct Cli {
  /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Print the derived worker configurations without writing anything.
  Derive(BuildArgs),
  /// Generate and write the worker scripts and `<prefix>-manifest.json`.
  Build(BuildArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
  /// Project directory; relative manifest paths and the default config resolve against it.
  #[arg(long, default_value = ".")]
  project: PathBuf,

  /// Options file. Defaults to `offline-sw.config.json` in the project directory.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Build output directory.
  #[arg(long, default_value = "dist")]
  output: PathBuf,

  /// Public path of the output directory when no manifest provides one.
  #[arg(long, default_value = "/")]
  public_path: String,

  /// Compilation stats JSON. Without it the output directory is scanned.
  #[arg(long)]
  stats: Option<PathBuf>,
}

impl BuildArgs {
  fn load(&self) -> Result<(PluginOptions, Compilation)> {
    let options = match &self.config {
      Some(path) => PluginOptions::from_path(path)?,
      None => PluginOptions::discover(&self.project)?,
    };

    let compilation = match &self.stats {
      Some(stats) => {
        let mut compilation = Compilation::from_stats_file(stats)?;
        if compilation.output_path.as_os_str().is_empty() {
          compilation.output_path = self.output.clone();
        }
        compilation
      }
      None => Compilation::scan(&self.output, &self.public_path)?,
    };

    Ok((options, compilation))
  }
}

fn init_logging(verbose: u8) {
  let filter = if std::env::var("RUST_LOG").is_ok() {
    EnvFilter::from_default_env()
  } else {
    EnvFilter::new(match verbose {
      0 => "info",
      1 => "debug",
      _ => "trace",
    })
  };

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  match cli.command {
    Command::Derive(args) => {
      let (options, compilation) = args.load()?;
      let plan = OfflineWorkerBuilder::new(&options, &compilation, &args.project).plan()?;

      let workers: Vec<_> = plan
        .derivation
        .configs
        .iter()
        .map(|config| json!({ "source": config.source_name, "config": config }))
        .collect();
      let output = json!({
        "publicPath": plan.public_path,
        "workers": workers,
        "diagnostics": plan.derivation.diagnostics,
      });
      println!(
        "{}",
        serde_json::to_string_pretty(&output).context("failed to render derived workers")?
      );
    }
    Command::Build(args) => {
      let (options, compilation) = args.load()?;
      let outcome = OfflineWorkerBuilder::new(&options, &compilation, &args.project)
        .build(&PrecacheScriptGenerator, &TokioFileSystem)
        .await?;

      for path in &outcome.report.written {
        println!("{}", path.display());
      }
      println!("{}", outcome.report.manifest_path.display());

      let errors = outcome.diagnostics.iter().filter(|d| d.is_error()).count();
      if errors > 0 {
        bail!("build finished with {errors} error(s)");
      }
    }
  }

  Ok(())
}
