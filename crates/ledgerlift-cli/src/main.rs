//! ledgerlift binary.
//!
//! Reads `ledgerlift.toml` (or the path given with `--config`), opens the
//! SQLite target store, migrates every configured legacy export into it and
//! prints the run report as JSON on stdout.
//!
//! Exit codes: `0` on success or a dry run, `2` when the data was committed
//! but a check failed, `1` when the run aborted and nothing was committed.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::Parser;
use ledgerlift_cli::{RunConfig, expand_tilde};
use ledgerlift_core::report::RunStatus;
use ledgerlift_store_sqlite::{Orchestrator, TargetStore};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Consolidate legacy exports into one SQLite store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ledgerlift.toml")]
  config: PathBuf,

  /// Run the whole migration, then roll it back.
  #[arg(long)]
  dry_run: bool,

  /// Pretty-print the JSON report.
  #[arg(long)]
  pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  // Logs go to stderr; stdout carries the report.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let mut run_cfg = RunConfig::load(&cli.config).context("failed to read config")?;
  run_cfg.dry_run |= cli.dry_run;
  if run_cfg.sources.is_empty() {
    tracing::warn!("no sources configured");
  }

  let target_path = expand_tilde(&run_cfg.target_path);
  let store = TargetStore::open(&target_path)
    .await
    .with_context(|| format!("failed to open target store at {target_path:?}"))?;

  let report = Orchestrator::new(store, run_cfg.readers(), run_cfg.options())
    .run()
    .await
    .context("migration aborted, nothing was committed")?;

  let json = if cli.pretty {
    serde_json::to_string_pretty(&report)
  } else {
    serde_json::to_string(&report)
  }
  .context("failed to serialise report")?;
  println!("{json}");

  Ok(match report.status {
    RunStatus::Success | RunStatus::DryRun => ExitCode::SUCCESS,
    RunStatus::Partial => ExitCode::from(2),
  })
}
