//! `hist` — export browsing history from Firefox-family `places.sqlite`
//! databases.
//!
//! # Usage
//!
//! ```
//! hist save ~/.mozilla/firefox/abcd.default/places.sqlite --to history.json
//! hist merge backups/*.sqlite --format jsonl --to all.jsonl
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `info` level) so
//! exported data on stdout can be piped.

mod commands;
mod config;
mod export;

use std::{
  io,
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use hist_store_sqlite::SourceReader;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  config::{ExportConfig, Format, Strategy},
  export::{Exporter, Output},
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Export browser history from places databases")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "hist.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Export the visits in one database.
  Save {
    /// The `places.sqlite` file to read.
    db: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
  },
  /// Export the union of several databases, dropping duplicate visits.
  Merge {
    /// The `places.sqlite` files to read.
    #[arg(required = true)]
    dbs: Vec<PathBuf>,

    #[command(flatten)]
    output: OutputArgs,
  },
}

#[derive(Args, Debug)]
struct OutputArgs {
  /// Write to this file instead of stdout.
  #[arg(long, value_name = "FILE")]
  to: Option<PathBuf>,

  /// Output format.
  #[arg(long, value_enum)]
  format: Option<Format>,

  /// How visits are joined with page metadata.
  #[arg(long, value_enum)]
  strategy: Option<Strategy>,

  /// Indent JSON output.
  #[arg(long)]
  pretty: bool,
}

impl OutputArgs {
  /// Flags override the config file, which overrides defaults.
  fn apply(&self, mut cfg: ExportConfig) -> ExportConfig {
    if let Some(format) = self.format {
      cfg.format = format;
    }
    if let Some(strategy) = self.strategy {
      cfg.strategy = strategy;
    }
    cfg.pretty |= self.pretty;
    cfg
  }

  /// A `--to` file is only replaced once the export has completed.
  fn output(&self) -> Result<Output> {
    match &self.to {
      Some(path) => Output::file(path)
        .with_context(|| format!("failed to stage output for {}", path.display())),
      None => Ok(Output::stdout()),
    }
  }

  fn commit(&self, exporter: Exporter<Output>) -> Result<()> {
    let output = exporter.finish().context("failed to finish export")?;
    match &self.to {
      Some(path) => output
        .commit()
        .with_context(|| format!("failed to write {}", path.display())),
      None => output.commit().context("failed to write to stdout"),
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let file_cfg = config::load(&cli.config)?;
  let mut reader = SourceReader::new();

  match &cli.command {
    Command::Save { db, output } => {
      let cfg = output.apply(file_cfg);
      let mut exporter = Exporter::new(output.output()?, cfg.format, cfg.pretty);
      commands::save(&mut reader, &expand_tilde(db), cfg.strategy.into(), &mut exporter)?;
      output.commit(exporter)?;
    }
    Command::Merge { dbs, output } => {
      let cfg = output.apply(file_cfg);
      let dbs: Vec<PathBuf> = dbs.iter().map(PathBuf::as_path).map(expand_tilde).collect();
      let mut exporter = Exporter::new(output.output()?, cfg.format, cfg.pretty);
      commands::merge(&mut reader, &dbs, cfg.strategy.into(), &mut exporter)?;
      tracing::debug!(written = exporter.written(), "export complete");
      output.commit(exporter)?;
    }
  }

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_save() {
    let cli = Cli::try_parse_from(["hist", "save", "places.sqlite", "--format", "jsonl"]).unwrap();
    let Command::Save { db, output } = cli.command else {
      panic!("expected save");
    };
    assert_eq!(db, PathBuf::from("places.sqlite"));
    assert_eq!(output.format, Some(Format::Jsonl));
    assert_eq!(output.strategy, None);
    assert_eq!(cli.config, PathBuf::from("hist.toml"));
  }

  #[test]
  fn merge_requires_a_database() {
    assert!(Cli::try_parse_from(["hist", "merge"]).is_err());
  }

  #[test]
  fn parses_merge_with_strategy() {
    let cli = Cli::try_parse_from([
      "hist", "merge", "a.sqlite", "b.sqlite", "--strategy", "merge", "--to", "out.json",
    ])
    .unwrap();
    let Command::Merge { dbs, output } = cli.command else {
      panic!("expected merge");
    };
    assert_eq!(dbs.len(), 2);
    assert_eq!(output.strategy, Some(Strategy::Merge));
    assert_eq!(output.to, Some(PathBuf::from("out.json")));
  }

  #[test]
  fn flags_override_config() {
    let output = OutputArgs { to: None, format: Some(Format::Jsonl), strategy: None, pretty: true };
    let file_cfg = ExportConfig { format: Format::Json, strategy: Strategy::Merge, pretty: false };

    let cfg = output.apply(file_cfg);
    assert_eq!(cfg.format, Format::Jsonl);
    assert_eq!(cfg.strategy, Strategy::Merge);
    assert!(cfg.pretty);
  }

  #[test]
  fn expands_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/places.sqlite")), PathBuf::from(home).join("places.sqlite"));
    assert_eq!(expand_tilde(Path::new("/abs/places.sqlite")), PathBuf::from("/abs/places.sqlite"));
  }
}
