//! Export settings, layered: defaults < `hist.toml` < `HIST_*` env < flags.

use std::path::Path;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde::Deserialize;

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  /// A single JSON array.
  #[default]
  Json,
  /// One JSON object per line.
  Jsonl,
}

/// How visits are joined with page metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
  /// Let SQLite join visits and pages in one query.
  #[default]
  Combined,
  /// Query visits and page metadata separately and merge in memory.
  Merge,
}

impl From<Strategy> for hist_store_sqlite::Strategy {
  fn from(s: Strategy) -> Self {
    match s {
      Strategy::Combined => Self::Combined,
      Strategy::Merge => Self::Merge,
    }
  }
}

/// Shape of the optional TOML config file (and `HIST_*` variables).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
  pub format:   Format,
  pub strategy: Strategy,
  /// Indent JSON array output.
  pub pretty:   bool,
}

/// Read `path` (if it exists) and the environment into an [`ExportConfig`].
pub fn load(path: &Path) -> Result<ExportConfig> {
  let settings = ::config::Config::builder()
    .add_source(::config::File::from(path.to_path_buf()).required(false))
    .add_source(::config::Environment::with_prefix("HIST"))
    .build()
    .with_context(|| format!("failed to read config file {}", path.display()))?;

  settings
    .try_deserialize()
    .context("failed to deserialise export config")
}
